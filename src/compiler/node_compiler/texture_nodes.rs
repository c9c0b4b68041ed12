//! Environment map sampling (EnvironmentSampleNode).

use anyhow::{Result, bail};

use super::super::builder::NodeBuilder;
use super::super::context::{ROUGHNESS_KEY, UV_KEY};
use super::super::types::{TextureDimension, TypedExpr, ValueType};
use super::super::utils::float_literal;
use super::{NodeId, ShaderNode};

/// Samples an environment texture, taking coordinate and blur level from the context.
///
/// # Context
/// - `uv`: sample coordinate; defaults to the interpolated uv. A vec2 coordinate
///   binds a `texture_2d<f32>`, a vec3 coordinate (e.g. a world normal) a
///   `texture_cube<f32>`.
/// - `roughness`: scaled by the configured max mip to pick the level; defaults to 0.0.
///
/// # Output
/// - Type: vec4f
///
/// # Example
/// ```wgsl
/// textureSampleLevel(env_tex_probe, env_samp_probe, in.uv, (roughnessFactor * 8.0))
/// ```
#[derive(Debug)]
pub struct EnvironmentSampleNode {
    id: NodeId,
    texture: String,
}

impl EnvironmentSampleNode {
    pub fn new(texture: impl Into<String>) -> Self {
        Self {
            id: NodeId::next(),
            texture: texture.into(),
        }
    }

    pub fn texture(&self) -> &str {
        &self.texture
    }
}

impl ShaderNode for EnvironmentSampleNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> &'static str {
        "EnvironmentSample"
    }

    fn result_type(&self) -> ValueType {
        ValueType::Vec4
    }

    fn generate(&self, builder: &mut NodeBuilder, _output: ValueType) -> Result<TypedExpr> {
        let uv = match builder.get_context_value(UV_KEY) {
            Some(value) => builder.generate_value(&value, value.value_type())?,
            None => {
                let c = builder.config();
                TypedExpr::new(format!("{}.{}", c.input_name, c.uv_field), ValueType::Vec2)
            }
        };
        let Some(dimension) = TextureDimension::for_coordinate(uv.ty) else {
            bail!("EnvironmentSample.uv must be vec2f or vec3f, got {}", uv.ty);
        };

        let roughness = match builder.get_context_value(ROUGHNESS_KEY) {
            Some(value) => builder.generate_value(&value, ValueType::F32)?,
            None => TypedExpr::constant("0.0", ValueType::F32),
        };
        let max_mip = float_literal(builder.config().env_max_mip)?;
        let level = format!("({} * {max_mip})", roughness.expr);

        builder.register_texture(&self.texture, dimension)?;
        let tex_var = NodeBuilder::tex_var_name(&self.texture);
        let samp_var = NodeBuilder::sampler_var_name(&self.texture);

        Ok(TypedExpr::new(
            format!("textureSampleLevel({tex_var}, {samp_var}, {}, {level})", uv.expr),
            ValueType::Vec4,
        ))
    }
}
