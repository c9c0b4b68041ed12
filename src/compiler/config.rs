//! Builder configuration: names of the shader inputs the emitted WGSL refers to.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::node_compiler::context_nodes::ROUGHNESS_FACTOR;
use super::types::ValueType;
use super::utils::sanitize_wgsl_ident;

/// A runtime value exposed as a parameter of the entry function (e.g. `roughnessFactor`).
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct RuntimeParam {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: ValueType,
}

impl RuntimeParam {
    pub fn new(name: impl Into<String>, ty: ValueType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    /// Name of the emitted entry function.
    pub function_name: String,
    /// Name of the struct carrying interpolated surface inputs.
    pub input_struct: String,
    /// Parameter name of the input struct inside the entry function.
    pub input_name: String,
    pub uv_field: String,
    /// Object-space normal field.
    pub normal_field: String,
    /// View-space normal field; world space is derived from it with the view matrix.
    pub view_normal_field: String,
    pub view_matrix: String,
    /// Extra parameters of the entry function. Must include `view_matrix`.
    pub params: Vec<RuntimeParam>,
    /// Mip level reached at roughness 1.0 when sampling environment maps.
    pub env_max_mip: f32,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            function_name: "node_main".to_string(),
            input_struct: "NodeInputs".to_string(),
            input_name: "in".to_string(),
            uv_field: "uv".to_string(),
            normal_field: "normal".to_string(),
            view_normal_field: "view_normal".to_string(),
            view_matrix: "view_matrix".to_string(),
            params: vec![
                RuntimeParam::new("view_matrix", ValueType::Mat4),
                RuntimeParam::new("roughnessFactor", ValueType::F32),
            ],
            env_max_mip: 8.0,
        }
    }
}

impl BuilderConfig {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let config: BuilderConfig =
            serde_json::from_str(text).context("failed to parse builder config json")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read builder config at {}", path.display()))?;
        Self::from_json_str(&text).with_context(|| format!("invalid builder config {}", path.display()))
    }

    /// Reject configs whose names would produce an unparsable module.
    pub fn validate(&self) -> Result<()> {
        let idents = [
            ("functionName", &self.function_name),
            ("inputStruct", &self.input_struct),
            ("inputName", &self.input_name),
            ("uvField", &self.uv_field),
            ("normalField", &self.normal_field),
            ("viewNormalField", &self.view_normal_field),
            ("viewMatrix", &self.view_matrix),
        ];
        for (field, value) in idents {
            if value.is_empty() || sanitize_wgsl_ident(value) != *value {
                bail!("{field} is not a valid WGSL identifier: {value:?}");
            }
        }

        let mut seen = HashSet::new();
        for p in &self.params {
            if p.name.is_empty() || sanitize_wgsl_ident(&p.name) != p.name {
                bail!("runtime param is not a valid WGSL identifier: {:?}", p.name);
            }
            if !seen.insert(p.name.as_str()) {
                bail!("duplicate runtime param: {}", p.name);
            }
        }
        match self.params.iter().find(|p| p.name == self.view_matrix) {
            Some(p) if p.ty == ValueType::Mat4 => {}
            Some(p) => bail!("{} must be mat4x4f, got {}", self.view_matrix, p.ty),
            None => bail!("params must declare the view matrix {}", self.view_matrix),
        }
        // Radiance scopes reference the runtime roughness by name.
        match self.params.iter().find(|p| p.name == ROUGHNESS_FACTOR) {
            Some(p) if p.ty == ValueType::F32 => {}
            Some(p) => bail!("{ROUGHNESS_FACTOR} must be f32, got {}", p.ty),
            None => bail!("params must declare {ROUGHNESS_FACTOR}: f32"),
        }

        if !self.env_max_mip.is_finite() || self.env_max_mip < 0.0 {
            bail!("envMaxMip must be a non-negative number, got {}", self.env_max_mip);
        }
        Ok(())
    }
}
