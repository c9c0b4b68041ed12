//! Core type definitions for the shader node compiler.

use std::fmt;
use std::str::FromStr;

use anyhow::{Error, bail};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// WGSL value type for shader expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    F32,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl ValueType {
    /// Returns the WGSL type name for this value type.
    pub fn wgsl(self) -> &'static str {
        match self {
            ValueType::F32 => "f32",
            ValueType::Vec2 => "vec2f",
            ValueType::Vec3 => "vec3f",
            ValueType::Vec4 => "vec4f",
            ValueType::Mat4 => "mat4x4f",
        }
    }

    /// Number of scalar lanes for scalar and vector types. Matrices have none.
    pub fn components(self) -> Option<usize> {
        match self {
            ValueType::F32 => Some(1),
            ValueType::Vec2 => Some(2),
            ValueType::Vec3 => Some(3),
            ValueType::Vec4 => Some(4),
            ValueType::Mat4 => None,
        }
    }

    pub fn is_vector(self) -> bool {
        matches!(self, ValueType::Vec2 | ValueType::Vec3 | ValueType::Vec4)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wgsl())
    }
}

impl FromStr for ValueType {
    type Err = Error;

    /// Accepts both WGSL spellings (`vec3f`) and the short GLSL-ish ones (`vec3`, `float`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "f32" | "float" => ValueType::F32,
            "vec2f" | "vec2" | "vector2" => ValueType::Vec2,
            "vec3f" | "vec3" | "vector3" => ValueType::Vec3,
            "vec4f" | "vec4" | "vector4" | "color" => ValueType::Vec4,
            "mat4x4f" | "mat4" => ValueType::Mat4,
            other => bail!("unsupported value type: {other}"),
        })
    }
}

impl Serialize for ValueType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.wgsl())
    }
}

impl<'de> Deserialize<'de> for ValueType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A typed WGSL expression with metadata.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedExpr {
    pub ty: ValueType,
    pub expr: String,
    /// Folding hint: the expression is a compile-time literal and may be inlined freely.
    pub is_const: bool,
}

impl TypedExpr {
    /// Create a new runtime (non-constant) typed expression.
    pub fn new(expr: impl Into<String>, ty: ValueType) -> Self {
        Self {
            ty,
            expr: expr.into(),
            is_const: false,
        }
    }

    /// Create a typed expression flagged as a foldable constant.
    pub fn constant(expr: impl Into<String>, ty: ValueType) -> Self {
        Self {
            ty,
            expr: expr.into(),
            is_const: true,
        }
    }

    pub fn with_const(expr: impl Into<String>, ty: ValueType, is_const: bool) -> Self {
        Self {
            ty,
            expr: expr.into(),
            is_const,
        }
    }
}

/// Dimension of an environment texture binding, decided by the coordinate type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureDimension {
    D2,
    Cube,
}

impl TextureDimension {
    pub fn wgsl(self) -> &'static str {
        match self {
            TextureDimension::D2 => "texture_2d<f32>",
            TextureDimension::Cube => "texture_cube<f32>",
        }
    }

    /// Pick the texture dimension addressed by a coordinate of type `ty`.
    pub fn for_coordinate(ty: ValueType) -> Option<Self> {
        match ty {
            ValueType::Vec2 => Some(TextureDimension::D2),
            ValueType::Vec3 => Some(TextureDimension::Cube),
            _ => None,
        }
    }
}

/// A texture + sampler pair referenced by the compiled graph.
#[derive(Clone, Debug, PartialEq)]
pub struct TextureBinding {
    pub name: String,
    pub dimension: TextureDimension,
}

/// Function-local variable declared for a non-constant node.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalDecl {
    pub name: String,
    pub ty: ValueType,
    pub init: String,
}

/// Result of compiling one node graph.
#[derive(Clone, Debug)]
pub struct ShaderFragment {
    /// The root expression, already coerced to the requested output type.
    pub expr: TypedExpr,
    /// Locals declared by non-constant nodes, in declaration order.
    pub locals: Vec<LocalDecl>,
    /// Environment textures referenced by the graph, in binding order.
    pub textures: Vec<TextureBinding>,
    /// A standalone WGSL module wrapping the expression in the entry function.
    pub module: String,
}
