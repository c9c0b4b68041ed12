//! Surface attribute accessors (NormalNode).

use std::str::FromStr;

use anyhow::{Error, Result, bail};

use super::super::builder::NodeBuilder;
use super::super::types::{TypedExpr, ValueType};
use super::{NodeId, ShaderNode};

/// Coordinate space of a surface normal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalSpace {
    Local,
    View,
    World,
}

impl NormalSpace {
    pub fn as_str(self) -> &'static str {
        match self {
            NormalSpace::Local => "local",
            NormalSpace::View => "view",
            NormalSpace::World => "world",
        }
    }
}

impl FromStr for NormalSpace {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "local" | "object" => NormalSpace::Local,
            "view" => NormalSpace::View,
            "world" => NormalSpace::World,
            other => bail!("unsupported normal space: {other} (expected local, view or world)"),
        })
    }
}

/// Reads the surface normal in a fixed space.
///
/// The expression itself, including any basis change, comes from
/// [`NodeBuilder::normal_expr`] so it follows the builder's input naming.
#[derive(Debug)]
pub struct NormalNode {
    id: NodeId,
    space: NormalSpace,
}

impl NormalNode {
    pub fn new(space: NormalSpace) -> Self {
        Self {
            id: NodeId::next(),
            space,
        }
    }

    pub fn space(&self) -> NormalSpace {
        self.space
    }
}

impl ShaderNode for NormalNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> &'static str {
        "Normal"
    }

    fn result_type(&self) -> ValueType {
        ValueType::Vec3
    }

    fn generate(&self, builder: &mut NodeBuilder, _output: ValueType) -> Result<TypedExpr> {
        Ok(TypedExpr::new(builder.normal_expr(self.space), ValueType::Vec3))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::config::BuilderConfig;

    #[test]
    fn test_normal_space_parse() {
        assert_eq!("World".parse::<NormalSpace>().unwrap(), NormalSpace::World);
        assert_eq!("object".parse::<NormalSpace>().unwrap(), NormalSpace::Local);
        assert!("tangent".parse::<NormalSpace>().is_err());
    }

    #[test]
    fn test_world_normal() {
        let mut builder = NodeBuilder::default();
        let result = builder
            .generate(&NormalNode::new(NormalSpace::World), ValueType::Vec3)
            .unwrap();
        assert_eq!(result.ty, ValueType::Vec3);
        assert_eq!(result.expr, "normalize((vec4f(in.view_normal, 0.0) * view_matrix).xyz)");
    }

    #[test]
    fn test_normal_follows_config_names() {
        let config = BuilderConfig {
            input_name: "frag".to_string(),
            normal_field: "n_obj".to_string(),
            ..BuilderConfig::default()
        };
        let mut builder = NodeBuilder::new(config).unwrap();
        let result = builder
            .generate(&NormalNode::new(NormalSpace::Local), ValueType::Vec3)
            .unwrap();
        assert_eq!(result.expr, "frag.n_obj");
    }

    #[test]
    fn test_normal_coerces_to_vec4() {
        let mut builder = NodeBuilder::default();
        let result = builder
            .generate(&NormalNode::new(NormalSpace::View), ValueType::Vec4)
            .unwrap();
        assert_eq!(result.expr, "vec4f(normalize(in.view_normal), 1.0)");
    }
}
