//! JSON description of a node graph and its conversion into nodes.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "metadata": { "name": "irradiance-probe" },
//!   "output": "vec3f",
//!   "root": {
//!     "type": "PhysicalContext",
//!     "scope": "irradiance",
//!     "node": { "type": "EnvironmentSample", "texture": "irradiance" }
//!   }
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::compiler::context::{ContextOverrideSet, ContextValue};
use crate::compiler::node_compiler::ShaderNode;
use crate::compiler::node_compiler::attribute::{NormalNode, NormalSpace};
use crate::compiler::node_compiler::context_nodes::{
    ContextNode, ContextValueNode, PhysicalContextNode, PhysicalScope,
};
use crate::compiler::node_compiler::input_nodes::{ConstantScalarNode, ExpressionNode};
use crate::compiler::node_compiler::math_nodes::{MathNode, MathOp};
use crate::compiler::node_compiler::texture_nodes::EnvironmentSampleNode;
use crate::compiler::types::ValueType;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GraphDSL {
    pub version: String,
    pub metadata: Metadata,
    /// Type the compiled module returns.
    #[serde(default = "default_output")]
    pub output: ValueType,
    pub root: NodeSpec,
}

fn default_output() -> ValueType {
    ValueType::Vec4
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Metadata {
    pub name: String,
    pub created: Option<String>,
    pub modified: Option<String>,
}

/// One node of the tree. Strings that select behavior (`scope`, `space`, `op`) are
/// parsed when the node is built, so an unknown value fails there.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(tag = "type")]
pub enum NodeSpec {
    PhysicalContext {
        scope: String,
        node: Box<NodeSpec>,
    },
    Context {
        #[serde(default)]
        values: BTreeMap<String, NodeSpec>,
        node: Box<NodeSpec>,
        #[serde(default, rename = "valueType")]
        value_type: Option<ValueType>,
    },
    Expression {
        snippet: String,
        #[serde(rename = "valueType")]
        value_type: ValueType,
    },
    Float {
        value: f32,
        #[serde(default)]
        constant: bool,
    },
    Normal {
        #[serde(default = "default_space")]
        space: String,
    },
    ContextValue {
        key: String,
        fallback: Box<NodeSpec>,
    },
    EnvironmentSample {
        texture: String,
    },
    Math {
        op: String,
        inputs: Vec<NodeSpec>,
    },
}

fn default_space() -> String {
    "view".to_string()
}

pub fn parse_graph(text: &str) -> Result<GraphDSL> {
    serde_json::from_str(text).context("failed to parse graph json")
}

pub fn load_graph_from_path(path: impl AsRef<std::path::Path>) -> Result<GraphDSL> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read graph json at {}", path.display()))?;
    parse_graph(&text).with_context(|| format!("invalid graph json {}", path.display()))
}

/// Build the root node of `graph`.
pub fn build_root(graph: &GraphDSL) -> Result<Box<dyn ShaderNode>> {
    build_node(&graph.root).with_context(|| format!("graph {}", graph.metadata.name))
}

/// Build a node tree from its description.
pub fn build_node(spec: &NodeSpec) -> Result<Box<dyn ShaderNode>> {
    let node: Box<dyn ShaderNode> = match spec {
        NodeSpec::PhysicalContext { scope, node } => {
            let scope: PhysicalScope = scope.parse()?;
            Box::new(PhysicalContextNode::for_scope(scope, build_node(node)?))
        }
        NodeSpec::Context {
            values,
            node,
            value_type,
        } => {
            let mut overrides = ContextOverrideSet::new();
            for (key, value) in values {
                let value: Arc<dyn ShaderNode> = Arc::from(
                    build_node(value).with_context(|| format!("context value {key}"))?,
                );
                overrides.insert(key.clone(), ContextValue::Node(value));
            }
            let ctx = ContextNode::new(build_node(node)?, overrides);
            match value_type {
                Some(ty) => Box::new(ctx.with_result_type(*ty)),
                None => Box::new(ctx),
            }
        }
        NodeSpec::Expression {
            snippet,
            value_type,
        } => {
            if snippet.trim().is_empty() {
                return Err(anyhow!("Expression.snippet must not be empty"));
            }
            Box::new(ExpressionNode::new(snippet.clone(), *value_type))
        }
        NodeSpec::Float { value, constant } => {
            Box::new(ConstantScalarNode::new(*value).with_const(*constant))
        }
        NodeSpec::Normal { space } => {
            let space: NormalSpace = space.parse()?;
            Box::new(NormalNode::new(space))
        }
        NodeSpec::ContextValue { key, fallback } => {
            Box::new(ContextValueNode::new(key.clone(), build_node(fallback)?))
        }
        NodeSpec::EnvironmentSample { texture } => Box::new(EnvironmentSampleNode::new(texture.clone())),
        NodeSpec::Math { op, inputs } => {
            let op: MathOp = op.parse()?;
            let operands = inputs.iter().map(build_node).collect::<Result<Vec<_>>>()?;
            Box::new(MathNode::new(op, operands)?)
        }
    };
    Ok(node)
}
