//! Shader node compiler: turns a tree of nodes into a WGSL module.
//!
//! This module is organized into several submodules:
//! - `types`: Core type definitions (ValueType, TypedExpr, ShaderFragment, etc.)
//! - `utils`: Literal formatting and the coercion table
//! - `config`: Builder configuration (input names, runtime params)
//! - `context`: Context override frames and the shadowing stack
//! - `builder`: NodeBuilder, which owns one compile's state
//! - `node_compiler`: The node trait and the node kinds
//! - `validation`: WGSL validation using naga
//!
//! The main entry point is [`NodeBuilder::build`].

pub mod builder;
pub mod config;
pub mod context;
pub mod node_compiler;
pub mod types;
pub mod utils;
pub mod validation;

pub use builder::{ContextGuard, NodeBuilder};
pub use config::{BuilderConfig, RuntimeParam};
pub use context::{ContextOverrideSet, ContextStack, ContextValue, NodeRef, ROUGHNESS_KEY, UV_KEY};
pub use node_compiler::attribute::{NormalNode, NormalSpace};
pub use node_compiler::context_nodes::{
    ContextNode, ContextPolicy, ContextValueNode, PhysicalContextNode, PhysicalScope, ROUGHNESS_FACTOR,
};
pub use node_compiler::input_nodes::{ConstantScalarNode, ExpressionNode};
pub use node_compiler::math_nodes::{MathNode, MathOp};
pub use node_compiler::texture_nodes::EnvironmentSampleNode;
pub use node_compiler::{NodeId, ShaderNode};
pub use types::{ShaderFragment, TypedExpr, ValueType};
pub use validation::{validate_wgsl, validate_wgsl_with_context};
