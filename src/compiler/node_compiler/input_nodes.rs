//! Leaf nodes with fixed values (ExpressionNode, ConstantScalarNode).

use anyhow::Result;

use super::super::builder::NodeBuilder;
use super::super::types::{TypedExpr, ValueType};
use super::super::utils::float_literal;
use super::{NodeId, ShaderNode};

/// Emits a named WGSL expression verbatim.
///
/// Typically a reference to a value computed elsewhere in the shader
/// (e.g. `roughnessFactor`), so it is never treated as a constant.
#[derive(Debug)]
pub struct ExpressionNode {
    id: NodeId,
    snippet: String,
    ty: ValueType,
}

impl ExpressionNode {
    pub fn new(snippet: impl Into<String>, ty: ValueType) -> Self {
        Self {
            id: NodeId::next(),
            snippet: snippet.into(),
            ty,
        }
    }

    pub fn snippet(&self) -> &str {
        &self.snippet
    }
}

impl ShaderNode for ExpressionNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> &'static str {
        "Expression"
    }

    fn result_type(&self) -> ValueType {
        self.ty
    }

    fn generate(&self, _builder: &mut NodeBuilder, _output: ValueType) -> Result<TypedExpr> {
        Ok(TypedExpr::new(self.snippet.clone(), self.ty))
    }
}

/// A float value.
///
/// # Output
/// - constant: the inline literal (`1.0`), flagged foldable
/// - otherwise: a function-local `var` declared once per node (`nf_float_<n>`)
#[derive(Debug)]
pub struct ConstantScalarNode {
    id: NodeId,
    value: f32,
    is_const: bool,
}

impl ConstantScalarNode {
    /// A runtime float. Use [`ConstantScalarNode::with_const`] to allow inlining.
    pub fn new(value: f32) -> Self {
        Self {
            id: NodeId::next(),
            value,
            is_const: false,
        }
    }

    pub fn constant(value: f32) -> Self {
        Self::new(value).with_const(true)
    }

    pub fn with_const(mut self, is_const: bool) -> Self {
        self.is_const = is_const;
        self
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    pub fn is_const(&self) -> bool {
        self.is_const
    }
}

impl ShaderNode for ConstantScalarNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> &'static str {
        "Float"
    }

    fn result_type(&self) -> ValueType {
        ValueType::F32
    }

    fn generate(&self, builder: &mut NodeBuilder, _output: ValueType) -> Result<TypedExpr> {
        let literal = float_literal(self.value)?;
        if self.is_const {
            return Ok(TypedExpr::constant(literal, ValueType::F32));
        }
        let name = builder.declare_local(self.id, ValueType::F32, literal);
        Ok(TypedExpr::new(name, ValueType::F32))
    }
}
