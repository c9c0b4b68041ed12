//! Arithmetic nodes (Add, Multiply, Mix).

use std::str::FromStr;

use anyhow::{Error, Result, bail};

use super::super::builder::NodeBuilder;
use super::super::types::{TypedExpr, ValueType};
use super::super::utils::coerce_for_binary;
use super::{NodeId, ShaderNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MathOp {
    Add,
    Multiply,
    Mix,
}

impl MathOp {
    /// Number of operands the op takes.
    pub fn arity(self) -> usize {
        match self {
            MathOp::Add | MathOp::Multiply => 2,
            MathOp::Mix => 3,
        }
    }
}

impl FromStr for MathOp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "add" => MathOp::Add,
            "multiply" | "mul" => MathOp::Multiply,
            "mix" | "lerp" => MathOp::Mix,
            other => bail!("unsupported math op: {other}"),
        })
    }
}

/// Combines its operands with scalar-to-vector promotion.
///
/// # Output
/// - Add: `(a + b)`
/// - Multiply: `(a * b)`
/// - Mix: `mix(a, b, t)` with `t` coerced to f32
///
/// The result is flagged constant only when every operand is.
#[derive(Debug)]
pub struct MathNode {
    id: NodeId,
    op: MathOp,
    operands: Vec<Box<dyn ShaderNode>>,
}

impl MathNode {
    /// Build a node for `op`; the operand count must match the op.
    pub fn new(op: MathOp, operands: Vec<Box<dyn ShaderNode>>) -> Result<Self> {
        if operands.len() != op.arity() {
            bail!(
                "Math {:?} takes {} inputs, got {}",
                op,
                op.arity(),
                operands.len()
            );
        }
        Ok(Self {
            id: NodeId::next(),
            op,
            operands,
        })
    }

    pub fn add(a: Box<dyn ShaderNode>, b: Box<dyn ShaderNode>) -> Self {
        Self {
            id: NodeId::next(),
            op: MathOp::Add,
            operands: vec![a, b],
        }
    }

    pub fn multiply(a: Box<dyn ShaderNode>, b: Box<dyn ShaderNode>) -> Self {
        Self {
            id: NodeId::next(),
            op: MathOp::Multiply,
            operands: vec![a, b],
        }
    }

    pub fn mix(a: Box<dyn ShaderNode>, b: Box<dyn ShaderNode>, t: Box<dyn ShaderNode>) -> Self {
        Self {
            id: NodeId::next(),
            op: MathOp::Mix,
            operands: vec![a, b, t],
        }
    }

    pub fn op(&self) -> MathOp {
        self.op
    }
}

fn promoted(a: ValueType, b: ValueType) -> ValueType {
    match (a, b) {
        (ValueType::F32, other) if other.is_vector() => other,
        (first, _) => first,
    }
}

impl ShaderNode for MathNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> &'static str {
        "Math"
    }

    fn result_type(&self) -> ValueType {
        promoted(self.operands[0].result_type(), self.operands[1].result_type())
    }

    fn generate(&self, builder: &mut NodeBuilder, _output: ValueType) -> Result<TypedExpr> {
        let a = builder.generate(self.operands[0].as_ref(), self.operands[0].result_type())?;
        let b = builder.generate(self.operands[1].as_ref(), self.operands[1].result_type())?;
        let (a, b, ty) = coerce_for_binary(a, b)?;

        Ok(match self.op {
            MathOp::Add => TypedExpr::with_const(
                format!("({} + {})", a.expr, b.expr),
                ty,
                a.is_const && b.is_const,
            ),
            MathOp::Multiply => TypedExpr::with_const(
                format!("({} * {})", a.expr, b.expr),
                ty,
                a.is_const && b.is_const,
            ),
            MathOp::Mix => {
                let t = builder.generate(self.operands[2].as_ref(), ValueType::F32)?;
                TypedExpr::with_const(
                    format!("mix({}, {}, {})", a.expr, b.expr, t.expr),
                    ty,
                    a.is_const && b.is_const && t.is_const,
                )
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::node_compiler::input_nodes::{ConstantScalarNode, ExpressionNode};

    fn expr(s: &str, ty: ValueType) -> Box<dyn ShaderNode> {
        Box::new(ExpressionNode::new(s, ty))
    }

    #[test]
    fn test_add_promotes_scalar() {
        let mut builder = NodeBuilder::default();
        let node = MathNode::add(expr("r", ValueType::F32), expr("n", ValueType::Vec3));
        assert_eq!(node.result_type(), ValueType::Vec3);
        let result = builder.generate(&node, ValueType::Vec3).unwrap();
        assert_eq!(result.expr, "(vec3f(r) + n)");
    }

    #[test]
    fn test_multiply_of_constants_stays_constant() {
        let mut builder = NodeBuilder::default();
        let node = MathNode::multiply(
            Box::new(ConstantScalarNode::constant(1.0)),
            Box::new(ConstantScalarNode::constant(8.0)),
        );
        let result = builder.generate(&node, ValueType::F32).unwrap();
        assert_eq!(result.expr, "(1.0 * 8.0)");
        assert!(result.is_const);
    }

    #[test]
    fn test_mix_coerces_factor_to_scalar() {
        let mut builder = NodeBuilder::default();
        let node = MathNode::mix(
            expr("a", ValueType::Vec3),
            expr("b", ValueType::Vec3),
            expr("t", ValueType::Vec4),
        );
        let result = builder.generate(&node, ValueType::Vec3).unwrap();
        assert_eq!(result.expr, "mix(a, b, (t).x)");
        assert!(!result.is_const);
    }

    #[test]
    fn test_incompatible_operands_fail() {
        let mut builder = NodeBuilder::default();
        let node = MathNode::add(expr("a", ValueType::Vec2), expr("b", ValueType::Vec3));
        assert!(builder.generate(&node, ValueType::Vec3).is_err());
    }

    #[test]
    fn test_new_checks_arity() {
        assert!(MathNode::new(MathOp::Mix, vec![expr("a", ValueType::F32)]).is_err());
        assert!(MathNode::new(MathOp::Add, vec![expr("a", ValueType::F32), expr("b", ValueType::F32)]).is_ok());
        assert_eq!("lerp".parse::<MathOp>().unwrap(), MathOp::Mix);
    }
}
