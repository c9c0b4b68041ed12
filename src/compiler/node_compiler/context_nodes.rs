//! Context-scoped composites (ContextNode, PhysicalContextNode) and the context reader.
//!
//! A [`ContextNode`] wraps exactly one child. While the child generates, the
//! node's override frame sits on top of the builder's context stack; keys it does
//! not define stay visible from the frames below. The frame is removed by a guard,
//! so the stack is restored whether the child succeeds, fails or panics.

use std::fmt;
use std::str::FromStr;

use anyhow::{Error, Result, bail};

use super::super::builder::NodeBuilder;
use super::super::context::{ContextOverrideSet, ContextValue, ROUGHNESS_KEY, UV_KEY};
use super::super::types::{TypedExpr, ValueType};
use super::attribute::{NormalNode, NormalSpace};
use super::input_nodes::{ConstantScalarNode, ExpressionNode};
use super::{NodeId, ShaderNode};

/// Name of the per-pixel roughness computed elsewhere in the shader.
pub const ROUGHNESS_FACTOR: &str = "roughnessFactor";

/// Computes the override frame a [`ContextNode`] installs.
pub trait ContextPolicy: Send + Sync {
    fn overrides(&self) -> ContextOverrideSet;
}

/// A fixed set of overrides is its own policy.
impl ContextPolicy for ContextOverrideSet {
    fn overrides(&self) -> ContextOverrideSet {
        self.clone()
    }
}

pub struct ContextNode<P: ContextPolicy = ContextOverrideSet> {
    id: NodeId,
    child: Box<dyn ShaderNode>,
    policy: P,
    overrides: ContextOverrideSet,
    ty: Option<ValueType>,
}

impl<P: ContextPolicy> ContextNode<P> {
    /// Wrap `child`. The policy is evaluated once, here; the resulting frame is
    /// reused by every generation so override nodes keep a stable identity.
    pub fn new(child: Box<dyn ShaderNode>, policy: P) -> Self {
        let overrides = policy.overrides();
        Self {
            id: NodeId::next(),
            child,
            policy,
            overrides,
            ty: None,
        }
    }

    /// Declare a result type independent of the child's.
    pub fn with_result_type(mut self, ty: ValueType) -> Self {
        self.ty = Some(ty);
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    pub fn overrides(&self) -> &ContextOverrideSet {
        &self.overrides
    }

    pub fn child(&self) -> &dyn ShaderNode {
        self.child.as_ref()
    }
}

impl<P: ContextPolicy> ShaderNode for ContextNode<P> {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> &'static str {
        "Context"
    }

    fn result_type(&self) -> ValueType {
        self.ty.unwrap_or_else(|| self.child.result_type())
    }

    fn generate(&self, builder: &mut NodeBuilder, output: ValueType) -> Result<TypedExpr> {
        let mut scope = builder.scoped_context(self.overrides.clone());
        scope.generate(self.child.as_ref(), output)
    }
}

impl<P: ContextPolicy + fmt::Debug> fmt::Debug for ContextNode<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextNode")
            .field("id", &self.id)
            .field("policy", &self.policy)
            .field("child", &self.child.as_ref())
            .finish()
    }
}

/// Lighting evaluation mode selected by a [`PhysicalContextNode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicalScope {
    /// Specular probe sampling: roughness is the runtime `roughnessFactor`.
    Radiance,
    /// Diffuse ambient sampling: roughness is the constant 1.0 and `uv` is the world normal.
    Irradiance,
}

impl PhysicalScope {
    pub fn as_str(self) -> &'static str {
        match self {
            PhysicalScope::Radiance => "radiance",
            PhysicalScope::Irradiance => "irradiance",
        }
    }
}

impl FromStr for PhysicalScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "radiance" => Ok(PhysicalScope::Radiance),
            "irradiance" => Ok(PhysicalScope::Irradiance),
            other => bail!("unknown physical context scope: {other:?} (expected \"radiance\" or \"irradiance\")"),
        }
    }
}

impl fmt::Display for PhysicalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ContextPolicy for PhysicalScope {
    fn overrides(&self) -> ContextOverrideSet {
        match self {
            PhysicalScope::Radiance => ContextOverrideSet::new().with(
                ROUGHNESS_KEY,
                ContextValue::node(ExpressionNode::new(ROUGHNESS_FACTOR, ValueType::F32)),
            ),
            PhysicalScope::Irradiance => ContextOverrideSet::new()
                .with(ROUGHNESS_KEY, ContextValue::node(ConstantScalarNode::constant(1.0)))
                .with(UV_KEY, ContextValue::node(NormalNode::new(NormalSpace::World))),
        }
    }
}

/// Context node configured for radiance or irradiance evaluation. Always declares vec3.
pub type PhysicalContextNode = ContextNode<PhysicalScope>;

impl ContextNode<PhysicalScope> {
    pub fn for_scope(scope: PhysicalScope, child: Box<dyn ShaderNode>) -> Self {
        ContextNode::new(child, scope).with_result_type(ValueType::Vec3)
    }

    pub fn scope(&self) -> PhysicalScope {
        self.policy
    }
}

/// Reads a context key, falling back to its own child when nothing overrides it.
#[derive(Debug)]
pub struct ContextValueNode {
    id: NodeId,
    key: String,
    fallback: Box<dyn ShaderNode>,
}

impl ContextValueNode {
    pub fn new(key: impl Into<String>, fallback: Box<dyn ShaderNode>) -> Self {
        Self {
            id: NodeId::next(),
            key: key.into(),
            fallback,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl ShaderNode for ContextValueNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn label(&self) -> &'static str {
        "ContextValue"
    }

    fn result_type(&self) -> ValueType {
        self.fallback.result_type()
    }

    fn generate(&self, builder: &mut NodeBuilder, output: ValueType) -> Result<TypedExpr> {
        match builder.get_context_value(&self.key) {
            Some(value) => {
                log::trace!("context {} -> {value:?}", self.key);
                builder.generate_value(&value, output)
            }
            None => builder.generate(self.fallback.as_ref(), output),
        }
    }
}
