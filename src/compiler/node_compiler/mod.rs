//! Node compiler infrastructure and trait definition.

pub mod attribute;
pub mod context_nodes;
pub mod input_nodes;
pub mod math_nodes;
pub mod texture_nodes;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;

use super::builder::NodeBuilder;
use super::types::{TypedExpr, ValueType};

/// Identity of a constructed node. Two nodes built from equal parameters still differ.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Allocate a fresh identity.
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// A unit of shader computation.
///
/// Nodes are immutable once built; everything that changes during a compile lives in
/// the [`NodeBuilder`]. Composite nodes call back into [`NodeBuilder::generate`] for
/// their children so coercion stays in one place.
pub trait ShaderNode: Send + Sync {
    fn id(&self) -> NodeId;

    /// Short type name used in logs and error messages.
    fn label(&self) -> &'static str;

    /// Declared result type, fixed at construction.
    fn result_type(&self) -> ValueType;

    /// Emit code for this node. `output` is the type the caller wants; returning a
    /// different type is fine, the builder coerces.
    fn generate(&self, builder: &mut NodeBuilder, output: ValueType) -> Result<TypedExpr>;
}

impl fmt::Debug for dyn ShaderNode + '_ {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.label(), self.id().get())
    }
}
