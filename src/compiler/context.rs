//! Generation-time context: keyed override frames and the stack that shadows them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::node_compiler::ShaderNode;
use super::types::{TypedExpr, ValueType};

/// Context key read by nodes that need the surface roughness.
pub const ROUGHNESS_KEY: &str = "roughness";
/// Context key read by nodes that sample a texture by coordinate.
pub const UV_KEY: &str = "uv";

/// Shared handle to a node stored in a context frame.
pub type NodeRef = Arc<dyn ShaderNode>;

/// A value installed under a context key: either a node to generate or a ready expression.
#[derive(Clone)]
pub enum ContextValue {
    Node(NodeRef),
    Literal(TypedExpr),
}

impl ContextValue {
    pub fn node(node: impl ShaderNode + 'static) -> Self {
        ContextValue::Node(Arc::new(node))
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            ContextValue::Node(node) => node.result_type(),
            ContextValue::Literal(expr) => expr.ty,
        }
    }

    pub fn as_node(&self) -> Option<&NodeRef> {
        match self {
            ContextValue::Node(node) => Some(node),
            ContextValue::Literal(_) => None,
        }
    }

    /// Identity comparison: nodes compare by reference, literals by value.
    pub fn same_as(&self, other: &ContextValue) -> bool {
        match (self, other) {
            (ContextValue::Node(a), ContextValue::Node(b)) => a.id() == b.id(),
            (ContextValue::Literal(a), ContextValue::Literal(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for ContextValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContextValue::Node(node) => write!(f, "Node({:?})", node.as_ref()),
            ContextValue::Literal(expr) => write!(f, "Literal({}: {})", expr.expr, expr.ty),
        }
    }
}

impl From<TypedExpr> for ContextValue {
    fn from(expr: TypedExpr) -> Self {
        ContextValue::Literal(expr)
    }
}

impl From<NodeRef> for ContextValue {
    fn from(node: NodeRef) -> Self {
        ContextValue::Node(node)
    }
}

/// One frame of overrides. Keys are unique; iteration order carries no meaning.
#[derive(Clone, Debug, Default)]
pub struct ContextOverrideSet {
    values: HashMap<String, ContextValue>,
}

impl ContextOverrideSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert or replace the value for `key`, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Option<ContextValue> {
        self.values.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Ordered override frames. Lookups walk from the top frame down and return the first match.
#[derive(Debug, Default)]
pub struct ContextStack {
    frames: Vec<ContextOverrideSet>,
}

impl ContextStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: ContextOverrideSet) {
        self.frames.push(frame);
    }

    pub fn pop(&mut self) -> Option<ContextOverrideSet> {
        self.frames.pop()
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn get(&self, key: &str) -> Option<&ContextValue> {
        self.frames.iter().rev().find_map(|frame| frame.get(key))
    }

    /// Drop every frame above `depth`.
    pub(crate) fn truncate(&mut self, depth: usize) {
        self.frames.truncate(depth);
    }

    /// Snapshot of what every key currently resolves to, for restoration checks.
    pub fn resolved(&self) -> HashMap<String, ContextValue> {
        let mut out = HashMap::new();
        for frame in &self.frames {
            for key in frame.keys() {
                if let Some(value) = frame.get(key) {
                    out.insert(key.to_string(), value.clone());
                }
            }
        }
        out
    }
}

/// Compare two [`ContextStack::resolved`] snapshots by identity.
pub fn same_resolution(
    a: &HashMap<String, ContextValue>,
    b: &HashMap<String, ContextValue>,
) -> bool {
    a.len() == b.len()
        && a.iter()
            .all(|(key, value)| b.get(key).is_some_and(|other| value.same_as(other)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(expr: &str) -> TypedExpr {
        TypedExpr::new(expr, ValueType::F32)
    }

    #[test]
    fn test_lookup_shadows_lower_frames() {
        let mut stack = ContextStack::new();
        stack.push(ContextOverrideSet::new().with("k", lit("outer")).with("other", lit("kept")));
        stack.push(ContextOverrideSet::new().with("k", lit("inner")));

        assert!(matches!(stack.get("k"), Some(ContextValue::Literal(e)) if e.expr == "inner"));
        // Keys absent from the top frame stay visible from below.
        assert!(matches!(stack.get("other"), Some(ContextValue::Literal(e)) if e.expr == "kept"));
        assert!(stack.get("missing").is_none());

        stack.pop();
        assert!(matches!(stack.get("k"), Some(ContextValue::Literal(e)) if e.expr == "outer"));
    }

    #[test]
    fn test_empty_stack_has_no_values() {
        let mut stack = ContextStack::new();
        assert_eq!(stack.depth(), 0);
        assert!(stack.get("roughness").is_none());
        assert!(stack.pop().is_none());
    }

    #[test]
    fn test_insert_replaces_existing_key() {
        let mut set = ContextOverrideSet::new();
        assert!(set.insert("k", lit("a")).is_none());
        assert!(set.insert("k", lit("b")).is_some());
        assert_eq!(set.len(), 1);
        assert!(set.contains_key("k"));
    }

    #[test]
    fn test_resolved_snapshot_matches_lookup() {
        let mut stack = ContextStack::new();
        stack.push(ContextOverrideSet::new().with("k", lit("outer")));
        stack.push(ContextOverrideSet::new().with("k", lit("inner")).with("j", lit("j0")));
        let snapshot = stack.resolved();
        assert_eq!(snapshot.len(), 2);
        assert!(matches!(snapshot.get("k"), Some(ContextValue::Literal(e)) if e.expr == "inner"));

        let before = stack.resolved();
        stack.pop();
        assert!(!same_resolution(&before, &stack.resolved()));
        assert!(same_resolution(&stack.resolved(), &stack.resolved()));
    }
}
