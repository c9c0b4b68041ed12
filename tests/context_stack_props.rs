use node_forge_shader_graph::compiler::context::same_resolution;
use node_forge_shader_graph::compiler::{
    ContextNode, ContextOverrideSet, ContextValueNode, ExpressionNode, NodeBuilder, ShaderNode,
    TypedExpr, ValueType,
};
use proptest::prelude::*;

const KEY: &str = "k";

/// Wrap a reader of `KEY` in one context node per layer, outermost first.
/// `Some(i)` overrides `KEY` with `k_i`; `None` installs an empty frame.
fn nested(layers: &[Option<u8>]) -> Box<dyn ShaderNode> {
    let mut node: Box<dyn ShaderNode> = Box::new(ContextValueNode::new(
        KEY,
        Box::new(ExpressionNode::new("k_fallback", ValueType::F32)),
    ));
    for layer in layers.iter().rev() {
        let overrides = match layer {
            Some(i) => ContextOverrideSet::new().with(KEY, TypedExpr::new(format!("k_{i}"), ValueType::F32)),
            None => ContextOverrideSet::new(),
        };
        node = Box::new(ContextNode::new(node, overrides));
    }
    node
}

fn expected(layers: &[Option<u8>], base: Option<&str>) -> String {
    layers
        .iter()
        .rev()
        .find_map(|layer| layer.map(|i| format!("k_{i}")))
        .or_else(|| base.map(str::to_string))
        .unwrap_or_else(|| "k_fallback".to_string())
}

proptest! {
    #[test]
    fn innermost_override_wins(layers in prop::collection::vec(prop::option::of(0u8..16), 0..10)) {
        let node = nested(&layers);
        let mut builder = NodeBuilder::default();
        let result = builder.generate(node.as_ref(), ValueType::F32).unwrap();
        prop_assert_eq!(result.expr, expected(&layers, None));
        prop_assert_eq!(builder.context_depth(), 0);
    }

    #[test]
    fn stack_is_restored_around_base_frame(
        layers in prop::collection::vec(prop::option::of(0u8..16), 0..10),
        seeded in any::<bool>(),
    ) {
        let mut builder = NodeBuilder::default();
        if seeded {
            builder.push_context(
                ContextOverrideSet::new()
                    .with(KEY, TypedExpr::new("k_base", ValueType::F32))
                    .with("other", TypedExpr::new("o_base", ValueType::Vec2)),
            );
        }
        let depth = builder.context_depth();
        let before = builder.context_stack().resolved();

        let node = nested(&layers);
        let result = builder.generate(node.as_ref(), ValueType::F32).unwrap();

        prop_assert_eq!(result.expr, expected(&layers, seeded.then_some("k_base")));
        prop_assert_eq!(builder.context_depth(), depth);
        prop_assert!(same_resolution(&before, &builder.context_stack().resolved()));
    }

    #[test]
    fn failure_at_any_depth_restores_stack(
        layers in prop::collection::vec(prop::option::of(0u8..16), 0..10),
    ) {
        let mut builder = NodeBuilder::default();
        builder.push_context(ContextOverrideSet::new().with(KEY, TypedExpr::new("k_base", ValueType::F32)));
        let before = builder.context_stack().resolved();

        // A mat4 value can never be produced as f32.
        let mut node: Box<dyn ShaderNode> = Box::new(ExpressionNode::new("view_matrix", ValueType::Mat4));
        for layer in layers.iter().rev() {
            let overrides = match layer {
                Some(i) => ContextOverrideSet::new().with(KEY, TypedExpr::new(format!("k_{i}"), ValueType::F32)),
                None => ContextOverrideSet::new(),
            };
            node = Box::new(ContextNode::new(node, overrides));
        }

        prop_assert!(builder.generate(node.as_ref(), ValueType::F32).is_err());
        prop_assert_eq!(builder.context_depth(), 1);
        prop_assert!(same_resolution(&before, &builder.context_stack().resolved()));
    }
}
