//! WGSL validation using the naga library.

use anyhow::{Context, Result, anyhow};

/// Validate WGSL source code using naga's parser.
///
/// # Example
/// ```ignore
/// let fragment = builder.build(&node, ValueType::Vec3)?;
/// validate_wgsl(&fragment.module)?;
/// ```
pub fn validate_wgsl(source: &str) -> Result<naga::Module> {
    naga::front::wgsl::parse_str(source)
        .map_err(|e| anyhow!("WGSL validation failed:\n{}", format_naga_error(source, &e)))
}

/// Validate WGSL and name what generated it (e.g. "graph irradiance-probe").
pub fn validate_wgsl_with_context(source: &str, context: &str) -> Result<naga::Module> {
    validate_wgsl(source).with_context(|| format!("{} generated invalid WGSL", context))
}

/// Format a naga parse error followed by the numbered source.
fn format_naga_error(source: &str, error: &naga::front::wgsl::ParseError) -> String {
    let mut output = String::new();

    output.push_str(&format!("  {}\n", error));

    output.push_str("\nGenerated WGSL:\n");
    output.push_str("---\n");
    for (line_num, line) in source.lines().enumerate() {
        output.push_str(&format!("{:4} | {}\n", line_num + 1, line));
    }
    output.push_str("---\n");

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::builder::NodeBuilder;
    use crate::compiler::node_compiler::context_nodes::{PhysicalContextNode, PhysicalScope};
    use crate::compiler::node_compiler::texture_nodes::EnvironmentSampleNode;
    use crate::compiler::types::ValueType;

    #[test]
    fn test_generated_module_parses() {
        let mut builder = NodeBuilder::default();
        for scope in [PhysicalScope::Radiance, PhysicalScope::Irradiance] {
            let node = PhysicalContextNode::for_scope(scope, Box::new(EnvironmentSampleNode::new("env")));
            let fragment = builder.build(&node, ValueType::Vec3).unwrap();
            if let Err(e) = validate_wgsl(&fragment.module) {
                panic!("{scope} module failed to parse: {e:#}");
            }
        }
    }

    #[test]
    fn test_invalid_wgsl_type_error() {
        let source = r#"
fn node_main() -> vec3f {
    let x: vec3f = 1.0;
    return x;
}
"#;
        assert!(validate_wgsl(source).is_err());
    }

    #[test]
    fn test_validate_with_context() {
        let result = validate_wgsl_with_context("invalid wgsl", "graph probe");
        let err_msg = format!("{:#}", result.unwrap_err());
        assert!(err_msg.contains("graph probe"));
        assert!(err_msg.contains("   1 | invalid wgsl"));
    }
}
