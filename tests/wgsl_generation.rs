use std::path::PathBuf;

use node_forge_shader_graph::{compiler::NodeBuilder, dsl};

fn case_dir(case_name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("cases")
        .join(case_name)
}

fn list_json_cases(dir: &std::path::Path) -> Vec<PathBuf> {
    let mut cases = Vec::new();
    let Ok(rd) = std::fs::read_dir(dir) else {
        return cases;
    };
    for entry in rd.flatten() {
        let path = entry.path();
        if path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
            && std::fs::metadata(&path).is_ok_and(|m| m.is_file())
        {
            cases.push(path);
        }
    }
    cases.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    cases
}

fn case_stem(path: &std::path::Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("case")
        .to_string()
}

#[test]
fn graph_json_compiles_to_valid_wgsl_modules() {
    let dir = case_dir("wgsl_generation");
    let update_goldens = std::env::var("UPDATE_GOLDENS").is_ok_and(|v| v != "0");

    let json_cases = list_json_cases(&dir);
    assert!(
        json_cases.len() >= 4,
        "expected the bundled *.json cases in {}",
        dir.display()
    );

    for input_path in json_cases {
        let case_name = case_stem(&input_path);
        let graph = dsl::load_graph_from_path(&input_path)
            .unwrap_or_else(|e| panic!("case {case_name}: load graph json failed: {e:#}"));
        let root = dsl::build_root(&graph)
            .unwrap_or_else(|e| panic!("case {case_name}: build nodes failed: {e:#}"));

        let mut builder = NodeBuilder::default();
        let fragment = builder
            .build(root.as_ref(), graph.output)
            .unwrap_or_else(|e| panic!("case {case_name}: compile failed: {e:#}"));
        assert_eq!(
            builder.context_depth(),
            0,
            "case {case_name}: context frames left on the builder"
        );
        assert_eq!(fragment.expr.ty, graph.output, "case {case_name}: output type");

        // Same graph, same builder state: same module.
        let again = builder.build(root.as_ref(), graph.output).unwrap();
        assert_eq!(fragment.module, again.module, "case {case_name}: compile is not deterministic");

        let expected_module_path = dir.join(format!("{case_name}.module.wgsl"));
        if update_goldens {
            std::fs::write(&expected_module_path, &fragment.module)
                .unwrap_or_else(|e| panic!("write {:?}: {e}", expected_module_path));
        } else {
            assert!(
                expected_module_path.is_file(),
                "case {case_name}: missing golden {} (run with UPDATE_GOLDENS=1)",
                expected_module_path.display()
            );
            let expected_module = std::fs::read_to_string(&expected_module_path)
                .unwrap_or_else(|e| panic!("read {:?}: {e}", expected_module_path));
            assert_eq!(
                fragment.module, expected_module,
                "case {case_name}: module golden mismatch"
            );
        }

        // Validate WGSL syntax without requiring a GPU.
        naga::front::wgsl::parse_str(&fragment.module).unwrap_or_else(|e| {
            panic!(
                "case {case_name}: WGSL parse failed: {e:?}\nWGSL:\n{}",
                fragment.module
            )
        });
    }
}

#[test]
fn ambient_plus_specular_binds_both_textures() {
    let graph = dsl::load_graph_from_path(case_dir("wgsl_generation").join("ambient-plus-specular.json"))
        .expect("load ambient-plus-specular.json");
    let root = dsl::build_root(&graph).expect("build nodes");
    let fragment = NodeBuilder::default()
        .build(root.as_ref(), graph.output)
        .expect("compile");

    assert!(fragment.module.contains("@group(0) @binding(0) var env_tex_specular: texture_2d<f32>;"));
    assert!(fragment.module.contains("@group(0) @binding(2) var env_tex_diffuse: texture_cube<f32>;"));
    assert!(fragment.module.contains("    var nf_float_0: f32 = 0.5;"));
    assert!(fragment.expr.expr.contains("(roughnessFactor * 8.0)"));
    assert!(fragment.expr.expr.contains("(1.0 * 8.0)"));
    assert!(fragment.expr.expr.starts_with("vec4f(("), "{}", fragment.expr.expr);
}

#[test]
fn nested_roughness_shadows_outer_frame() {
    let graph = dsl::load_graph_from_path(case_dir("wgsl_generation").join("nested-roughness.json"))
        .expect("load nested-roughness.json");
    let root = dsl::build_root(&graph).expect("build nodes");
    let fragment = NodeBuilder::default()
        .build(root.as_ref(), graph.output)
        .expect("compile");

    // The irradiance branch sees its own constant; the sibling sees the outer 0.25.
    assert!(
        fragment.expr.expr.starts_with("(mix(vec3f(1.0), vec3f(0.25), "),
        "{}",
        fragment.expr.expr
    );
    assert!(!fragment.expr.is_const);
}
