use std::path::PathBuf;

use anyhow::{Result, anyhow};
use node_forge_shader_graph::{
    compiler::{BuilderConfig, NodeBuilder, ValueType, validate_wgsl_with_context},
    dsl,
};

#[derive(Debug, Default, Clone)]
struct Cli {
    graph_json: Option<PathBuf>,
    config_json: Option<PathBuf>,
    output: Option<ValueType>,
    validate: bool,
}

fn parse_cli(args: &[String]) -> Result<Cli> {
    let mut cli = Cli::default();
    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--graph-json" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --graph-json"));
                };
                cli.graph_json = Some(PathBuf::from(v));
                i += 2;
            }
            "--config" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --config"));
                };
                cli.config_json = Some(PathBuf::from(v));
                i += 2;
            }
            "--output" => {
                let Some(v) = args.get(i + 1) else {
                    return Err(anyhow!("missing value for --output"));
                };
                cli.output = Some(v.parse()?);
                i += 2;
            }
            "--validate" => {
                cli.validate = true;
                i += 1;
            }
            other => {
                return Err(anyhow!(
                    "unknown argument: {other} (supported: --graph-json <graph.json>, --config <config.json>, --output <type>, --validate)"
                ));
            }
        }
    }
    Ok(cli)
}

fn main() -> Result<()> {
    env_logger::init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = parse_cli(&argv)?;

    let graph_path = cli
        .graph_json
        .ok_or_else(|| anyhow!("--graph-json <graph.json> is required"))?;
    let graph = dsl::load_graph_from_path(&graph_path)?;
    let config = match cli.config_json.as_deref() {
        Some(path) => BuilderConfig::from_json_path(path)?,
        None => BuilderConfig::default(),
    };

    let root = dsl::build_root(&graph)?;
    let output = cli.output.unwrap_or(graph.output);
    let mut builder = NodeBuilder::new(config)?;
    let fragment = builder.build(root.as_ref(), output)?;

    if cli.validate {
        validate_wgsl_with_context(&fragment.module, &format!("graph {}", graph.metadata.name))?;
        eprintln!("[validate] {}: ok", graph.metadata.name);
    }

    print!("{}", fragment.module);
    Ok(())
}
