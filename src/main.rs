// Example runner for the `sky_vision` library.
//
// Usage:
//     sky_vision [--config analysis.json] north=n.jpg east=e.jpg south=s.jpg west=w.jpg
//
// Any subset of the four directions may be given. The fused report is printed
// to stdout as JSON; logs go to stderr (set RUST_LOG to change the level).

use anyhow::{Context, bail};
use flexi_logger::Logger;
use log::info;
use sky_vision::{AnalysisConfig, Direction, ParallelSkyPipeline};
use std::path::PathBuf;

const USAGE: &str =
    "sky_vision [--config analysis.json] north=<img> [east=<img> south=<img> west=<img>]";

struct Args {
    config: Option<PathBuf>,
    captures: Vec<(Direction, PathBuf)>,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Args> {
    let mut config = None;
    let mut captures = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--config" {
            let path = args.next().context("--config needs a file path")?;
            config = Some(PathBuf::from(path));
            continue;
        }
        let Some((direction, path)) = arg.split_once('=') else {
            bail!("expected <direction>=<image path>, got `{arg}`");
        };
        let direction: Direction = direction.parse().map_err(anyhow::Error::msg)?;
        captures.push((direction, PathBuf::from(path)));
    }

    if captures.is_empty() {
        bail!("usage: {USAGE}");
    }
    Ok(Args { config, captures })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _logger = Logger::try_with_env_or_str("info")?.log_to_stderr().start()?;

    let args = parse_args(std::env::args().skip(1))?;
    let config = match &args.config {
        Some(path) => AnalysisConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    let mut payloads = Vec::with_capacity(args.captures.len());
    for (direction, path) in &args.captures {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {direction} photo {}", path.display()))?;
        payloads.push((*direction, bytes));
    }

    info!("analysing {} directional photo(s)", payloads.len());
    let pipeline = ParallelSkyPipeline::new(config)?;
    let report = pipeline.analyze_payloads(payloads).await;
    pipeline.shutdown().await;

    let report = report?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
