//! costplug Conformance Example
//!
//! Certifies the bundled mock plugin and prints the report.
//!
//! # Usage
//!
//! ```bash
//! # Certify at the standard tier
//! cargo run --example conformance
//!
//! # Pick a tier, load settings, or slow a method down to watch it fail
//! cargo run --example conformance -- --tier advanced
//! cargo run --example conformance -- --config conformance.toml
//! cargo run --example conformance -- --slow GetProjectedCost=300ms
//!
//! # Emit the report as JSON
//! cargo run --example conformance -- --json
//! ```

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, bail};
use costplug::prelude::*;

struct Args {
    tier: Option<CertificationTier>,
    config: Option<String>,
    slow: Vec<(Method, Duration)>,
    json: bool,
}

fn print_help() {
    println!("costplug Conformance Example");
    println!();
    println!("Usage: conformance [OPTIONS]");
    println!();
    println!("Options:");
    println!("  --tier <basic|standard|advanced>  Tier to certify against");
    println!("  --config <PATH>                   Load settings from a TOML file");
    println!("  --slow <METHOD=DURATION>          Inject a delay into a mock method");
    println!("  --json                            Print the report as JSON");
    println!("  -h, --help                        Show this help");
}

fn parse_slow(spec: &str) -> anyhow::Result<(Method, Duration)> {
    let (method, delay) = spec
        .split_once('=')
        .with_context(|| format!("expected METHOD=DURATION, got '{spec}'"))?;
    let delay = humantime::parse_duration(delay)
        .with_context(|| format!("invalid duration '{delay}'"))?;
    Ok((method.parse()?, delay))
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut args = Args {
        tier: None,
        config: None,
        slow: Vec::new(),
        json: false,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(None),
            "--json" => args.json = true,
            "--tier" => {
                let value = iter.next().context("--tier needs a value")?;
                args.tier = Some(value.parse()?);
            }
            "--config" => args.config = Some(iter.next().context("--config needs a path")?),
            "--slow" => {
                let value = iter.next().context("--slow needs METHOD=DURATION")?;
                args.slow.push(parse_slow(&value)?);
            }
            other => bail!("unknown argument '{other}'"),
        }
    }
    Ok(Some(args))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let Some(args) = parse_args()? else {
        print_help();
        return Ok(ExitCode::SUCCESS);
    };

    let mut config = match &args.config {
        Some(path) => ConformanceConfig::load(path)
            .with_context(|| format!("loading config from {path}"))?,
        None => ConformanceConfig::default(),
    };
    if let Some(tier) = args.tier {
        config.tier = tier;
    }

    let mock = MockCostSource::default();
    for (method, delay) in &args.slow {
        mock.set_delay(*method, *delay);
    }

    let mut harness = Harness::mocked(mock).with_buffer(config.transport_buffer);
    let runner = ConformanceRunner::with_config(Registry::global(), config)?;
    let report = runner.run_configured(&mut harness).await;

    if args.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{report}");
    }

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
