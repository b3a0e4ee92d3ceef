//! duolog demo - initializes the logger the way a host application would

use anyhow::Result;
use clap::Parser;
use duolog::{field, LoggerConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "duolog-demo", version, about = "Emit sample records through duolog")]
struct Cli {
    /// Logger config file (.toml, .yaml, .yml or .json)
    #[arg(short, long, env = "DUOLOG_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured level
    #[arg(short, long)]
    level: Option<String>,

    /// Number of sample records per level
    #[arg(short = 'n', long, default_value_t = 3)]
    count: usize,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => LoggerConfig::load(path)?,
        None => LoggerConfig::default(),
    };
    if let Some(level) = cli.level {
        config.level = level;
    }

    let log = duolog::init_logger(&config);
    let sugar = log.sugar();

    for i in 0..cli.count {
        log.debug("debug sample", &[field("i", i)]);
        log.info("info sample", &[field("i", i), field("dev", config.dev)]);
        sugar.warnf(format_args!("warn sample {} of {}", i + 1, cli.count));
        tracing::error!(i, "error sample via tracing");
    }

    log.named("demo").with([field("done", true)]).info("finished", &[]);
    log.flush()?;
    Ok(())
}
