use anyhow::Result;
use clap::Parser;
use covidscope::{config::StudyConfig, pipeline, report::summary};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Clean, join and summarise per-country case counts against country metadata.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// YAML config; any key it leaves out keeps its default
    #[arg(long)]
    config: Option<PathBuf>,

    /// Daily per-country cases CSV
    #[arg(long)]
    cases: Option<PathBuf>,

    /// Country metadata (CSV, or JSON when the extension is .json)
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Geographic reference names CSV (`name` column)
    #[arg(long)]
    reference: Option<PathBuf>,

    /// Directory for the exported Parquet datasets
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) resolve config ───────────────────────────────────────────
    let args = Args::parse();
    let mut cfg = match &args.config {
        Some(path) => StudyConfig::load(path)?,
        None => StudyConfig::default(),
    };
    if let Some(p) = args.cases {
        cfg.cases_path = p;
    }
    if let Some(p) = args.metadata {
        cfg.metadata_path = p;
    }
    if let Some(p) = args.reference {
        cfg.reference_path = Some(p);
    }
    if let Some(p) = args.out {
        cfg.output_dir = p;
    }
    info!(
        cases = %cfg.cases_path.display(),
        metadata = %cfg.metadata_path.display(),
        out = %cfg.output_dir.display(),
        "configured"
    );

    // ─── 3) run + print summary ──────────────────────────────────────
    let report = pipeline::run(&cfg)?;
    print!("{}", summary::render(&report));

    info!("all done");
    Ok(())
}
