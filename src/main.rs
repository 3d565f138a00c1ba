use clap::Parser;
use cpu_probe::core::config::ProbeConfig;
use cpu_probe::core::hardware::{self, detect_with};
use cpu_probe::core::signals::HostSignals;
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Report the CPU capabilities of this machine", long_about = None)]
struct Args {
    /// Print the record as JSON
    #[arg(long)]
    json: bool,

    /// Log every probed signal to stderr
    #[arg(short, long)]
    verbose: bool,

    /// JSON file with probe settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Huge-page control file to test instead of the kernel default
    #[arg(long)]
    hugepage_control: Option<PathBuf>,

    /// Report this brand instead of the detected one
    #[arg(long)]
    brand: Option<String>,
}

#[derive(Serialize)]
struct RecordExport {
    strategy: &'static str,
    brand: String,
    flags: Vec<&'static str>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => ProbeConfig::from_json_file(path)?,
        None => ProbeConfig::default(),
    };
    if let Some(path) = args.hugepage_control {
        config.hugepage_control = path;
    }
    if let Some(brand) = args.brand {
        config.brand_override = Some(brand);
    }

    let record = detect_with(&HostSignals, &config);
    let export = RecordExport {
        strategy: hardware::select().name(),
        brand: record.brand().to_string(),
        flags: record.flags().iter_names().map(|(name, _)| name).collect(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&export)?);
        return Ok(());
    }

    println!("Strategy: {}", export.strategy);
    if export.brand.is_empty() {
        println!("Brand:    (unknown)");
    } else {
        println!("Brand:    {}", export.brand);
    }
    if export.flags.is_empty() {
        println!("Flags:    (none)");
    } else {
        println!("Flags:    {}", export.flags.join(" "));
    }
    Ok(())
}
