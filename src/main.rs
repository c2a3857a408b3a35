//! canada-immigration - report, chart export and dashboard over the
//! Canada by Citizenship immigration table.

use anyhow::{anyhow, Context, Result};
use canada_immigration::charts::{HtmlExporter, StaticChartRenderer};
use canada_immigration::config::AppConfig;
use canada_immigration::{gui, pipeline, report};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Immigration to Canada by citizenship, 1980-2013.")]
struct Cli {
    /// JSON configuration file; every field is optional.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source workbook or CSV, overriding the configuration.
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    /// Workbook sheet, overriding the configuration.
    #[arg(long, global = true)]
    sheet: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the total and the top source countries.
    Report {
        /// Number of countries in the table.
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
    /// Write one HTML page per chart plus an index and summary.json.
    Export {
        /// Output directory.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Also write PNG copies of every chart.
        #[arg(long)]
        png: bool,

        /// Open the index page when done.
        #[arg(long)]
        open: bool,
    },
    /// Open the interactive dashboard.
    Dashboard,
}

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(source) = cli.source {
        config.source.path = source;
    }
    if let Some(sheet) = cli.sheet {
        config.source.sheet = Some(sheet);
    }

    match cli.command {
        Command::Report { top } => {
            config.analysis.top_countries = config.analysis.top_countries.max(top);
            let analysis = pipeline::run(&config).context("Failed to analyze source")?;
            print!("{}", report::render_report(&analysis.summary, top));
        }
        Command::Export { out, png, open } => {
            if let Some(out) = out {
                config.export.out_dir = out;
            }
            config.export.png |= png;

            let analysis = pipeline::run(&config).context("Failed to analyze source")?;
            let renderer =
                StaticChartRenderer::new(&analysis.summary, &config.analysis, &config.theme)
                    .with_width(config.export.width);
            let exported = HtmlExporter::new(renderer, &analysis.summary, &config.export.out_dir)
                .with_png(config.export.png)
                .export_all()
                .context("Failed to export charts")?;

            println!(
                "Wrote {} files to {}",
                exported.file_count(),
                config.export.out_dir.display()
            );
            if open {
                info!(index = %exported.index.display(), "opening index page");
                open::that(&exported.index)
                    .with_context(|| format!("Failed to open {}", exported.index.display()))?;
            }
        }
        Command::Dashboard => {
            gui::run_dashboard(config).map_err(|e| anyhow!("Dashboard failed: {e}"))?;
        }
    }
    Ok(())
}
