//! GFS regional viewer
//!
//! Renders GFS 0.25° forecast maps for the Sumatra region from the NOMADS
//! OPeNDAP service.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use forecast_pipeline::{ForecastViewer, RenderRequest};
use gfs_common::{RunHour, RunId};
use opendap::ClientConfig;
use renderer::MapRenderer;
use tokio::io::BufReader;
use tracing::{error, info};

use gfs_viewer::commands::{describe_dataset, render_one, report_failure, write_parameters};
use gfs_viewer::logging::{init_tracing, LogFormat};
use gfs_viewer::session::run_session;
use gfs_viewer::{GfsOpener, ViewerConfig};

#[derive(Parser, Debug)]
#[command(name = "gfs-viewer")]
#[command(about = "Regional GFS forecast maps over Sumatra", version)]
struct Cli {
    /// YAML configuration file
    #[arg(long, global = true, env = "GFS_CONFIG")]
    config: Option<PathBuf>,

    /// Log level
    #[arg(long, global = true, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// DODS root of the GFS 0.25° hourly runs
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Directory for rendered PNGs
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,

    /// TrueType font used for map text
    #[arg(long, global = true)]
    font: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a single map
    Render(RenderArgs),
    /// Read requests from stdin, one per line: DATE HOUR LEAD PARAMETER
    Session,
    /// Open a run and list its variables
    Inspect(RunArgs),
    /// List the parameter kinds and accepted labels
    Parameters,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Run date, YYYY-MM-DD or YYYYMMDD (default: today, UTC)
    #[arg(long)]
    date: Option<String>,

    /// Run hour: 00, 06, 12 or 18
    #[arg(long, default_value = "00")]
    hour: RunHour,
}

impl RunArgs {
    fn run_id(&self) -> Result<RunId> {
        let date = match &self.date {
            Some(s) => RunId::parse_date(s).with_context(|| format!("Invalid run date: {}", s))?,
            None => today(),
        };
        Ok(RunId::new(date, self.hour))
    }
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Forecast lead in hours (0-240)
    #[arg(long, default_value_t = 0)]
    lead: usize,

    /// Parameter label or short id, e.g. "Suhu Permukaan (tmp2m)" or temp
    #[arg(long)]
    parameter: String,
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn main() {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    if let Err(e) = init_tracing(&cli.log_level, cli.log_format) {
        eprintln!("{:#}", e);
        std::process::exit(2);
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(error = %e, "Failed to create Tokio runtime");
            std::process::exit(2);
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            error!(error = %format!("{:#}", e), "Fatal error");
            eprintln!("{:#}", e);
            std::process::exit(2);
        }
    }
}

/// Returns `Ok(false)` when the command ran but its request failed.
async fn run(cli: Cli) -> Result<bool> {
    if matches!(cli.command, Command::Parameters) {
        write_parameters(&mut std::io::stdout().lock())?;
        return Ok(true);
    }

    let config = load_config(&cli)?;
    info!(
        base_url = %config.base_url,
        output_dir = %config.output_dir.display(),
        cache_capacity = config.pipeline.cache_capacity,
        "Starting GFS viewer"
    );

    let client_config = ClientConfig {
        request_timeout: config.request_timeout(),
        ..ClientConfig::default()
    };
    let opener = GfsOpener::new(config.base_url.clone(), client_config).context("Failed to create HTTP client")?;
    let viewer = ForecastViewer::new(opener, &config.pipeline);

    match cli.command {
        Command::Parameters => Ok(true),

        Command::Render(args) => {
            let renderer = MapRenderer::new(config.map_style()).context("Failed to set up the map renderer")?;
            let request = RenderRequest::new(args.run.run_id()?, args.lead, args.parameter);
            match render_one(&viewer, &renderer, &config.output_dir, &request).await {
                Ok(rendered) => {
                    println!("{}", rendered.output.display());
                    Ok(true)
                }
                Err(e) => {
                    report_failure(&mut std::io::stderr().lock(), &e)?;
                    Ok(false)
                }
            }
        }

        Command::Session => {
            let renderer = MapRenderer::new(config.map_style()).context("Failed to set up the map renderer")?;
            let input = BufReader::new(tokio::io::stdin());
            let summary = run_session(&viewer, &renderer, &config.output_dir, input, &mut std::io::stdout())
                .await
                .context("Session I/O failed")?;
            Ok(summary.failed == 0 && summary.rejected == 0)
        }

        Command::Inspect(args) => {
            let run = args.run_id()?;
            match viewer.loader().load(run).await {
                Ok(dataset) => {
                    let mut out = std::io::stdout().lock();
                    describe_dataset(&mut out, dataset.as_ref())?;
                    out.flush()?;
                    Ok(true)
                }
                Err(e) => {
                    report_failure(&mut std::io::stderr().lock(), &e)?;
                    Ok(false)
                }
            }
        }
    }
}

/// Defaults, YAML, environment, then command-line flags.
fn load_config(cli: &Cli) -> Result<ViewerConfig> {
    let mut config = ViewerConfig::resolve(cli.config.as_deref())?;

    if let Some(url) = &cli.base_url {
        config.base_url = url.clone();
    }
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(font) = &cli.font {
        config.font_path = Some(font.clone());
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}
