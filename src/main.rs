use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use color_eyre::Result;
use color_eyre::eyre::eyre;

use cpuscope::config::{Config, OutputMode, load_config, load_config_from_path};
use cpuscope::display::{DisplaySink, LineSink, TerminalSink};
use cpuscope::logging;
use cpuscope::scheduler::{Presentation, ReportLoop, ReportScheduler};
use cpuscope::system::counters::OsCounterSampler;
use cpuscope::system::dynamic::{DynamicMetricsFetcher, ProcessFilter};
use cpuscope::system::facts::StaticFactsCache;
use cpuscope::system::source::{OsSource, TelemetrySource};

#[derive(Parser)]
#[command(
    name = "cpuscope",
    about = "Periodic CPU utilization, topology and process report"
)]
struct Cli {
    /// Path to config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Report period in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Gap between the two counter reads in milliseconds
    #[arg(long)]
    sample_delay_ms: Option<u64>,

    /// Write one JSON snapshot per line instead of redrawing the screen
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Print a single report and exit
    #[arg(long, default_value_t = false)]
    once: bool,

    /// Log level or filter directive (logs go to stderr)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config_for_cli(&cli);
    logging::init(&config.logging)?;

    let source: Arc<dyn TelemetrySource> = Arc::new(OsSource);
    let facts = StaticFactsCache::new();
    let facts_ready = facts.initialize(source.clone());

    let filter = ProcessFilter::new(
        config.processes.deny_list.iter().cloned(),
        config.display.max_processes,
    );
    let fetcher = DynamicMetricsFetcher::new(source, filter);

    let presentation = match config.general.output {
        OutputMode::Json => Presentation::Json,
        OutputMode::Terminal => Presentation::Text(config.display.render_options()),
    };
    let sink: Box<dyn DisplaySink> = if config.general.output == OutputMode::Terminal && !cli.once
    {
        Box::new(TerminalSink::stdout())
    } else {
        Box::new(LineSink::stdout())
    };

    let mut scheduler = ReportScheduler::new(Box::new(OsCounterSampler), facts, fetcher, sink)
        .with_timing(config.general.timing())
        .with_presentation(presentation);

    if cli.once {
        if let Err(err) = facts_ready.await {
            tracing::warn!(error = %err, "static facts initialization did not finish");
        }
        scheduler
            .run_cycle()
            .await
            .map_err(|e| eyre!("could not sample cpu counters: {e}"))?;
        return Ok(());
    }

    let report_loop = ReportLoop::spawn(scheduler);
    tokio::signal::ctrl_c().await?;
    report_loop.stop().await;

    Ok(())
}

fn load_config_for_cli(cli: &Cli) -> Config {
    let mut config = match &cli.config {
        Some(path) => load_config_from_path(path),
        None => load_config(),
    };

    if let Some(interval) = cli.interval_ms {
        config.general.interval_ms = interval;
    }
    if let Some(delay) = cli.sample_delay_ms {
        config.general.sample_delay_ms = delay;
    }
    if cli.json {
        config.general.output = OutputMode::Json;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }

    config
}
