//! mailout - one email per event, over SMTP or sendmail.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use mailout::cli::{Cli, LogFormat};
use mailout::config::Config;
use mailout::{EmailOutput, MetricsServer, TransportSettings, run_pipeline};

/// Initialize the tracing subscriber with the specified log format.
fn init_logging(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    match format {
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .with_env_filter(filter)
                .init();
        }
        LogFormat::Json => {
            tracing_subscriber::fmt()
                .with_writer(std::io::stderr)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .flatten_event(true)
                .with_env_filter(filter)
                .init();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_format);

    info!(config_path = %cli.config.display(), "Loading configuration");

    let config = match Config::load(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, path = %cli.config.display(), "Failed to load configuration");
            std::process::exit(1);
        }
    };

    let metrics_config = config.metrics.clone();

    let output = match EmailOutput::configure(config.email) {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "Configuration validation failed");
            std::process::exit(1);
        }
    };

    if cli.validate {
        print_summary(&cli, &output, metrics_config.enabled, metrics_config.port);
        return Ok(());
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(run(cli, output, metrics_config))
}

fn print_summary(cli: &Cli, output: &EmailOutput, metrics_enabled: bool, metrics_port: u16) {
    let config = output.config();
    println!("Configuration is valid: {}", cli.config.display());
    println!("  To: {}", config.to.templates().join(", "));
    println!("  From: {}", config.from);
    match output.settings() {
        TransportSettings::Smtp(smtp) => println!(
            "  Via: smtp ({}:{}, auth: {})",
            smtp.address,
            smtp.port,
            smtp.authentication
                .map(|a| format!("{:?}", a).to_lowercase())
                .unwrap_or_else(|| "none".to_string())
        ),
        TransportSettings::Sendmail(sendmail) => println!(
            "  Via: sendmail ({} {})",
            sendmail.location.display(),
            sendmail.arguments.join(" ")
        ),
        TransportSettings::Named { name, .. } => println!("  Via: {}", name),
    }
    if let Some(path) = &config.template_file {
        println!("  Template: {}", path.display());
    }
    println!("  Attachments: {}", config.attachments.len());
    println!(
        "  Metrics: {} (port {})",
        if metrics_enabled { "enabled" } else { "disabled" },
        metrics_port
    );
}

async fn run(cli: Cli, output: EmailOutput, metrics: mailout::config::MetricsConfig) -> Result<()> {
    let cancel = CancellationToken::new();

    let metrics_handle = if metrics.enabled {
        let server = MetricsServer::new(metrics.port);
        let cancel_metrics = cancel.clone();
        info!(port = metrics.port, "Starting metrics server");
        Some(tokio::spawn(async move {
            if let Err(e) = server.run(cancel_metrics).await {
                error!(error = %e, "Metrics server error");
            }
        }))
    } else {
        None
    };

    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c signal");
            return;
        }
        info!("Received shutdown signal, stopping after the current event");
        cancel_clone.cancel();
    });

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &cli.input {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open input {}", path.display()))?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let source = cli
        .input
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "stdin".to_string());
    info!(input = %source, "mailout starting");

    let stats = run_pipeline(&output, reader, cancel.clone()).await?;

    info!(
        received = stats.received,
        delivered = stats.delivered,
        failed = stats.failed,
        skipped = stats.skipped,
        "mailout finished"
    );

    cancel.cancel();
    if let Some(handle) = metrics_handle {
        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
    }

    Ok(())
}
