//! Debounce stdin lines

use anyhow::{Context, Result};
use cli_lib::runner::{self, LineSink};
use cli_lib::system_config;
use debounce::{delay_from_millis, Debounced};
use tokio::io::BufReader;
use tracing::info;

/// Conventional exit status for termination by SIGINT
const INTERRUPTED_EXIT_CODE: i32 = 130;

pub async fn run(
    delay_ms: Option<i64>,
    label: Option<String>,
    timestamps: bool,
    command: Vec<String>,
) -> Result<()> {
    let config = system_config::load()?;

    let delay = match delay_ms {
        Some(ms) => delay_from_millis(ms).context("Invalid --delay-ms")?,
        None => config.debounce.delay(),
    };
    let label = label
        .or(config.debounce.label)
        .unwrap_or_else(|| "stdin".to_string());
    let sink = LineSink::from_command(&command, timestamps || config.output.timestamps);

    let debounced = Debounced::builder(move |line: String| {
        sink.deliver(&line).map_err(|e| format!("{:#}", e))
    })
    .delay(delay)
    .label(label)
    .build()
    .context("Failed to create debouncer")?;

    info!(delay = ?delay, label = %debounced.label(), "Reading from stdin");

    let input = BufReader::new(tokio::io::stdin());
    tokio::select! {
        lines = runner::drain(input, &debounced) => {
            let lines = lines?;
            info!(lines, "Input closed and all output delivered");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, dropping pending output");
            // The blocking stdin read cannot be cancelled and would keep the
            // runtime from shutting down, so leave without unwinding it.
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    }

    let stats = debounced.stats();
    tracing::debug!(
        calls = stats.calls,
        fires = stats.fires,
        superseded = stats.superseded,
        failures = stats.failures,
        "Debounce summary"
    );

    Ok(())
}
