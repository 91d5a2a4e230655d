//! Line stream debouncing
//!
//! Each input line triggers the debounced wrapper; only the last line of a
//! burst reaches the sink once input has been quiet for the delay.

use anyhow::{Context, Result};
use debounce::Debounced;
use std::io::Write;
use std::process::Command;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::runtime::{Handle, RuntimeFlavor};

/// Where settled lines go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineSink {
    /// Write the line to stdout
    Print { timestamps: bool },
    /// Run a program with the line appended as its last argument
    Exec { program: String, args: Vec<String> },
}

impl LineSink {
    /// Build a sink from a command line; an empty command means print
    pub fn from_command(command: &[String], timestamps: bool) -> Self {
        match command.split_first() {
            Some((program, args)) => LineSink::Exec {
                program: program.clone(),
                args: args.to_vec(),
            },
            None => LineSink::Print { timestamps },
        }
    }

    /// Deliver one settled line
    pub fn deliver(&self, line: &str) -> Result<()> {
        match self {
            LineSink::Print { timestamps } => {
                let mut out = std::io::stdout().lock();
                if *timestamps {
                    let now = chrono::Local::now().format("%H:%M:%S%.3f");
                    writeln!(out, "[{}] {}", now, line)?;
                } else {
                    writeln!(out, "{}", line)?;
                }
                out.flush()?;
                Ok(())
            }
            LineSink::Exec { program, args } => {
                let status = run_blocking(|| Command::new(program).args(args).arg(line).status())
                    .with_context(|| format!("Failed to run '{}'", program))?;

                if !status.success() {
                    anyhow::bail!("'{}' exited with {}", program, status);
                }
                tracing::debug!(program = %program, "Command completed");
                Ok(())
            }
        }
    }
}

/// Run blocking work without starving the runtime's other tasks
///
/// On a multi-threaded runtime the current worker hands its queue to another
/// thread first; elsewhere the work simply runs inline.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(work)
        }
        _ => work(),
    }
}

/// Decode one raw line, dropping its terminator
///
/// Invalid UTF-8 is replaced rather than rejected.
fn decode_line(raw: &[u8]) -> String {
    let raw = raw.strip_suffix(b"\n").unwrap_or(raw);
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    String::from_utf8_lossy(raw).into_owned()
}

/// Feed every line of `reader` into `debounced`
///
/// Returns the number of lines read once the input is exhausted.
pub async fn feed_lines<R>(mut reader: R, debounced: &Debounced<String>) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let mut count = 0u64;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .await
            .context("Failed to read input")?;
        if read == 0 {
            break;
        }
        debounced.call(decode_line(&buf));
        count += 1;
    }

    Ok(count)
}

/// Feed `reader` to completion, then wait for the last line to be delivered
///
/// A read error still lets the already recorded line fire before the error
/// is returned.
pub async fn drain<R>(reader: R, debounced: &Debounced<String>) -> Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let fed = feed_lines(reader, debounced).await;
    debounced.settled().await;
    fed
}
