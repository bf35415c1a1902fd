//! Stderr logging for the CLI and tests.
//!
//! Lines look like `[  0.412s  WARN chart_calib_lines::hough] message`, the
//! time being measured from installation. `init_tracing` replaces this with a
//! `tracing` subscriber when the `tracing` feature is on.

use std::io::Write;
use std::sync::OnceLock;
use std::time::Instant;

use log::{LevelFilter, Log, Metadata, Record};

struct StderrLogger {
    started: Instant,
}

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = format!(
            "[{:7.3}s {:>5} {}] {}",
            self.started.elapsed().as_secs_f64(),
            record.level(),
            record.target(),
            record.args()
        );
        let _ = writeln!(std::io::stderr().lock(), "{line}");
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

static LOGGER: OnceLock<StderrLogger> = OnceLock::new();

/// Install the stderr logger once; later calls only change the level.
pub fn init_with_level(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    let mut first = false;
    let logger = LOGGER.get_or_init(|| {
        first = true;
        StderrLogger {
            started: Instant::now(),
        }
    });
    if first {
        log::set_logger(logger)?;
    }
    log::set_max_level(level);
    Ok(())
}

/// Install a plain-text `tracing` subscriber on stderr, filtered by
/// `RUST_LOG` (default `info`). Span closings are reported with their
/// timings. Does nothing when a global subscriber already exists.
#[cfg(feature = "tracing")]
pub fn init_tracing() {
    use tracing_subscriber::fmt::format::FmtSpan;
    use tracing_subscriber::util::SubscriberInitExt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_timer(tracing_subscriber::fmt::time::Uptime::default())
        .with_writer(std::io::stderr)
        .finish()
        .try_init();
    if installed.is_err() {
        log::debug!("tracing subscriber already installed");
    }
}
