//! Tracing setup driven by [`LoggingParams`]: a stdout layer always, plus an
//! optional daily-rolling file layer. The returned guard keeps the file
//! writer's background thread alive; hold it for the process lifetime.

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingParams;

pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

pub fn init(params: &LoggingParams) -> LogGuard {
    let env_filter =
        EnvFilter::try_new(&params.level).unwrap_or_else(|_| EnvFilter::new("info"));

    let (file_layer, guard) = if params.file_output {
        match file_writer(&params.log_dir) {
            Ok((writer, guard)) => {
                let layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(err) => {
                eprintln!("file logging disabled ({}): {err}", params.log_dir);
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .with(file_layer)
        .init();

    LogGuard { _file: guard }
}

fn file_writer(log_dir: &str) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(log_dir)?;
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "assessment.log");
    Ok(tracing_appender::non_blocking(appender))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_writer_creates_the_log_directory() {
        let dir = std::env::temp_dir().join("vark-assessment-log-test");
        let _ = std::fs::remove_dir_all(&dir);

        let path = dir.to_string_lossy().to_string();
        let created = file_writer(&path);
        assert!(created.is_ok());
        assert!(dir.is_dir());

        drop(created);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn init_installs_a_subscriber() {
        // Only this test touches the global dispatcher.
        let _guard = init(&LoggingParams::default());
        tracing::info!("logging initialized");
    }
}
