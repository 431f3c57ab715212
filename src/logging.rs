use once_cell::sync::OnceCell;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

static FILE_GUARD: OnceCell<WorkerGuard> = OnceCell::new();

/// Initialise logging. The level is `debug` when `debug` is set and `info`
/// otherwise. The level can be overridden via the `RUST_LOG` environment
/// variable only while debug logging is enabled.
///
/// When `log_file` is given, output is appended to that file instead of
/// stderr.
pub fn init(debug: bool, log_file: Option<PathBuf>) {
    // Force `info` when debug logging is off so a stray `RUST_LOG` does not
    // flood the terminal.
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_file {
        Some(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("."));
            let file_name = path
                .file_name()
                .map(|n| n.to_owned())
                .unwrap_or_else(|| "swatch.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            if builder
                .with_writer(writer)
                .with_ansi(false)
                .try_init()
                .is_ok()
            {
                let _ = FILE_GUARD.set(guard);
            }
        }
        None => {
            let _ = builder.with_writer(std::io::stderr).try_init();
        }
    }
}
