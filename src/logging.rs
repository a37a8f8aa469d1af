/// File logging via tracing.
///
/// The terminal is in raw mode on the alternate screen while the game runs,
/// so nothing may go to stdout/stderr. Events go to a non-blocking file
/// writer instead; `RUST_LOG` overrides the configured level.

use std::path::{Path, PathBuf};
use std::sync::Once;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::{data_dir, LogConfig};

/// Relative log paths live in the data dir, or the CWD without one.
fn resolve(file: &Path, base: Option<PathBuf>) -> PathBuf {
    if file.is_absolute() {
        return file.to_path_buf();
    }
    base.unwrap_or_else(|| PathBuf::from(".")).join(file)
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Keep the guard alive until exit so the
/// writer thread can flush; `None` means logging stays off.
pub fn init(cfg: &LogConfig) -> Option<WorkerGuard> {
    let path = resolve(&cfg.file, data_dir());
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_else(|| PathBuf::from("."));
    let name = path.file_name()?.to_owned();
    std::fs::create_dir_all(&dir).ok()?;

    let appender = tracing_appender::rolling::never(dir, name);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter(&cfg.level))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .ok()?;

    install_panic_hook();
    Some(guard)
}

fn install_panic_hook() {
    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            tracing::error!(target: "panic", %info, "panic");
            default_panic(info);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_join_base() {
        let base = PathBuf::from("/data/plates");
        assert_eq!(resolve(Path::new("plates.log"), Some(base)), PathBuf::from("/data/plates/plates.log"));
        assert_eq!(resolve(Path::new("plates.log"), None), PathBuf::from("./plates.log"));
    }

    #[test]
    fn absolute_paths_are_kept() {
        let p = Path::new("/var/log/plates.log");
        assert_eq!(resolve(p, Some(PathBuf::from("/data"))), p);
    }

    #[test]
    fn bad_level_falls_back() {
        // must not panic on garbage directives
        let _ = filter("=[=");
    }
}
