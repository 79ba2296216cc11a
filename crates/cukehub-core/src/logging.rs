//! Diagnostics for hosts and the command line.
//!
//! Events are written to stderr in the compact `fmt` layout, leaving stdout to
//! command output. The level is [`EditorConfig::log_level`], which already
//! folds in `CUKEHUB_LOG_LEVEL` and the `--log-level` flag.

use std::io::{self, IsTerminal};

use tracing::Subscriber;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

use crate::config::EditorConfig;

fn subscriber_for<W>(
    config: &EditorConfig,
    writer: W,
    ansi: bool,
) -> impl Subscriber + Send + Sync + use<W>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(EnvFilter::new(config.log_level.as_filter_str()))
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(true)
        .finish()
}

/// Install the process-wide subscriber for `config`.
///
/// Returns `false` when a subscriber was already installed. The earlier one
/// stays in place, so hosts and tests may call this more than once.
pub fn init_logging(config: &EditorConfig) -> bool {
    let subscriber = subscriber_for(config, io::stderr, io::stderr().is_terminal());
    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();
    if installed {
        tracing::debug!(level = config.log_level.as_filter_str(), "logging initialised");
    }
    installed
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex, PoisonError};

    use rstest::rstest;
    use tracing::{debug, info, warn};

    use super::*;
    use crate::config::LogLevel;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn text(&self) -> String {
            let bytes = self.0.lock().unwrap_or_else(PoisonError::into_inner);
            String::from_utf8_lossy(&bytes).into_owned()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[rstest]
    #[case(LogLevel::Warn, &["export failed"], &["working copy loaded", "field path not found"])]
    #[case(LogLevel::Info, &["export failed", "working copy loaded"], &["field path not found"])]
    #[case(LogLevel::Debug, &["export failed", "working copy loaded", "field path not found"], &[])]
    fn events_follow_the_configured_level(
        #[case] level: LogLevel,
        #[case] shown: &[&str],
        #[case] hidden: &[&str],
    ) {
        let captured = Captured::default();
        let config = EditorConfig::default().with_log_level(level);
        let subscriber = subscriber_for(&config, captured.clone(), false);
        tracing::subscriber::with_default(subscriber, || {
            warn!("export failed");
            info!("working copy loaded");
            debug!("field path not found");
        });
        let text = captured.text();
        for message in shown {
            assert!(text.contains(message), "missing {message} in:\n{text}");
        }
        for message in hidden {
            assert!(!text.contains(message), "unexpected {message} in:\n{text}");
        }
    }

    #[test]
    fn events_carry_their_target() {
        let captured = Captured::default();
        let subscriber = subscriber_for(&EditorConfig::default(), captured.clone(), false);
        tracing::subscriber::with_default(subscriber, || info!("ready"));
        assert!(captured.text().contains("cukehub_core::logging::tests"));
    }

    #[test]
    fn the_first_global_subscriber_is_kept() {
        let config = EditorConfig::default();
        init_logging(&config);
        assert!(!init_logging(&config));
    }
}
