//! Stderr tracing for the `kinetic` binary.
//!
//! Diagnostics only: resolver decisions reach embedders through
//! `observer::ResolutionObserver`, and the library never installs a
//! subscriber itself. `RUST_LOG` selects what the binary prints here.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Used when `RUST_LOG` is unset or blank: blocked resolutions only.
const DEFAULT_DIRECTIVES: &str = "warn";

/// Install the compact stderr subscriber.
///
/// ```bash
/// RUST_LOG=kinetic=debug kinetic resolve --state 1,2,3
/// ```
///
/// A subscriber that is already installed wins; calling this twice is harmless.
pub fn init() {
    let filter = env_filter(std::env::var(EnvFilter::DEFAULT_ENV).ok().as_deref());
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .compact(),
        )
        .try_init();
}

/// Build the filter from raw `RUST_LOG` directives. Unparseable or blank
/// directives fall back to [`DEFAULT_DIRECTIVES`].
fn env_filter(directives: Option<&str>) -> EnvFilter {
    directives
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_DIRECTIVES))
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::filter::LevelFilter;

    use super::*;

    #[test]
    fn unset_or_blank_defaults_to_warn() {
        assert_eq!(env_filter(None).max_level_hint(), Some(LevelFilter::WARN));
        assert_eq!(env_filter(Some("  ")).max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn directives_raise_verbosity() {
        let filter = env_filter(Some("kinetic=debug"));
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::DEBUG));
    }

    #[test]
    fn repeated_init_does_not_panic() {
        init();
        init();
    }
}
