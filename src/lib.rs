pub mod assistant;
pub mod config;
pub mod inference;

pub use assistant::{AiResponse, Assistant, ConversationContext, Turn};
pub use config::{find_config_path, load_config, AppConfig, LoggingConfig};
pub use inference::{ProviderChain, Style};

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` overrides the configured filter. Returns `false` if a global
/// subscriber was already installed (tests, or a host application).
pub fn init_tracing(config: &LoggingConfig) -> bool {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .unwrap_or_else(|_| EnvFilter::new("ridechat=info,warn"));

    let builder = fmt::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false);

    let installed = if config.json {
        builder.json().try_init().is_ok()
    } else {
        builder.try_init().is_ok()
    };

    if installed {
        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            json = config.json,
            "=== ridechat starting ==="
        );
    }
    installed
}
