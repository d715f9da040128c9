pub mod config;
pub mod domains;
pub mod errors;
pub mod events;
pub mod shared;

pub use config::RegistryConfig;
pub use domains::sessions::{SessionRegistry, SessionStore};
pub use errors::CockpitError;
pub use events::{CockpitEvent, EventEmitter, LogEmitter};

/// Initialize the `log` facade for binaries and tests that want console
/// output. Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
