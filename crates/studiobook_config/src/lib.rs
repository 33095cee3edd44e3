// --- File: crates/studiobook_config/src/lib.rs ---

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use std::env;

pub mod models;
pub use models::*;

/// Loads the application configuration.
///
/// Sources are layered, later sources override earlier ones:
/// 1. `config/default` (any format the `config` crate recognises)
/// 2. `config/{RUN_ENV}` (RUN_ENV defaults to "debug")
/// 3. environment variables with the `STUDIOBOOK` prefix and `__` separator,
///    e.g. `STUDIOBOOK_SERVER__PORT=8086`
///
/// Secrets (STRIPE_SECRET_KEY) are never part of the config tree; they are
/// read from the environment at the call site that needs them.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    ensure_dotenv_loaded();

    let run_env = env::var("RUN_ENV").unwrap_or_else(|_| "debug".to_string());
    let prefix = env::var("PREFIX").unwrap_or_else(|_| "STUDIOBOOK".to_string());

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{}", run_env)).required(false))
        .add_source(Environment::with_prefix(&prefix).separator("__"));

    builder.build()?.try_deserialize()
}

static INIT_DOTENV: OnceCell<()> = OnceCell::new();

/// Ensures the `.env` file is loaded into the process environment exactly
/// once. The path can be overridden with `DOTENV_OVERRIDE`.
pub fn ensure_dotenv_loaded() {
    let dotenv_path =
        std::env::var("DOTENV_OVERRIDE").unwrap_or_else(|_| ".env".to_string());
    INIT_DOTENV.get_or_init(|| {
        dotenv::from_filename(&dotenv_path).ok();
    });
}
