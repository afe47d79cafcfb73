//! CLI command implementations.
//!
//! Each submodule corresponds to a top-level CLI command and reuses the
//! troupe-core domain logic through `AppState`.

pub mod cases;
pub mod design;
pub mod run;
pub mod server;

use troupe_core::state::AppState;

/// Initialize a shared `AppState` for non-server commands.
///
/// Tracing goes to stderr so command output stays clean on stdout.
pub fn init_state(db_path: &str, max_turns: u32) -> Result<AppState, String> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "troupe_core=warn".into()),
        )
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    troupe_server::create_app_state(db_path, max_turns)
}
