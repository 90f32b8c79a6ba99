//! Runtime execution modes.
//!
//! - `exec`: one request, printed to stdout/stderr
//! - `tui`: full-screen interactive terminal UI (optional feature)

#[cfg(feature = "tui")]
pub use pseudo_tui::run_interactive_chat;

#[cfg(not(feature = "tui"))]
pub async fn run_interactive_chat(
    _config: &pseudo_core::config::Config,
    _client: pseudo_core::api::ApiClient,
    _chat_id: Option<String>,
) -> anyhow::Result<()> {
    anyhow::bail!("TUI support is disabled in this build (feature \"tui\").");
}
