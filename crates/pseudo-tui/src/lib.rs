//! Full-screen terminal chat view for pseudo.

pub mod common;
pub mod effects;
pub mod events;
pub mod features;
pub mod mutations;
pub mod overlays;
pub mod render;
pub mod runtime;
pub mod state;
pub mod terminal;
pub mod update;

use std::io::{IsTerminal, Write, stderr};

use anyhow::Result;
pub use features::{chat, input, transcript};
use pseudo_core::api::ApiClient;
use pseudo_core::config::Config;
pub use runtime::TuiRuntime;

/// Runs the interactive chat view against `client`, optionally opening a
/// stored chat first.
///
/// # Errors
/// Returns an error if stderr is not a terminal or the terminal fails.
pub async fn run_interactive_chat(
    config: &Config,
    client: ApiClient,
    chat_id: Option<String>,
) -> Result<()> {
    if !stderr().is_terminal() {
        anyhow::bail!(
            "Chat mode requires a terminal.\n\
             Use `pseudo exec -p '...'` for non-interactive use."
        );
    }

    tracing::info!(server = client.base_url(), model = %config.model, "starting chat view");

    let mut runtime = TuiRuntime::new(config.clone(), client)?;
    if let Some(id) = chat_id {
        runtime.open_chat(id);
    }
    runtime.run()?;
    drop(runtime);

    writeln!(stderr(), "Goodbye!")?;
    Ok(())
}
