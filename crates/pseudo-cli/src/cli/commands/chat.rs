//! Interactive chat command.

use anyhow::{Context, Result};
use pseudo_core::api::ApiClient;
use pseudo_core::config::Config;

use crate::modes;

pub async fn run(config: &Config, client: ApiClient, chat_id: Option<String>) -> Result<()> {
    modes::run_interactive_chat(config, client, chat_id)
        .await
        .context("interactive chat failed")
}
