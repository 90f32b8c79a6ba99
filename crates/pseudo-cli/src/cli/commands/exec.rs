//! One-shot message command.

use std::io::{Write, stderr};

use anyhow::{Context, Result, bail};
use pseudo_core::api::ApiClient;
use pseudo_core::config::Config;
use pseudo_core::conversation::Conversation;
use pseudo_core::session::ChatSession;

pub struct ExecRunOptions<'a> {
    pub client: ApiClient,
    pub config: &'a Config,
    pub prompt: &'a str,
    pub model_override: Option<&'a str>,
    pub chat_id: Option<&'a str>,
}

/// Sends the prompt and prints the reply to stdout.
///
/// Attribution and the chat id go to stderr so stdout stays pipeable.
pub async fn run(opts: ExecRunOptions<'_>) -> Result<()> {
    if opts.prompt.trim().is_empty() {
        bail!("Prompt must not be empty");
    }

    let model = opts.model_override.unwrap_or(&opts.config.model);
    let conversation = match opts.chat_id {
        Some(id) => {
            let record = opts.client.get_chat(id).await?;
            Conversation::from_record(&record, model)
        }
        None => Conversation::new(model),
    };

    let client = opts.client.clone();
    let mut session = ChatSession::new(opts.client, conversation);
    let done = session.send_message(opts.prompt).await?;
    if done.is_failure() {
        bail!("Chat request failed (set PSEUDO_LOG=debug for details)");
    }

    let conversation = session.conversation();
    let reply = done
        .message_id()
        .and_then(|id| conversation.transcript().get(id))
        .context("reply missing from transcript")?;
    let variation = reply.current();

    println!("{}", variation.content);
    if let Some(url) = variation.media_url.as_deref() {
        println!("{}", client.absolute_url(url));
    }

    let mut err = stderr();
    if let Some(attribution) = variation.attribution() {
        writeln!(err, "{attribution}")?;
    }
    if let Some(id) = conversation.chat_id() {
        writeln!(err, "Chat: {id}")?;
    }
    Ok(())
}
