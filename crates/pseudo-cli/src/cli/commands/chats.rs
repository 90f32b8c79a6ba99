//! Stored chat command handlers.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::Utc;
use comfy_table::{ContentArrangement, Table};
use pseudo_core::api::{ApiClient, ChatRecord, MediaRef, format_relative};
use pseudo_core::config::Config;
use pseudo_core::media::{MediaDestination, save_media};

pub async fn list(client: &ApiClient) -> Result<()> {
    let chats = client.list_chats().await?;
    if chats.is_empty() {
        println!("No saved chats.");
        return Ok(());
    }

    let now = Utc::now();
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["ID", "Title", "Messages", "Updated"]);
    for chat in &chats {
        let updated = chat
            .updated()
            .map_or_else(|| "unknown".to_string(), |t| format_relative(t, now));
        table.add_row([
            chat.id.clone(),
            chat.title.clone(),
            chat.message_count.to_string(),
            updated,
        ]);
    }
    println!("{table}");
    Ok(())
}

pub async fn show(client: &ApiClient, id: &str, json: bool) -> Result<()> {
    let record = client.get_chat(id).await?;
    if json {
        let text = serde_json::to_string_pretty(&record).context("encode chat as JSON")?;
        println!("{text}");
    } else {
        print!("{}", format_record(client, &record));
    }
    Ok(())
}

pub async fn delete(client: &ApiClient, id: &str) -> Result<()> {
    client.delete_chat(id).await?;
    println!("Deleted chat {id}");
    Ok(())
}

pub async fn create(client: &ApiClient) -> Result<()> {
    let chat = client.new_chat().await?;
    println!("{}", chat.chat_id);
    Ok(())
}

pub async fn media(
    client: &ApiClient,
    config: &Config,
    chat_id: String,
    file: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let dest = output.map_or_else(
        || MediaDestination::Dir(config.download_dir()),
        MediaDestination::from_output,
    );
    let media = MediaRef { chat_id, file };
    let path = save_media(client, &media, &dest).await?;
    println!("{}", path.display());
    Ok(())
}

/// Plain-text transcript: a title line, then one block per message.
fn format_record(client: &ApiClient, record: &ChatRecord) -> String {
    let mut out = format!("# {}\n", record.title);
    for message in &record.messages {
        out.push('\n');
        let speaker = match (message.role.as_str(), message.model.as_deref()) {
            ("assistant", Some(model)) => format!("assistant ({model})"),
            (role, _) => role.to_string(),
        };
        out.push_str(&format!("{speaker}:\n{}\n", message.content));
        if let Some(path) = message.media_path(&record.id) {
            out.push_str(&format!("{}\n", client.absolute_url(&path)));
        }
    }
    out
}
