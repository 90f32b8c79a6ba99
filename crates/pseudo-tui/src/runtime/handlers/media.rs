//! Media download into the configured directory.

use std::path::PathBuf;

use pseudo_core::api::{ApiClient, MediaRef};
use pseudo_core::media::{MediaDestination, save_media};

use crate::events::UiEvent;

pub async fn media_save(client: ApiClient, media: MediaRef, dir: PathBuf) -> UiEvent {
    match save_media(&client, &media, &MediaDestination::Dir(dir)).await {
        Ok(path) => UiEvent::MediaSaved { path },
        Err(e) => UiEvent::MediaSaveFailed {
            error: format!("{e:#}"),
        },
    }
}
