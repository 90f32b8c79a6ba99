//! Stored-chat requests: list, load and delete.

use pseudo_core::api::ApiClient;

use crate::events::{HistoryUiEvent, UiEvent};

pub async fn chat_list_load(client: ApiClient) -> UiEvent {
    let event = match client.list_chats().await {
        Ok(chats) => HistoryUiEvent::ListLoaded { chats },
        Err(e) => HistoryUiEvent::ListFailed {
            error: format!("{e:#}"),
        },
    };
    UiEvent::History(event)
}

pub async fn chat_load(client: ApiClient, id: String) -> UiEvent {
    let event = match client.get_chat(&id).await {
        Ok(record) => HistoryUiEvent::Loaded { record },
        Err(e) => HistoryUiEvent::LoadFailed {
            id,
            error: format!("{e:#}"),
        },
    };
    UiEvent::History(event)
}

pub async fn chat_delete(client: ApiClient, id: String) -> UiEvent {
    let event = match client.delete_chat(&id).await {
        Ok(()) => HistoryUiEvent::Deleted { id },
        Err(e) => HistoryUiEvent::DeleteFailed {
            id,
            error: format!("{e:#}"),
        },
    };
    UiEvent::History(event)
}
