use pseudo_core::api::ApiClient;

use crate::events::{ModelsUiEvent, UiEvent};
use crate::overlays::ModelPickerMode;

/// Fetches the selectable models for a picker opening in `mode`.
pub async fn models_load(client: ApiClient, mode: ModelPickerMode) -> UiEvent {
    let event = match client.list_models().await {
        Ok(models) => ModelsUiEvent::Loaded { models, mode },
        Err(e) => ModelsUiEvent::Failed {
            error: format!("{e:#}"),
        },
    };
    UiEvent::Models(event)
}
