use pseudo_core::api::{ApiClient, ApiError, ChatRequest};
use tokio_util::sync::CancellationToken;

use crate::events::UiEvent;

/// Posts one chat request, racing it against `cancel`.
///
/// A cancelled request still yields an event; the reducer has already
/// forgotten the task, so it is dropped there.
pub async fn send_chat(
    client: ApiClient,
    request: ChatRequest,
    cancel: Option<CancellationToken>,
) -> UiEvent {
    let cancel = cancel.unwrap_or_default();
    let outcome = tokio::select! {
        () = cancel.cancelled() => Err("request cancelled".to_string()),
        result = client.send_chat(&request) => result.map_err(|err| {
            match err.downcast_ref::<ApiError>() {
                Some(api) => tracing::warn!(kind = %api.kind, "chat request failed: {err:#}"),
                None => tracing::warn!("chat request failed: {err:#}"),
            }
            format!("{err:#}")
        }),
    };
    UiEvent::ChatReplied { outcome }
}
