//! Response envelopes shared by the handlers.
//!
//! JSON bodies use a `{ "data": ... }` envelope. Streaming endpoints answer
//! with server-sent events instead; [`json_sse`] turns any stream of
//! serializable items into one.

use std::convert::Infallible;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio_util::sync::CancellationToken;

/// Standard `{ "data": T }` response envelope.
///
/// ```ignore
/// Ok(Json(DataResponse { data: items }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// Serve `stream` as SSE, one `data:` line of JSON per item.
///
/// The stream is dropped when the client disconnects or `shutdown` fires.
pub fn json_sse<S, T>(
    stream: S,
    shutdown: &CancellationToken,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    S: Stream<Item = T> + Send + 'static,
    T: Serialize,
{
    let events = stream.take_until(shutdown.clone().cancelled_owned()).map(|item| {
        Ok::<_, Infallible>(Event::default().json_data(&item).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to serialize stream item");
            Event::default().event("error").data("serialization failed")
        }))
    });
    Sse::new(events).keep_alive(KeepAlive::default())
}
