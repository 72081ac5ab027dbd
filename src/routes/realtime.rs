use std::convert::Infallible;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::routing::get;
use axum::Router;
use futures::Stream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::constants::{SSE_KEEPALIVE_INTERVAL, SSE_KEEPALIVE_TEXT};
use crate::response::AppError;
use crate::state::AppState;

struct SseGuard(Arc<AtomicUsize>);

impl Drop for SseGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/:id/events", get(sse_handler))
}

/// Streams detector events for one session. The first event is `connected`
/// carrying the current status; each detector event follows under its
/// snake_case name. The stream ends when the session is deleted or the
/// server shuts down.
pub async fn sse_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, AppError> {
    let entry = state.sessions().get(&id).await?;

    let max_sse = state.config().limits.max_sse_connections;
    let counter = state.sse_connections().clone();
    let current = counter.fetch_add(1, Ordering::SeqCst);
    if current >= max_sse {
        counter.fetch_sub(1, Ordering::SeqCst);
        return Err(AppError::too_many_requests("Too many SSE connections"));
    }
    let guard = SseGuard(counter);

    let mut events = BroadcastStream::new(entry.subscribe());
    let snapshot = entry.status().await;
    // 不持有会话引用，删除会话时发送端随之释放，流自然结束
    drop(entry);

    let mut shutdown_rx = state.shutdown_rx();
    tracing::info!(session_id = %id, "SSE subscriber connected");

    let stream = async_stream::stream! {
        let _guard = guard;

        if let Ok(json) = serde_json::to_string(&snapshot) {
            yield Ok(SseEvent::default().event("connected").data(json));
        }

        loop {
            tokio::select! {
                next = events.next() => {
                    match next {
                        Some(Ok(event)) => {
                            if let Ok(json) = serde_json::to_string(&event) {
                                yield Ok(SseEvent::default().event(event.name()).data(json));
                            }
                        }
                        Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                            tracing::warn!(session_id = %id, skipped, "SSE subscriber lagged, events dropped");
                            let json = serde_json::json!({ "skipped": skipped }).to_string();
                            yield Ok(SseEvent::default().event("lagged").data(json));
                        }
                        None => {
                            tracing::info!(session_id = %id, "Session closed, ending SSE stream");
                            break;
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    break;
                }
            }
        }
    };

    Ok(Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEPALIVE_INTERVAL)
            .text(SSE_KEEPALIVE_TEXT),
    ))
}
