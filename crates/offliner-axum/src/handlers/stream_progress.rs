//! `GET /stream_progress/{request_id}` (spec §6): SSE stream of the
//! Progress Record, polled from the store rather than pushed, since the
//! store is a process-external substrate the worker writes from a
//! different process than this one reads from.

use std::convert::Infallible;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures_util::stream::Stream;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;

use offliner_core::domain::RequestId;

use crate::state::{AppState, JobService};

const POLL_INTERVAL: Duration = Duration::from_millis(750);

/// Fires `request_cancel` when the SSE body is dropped before the job
/// reached a terminal state — the only signal axum gives us for "the
/// client went away" on a long-lived stream (spec §6 "Client disconnect
/// ⇒ `request_cancel(request_id)`").
struct CancelOnDrop {
    state: AppState,
    id: RequestId,
    completed: Arc<AtomicBool>,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.completed.load(Ordering::Acquire) {
            return;
        }
        let state = Arc::clone(&self.state);
        let id = self.id;
        tokio::spawn(async move {
            let _ = state.request_cancel(id).await;
        });
    }
}

pub async fn stream_progress(
    State(state): State<AppState>,
    Path(request_id): Path<RequestId>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let guard = CancelOnDrop {
        state: Arc::clone(&state),
        id: request_id,
        completed: Arc::new(AtomicBool::new(false)),
    };

    let ticks = IntervalStream::new(tokio::time::interval(POLL_INTERVAL));
    let records = ticks.then(move |_| {
        let state = Arc::clone(&state);
        async move { state.observe(request_id).await }
    });

    // Include the terminal record, then stop — `take_while` is evaluated
    // against the *previous* item's terminal-ness so the record carrying
    // `complete=true` is still emitted. `guard` is moved into this final
    // combinator so it lives exactly as long as the stream axum polls —
    // dropped early (client disconnect) or dropped after the last item.
    let mut already_done = false;
    let stream = records
        .take_while(move |record: &offliner_core::domain::ProgressRecord| {
            let keep = !already_done;
            if record.complete {
                already_done = true;
            }
            keep
        })
        .map(move |record| {
            if record.complete {
                guard.completed.store(true, Ordering::Release);
            }
            let json = serde_json::to_string(&record).unwrap_or_else(|_| "{}".to_string());
            Ok(Event::default().data(json))
        });

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)).text("ping"))
}
