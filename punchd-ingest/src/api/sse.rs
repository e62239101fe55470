//! Server-Sent Events subscriber channel
//!
//! Streams reconciliation results to connected subscribers. Each
//! connection receives a greeting message, then one `attendance` event
//! per mutating reconciliation. Delivery is best-effort: a subscriber
//! that falls behind the fanout channel is disconnected rather than
//! retried, and a service stop closes every stream.

use crate::api::AppContext;
use crate::fanout::FanoutMessage;
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use futures::stream::Stream;
use punchd_common::events::SubscriberMessage;
use std::convert::Infallible;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

/// GET /attendance/events - SSE subscriber stream
pub async fn event_stream(
    State(ctx): State<AppContext>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = ctx.fanout.subscribe();
    debug!(
        "New subscriber connected, total subscribers: {}",
        ctx.fanout.subscriber_count()
    );

    let stream = async_stream::stream! {
        let greeting = SubscriberMessage::connection("Connected to punchd real-time attendance");
        if let Some(event) = to_sse_event(&greeting) {
            yield Ok(event);
        }

        loop {
            match rx.recv().await {
                Ok(FanoutMessage::Attendance(update)) => {
                    let message = SubscriberMessage::attendance(update);
                    if let Some(event) = to_sse_event(&message) {
                        yield Ok(event);
                    }
                }
                Ok(FanoutMessage::Shutdown) => {
                    debug!("Subscriber stream closing: service stopping");
                    break;
                }
                Err(RecvError::Lagged(skipped)) => {
                    // A stalled subscriber must not stall fanout to the
                    // rest; it is dropped, not retried
                    warn!("Subscriber fell {} messages behind, disconnecting", skipped);
                    break;
                }
                Err(RecvError::Closed) => break,
            }
        }
    };

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_sse_event(message: &SubscriberMessage) -> Option<Event> {
    match serde_json::to_string(message) {
        Ok(json) => Some(Event::default().event(message.event_name()).data(json)),
        Err(e) => {
            warn!("Failed to serialize subscriber message: {}", e);
            None
        }
    }
}
