use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::{
        sse::{Handshake, ServerEvent},
        timer::TimerView,
    },
    services::auth_service::Operator,
    state::SharedState,
};

const EVENT_HANDSHAKE: &str = "handshake";

/// Identifies the target SSE stream for teardown logging.
#[derive(Clone)]
pub enum StreamKind {
    Public,
    Operator(String),
}

impl StreamKind {
    fn name(&self) -> &'static str {
        match self {
            StreamKind::Public => "public",
            StreamKind::Operator(_) => "operator",
        }
    }
}

/// Subscribe to the shared public SSE stream.
pub fn subscribe_public(state: &SharedState) -> broadcast::Receiver<ServerEvent> {
    state.public_sse().subscribe()
}

/// Subscribe to the operator-only SSE stream.
pub fn subscribe_operator(
    state: &SharedState,
    operator: &Operator,
) -> broadcast::Receiver<ServerEvent> {
    info!(operator = %operator.email(), "operator SSE stream subscribed");
    state.operator_sse().subscribe()
}

/// First event sent on every new stream.
pub fn handshake(state: &SharedState, kind: &StreamKind) -> ServerEvent {
    let payload = Handshake {
        stream: kind.name().to_string(),
        message: format!("{} stream connected", kind.name()),
        degraded: state.is_degraded(),
        timer: state
            .timer_snapshot()
            .map(|timer| TimerView::at(&timer, state.now_ms())),
    };
    ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &payload).unwrap_or_else(|_| {
        ServerEvent::new(Some(EVENT_HANDSHAKE.to_string()), payload.message.clone())
    })
}

/// Convert a broadcast receiver into an SSE response, forwarding events and
/// cleaning up once the client disconnects.
pub fn to_sse_stream(
    first: ServerEvent,
    mut receiver: broadcast::Receiver<ServerEvent>,
    kind: StreamKind,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(16);

    tokio::spawn(async move {
        if tx.send(Ok(to_event(first))).await.is_err() {
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) => {
                            if tx.send(Ok(to_event(payload))).await.is_err() {
                                break;
                            }
                        }
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            // Timer ticks are superseded by the next one anyway.
                            debug!(stream = kind.name(), skipped, "SSE subscriber lagged");
                            continue;
                        }
                    }
                }
            }
        }

        match kind {
            StreamKind::Public => info!("public SSE stream disconnected"),
            StreamKind::Operator(email) => {
                info!(operator = %email, "operator SSE stream disconnected")
            }
        }
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}
