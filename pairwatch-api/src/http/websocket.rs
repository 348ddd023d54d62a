// WebSocket handler for the realtime sync relay
//
// One task per socket. The task reads client frames and forwards whatever the
// room hub queues for it. Before a successful `auth` only `auth` and `ping`
// are honoured, and the socket is closed if `auth` does not arrive in time.
// A protocol ping goes out every heartbeat so a viewer who only watches still
// answers with pongs and is not swept as idle.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use bytes::Bytes;
use pairwatch_core::models::{ConnectionId, RoomId, SessionId};
use pairwatch_relay::{ClientMessage, RelayError, ServerMessage};
use tokio::{sync::mpsc, time::MissedTickBehavior};
use tracing::{debug, info, warn};

use super::AppState;

/// GET /ws
pub async fn websocket_handler(
    State(state): State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.max_message_size(state.relay.max_message_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// Seat held by an authenticated connection
struct Joined {
    room_id: RoomId,
    session_id: SessionId,
}

enum Event {
    AuthTimeout,
    Heartbeat,
    Outbound(Option<ServerMessage>),
    Inbound(Option<Result<Message, axum::Error>>),
}

enum Flow {
    Continue,
    Close,
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    let connection_id = ConnectionId::new();

    if let Err(e) = state.connections.register(connection_id.clone()) {
        warn!(connection_id = %connection_id, "Rejecting connection: {}", e);
        send(&mut socket, &ServerMessage::error(e.to_string())).await;
        let _ = socket.send(Message::Close(None)).await;
        return;
    }
    info!(connection_id = %connection_id, "WebSocket connection established");

    let deadline = tokio::time::sleep(state.relay.auth_timeout);
    tokio::pin!(deadline);

    let period = state.relay.heartbeat_interval;
    let mut heartbeat = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut outbound: Option<mpsc::Receiver<ServerMessage>> = None;
    let mut joined: Option<Joined> = None;

    loop {
        let event = tokio::select! {
            () = &mut deadline, if joined.is_none() => Event::AuthTimeout,
            _ = heartbeat.tick() => Event::Heartbeat,
            message = next_outbound(&mut outbound) => Event::Outbound(message),
            incoming = socket.recv() => Event::Inbound(incoming),
        };

        match event {
            Event::AuthTimeout => {
                debug!(connection_id = %connection_id, "Authentication timed out");
                send(&mut socket, &ServerMessage::auth_failed("Authentication timeout")).await;
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            Event::Heartbeat => {
                if socket.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
            Event::Outbound(Some(message)) => {
                if !send(&mut socket, &message).await {
                    break;
                }
            }
            Event::Outbound(None) => {
                // Hub dropped our queue: replaced, evicted, left or shutting down
                debug!(connection_id = %connection_id, "Outbound queue closed");
                let _ = socket.send(Message::Close(None)).await;
                break;
            }
            Event::Inbound(Some(Ok(Message::Text(text)))) => {
                let flow = handle_text(
                    &mut socket,
                    &state,
                    &connection_id,
                    text.as_str(),
                    &mut joined,
                    &mut outbound,
                )
                .await;
                if matches!(flow, Flow::Close) {
                    break;
                }
            }
            Event::Inbound(Some(Ok(Message::Binary(_)))) => {
                send(&mut socket, &ServerMessage::error("Binary frames are not supported")).await;
            }
            Event::Inbound(Some(Ok(Message::Close(_))) | None) => {
                debug!(connection_id = %connection_id, "Client closed connection");
                break;
            }
            // The protocol layer answers pings; both still count as activity
            Event::Inbound(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => {
                state.connections.touch(&connection_id);
            }
            Event::Inbound(Some(Err(e))) => {
                debug!(connection_id = %connection_id, "WebSocket error: {}", e);
                break;
            }
        }
    }

    if let Some(seat) = joined {
        state.hub.leave(&connection_id);
        state.rooms.detach(&seat.session_id, &connection_id);
        debug!(
            room_id = %seat.room_id,
            session_id = %seat.session_id,
            connection_id = %connection_id,
            "Released relay seat"
        );
    }
    state.connections.unregister(&connection_id);
    info!(connection_id = %connection_id, "WebSocket connection closed");
}

async fn next_outbound(outbound: &mut Option<mpsc::Receiver<ServerMessage>>) -> Option<ServerMessage> {
    match outbound {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

async fn handle_text(
    socket: &mut WebSocket,
    state: &AppState,
    connection_id: &ConnectionId,
    text: &str,
    joined: &mut Option<Joined>,
    outbound: &mut Option<mpsc::Receiver<ServerMessage>>,
) -> Flow {
    if !state.connections.record_message(connection_id) {
        send(socket, &ServerMessage::error("Rate limit exceeded")).await;
        return Flow::Continue;
    }

    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!(connection_id = %connection_id, "Unparseable client message: {}", e);
            send(socket, &ServerMessage::error("Invalid message format")).await;
            return Flow::Continue;
        }
    };

    match message {
        ClientMessage::Ping => {
            if send(socket, &ServerMessage::Pong).await {
                Flow::Continue
            } else {
                Flow::Close
            }
        }
        ClientMessage::Auth { token, room_id } => {
            if joined.is_some() {
                send(socket, &ServerMessage::error("Already authenticated")).await;
                return Flow::Continue;
            }
            match authenticate(socket, state, connection_id, &token, room_id).await {
                Some((seat, receiver)) => {
                    *joined = Some(seat);
                    *outbound = Some(receiver);
                    Flow::Continue
                }
                None => {
                    let _ = socket.send(Message::Close(None)).await;
                    Flow::Close
                }
            }
        }
        ClientMessage::Sync { action } => {
            let Some(seat) = joined.as_ref() else {
                send(socket, &ServerMessage::error("Not authenticated")).await;
                return Flow::Continue;
            };

            state.rooms.touch(&seat.session_id);
            match state.hub.relay(connection_id, action) {
                Ok(_) => Flow::Continue,
                Err(RelayError::NotJoined) => {
                    // Replaced or evicted between frames
                    Flow::Close
                }
                Err(e) => {
                    send(socket, &ServerMessage::error(e.to_string())).await;
                    Flow::Continue
                }
            }
        }
    }
}

/// Verify a room token and seat the connection
///
/// Sends `auth_result` either way; on success follows it with the peers'
/// presence and the room's playback snapshot.
async fn authenticate(
    socket: &mut WebSocket,
    state: &AppState,
    connection_id: &ConnectionId,
    token: &str,
    requested_room: Option<RoomId>,
) -> Option<(Joined, mpsc::Receiver<ServerMessage>)> {
    let claims = match state
        .tokens
        .verify_room_token(token)
        .and_then(|claims| state.rooms.session_for(&claims).map(|_| claims))
    {
        Ok(claims) => claims,
        Err(e) => {
            debug!(connection_id = %connection_id, "Relay auth rejected: {}", e);
            send(socket, &ServerMessage::auth_failed("Invalid or expired token")).await;
            return None;
        }
    };

    if requested_room.is_some_and(|room_id| room_id != claims.room_id) {
        send(socket, &ServerMessage::auth_failed("Token does not match room")).await;
        return None;
    }

    if let Err(e) = state.rooms.attach(&claims.session_id, connection_id.clone()) {
        debug!(connection_id = %connection_id, "Seat vanished during auth: {}", e);
        send(socket, &ServerMessage::auth_failed("Session expired")).await;
        return None;
    }

    let outcome = match state
        .hub
        .join(claims.room_id, claims.session_id.clone(), connection_id.clone())
    {
        Ok(outcome) => outcome,
        Err(e) => {
            state.rooms.detach(&claims.session_id, connection_id);
            send(socket, &ServerMessage::auth_failed(e.to_string())).await;
            return None;
        }
    };
    state.connections.join_room(connection_id, claims.room_id);

    send(socket, &ServerMessage::auth_ok(claims.session_id.clone())).await;
    for message in outcome.catch_up(claims.room_id) {
        send(socket, &message).await;
    }

    Some((
        Joined {
            room_id: claims.room_id,
            session_id: claims.session_id,
        },
        outcome.receiver,
    ))
}

/// Serialize and write one message; false once the socket is gone
async fn send(socket: &mut WebSocket, message: &ServerMessage) -> bool {
    let json = match message.to_json() {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to serialize {} message: {}", message.message_type(), e);
            return true;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}
