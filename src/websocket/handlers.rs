use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::services::{messages::MessageService, users::UserService};
use crate::state::AppState;
use crate::store::GroupStore;
use crate::websocket::events::{ClientEvent, ServerEvent};
use crate::websocket::ConnHandle;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|s| s.to_string())
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let token = match params.token.or_else(|| bearer_from_headers(&headers)) {
        Some(t) => t,
        None => {
            warn!("websocket rejected: no token provided");
            return axum::http::StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let user_id = match state.tokens.verify(&token) {
        Ok(id) => id,
        Err(e) => {
            warn!(error = %e, "websocket rejected: invalid token");
            return axum::http::StatusCode::UNAUTHORIZED.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(state, user_id, socket))
}

async fn handle_socket(state: AppState, user_id: Uuid, socket: WebSocket) {
    let (handle, mut rx) = state.registry.connect(user_id).await;

    if let Err(e) = UserService::mark_online(&state.store, user_id).await {
        warn!(error = %e, %user_id, "failed to mark user online");
    }

    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            maybe = rx.recv() => {
                match maybe {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(txt) => {
                                if sender.send(Message::Text(txt)).await.is_err() {
                                    break;
                                }
                            }
                            Err(e) => warn!(error = %e, "failed to serialize outbound event"),
                        }
                    }
                    None => break,
                }
            }

            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Text(txt))) => {
                        match serde_json::from_str::<ClientEvent>(&txt) {
                            Ok(event) => handle_client_event(&state, handle, event).await,
                            Err(e) => debug!(error = %e, "ignoring unparseable client event"),
                        }
                    }
                    Some(Ok(Message::Ping(_))) => {
                        // Pong is handled by the framework
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    // Only the connection still on record owns the offline transition; a
    // stale disconnect after a reconnect must leave the user online.
    if state.registry.disconnect(handle).await {
        if let Err(e) = UserService::mark_offline(&state.store, user_id).await {
            warn!(error = %e, %user_id, "failed to mark user offline");
        }
    }
}

async fn handle_client_event(state: &AppState, handle: ConnHandle, event: ClientEvent) {
    let sender_id = handle.user_id;
    match event {
        ClientEvent::SendMessage {
            receiver_id,
            message,
        } => {
            // Delivered is computed only when the receiver is online right
            // now; offline messages stay undelivered until marked seen.
            if state.registry.is_online(receiver_id).await {
                if let Err(e) =
                    MessageService::mark_delivered(&state.store, sender_id, receiver_id).await
                {
                    warn!(error = %e, "failed to flag messages delivered");
                } else {
                    state
                        .registry
                        .emit_to_user(sender_id, ServerEvent::MessageDelivered { receiver_id })
                        .await;
                }
            }
            state
                .registry
                .emit_to_user(receiver_id, ServerEvent::ReceiveMessage { sender_id, message })
                .await;
        }
        ClientEvent::Typing { receiver_id } => {
            state
                .registry
                .emit_to_user(receiver_id, ServerEvent::Typing { sender_id })
                .await;
        }
        ClientEvent::StopTyping { receiver_id } => {
            state
                .registry
                .emit_to_user(receiver_id, ServerEvent::StopTyping { sender_id })
                .await;
        }
        ClientEvent::JoinGroup { group_id } => {
            match state.store.groups.get(group_id).await {
                Ok(Some(group)) if group.is_member(sender_id) => {
                    state.registry.join_group(handle, group_id).await;
                }
                Ok(_) => {
                    warn!(%sender_id, %group_id, "join_group refused: not a member");
                }
                Err(e) => warn!(error = %e, "join_group lookup failed"),
            }
        }
        ClientEvent::SendGroupMessage {
            group_id,
            body,
            kind,
            media_url,
        } => {
            // The broadcast happens inside the service; socket events have no
            // reply channel, so failures are only logged.
            if let Err(e) = MessageService::send_group(
                &state.store,
                &state.registry,
                sender_id,
                group_id,
                body,
                kind,
                media_url,
            )
            .await
            {
                warn!(error = %e, %group_id, "group message via socket failed");
            }
        }
    }
}
