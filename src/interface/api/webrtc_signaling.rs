/// WebRTC signaling endpoint for browser-based clients
use super::presence_handler::AppState;
use crate::application::signaling::{
    outbound_channel, ClientContext, ClientMessage, ServerMessage, SignalingCoordinator,
    SignalingResult,
};
use crate::domain::shared::value_objects::ConnectionId;
use crate::infrastructure::identity::{AuthError, IdentityProvider};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Query parameters of the signaling upgrade request
#[derive(Debug, Default, Deserialize)]
pub struct SignalingQuery {
    pub token: Option<String>,
}

/// WebSocket handler for signaling
pub async fn signaling_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<SignalingQuery>,
    State(state): State<AppState>,
) -> Response {
    let connection = ConnectionId::new();

    let client = match authenticate(
        state.identity_provider.as_deref(),
        query.token.as_deref(),
        connection,
    )
    .await
    {
        Ok(client) => client,
        Err(e) => {
            warn!("Refusing signaling connection: {}", e);
            return (StatusCode::UNAUTHORIZED, e.to_string()).into_response();
        }
    };

    let coordinator = state.coordinator.clone();
    ws.on_upgrade(move |socket| handle_socket(socket, client, coordinator))
}

/// Build the client context for a new connection, verifying its token when
/// an identity provider is configured
pub async fn authenticate(
    provider: Option<&dyn IdentityProvider>,
    token: Option<&str>,
    connection: ConnectionId,
) -> Result<ClientContext, AuthError> {
    let Some(provider) = provider else {
        return Ok(ClientContext::new(connection));
    };

    let token = token
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;
    let verified = provider.verify(token).await?;
    debug!(
        "Connection {} authenticated as {}",
        connection, verified.identity
    );
    Ok(ClientContext::verified(connection, verified))
}

/// Handle WebSocket connection
async fn handle_socket(
    socket: WebSocket,
    mut client: ClientContext,
    coordinator: Arc<SignalingCoordinator>,
) {
    let connection = client.connection();
    info!("Signaling connection established: {}", connection);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = outbound_channel();
    coordinator.connect(connection, tx).await;

    // Task to send queued messages to this connection
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let json = match serde_json::to_string(&message) {
                Ok(j) => j,
                Err(e) => {
                    error!("Failed to serialize message: {}", e);
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    // Task to receive messages from this connection
    let recv_coordinator = coordinator.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    handle_text(&recv_coordinator, &mut client, &text).await;
                }
                Ok(Message::Close(_)) => {
                    info!("WebSocket closed for connection: {}", connection);
                    break;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    debug!("Keepalive from {}", connection);
                }
                Ok(Message::Binary(_)) => {
                    warn!("Binary frame from {} ignored", connection);
                    recv_coordinator
                        .hub()
                        .send(
                            &connection,
                            ServerMessage::error(
                                "UNSUPPORTED_FRAME",
                                "binary frames are not supported",
                            ),
                        )
                        .await;
                }
                Err(e) => {
                    error!("WebSocket error for {}: {}", connection, e);
                    break;
                }
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => {
            debug!("Send task finished for {}", connection);
        }
        _ = &mut recv_task => {
            debug!("Receive task finished for {}", connection);
        }
    }

    // Cleanup
    coordinator.disconnect(&connection).await;
    send_task.abort();
    recv_task.abort();
    info!("Signaling connection closed: {}", connection);
}

async fn handle_text(
    coordinator: &Arc<SignalingCoordinator>,
    client: &mut ClientContext,
    text: &str,
) {
    let connection = client.connection();
    debug!("Received signaling message from {}: {}", connection, text);

    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            warn!("Failed to parse signaling message from {}: {}", connection, e);
            coordinator
                .hub()
                .send(
                    &connection,
                    ServerMessage::error(
                        "PARSE_ERROR",
                        format!("Invalid message format: {}", e),
                    ),
                )
                .await;
            return;
        }
    };

    if let Err(e) = dispatch(coordinator, client, message).await {
        warn!("Signaling request from {} refused: {}", connection, e);
        coordinator.hub().send(&connection, e.to_message()).await;
    }
}

/// Handle individual signaling messages
pub async fn dispatch(
    coordinator: &Arc<SignalingCoordinator>,
    client: &mut ClientContext,
    message: ClientMessage,
) -> SignalingResult<()> {
    match message {
        ClientMessage::Join {
            identity,
            display_name,
        } => {
            coordinator.join(client, &identity, &display_name).await?;
        }
        ClientMessage::CallRequest {
            target,
            offer,
            caller_meta,
        } => {
            coordinator
                .call_request(client, &target, offer, caller_meta)
                .await?;
        }
        ClientMessage::CallAnswer { target, answer } => {
            coordinator.answer(client, &target, answer).await?;
        }
        ClientMessage::CallReject {
            target,
            rejector_meta,
        } => {
            coordinator.reject(client, &target, rejector_meta).await?;
        }
        ClientMessage::CallEnd { target } => {
            coordinator.end(client, &target).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::signaling::SignalingError;
    use crate::config::SignalingConfig;
    use crate::domain::shared::value_objects::UserId;
    use crate::infrastructure::identity::{MockIdentityProvider, VerifiedIdentity};
    use serde_json::json;

    #[tokio::test]
    async fn test_authenticate_without_provider_trusts_join() {
        let connection = ConnectionId::new();
        let client = authenticate(None, None, connection).await.unwrap();
        assert_eq!(client.connection(), connection);
        assert!(client.verified_identity().is_none());
    }

    #[tokio::test]
    async fn test_authenticate_with_valid_token() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_verify().times(1).returning(|_| {
            Ok(VerifiedIdentity {
                identity: UserId::new("alice"),
                display_name: "Alice".to_string(),
            })
        });

        let client = authenticate(
            Some(&provider as &dyn IdentityProvider),
            Some("secret"),
            ConnectionId::new(),
        )
        .await
        .unwrap();
        assert_eq!(
            client.verified_identity().map(|v| v.identity.clone()),
            Some(UserId::new("alice"))
        );
    }

    #[tokio::test]
    async fn test_authenticate_requires_token() {
        let mut provider = MockIdentityProvider::new();
        provider.expect_verify().never();

        let err = authenticate(
            Some(&provider as &dyn IdentityProvider),
            None,
            ConnectionId::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, AuthError::MissingToken);

        let err = authenticate(
            Some(&provider as &dyn IdentityProvider),
            Some(""),
            ConnectionId::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, AuthError::MissingToken);
    }

    #[tokio::test]
    async fn test_authenticate_rejects_bad_token() {
        let mut provider = MockIdentityProvider::new();
        provider
            .expect_verify()
            .times(1)
            .returning(|_| Err(AuthError::InvalidToken));

        let err = authenticate(
            Some(&provider as &dyn IdentityProvider),
            Some("forged"),
            ConnectionId::new(),
        )
        .await
        .unwrap_err();
        assert_eq!(err, AuthError::InvalidToken);
    }

    #[tokio::test]
    async fn test_dispatch_routes_to_coordinator() {
        let coordinator = Arc::new(SignalingCoordinator::new(SignalingConfig::default()));
        let (tx, _rx) = outbound_channel();
        let connection = ConnectionId::new();
        coordinator.connect(connection, tx).await;
        let mut client = ClientContext::new(connection);

        let early = dispatch(
            &coordinator,
            &mut client,
            ClientMessage::CallEnd {
                target: UserId::new("bob"),
            },
        )
        .await;
        assert_eq!(early, Err(SignalingError::NotJoined));

        dispatch(
            &coordinator,
            &mut client,
            ClientMessage::Join {
                identity: "alice".to_string(),
                display_name: "Alice".to_string(),
            },
        )
        .await
        .unwrap();
        assert!(coordinator.is_online(&UserId::new("alice")).await);

        let unreachable = dispatch(
            &coordinator,
            &mut client,
            ClientMessage::CallRequest {
                target: UserId::new("bob"),
                offer: json!({"sdp": "x"}),
                caller_meta: json!(null),
            },
        )
        .await;
        assert_eq!(
            unreachable,
            Err(SignalingError::UnreachableTarget(UserId::new("bob")))
        );
    }
}
