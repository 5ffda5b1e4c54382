//! WebSocket transport (C10): a single `search` request/reply pair over a
//! tagged JSON message enum, split sender/receiver, fire-and-forget replies.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::dto::{SearchRequestDto, SearchResponseDto};
use crate::state::AppState;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsRequest {
    Search {
        req_id: String,
        store: String,
        #[serde(flatten)]
        request: SearchRequestDto,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsReply {
    Results {
        req_id: String,
        #[serde(flatten)]
        response: SearchResponseDto,
    },
    Error {
        req_id: String,
        code: String,
        message: String,
    },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    while let Some(Ok(message)) = receiver.next().await {
        let Message::Text(text) = message else {
            if matches!(message, Message::Close(_)) {
                break;
            }
            continue;
        };

        let parsed: Result<WsRequest, _> = serde_json::from_str(&text);
        let reply = match parsed {
            Ok(WsRequest::Search { req_id, store, request }) => {
                let orchestrator_request = request.into_orchestrator_request(store);
                match state
                    .orchestrator
                    .search(orchestrator_request, CancellationToken::new())
                    .await
                {
                    Ok(response) => WsReply::Results {
                        req_id,
                        response: response.into(),
                    },
                    Err(err) => WsReply::Error {
                        req_id,
                        code: format!("{:?}", err.code()),
                        message: err.to_string(),
                    },
                }
            }
            Err(err) => WsReply::Error {
                req_id: String::new(),
                code: "InvalidQuery".to_string(),
                message: format!("malformed message: {err}"),
            },
        };

        let Ok(json) = serde_json::to_string(&reply) else {
            tracing::warn!("failed to serialize websocket reply");
            continue;
        };
        if sender.send(Message::Text(json.into())).await.is_err() {
            break;
        }
    }
}
