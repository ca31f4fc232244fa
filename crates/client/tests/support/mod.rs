//! In-process Orca backend for integration tests.
//!
//! Serves `/ws` with the bootstrap exchange and records every session API
//! request. Prompt requests can be held open to observe single-flight
//! behaviour.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use orca_protocol::{Agent, DirectoryInfo, DirectoryList, ServerInfo, ServerMessage};
use serde_json::Value;
use tokio::sync::Notify;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub path: String,
    pub body: Value,
}

#[derive(Default)]
pub struct Shared {
    /// Raw frames sent before the directory list
    pub preamble: Mutex<Vec<String>>,
    pub selections: Mutex<Vec<String>>,
    pub requests: Mutex<Vec<RecordedRequest>>,
    pub hold_prompts: AtomicBool,
    pub fail_config: AtomicBool,
    pub prompt_arrived: Notify,
    pub release_prompt: Notify,
    pub socket_closed: Notify,
}

impl Shared {
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn selections(&self) -> Vec<String> {
        self.selections.lock().unwrap().clone()
    }
}

pub struct Backend {
    pub origin: Url,
    pub shared: Arc<Shared>,
}

pub fn directories() -> Vec<DirectoryInfo> {
    vec![
        DirectoryInfo {
            name: "orca".to_string(),
            path: "/home/dev/src/orca".to_string(),
        },
        DirectoryInfo {
            name: "tools/lint".to_string(),
            path: "/home/dev/src/tools/lint".to_string(),
        },
    ]
}

pub fn agents() -> Vec<Agent> {
    ["build", "plan", "general"]
        .into_iter()
        .map(|name| Agent {
            name: name.to_string(),
            description: None,
            mode: "primary".to_string(),
            built_in: true,
        })
        .collect()
}

pub fn server_info(session_id: &str, directory: &str) -> ServerInfo {
    ServerInfo {
        url: "http://127.0.0.1:4096".to_string(),
        directory: directory.to_string(),
        share_url: format!("https://share.example/s/{session_id}"),
        session_id: session_id.to_string(),
        current_model: "openai/gpt-5".to_string(),
        current_agent: "build".to_string(),
        models: vec![
            "openai/gpt-5".to_string(),
            "anthropic/claude-sonnet".to_string(),
        ],
        agents: agents(),
    }
}

pub async fn spawn_backend() -> Backend {
    spawn_backend_with(Shared::default()).await
}

pub async fn spawn_backend_with(shared: Shared) -> Backend {
    let shared = Arc::new(shared);
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/api/{session}/session/{id}/message", post(prompt_handler))
        .route("/api/{session}/config", patch(config_handler))
        .with_state(shared.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind test backend");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve test backend");
    });

    Backend {
        origin: Url::parse(&format!("http://{addr}")).expect("origin"),
        shared,
    }
}

/// Origin on a loopback port nobody listens on.
pub fn refused_origin() -> Url {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().expect("addr").port();
    drop(listener);
    Url::parse(&format!("http://127.0.0.1:{port}")).expect("origin")
}

async fn ws_handler(ws: WebSocketUpgrade, State(shared): State<Arc<Shared>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, shared))
}

async fn send_json(socket: &mut WebSocket, msg: &ServerMessage) -> bool {
    let json = serde_json::to_string(msg).expect("serialize server message");
    socket.send(Message::Text(json.into())).await.is_ok()
}

async fn handle_socket(mut socket: WebSocket, shared: Arc<Shared>) {
    let preamble = shared.preamble.lock().unwrap().clone();
    for raw in preamble {
        if socket.send(Message::Text(raw.into())).await.is_err() {
            shared.socket_closed.notify_one();
            return;
        }
    }

    let catalog = ServerMessage::DirectoryList(DirectoryList {
        directories: directories(),
    });
    if !send_json(&mut socket, &catalog).await {
        shared.socket_closed.notify_one();
        return;
    }

    let mut sessions = 0;
    while let Some(Ok(msg)) = socket.recv().await {
        let Message::Text(text) = msg else {
            if matches!(msg, Message::Close(_)) {
                break;
            }
            continue;
        };
        let Ok(value) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        if value["type"] != "selectDirectory" {
            continue;
        }
        let Some(path) = value["data"]["path"].as_str() else {
            continue;
        };

        shared.selections.lock().unwrap().push(path.to_string());
        sessions += 1;
        let ready = ServerMessage::ServerReady(server_info(&format!("ses_{sessions}"), path));
        if !send_json(&mut socket, &ready).await {
            break;
        }
    }

    shared.socket_closed.notify_one();
}

async fn prompt_handler(
    State(shared): State<Arc<Shared>>,
    Path((session, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    shared.requests.lock().unwrap().push(RecordedRequest {
        method: "POST",
        path: format!("/api/{session}/session/{id}/message"),
        body,
    });
    shared.prompt_arrived.notify_one();
    if shared.hold_prompts.load(Ordering::SeqCst) {
        shared.release_prompt.notified().await;
    }
    StatusCode::OK
}

async fn config_handler(
    State(shared): State<Arc<Shared>>,
    Path(session): Path<String>,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    shared.requests.lock().unwrap().push(RecordedRequest {
        method: "PATCH",
        path: format!("/api/{session}/config"),
        body,
    });
    if shared.fail_config.load(Ordering::SeqCst) {
        return (StatusCode::INTERNAL_SERVER_ERROR, "config write failed");
    }
    (StatusCode::OK, "")
}
