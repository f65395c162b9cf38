//! Local chat runtime
//!
//! Serves a compiled manifest over HTTP:
//! - `GET /` chat UI
//! - `GET /api/agents` agent list
//! - `POST /api/chat` relay one message to the agent's model
//!
//! The manifest is compiled once before the server starts and shared
//! read-only with every connection.

use eyre::{Context, Result};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;

pub mod chat;
pub mod http;
pub mod page;

use crate::compiler::Manifest;
use crate::config::RuntimeConfig;
use chat::{ChatBackend, OpenAiRelay, sanitize_history};
use http::{HttpError, Request, Response, read_request, write_response};

/// How long a client has to deliver a complete request
pub const REQUEST_READ_TIMEOUT: Duration = Duration::from_secs(30);

/// State shared by all connections
pub struct AppState {
    pub manifest: Arc<Manifest>,
    pub chat: Arc<dyn ChatBackend>,
    pub read_timeout: Duration,
}

impl AppState {
    pub fn new(manifest: Manifest, chat: Arc<dyn ChatBackend>) -> Self {
        Self {
            manifest: Arc::new(manifest),
            chat,
            read_timeout: REQUEST_READ_TIMEOUT,
        }
    }
}

/// Agent summary returned by `GET /api/agents`
#[derive(Debug, Serialize)]
pub struct AgentSummary {
    pub name: String,
    pub model_provider: Option<Value>,
    pub model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    agent: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    history: Value,
}

/// Bind, serve until Ctrl-C, then wait for in-flight requests
pub fn run_server(manifest: Manifest, config: &RuntimeConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    let relay: Arc<dyn ChatBackend> = Arc::new(OpenAiRelay::from_config(config));
    let state = Arc::new(AppState::new(manifest, relay));
    let address = format!("{}:{}", config.host, config.port);

    runtime.block_on(async move {
        let listener = TcpListener::bind(&address)
            .await
            .with_context(|| format!("Failed to bind {}", address))?;
        println!("ABT runtime listening on http://{}", address);
        println!("Press Ctrl+C to stop.");
        info!("Runtime listening on {}", address);

        serve(listener, state, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    })
}

/// Accept connections until `shutdown` resolves
///
/// On shutdown, connections still waiting for a request are dropped and
/// requests already read run to completion.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let mut tasks = JoinSet::new();
    let (closing_tx, closing_rx) = watch::channel(false);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!("serve: connection from {}", peer);
                    let state = Arc::clone(&state);
                    let closing = closing_rx.clone();
                    tasks.spawn(async move {
                        if let Err(e) = handle_connection(stream, state, closing).await {
                            warn!("Connection from {} failed: {}", peer, e);
                        }
                    });
                }
                Err(e) => warn!("Failed to accept connection: {}", e),
            },
            Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
        }
    }

    closing_tx.send_replace(true);
    let in_flight = tasks.len();
    if in_flight > 0 {
        info!("Waiting for {} in-flight request(s)", in_flight);
    }
    while tasks.join_next().await.is_some() {}
    Ok(())
}

async fn handle_connection(
    stream: TcpStream,
    state: Arc<AppState>,
    closing: watch::Receiver<bool>,
) -> Result<(), HttpError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    let read = tokio::select! {
        read = tokio::time::timeout(state.read_timeout, read_request(&mut reader)) => read,
        _ = closed(closing) => {
            debug!("handle_connection: dropping connection with no request on shutdown");
            return Ok(());
        }
    };

    let response = match read {
        Ok(Ok(Some(request))) => route(request, state).await,
        Ok(Ok(None)) => return Ok(()),
        Ok(Err(HttpError::Io(e))) => return Err(HttpError::Io(e)),
        Ok(Err(e)) => Response::error(400, e.to_string()),
        Err(_) => {
            debug!("handle_connection: request not received within {:?}", state.read_timeout);
            Response::error(408, "Request Timeout")
        }
    };

    write_response(&mut write_half, &response).await
}

/// Resolves once the server starts shutting down
async fn closed(mut closing: watch::Receiver<bool>) {
    while !*closing.borrow_and_update() {
        if closing.changed().await.is_err() {
            return;
        }
    }
}

/// Dispatch one request
pub async fn route(request: Request, state: Arc<AppState>) -> Response {
    debug!("route: {} {}", request.method, request.path);
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") | ("GET", "/index.html") => Response::html(page::CHAT_PAGE),
        ("GET", "/api/agents") => list_agents(&state.manifest),
        ("POST", "/api/chat") => handle_chat(&request.body, state).await,
        (_, "/" | "/index.html" | "/api/agents" | "/api/chat") => Response::error(405, "Method Not Allowed"),
        _ => Response::error(404, "Not Found"),
    }
}

fn list_agents(manifest: &Manifest) -> Response {
    let agents: Vec<AgentSummary> = manifest
        .agents
        .iter()
        .map(|(name, agent)| AgentSummary {
            name: name.clone(),
            model_provider: agent.model_provider.clone(),
            model: agent.model.clone(),
        })
        .collect();
    Response::json(200, &json!({ "agents": agents }))
}

async fn handle_chat(body: &[u8], state: Arc<AppState>) -> Response {
    let payload: ChatRequest = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(_) => return Response::error(400, "Invalid JSON body"),
    };

    let (agent_name, message) = match (payload.agent, payload.message) {
        (Some(agent), Some(message)) if !agent.is_empty() && !message.is_empty() => (agent, message),
        _ => return Response::error(400, "Missing agent or message"),
    };

    let Some(agent) = state.manifest.get(&agent_name).cloned() else {
        return Response::error(404, format!("Unknown agent '{}'", agent_name));
    };

    let history = sanitize_history(&payload.history);
    let chat = Arc::clone(&state.chat);
    let result = tokio::task::spawn_blocking(move || chat.complete(&agent, &history, &message)).await;

    match result {
        Ok(Ok(reply)) => Response::json(200, &json!({ "reply": reply })),
        Ok(Err(e)) => {
            warn!("Chat with '{}' failed: {}", agent_name, e);
            Response::error(500, e.to_string())
        }
        Err(e) => Response::error(500, format!("Chat task failed: {}", e)),
    }
}
