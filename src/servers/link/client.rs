//! Per-connection transport loop
//!
//! Newline-delimited JSON over TCP. Each connection announces its player
//! with a hello message, then submits requests; responses owed to that
//! player are written back on the same connection. Malformed lines are
//! logged and skipped - nothing at this layer surfaces an error to the
//! peer.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use super::messages::ClientMessage;
use super::LinkService;
use crate::store::LinkStore;

/// Accept loop for the link server.
pub async fn run<S: LinkStore + 'static>(
    service: Arc<LinkService<S>>,
    bind: &str,
) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("Cannot bind link server to {}", bind))?;

    tracing::info!("[link] [listening] addr={}", bind);

    loop {
        let (stream, peer) = listener.accept().await?;
        let svc = Arc::clone(&service);
        tokio::spawn(async move {
            handle_client(svc, stream, peer).await;
        });
    }
}

/// Drives one client connection to completion.
pub async fn handle_client<S: LinkStore>(
    service: Arc<LinkService<S>>,
    stream: TcpStream,
    peer: SocketAddr,
) {
    tracing::debug!("[link] [connect] peer={}", peer);

    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    // The player this connection announced itself as, for roster
    // cleanup on disconnect.
    let mut joined: Option<i64> = None;

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!("[link] [read_error] peer={} {}", peer, e);
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let msg: ClientMessage = match serde_json::from_str(&line) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::warn!("[link] [bad_message] peer={} {}", peer, e);
                continue;
            }
        };

        if let ClientMessage::Hello(hello) = &msg {
            joined = Some(hello.player_id);
        }

        if let Some(response) = service.dispatch(&msg).await {
            let mut payload = match serde_json::to_string(&response) {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("[link] [encode_failed] {}", e);
                    continue;
                }
            };
            payload.push('\n');
            if write_half.write_all(payload.as_bytes()).await.is_err() {
                break;
            }
        }
    }

    if let Some(player_id) = joined {
        if let Some(state) = service.authority() {
            state.roster.leave(player_id);
        }
    }
    tracing::debug!("[link] [disconnect] peer={}", peer);
}
