//! Verification orchestration
//!
//! The authoritative side of the protocol: checks codes against the
//! deterministic derivation, remembers who is linked, prevents code
//! re-use across all instances, and produces structured responses. No
//! failure here ever reaches a client as an error - every outcome is a
//! response payload or a logged silent drop.

use std::sync::Arc;

use tokio::sync::Mutex;

use super::messages::{
    CheckLinkStatusRequest, CheckLinkStatusResponse, ClientMessage, DebugActionResponse,
    DebugRequest, ServerMessage, VerifyCodeRequest, VerifyCodeResponse,
};
use super::roster::Roster;
use super::{
    LinkMessages, LNK_ALREADY, LNK_CLEARFAIL, LNK_CLEAROK, LNK_CODEUSED, LNK_INVALID,
    LNK_NOSTORAGE, LNK_RESETFAIL, LNK_RESETOK, LNK_SUCCESS,
};
use crate::code;
use crate::config::LinkConfig;
use crate::ledger::Ledger;
use crate::store::{LinkStore, StoreError};

/// Shared state of one running link authority.
pub struct LinkState<S: LinkStore> {
    pub config: LinkConfig,
    pub messages: LinkMessages,
    pub store: S,
    pub roster: Roster,
    ledger: Mutex<Ledger>,
}

impl<S: LinkStore> LinkState<S> {
    pub fn new(config: LinkConfig, messages: LinkMessages, store: S) -> Self {
        Self {
            config,
            messages,
            store,
            roster: Roster::new(),
            ledger: Mutex::new(Ledger::new()),
        }
    }

    /// Loads the shared used-code ledger ahead of the first request.
    /// Verification also loads it lazily, so this is an optimization,
    /// not a requirement.
    pub async fn preload_ledger(&self) {
        let mut ledger = self.ledger.lock().await;
        ledger.ensure_loaded(&self.store).await;
    }

    /// True once the ledger has fallen back to in-memory-only replay
    /// protection.
    pub async fn ledger_degraded(&self) -> bool {
        self.ledger.lock().await.degraded()
    }

    /// Number of consumed codes currently known to this instance.
    pub async fn used_code_count(&self) -> usize {
        self.ledger.lock().await.len()
    }

    /// Handles a link-status query. Read-only; unknown players are
    /// dropped silently.
    pub async fn handle_check_status(
        &self,
        req: &CheckLinkStatusRequest,
    ) -> Option<CheckLinkStatusResponse> {
        self.resolve_player(req.player_id)?;

        match self.store.get_link_flag(req.player_id).await {
            Ok(flag) => Some(CheckLinkStatusResponse {
                is_linked: flag != 0,
                player_id: req.player_id,
            }),
            Err(e) => {
                tracing::warn!("[link] [status_check_failed] player={} {}", req.player_id, e);
                None
            }
        }
    }

    /// Handles a verification request. Checks run in fixed precedence,
    /// each short-circuiting: live player, already linked, code already
    /// used, then derivation match. Only a matching code mutates state.
    pub async fn handle_verify(&self, req: &VerifyCodeRequest) -> Option<VerifyCodeResponse> {
        let player_name = self.resolve_player(req.player_id)?;

        tracing::info!(
            "[link] [verify_request] player={} name={} code={} username={}",
            req.player_id, player_name, req.code, req.username
        );

        let mut ledger = self.ledger.lock().await;
        ledger.ensure_loaded(&self.store).await;

        // Already linked wins over everything, including garbage codes.
        match self.store.get_link_flag(req.player_id).await {
            Ok(flag) if flag != 0 => {
                tracing::info!("[link] [already_linked] username={}", req.username);
                return Some(VerifyCodeResponse {
                    success: false,
                    message: self.messages.0[LNK_ALREADY].clone(),
                    already_linked: Some(true),
                    code_already_used: None,
                });
            }
            Ok(_) => {}
            Err(e) => {
                // Treated as not linked; the ledger still guards replay.
                tracing::warn!("[link] [link_check_failed] player={} {}", req.player_id, e);
            }
        }

        // A consumed code never authenticates again, for anyone, even
        // if it would otherwise verify for this username.
        if ledger.is_used(&req.code) {
            tracing::info!("[link] [code_already_used] code={}", code::normalize(&req.code));
            return Some(VerifyCodeResponse {
                success: false,
                message: self.messages.0[LNK_CODEUSED].clone(),
                already_linked: None,
                code_already_used: Some(true),
            });
        }

        if code::matches(
            &req.code,
            &req.username,
            &self.config.world_name,
            &self.config.secret_key,
        ) {
            tracing::info!("[link] [verified] username={}", req.username);

            if let Err(e) = self.store.set_link_flag(req.player_id, 1).await {
                tracing::warn!("[link] [link_save_failed] player={} {}", req.player_id, e);
            }
            ledger.mark_used(&self.store, &req.code, &req.username).await;

            Some(VerifyCodeResponse {
                success: true,
                message: self.messages.0[LNK_SUCCESS].clone(),
                already_linked: None,
                code_already_used: None,
            })
        } else {
            // An invalid code is a business outcome, not an error, and
            // is never marked used - the player may retry correctly.
            tracing::info!("[link] [invalid_code] username={}", req.username);
            Some(VerifyCodeResponse {
                success: false,
                message: self.messages.0[LNK_INVALID].clone(),
                already_linked: None,
                code_already_used: None,
            })
        }
    }

    /// Debug: force a player's link flag back to 0. The ledger is
    /// untouched, so their consumed code stays consumed.
    pub async fn handle_reset_player(&self, req: &DebugRequest) -> Option<DebugActionResponse> {
        let player_name = self.resolve_player(req.player_id)?;

        tracing::info!("[link] [debug_reset] player={} name={}", req.player_id, player_name);

        match self.store.set_link_flag(req.player_id, 0).await {
            Ok(()) => Some(DebugActionResponse {
                success: true,
                message: self.messages.0[LNK_RESETOK].clone(),
                player_id: req.player_id,
            }),
            Err(e) => {
                tracing::error!("[link] [debug_reset_failed] player={} {}", req.player_id, e);
                Some(DebugActionResponse {
                    success: false,
                    message: self.messages.0[LNK_RESETFAIL].clone(),
                    player_id: req.player_id,
                })
            }
        }
    }

    /// Debug: empty the global used-code ledger across all instances.
    /// Irreversible, operator use only.
    pub async fn handle_clear_codes(&self, req: &DebugRequest) -> Option<DebugActionResponse> {
        let player_name = self.resolve_player(req.player_id)?;

        tracing::info!("[link] [debug_clear] player={} name={}", req.player_id, player_name);

        let mut ledger = self.ledger.lock().await;
        ledger.ensure_loaded(&self.store).await;

        match ledger.clear_all(&self.store).await {
            Ok(count) => Some(DebugActionResponse {
                success: true,
                message: self.messages.0[LNK_CLEAROK].replace("{count}", &count.to_string()),
                player_id: req.player_id,
            }),
            Err(e) => {
                tracing::error!("[link] [debug_clear_failed] {}", e);
                let msg = match e {
                    StoreError::Unavailable(_) => &self.messages.0[LNK_NOSTORAGE],
                    _ => &self.messages.0[LNK_CLEARFAIL],
                };
                Some(DebugActionResponse {
                    success: false,
                    message: msg.clone(),
                    player_id: req.player_id,
                })
            }
        }
    }

    /// Looks the player up in the live roster. A missing player yields a
    /// warning and a silent drop - there is no connection to answer.
    fn resolve_player(&self, player_id: i64) -> Option<String> {
        match self.roster.resolve(player_id) {
            Some(name) => Some(name),
            None => {
                tracing::warn!("[link] [player_not_found] player={}", player_id);
                None
            }
        }
    }
}

/// The hosting wrapper: holds an authority only when the configuration
/// allows one. With an incomplete config no handlers exist at all, so
/// every inbound message is ignored rather than answered with an error.
pub struct LinkService<S: LinkStore> {
    authority: Option<Arc<LinkState<S>>>,
}

impl<S: LinkStore> LinkService<S> {
    pub fn start(config: LinkConfig, messages: LinkMessages, store: S) -> Self {
        tracing::info!("[link] [starting] verification authority");

        if config.world_name.trim().is_empty() {
            tracing::error!("[link] [config_missing] world_name must be set; verification disabled");
            return Self { authority: None };
        }
        if config.secret_key.trim().is_empty() {
            tracing::error!("[link] [config_missing] secret_key must be set; verification disabled");
            return Self { authority: None };
        }

        tracing::info!("[link] [configured] world={}", config.world_name);

        Self {
            authority: Some(Arc::new(LinkState::new(config, messages, store))),
        }
    }

    pub fn enabled(&self) -> bool {
        self.authority.is_some()
    }

    pub fn authority(&self) -> Option<&Arc<LinkState<S>>> {
        self.authority.as_ref()
    }

    /// Routes one inbound message to its handler. Returns the response
    /// owed to the sending connection, if any. A disabled service
    /// processes nothing.
    pub async fn dispatch(&self, msg: &ClientMessage) -> Option<ServerMessage> {
        let state = self.authority.as_ref()?;

        match msg {
            ClientMessage::Hello(hello) => {
                state.roster.join(hello.player_id, &hello.username);
                None
            }
            ClientMessage::VerifyCodeRequest(req) => state
                .handle_verify(req)
                .await
                .map(ServerMessage::VerifyCodeResponse),
            ClientMessage::CheckLinkStatusRequest(req) => state
                .handle_check_status(req)
                .await
                .map(ServerMessage::CheckLinkStatusResponse),
            ClientMessage::DebugResetPlayer(req) => state
                .handle_reset_player(req)
                .await
                .map(ServerMessage::DebugActionResponse),
            ClientMessage::DebugClearCodes(req) => state
                .handle_clear_codes(req)
                .await
                .map(ServerMessage::DebugActionResponse),
        }
    }
}
