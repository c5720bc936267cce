//! Wire contract
//!
//! One JSON object per line, tagged with the original event names. The
//! payload field names must match the external client and code issuer
//! 1:1 - they are part of the interop surface, not free to rename.

use serde::{Deserialize, Serialize};

// ============================================
// Client -> authority payloads
// ============================================

/// A player announcing themselves on connect; joins the live roster.
/// Transport plumbing, not part of the verification decision logic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hello {
    pub player_id: i64,
    pub username: String,
}

/// Ask the authority to verify a code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeRequest {
    pub code: String,
    pub username: String,
    pub player_id: i64,
}

/// Ask whether this player is already linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckLinkStatusRequest {
    pub player_id: i64,
}

/// Payload shared by both debug operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugRequest {
    pub player_id: i64,
}

// ============================================
// Authority -> client payloads
// ============================================

/// Verification result. The optional flags are omitted from the wire
/// when unset so the client can branch on their presence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyCodeResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub already_linked: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_already_used: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckLinkStatusResponse {
    pub is_linked: bool,
    pub player_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugActionResponse {
    pub success: bool,
    pub message: String,
    pub player_id: i64,
}

// ============================================
// Envelopes
// ============================================

/// Everything a client may send, tagged with the original event names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    #[serde(rename = "HWLink:Hello")]
    Hello(Hello),
    #[serde(rename = "HWLink:VerifyCodeRequest")]
    VerifyCodeRequest(VerifyCodeRequest),
    #[serde(rename = "HWLink:CheckLinkStatusRequest")]
    CheckLinkStatusRequest(CheckLinkStatusRequest),
    #[serde(rename = "HWLink:DebugResetPlayer")]
    DebugResetPlayer(DebugRequest),
    #[serde(rename = "HWLink:DebugClearCodes")]
    DebugClearCodes(DebugRequest),
}

/// Everything the authority may send back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    #[serde(rename = "HWLink:VerifyCodeResponse")]
    VerifyCodeResponse(VerifyCodeResponse),
    #[serde(rename = "HWLink:CheckLinkStatusResponse")]
    CheckLinkStatusResponse(CheckLinkStatusResponse),
    #[serde(rename = "HWLink:DebugActionResponse")]
    DebugActionResponse(DebugActionResponse),
}
