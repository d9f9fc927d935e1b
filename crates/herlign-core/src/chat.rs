//! Chat mode state machine.
//!
//! A session is either served by the completion bot (`auto`) or by a human
//! admin (`live`). Admins flip the mode; guests never do. The mode decides
//! what happens after a guest message has been stored.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::CoreError;

/// Served when the completion service fails or is not configured.
pub const FALLBACK_REPLY: &str =
    "I'm currently unavailable. Please try again later or contact our support team for assistance.";

/// Sent back to a guest whose session is in live mode.
pub const LIVE_MODE_NOTICE: &str = "An admin will respond to you shortly.";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ChatMode {
    Auto,
    Live,
}

impl ChatMode {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::from_str(raw).map_err(|_| CoreError::UnknownMode(raw.to_owned()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChatMode::Auto => "auto",
            ChatMode::Live => "live",
        }
    }
}

impl TryFrom<String> for ChatMode {
    type Error = CoreError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

/// Author of a chat message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SenderType {
    Guest,
    Bot,
    Admin,
}

impl SenderType {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        Self::from_str(raw).map_err(|_| CoreError::UnknownSender(raw.to_owned()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SenderType::Guest => "guest",
            SenderType::Bot => "bot",
            SenderType::Admin => "admin",
        }
    }

    /// Role used when the history is replayed to a completion service.
    pub fn completion_role(&self) -> &'static str {
        match self {
            SenderType::Guest => "user",
            SenderType::Bot | SenderType::Admin => "assistant",
        }
    }
}

impl TryFrom<String> for SenderType {
    type Error = CoreError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(&raw)
    }
}

/// Column values to write when a session changes mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeTransition {
    pub mode: ChatMode,
    pub admin_id: Option<String>,
}

/// Compute the new `(mode, admin_id)` pair for a session.
///
/// Entering live mode stamps the admin who took over; going back to auto
/// always clears the owner.
pub fn transition(target: ChatMode, admin_id: Option<&str>) -> Result<ModeTransition, CoreError> {
    match target {
        ChatMode::Live => {
            let admin = admin_id
                .filter(|id| !id.trim().is_empty())
                .ok_or(CoreError::AdminRequired)?;
            Ok(ModeTransition {
                mode: ChatMode::Live,
                admin_id: Some(admin.to_owned()),
            })
        }
        ChatMode::Auto => Ok(ModeTransition {
            mode: ChatMode::Auto,
            admin_id: None,
        }),
    }
}

/// What the server does after persisting a guest message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestReplyPlan {
    /// Ask the completion service; store exactly one bot message.
    GenerateReply,
    /// Tell the guest a human will answer; store nothing.
    AwaitAdmin,
}

impl GuestReplyPlan {
    pub fn for_mode(mode: ChatMode) -> Self {
        match mode {
            ChatMode::Auto => GuestReplyPlan::GenerateReply,
            ChatMode::Live => GuestReplyPlan::AwaitAdmin,
        }
    }
}

/// Pick the bot text to store: the completion on success, the fallback otherwise.
pub fn bot_reply<E>(outcome: Result<String, E>) -> String {
    match outcome {
        Ok(text) if !text.trim().is_empty() => text,
        _ => FALLBACK_REPLY.to_owned(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mode_round_trips_through_strings() {
        assert_eq!(ChatMode::parse("auto"), Ok(ChatMode::Auto));
        assert_eq!(ChatMode::parse("live"), Ok(ChatMode::Live));
        assert_eq!(ChatMode::Live.to_string(), "live");
        assert!(matches!(ChatMode::parse("manual"), Err(CoreError::UnknownMode(_))));
    }

    #[test]
    fn mode_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMode::Auto).unwrap();
        assert_eq!(json, "\"auto\"");
    }

    #[test]
    fn entering_live_requires_admin() {
        assert_eq!(transition(ChatMode::Live, None), Err(CoreError::AdminRequired));
        assert_eq!(transition(ChatMode::Live, Some("  ")), Err(CoreError::AdminRequired));

        let t = transition(ChatMode::Live, Some("admin-1")).unwrap();
        assert_eq!(t.mode, ChatMode::Live);
        assert_eq!(t.admin_id.as_deref(), Some("admin-1"));
    }

    #[test]
    fn returning_to_auto_clears_owner() {
        let t = transition(ChatMode::Auto, Some("admin-1")).unwrap();
        assert_eq!(t.mode, ChatMode::Auto);
        assert_eq!(t.admin_id, None);
    }

    #[test]
    fn plan_follows_mode() {
        assert_eq!(GuestReplyPlan::for_mode(ChatMode::Auto), GuestReplyPlan::GenerateReply);
        assert_eq!(GuestReplyPlan::for_mode(ChatMode::Live), GuestReplyPlan::AwaitAdmin);
    }

    #[test]
    fn failed_or_blank_completion_uses_fallback() {
        assert_eq!(bot_reply::<()>(Err(())), FALLBACK_REPLY);
        assert_eq!(bot_reply::<()>(Ok("   ".into())), FALLBACK_REPLY);
        assert_eq!(bot_reply::<()>(Ok("hi there".into())), "hi there");
    }

    #[test]
    fn history_roles() {
        assert_eq!(SenderType::Guest.completion_role(), "user");
        assert_eq!(SenderType::Bot.completion_role(), "assistant");
        assert_eq!(SenderType::Admin.completion_role(), "assistant");
        assert_eq!(SenderType::parse("bot"), Ok(SenderType::Bot));
    }
}
