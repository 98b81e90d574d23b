//! What the hub does when a session's mailbox is full.
//!
//! A broadcast is attempted on every live session before the next one
//! starts.  If one client stops reading, its mailbox fills up and the hub
//! must choose between that client and everybody else.  [`BackpressurePolicy`]
//! makes that choice an explicit setting instead of a hidden behaviour.
//!
//! | Policy        | Mailbox full                         | Cost to other sessions |
//! |---------------|--------------------------------------|------------------------|
//! | `Disconnect`  | session removed, mailbox closed      | none                   |
//! | `DropMessage` | this event skipped for that session  | none                   |
//! | `Block`       | hub waits for space                  | all delivery stalls    |
//!
//! Whatever the policy, a mailbox whose reader has already gone away (the
//! session's outbound loop hit a write fault) is treated as dead and the
//! session is removed.

use serde::{Deserialize, Serialize};

/// Delivery strategy applied per session during a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Drop the slow session entirely.  Default.
    #[default]
    Disconnect,
    /// Keep the session but skip the event it has no room for.
    DropMessage,
    /// Wait until the session has room.  One stalled reader stalls the hub.
    Block,
}

impl std::str::FromStr for BackpressurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "disconnect" => Ok(BackpressurePolicy::Disconnect),
            "drop_message" => Ok(BackpressurePolicy::DropMessage),
            "block" => Ok(BackpressurePolicy::Block),
            other => Err(format!(
                "unknown backpressure policy '{other}' (expected disconnect, drop-message or block)"
            )),
        }
    }
}

impl std::fmt::Display for BackpressurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BackpressurePolicy::Disconnect => "disconnect",
            BackpressurePolicy::DropMessage => "drop-message",
            BackpressurePolicy::Block => "block",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_is_disconnect() {
        assert_eq!(BackpressurePolicy::default(), BackpressurePolicy::Disconnect);
    }

    #[test]
    fn test_parse_accepts_dash_and_underscore() {
        assert_eq!(
            "drop-message".parse::<BackpressurePolicy>(),
            Ok(BackpressurePolicy::DropMessage)
        );
        assert_eq!(
            "drop_message".parse::<BackpressurePolicy>(),
            Ok(BackpressurePolicy::DropMessage)
        );
        assert_eq!("Block".parse::<BackpressurePolicy>(), Ok(BackpressurePolicy::Block));
    }

    #[test]
    fn test_parse_rejects_unknown() {
        assert!("retry".parse::<BackpressurePolicy>().is_err());
    }

    #[test]
    fn test_display_parses_back() {
        for policy in [
            BackpressurePolicy::Disconnect,
            BackpressurePolicy::DropMessage,
            BackpressurePolicy::Block,
        ] {
            assert_eq!(policy.to_string().parse::<BackpressurePolicy>(), Ok(policy));
        }
    }
}
