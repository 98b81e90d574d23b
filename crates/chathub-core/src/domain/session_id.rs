//! Session identity.

use uuid::Uuid;

/// Opaque identifier of one client connection.
///
/// Randomly generated (UUID v4) when the gateway accepts a peer.  The hub
/// keys its live-session registry by this value, so two connections from the
/// same address or under the same username never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Generates a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for SessionId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The first UUID group is plenty to tell sessions apart in logs.
        let full = self.0.simple().to_string();
        f.write_str(&full[..8])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ids_are_distinct() {
        assert_ne!(SessionId::new(), SessionId::new());
    }

    #[test]
    fn test_display_is_short_prefix() {
        let uuid = Uuid::parse_str("0123abcd-0000-4000-8000-000000000000").unwrap();
        assert_eq!(SessionId::from(uuid).to_string(), "0123abcd");
    }

    #[test]
    fn test_as_uuid_roundtrips() {
        let uuid = Uuid::new_v4();
        assert_eq!(SessionId::from(uuid).as_uuid(), uuid);
    }
}
