//! The roster: who is logged in right now.
//!
//! A [`Roster`] is an ordered list of usernames in login order.  It has a
//! single owner (the hub's coordination loop); every other component only
//! ever sees a [`Roster::snapshot`] copied into an event.
//!
//! # Duplicates
//!
//! Two sessions may log in under the same name and both entries are kept.
//! Removal drops the *first* matching entry, so one logout never removes
//! both.

/// Ordered, duplicate-tolerant list of logged-in usernames.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Roster {
    users: Vec<String>,
}

impl Roster {
    /// Creates an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `user` at the end.  Duplicates are not rejected.
    pub fn add(&mut self, user: impl Into<String>) {
        self.users.push(user.into());
    }

    /// Removes the first entry equal to `user`.
    ///
    /// Returns `true` if an entry was removed.  An absent user leaves the
    /// roster unchanged.
    pub fn remove(&mut self, user: &str) -> bool {
        match self.users.iter().position(|u| u == user) {
            Some(index) => {
                self.users.remove(index);
                true
            }
            None => false,
        }
    }

    /// Returns an owned copy of the current entries, in login order.
    pub fn snapshot(&self) -> Vec<String> {
        self.users.clone()
    }

    pub fn contains(&self, user: &str) -> bool {
        self.users.iter().any(|u| u == user)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Iterates over the entries in login order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.users.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for Roster {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_starts_empty() {
        let roster = Roster::new();
        assert!(roster.is_empty());
        assert_eq!(roster.snapshot(), Vec::<String>::new());
    }

    #[test]
    fn test_add_appends_in_login_order() {
        let mut roster = Roster::new();
        roster.add("alice");
        roster.add("bob");
        assert_eq!(roster.snapshot(), vec!["alice", "bob"]);
    }

    #[test]
    fn test_add_keeps_duplicates() {
        let mut roster = Roster::new();
        roster.add("alice");
        roster.add("alice");
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_remove_only_entry_yields_empty() {
        // Arrange
        let mut roster: Roster = ["a"].into_iter().collect();

        // Act
        let removed = roster.remove("a");

        // Assert
        assert!(removed);
        assert!(roster.is_empty());
    }

    #[test]
    fn test_remove_first_of_two() {
        let mut roster: Roster = ["a", "b"].into_iter().collect();
        roster.remove("a");
        assert_eq!(roster.snapshot(), vec!["b"]);
    }

    #[test]
    fn test_remove_absent_user_is_unchanged() {
        let mut roster: Roster = ["a"].into_iter().collect();
        let removed = roster.remove("z");
        assert!(!removed);
        assert_eq!(roster.snapshot(), vec!["a"]);
    }

    #[test]
    fn test_remove_from_empty_is_noop() {
        let mut roster = Roster::new();
        assert!(!roster.remove("a"));
        assert!(roster.is_empty());
    }

    #[test]
    fn test_remove_drops_first_duplicate_only() {
        let mut roster: Roster = ["a", "b", "a"].into_iter().collect();
        roster.remove("a");
        assert_eq!(roster.snapshot(), vec!["b", "a"]);
    }

    #[test]
    fn test_remove_last_entry_keeps_prefix() {
        let mut roster: Roster = ["a", "b", "c"].into_iter().collect();
        roster.remove("c");
        assert_eq!(roster.snapshot(), vec!["a", "b"]);
    }

    #[test]
    fn test_add_then_remove_restores_previous_roster() {
        let mut roster: Roster = ["x", "y"].into_iter().collect();
        let before = roster.clone();
        roster.add("alice");
        roster.remove("alice");
        assert_eq!(roster, before);
    }

    #[test]
    fn test_snapshot_is_detached_copy() {
        let mut roster = Roster::new();
        roster.add("alice");
        let snapshot = roster.snapshot();
        roster.add("bob");
        assert_eq!(snapshot, vec!["alice"]);
    }

    #[test]
    fn test_contains() {
        let roster: Roster = ["alice"].into_iter().collect();
        assert!(roster.contains("alice"));
        assert!(!roster.contains("bob"));
    }
}
