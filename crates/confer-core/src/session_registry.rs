//! Session registry (S): in-memory catalog of conferences and membership.
//!
//! Grounded on the bidirectional-map shape of the registry this crate is
//! modeled on, simplified to a single map since sessions here are
//! string-named rather than numeric, and there is no separate "rooms a
//! session belongs to" dimension.

use std::collections::HashMap;

use crate::error::{ConferenceError, Result};

/// A named conference and its current membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    id: String,
    members: Vec<String>,
}

impl Session {
    /// Session name.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current member principal IDs, in join order.
    #[must_use]
    pub fn members(&self) -> &[String] {
        &self.members
    }
}

/// Catalog of sessions, enforcing I3, I4, and the session-capacity half of
/// I6.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<String, Session>,
    max_sessions: usize,
    max_members: usize,
}

impl SessionRegistry {
    /// Build an empty registry with the given capacities.
    #[must_use]
    pub fn new(max_sessions: usize, max_members: usize) -> Self {
        Self { sessions: HashMap::new(), max_sessions, max_members }
    }

    /// Look up a session by name.
    #[must_use]
    pub fn find(&self, sid: &str) -> Option<&Session> {
        self.sessions.get(sid)
    }

    /// Number of currently existing sessions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// True if no sessions currently exist.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Create a new, empty session.
    ///
    /// # Errors
    ///
    /// [`ConferenceError::SessionAlreadyExists`] if `sid` is taken,
    /// [`ConferenceError::TooManySessions`] if the registry is at capacity.
    pub fn create(&mut self, sid: &str) -> Result<()> {
        if self.sessions.contains_key(sid) {
            return Err(ConferenceError::SessionAlreadyExists(sid.to_owned()));
        }
        if self.sessions.len() >= self.max_sessions {
            return Err(ConferenceError::TooManySessions { max: self.max_sessions });
        }
        self.sessions.insert(sid.to_owned(), Session { id: sid.to_owned(), members: Vec::new() });
        Ok(())
    }

    /// Add `cid` to session `sid`. Idempotent: if `cid` is already a
    /// member, returns `Ok(())` without duplicating (I3).
    ///
    /// # Errors
    ///
    /// [`ConferenceError::SessionNotFound`] if `sid` does not exist,
    /// [`ConferenceError::SessionFull`] if the session is at member
    /// capacity.
    pub fn add_member(&mut self, sid: &str, cid: &str) -> Result<()> {
        let max_members = self.max_members;
        let session = self
            .sessions
            .get_mut(sid)
            .ok_or_else(|| ConferenceError::SessionNotFound(sid.to_owned()))?;

        if session.members.iter().any(|m| m == cid) {
            return Ok(());
        }
        if session.members.len() >= max_members {
            return Err(ConferenceError::SessionFull { sid: sid.to_owned(), max: max_members });
        }
        session.members.push(cid.to_owned());
        Ok(())
    }

    /// Remove `cid` from session `sid`, if present. If this empties the
    /// session, the session is destroyed entirely (I4). No-op if `sid`
    /// does not exist or `cid` was not a member.
    pub fn remove_member(&mut self, sid: &str, cid: &str) {
        let Some(session) = self.sessions.get_mut(sid) else { return };
        session.members.retain(|m| m != cid);
        if session.members.is_empty() {
            self.sessions.remove(sid);
        }
    }

    /// Remove `cid` from every session it belongs to, for EXIT / abrupt
    /// disconnect / reaper cleanup. Returns the sessions that were emptied
    /// and consequently destroyed.
    pub fn remove_member_everywhere(&mut self, cid: &str) -> Vec<String> {
        let mut emptied = Vec::new();
        self.sessions.retain(|sid, session| {
            session.members.retain(|m| m != cid);
            if session.members.is_empty() {
                emptied.push(sid.clone());
                false
            } else {
                true
            }
        });
        emptied
    }

    /// Human-readable session listing: `"<sid> (<n> members)"` per line,
    /// sorted by name for determinism.
    #[must_use]
    pub fn list_text(&self) -> String {
        let mut names: Vec<&str> = self.sessions.keys().map(String::as_str).collect();
        names.sort_unstable();

        let mut out = String::new();
        for name in names {
            #[allow(clippy::expect_used)]
            let session = self.sessions.get(name).expect("invariant: name came from keys()");
            out.push_str(&format!("  {} ({} members)\n", name, session.members.len()));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> SessionRegistry {
        SessionRegistry::new(4, 4)
    }

    #[test]
    fn create_then_find() {
        let mut reg = registry();
        reg.create("room1").unwrap();
        assert_eq!(reg.find("room1").unwrap().id(), "room1");
    }

    #[test]
    fn create_duplicate_is_rejected() {
        let mut reg = registry();
        reg.create("room1").unwrap();
        assert_eq!(reg.create("room1"), Err(ConferenceError::SessionAlreadyExists("room1".into())));
    }

    #[test]
    fn create_respects_capacity() {
        let mut reg = SessionRegistry::new(1, 4);
        reg.create("room1").unwrap();
        assert_eq!(reg.create("room2"), Err(ConferenceError::TooManySessions { max: 1 }));
    }

    #[test]
    fn add_member_is_idempotent() {
        let mut reg = registry();
        reg.create("room1").unwrap();
        reg.add_member("room1", "alice").unwrap();
        reg.add_member("room1", "alice").unwrap();
        assert_eq!(reg.find("room1").unwrap().members(), &["alice".to_owned()]);
    }

    #[test]
    fn add_member_unknown_session() {
        let mut reg = registry();
        assert_eq!(
            reg.add_member("ghost", "alice"),
            Err(ConferenceError::SessionNotFound("ghost".into()))
        );
    }

    #[test]
    fn add_member_respects_capacity() {
        let mut reg = SessionRegistry::new(4, 1);
        reg.create("room1").unwrap();
        reg.add_member("room1", "alice").unwrap();
        assert_eq!(
            reg.add_member("room1", "bob"),
            Err(ConferenceError::SessionFull { sid: "room1".into(), max: 1 })
        );
    }

    #[test]
    fn removing_last_member_destroys_session() {
        let mut reg = registry();
        reg.create("room1").unwrap();
        reg.add_member("room1", "alice").unwrap();
        reg.remove_member("room1", "alice");
        assert!(reg.find("room1").is_none());
    }

    #[test]
    fn remove_member_everywhere_reports_emptied_sessions() {
        let mut reg = registry();
        reg.create("room1").unwrap();
        reg.create("room2").unwrap();
        reg.add_member("room1", "alice").unwrap();
        reg.add_member("room2", "alice").unwrap();
        reg.add_member("room2", "bob").unwrap();

        let mut emptied = reg.remove_member_everywhere("alice");
        emptied.sort_unstable();
        assert_eq!(emptied, vec!["room1".to_owned()]);
        assert!(reg.find("room1").is_none());
        assert_eq!(reg.find("room2").unwrap().members(), &["bob".to_owned()]);
    }

    #[test]
    fn list_text_is_sorted() {
        let mut reg = registry();
        reg.create("zeta").unwrap();
        reg.create("alpha").unwrap();
        reg.add_member("zeta", "alice").unwrap();
        assert_eq!(reg.list_text(), "  alpha (0 members)\n  zeta (1 members)\n");
    }
}
