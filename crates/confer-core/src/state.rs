//! Combined registry state and the sans-IO dispatch logic that mutates it.
//!
//! `ServerState` is what the connection handler (H), acceptor (L), and idle
//! reaper (I) all operate on while holding the single global lock. Every
//! method here is synchronous and infallible to call (failures are returned
//! as values, never panics), so the IO-bound driver crate can wrap a call in
//! a mutex guard and nothing here ever awaits.

use std::{net::SocketAddr, time::Duration};

use confer_proto::DATA_LEN;

use crate::{auth::authenticate, client_registry::ClientRegistry, session_registry::SessionRegistry};

/// Result of an attempted login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Login succeeded; the client now occupies this slot.
    Accepted {
        /// Slot index assigned to the new client.
        slot: usize,
    },
    /// Login failed; `reason` is the human-readable NAK text.
    Rejected {
        /// Reason reported back to the client.
        reason: String,
    },
}

/// Result of an attempted JOIN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Newly added to the session.
    Joined,
    /// Already a member; idempotent confirmation, no state change.
    AlreadyMember,
    /// Join failed; `reason` is the human-readable NAK text.
    Failed {
        /// Reason reported back to the client.
        reason: String,
    },
}

/// Result of an attempted NEW_SESS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NewSessionOutcome {
    /// Session created and the requesting client added as its first member.
    Created,
    /// Creation failed; `reason` is the human-readable NAK text.
    Failed {
        /// Reason reported back to the client.
        reason: String,
    },
}

/// Combined client and session registries, plus the operations that mutate
/// both consistently (I1-I6).
#[derive(Debug)]
pub struct ServerState<H, I> {
    clients: ClientRegistry<H, I>,
    sessions: SessionRegistry,
}

impl<H, I: Copy> ServerState<H, I> {
    /// Build empty registries with the given capacities.
    #[must_use]
    pub fn new(max_clients: usize, max_sessions: usize) -> Self {
        Self {
            clients: ClientRegistry::new(max_clients),
            sessions: SessionRegistry::new(max_sessions, max_clients),
        }
    }

    /// Read-only access to the client registry.
    #[must_use]
    pub fn clients(&self) -> &ClientRegistry<H, I> {
        &self.clients
    }

    /// Mutable access to the client registry, for driver code that needs to
    /// reach a handle directly (e.g. to send a NAK before a slot exists).
    pub fn clients_mut(&mut self) -> &mut ClientRegistry<H, I> {
        &mut self.clients
    }

    /// Read-only access to the session registry.
    #[must_use]
    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    /// Acceptor (L) step 3-6: admit or reject a login attempt.
    pub fn login(
        &mut self,
        handle: H,
        id: &str,
        password: &str,
        addr: SocketAddr,
        now: I,
    ) -> LoginOutcome {
        if self.clients.find_by_id(id).is_some() {
            return LoginOutcome::Rejected { reason: "Client ID already in use".to_owned() };
        }
        if !authenticate(id, password) {
            return LoginOutcome::Rejected { reason: "Invalid username/password".to_owned() };
        }
        match self.clients.register(handle, id.to_owned(), addr, now) {
            Ok(slot) => LoginOutcome::Accepted { slot },
            Err(_) => LoginOutcome::Rejected { reason: "Server full".to_owned() },
        }
    }

    /// JOIN dispatch (H).
    pub fn join(&mut self, slot: usize, sid: &str) -> JoinOutcome {
        let Some(client) = self.clients.get(slot) else {
            return JoinOutcome::Failed { reason: format!("{sid}: session not found") };
        };

        if self.sessions.find(sid).is_none() {
            return JoinOutcome::Failed { reason: format!("{sid}: session not found") };
        }
        if client.joined.iter().any(|s| s == sid) {
            return JoinOutcome::AlreadyMember;
        }

        let id = client.id.clone();
        match self.sessions.add_member(sid, &id) {
            Ok(()) => {
                #[allow(clippy::expect_used)]
                let client = self.clients.get_mut(slot).expect("invariant: slot checked above");
                client.joined.push(sid.to_owned());
                JoinOutcome::Joined
            },
            Err(_) => JoinOutcome::Failed { reason: "Session is full or error adding".to_owned() },
        }
    }

    /// LEAVE_SESS dispatch (H): no-op if not a member, no reply either way.
    pub fn leave(&mut self, slot: usize, sid: &str) {
        let Some(client) = self.clients.get_mut(slot) else { return };
        if !client.joined.iter().any(|s| s == sid) {
            return;
        }
        client.joined.retain(|s| s != sid);
        let id = client.id.clone();
        self.sessions.remove_member(sid, &id);
    }

    /// NEW_SESS dispatch (H).
    pub fn new_session(&mut self, slot: usize, sid: &str) -> NewSessionOutcome {
        if let Err(e) = self.sessions.create(sid) {
            let _ = e;
            return NewSessionOutcome::Failed {
                reason: format!("Failed to create session {sid}"),
            };
        }

        let Some(client) = self.clients.get(slot) else {
            return NewSessionOutcome::Failed {
                reason: format!("Failed to create session {sid}"),
            };
        };
        let id = client.id.clone();

        #[allow(clippy::expect_used)]
        self.sessions
            .add_member(sid, &id)
            .expect("invariant: session was just created with room for one member");

        #[allow(clippy::expect_used)]
        let client = self.clients.get_mut(slot).expect("invariant: slot checked above");
        client.joined.push(sid.to_owned());

        NewSessionOutcome::Created
    }

    /// EXIT / abrupt-disconnect / reaper-eviction cleanup: remove `slot`
    /// from every joined session, then free the slot. Returns the freed
    /// record (including its handle) so the caller can close it.
    pub fn exit_client(&mut self, slot: usize) -> Option<crate::client_registry::ClientRecord<H, I>> {
        let joined = self.clients.get(slot)?.joined.clone();
        let id = self.clients.get(slot)?.id.clone();
        for sid in &joined {
            self.sessions.remove_member(sid, &id);
        }
        self.clients.deactivate(slot)
    }

    /// Resolve the active-client slots currently in session `sid`, for
    /// MESSAGE broadcast.
    #[must_use]
    pub fn message_targets(&self, sid: &str) -> Vec<usize> {
        let Some(session) = self.sessions.find(sid) else { return Vec::new() };
        session
            .members()
            .iter()
            .filter_map(|id| self.clients.find_by_id(id))
            .collect()
    }

    /// QUERY dispatch (H): combined user/session listing, capped to the
    /// conferencing frame's 1024-byte data field (the original server's
    /// truncation behavior is preserved; see the design note on lifting it).
    #[must_use]
    pub fn query_text(&self) -> String {
        let mut text = String::from("Users:\n");
        text.push_str(&self.clients.list_text());
        text.push_str("Sessions:\n");
        text.push_str(&self.sessions.list_text());

        if text.len() > DATA_LEN {
            text.truncate(DATA_LEN);
        }
        text
    }

    /// Idle reaper (I) tick: evict every active client whose last activity
    /// is older than `threshold` relative to `now`. Returns the evicted
    /// records (including their handles) so the caller can close them and
    /// log each eviction.
    pub fn reap_idle(
        &mut self,
        now: I,
        threshold: Duration,
    ) -> Vec<crate::client_registry::ClientRecord<H, I>>
    where
        I: std::ops::Sub<Output = Duration>,
    {
        let stale: Vec<usize> = self
            .clients
            .active_slots()
            .filter(|&slot| {
                #[allow(clippy::expect_used)]
                let record = self.clients.get(slot).expect("invariant: slot came from active_slots");
                now - record.last_activity > threshold
            })
            .collect();

        stale.into_iter().filter_map(|slot| self.exit_client(slot)).collect()
    }
}

#[cfg(test)]
mod tests {
    use std::{
        net::{IpAddr, Ipv4Addr},
        time::{Duration, Instant},
    };

    use super::*;

    fn addr() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4000)
    }

    fn login_alice(state: &mut ServerState<u32, Instant>, now: Instant) -> usize {
        match state.login(1, "alice", "12345", addr(), now) {
            LoginOutcome::Accepted { slot } => slot,
            other => panic!("expected accept, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_login_rejected_first_intact() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let now = Instant::now();
        let slot = login_alice(&mut state, now);

        let outcome = state.login(2, "alice", "12345", addr(), now);
        assert_eq!(
            outcome,
            LoginOutcome::Rejected { reason: "Client ID already in use".to_owned() }
        );
        assert_eq!(state.clients().find_by_id("alice"), Some(slot));
    }

    #[test]
    fn bad_password_rejected() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let now = Instant::now();
        assert_eq!(
            state.login(1, "alice", "wrong", addr(), now),
            LoginOutcome::Rejected { reason: "Invalid username/password".to_owned() }
        );
    }

    #[test]
    fn join_twice_is_idempotent() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let now = Instant::now();
        let slot = login_alice(&mut state, now);
        state.sessions.create("room1").unwrap();

        assert_eq!(state.join(slot, "room1"), JoinOutcome::Joined);
        assert_eq!(state.join(slot, "room1"), JoinOutcome::AlreadyMember);
        assert_eq!(state.sessions().find("room1").unwrap().members(), &["alice".to_owned()]);
    }

    #[test]
    fn new_session_then_join_from_second_client() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let now = Instant::now();
        let a = login_alice(&mut state, now);
        let b = match state.login(2, "bob", "hunter2", addr(), now) {
            LoginOutcome::Accepted { slot } => slot,
            other => panic!("expected accept, got {other:?}"),
        };

        assert_eq!(state.new_session(a, "room1"), NewSessionOutcome::Created);
        assert_eq!(state.join(b, "room1"), JoinOutcome::Joined);

        let mut members = state.sessions().find("room1").unwrap().members().to_vec();
        members.sort_unstable();
        assert_eq!(members, vec!["alice".to_owned(), "bob".to_owned()]);
    }

    #[test]
    fn leave_when_not_member_is_noop() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let now = Instant::now();
        let slot = login_alice(&mut state, now);
        state.sessions.create("room1").unwrap();

        state.leave(slot, "room1");
        assert!(state.sessions().find("room1").is_some());
    }

    #[test]
    fn exit_removes_from_all_sessions_and_frees_slot() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let now = Instant::now();
        let slot = login_alice(&mut state, now);
        state.new_session(slot, "room1");

        let record = state.exit_client(slot).unwrap();
        assert_eq!(record.id, "alice");
        assert!(state.sessions().find("room1").is_none());
        assert_eq!(state.clients().find_by_id("alice"), None);
    }

    #[test]
    fn message_targets_limited_to_session_members() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let now = Instant::now();
        let a = login_alice(&mut state, now);
        let b = match state.login(2, "bob", "hunter2", addr(), now) {
            LoginOutcome::Accepted { slot } => slot,
            other => panic!("expected accept, got {other:?}"),
        };
        state.new_session(a, "r1");
        state.new_session(b, "r2");

        assert_eq!(state.message_targets("r1"), vec![a]);
        assert_eq!(state.message_targets("r2"), vec![b]);
    }

    #[test]
    fn reap_idle_evicts_stale_clients_and_their_sessions() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let t0 = Instant::now();
        let slot = login_alice(&mut state, t0);
        state.new_session(slot, "room1");

        let t1 = t0 + Duration::from_secs(61);
        let evicted = state.reap_idle(t1, Duration::from_secs(60));

        assert_eq!(evicted.len(), 1);
        assert_eq!(evicted[0].id, "alice");
        assert!(state.sessions().find("room1").is_none());
        assert_eq!(state.clients().find_by_id("alice"), None);
    }

    #[test]
    fn reap_idle_leaves_active_clients() {
        let mut state: ServerState<u32, Instant> = ServerState::new(4, 4);
        let t0 = Instant::now();
        login_alice(&mut state, t0);

        let t1 = t0 + Duration::from_secs(30);
        let evicted = state.reap_idle(t1, Duration::from_secs(60));
        assert!(evicted.is_empty());
    }
}
