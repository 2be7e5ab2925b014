//! Client registry (R): active logged-in principals and their transport
//! handles, joined-session lists, and last-activity timestamps.
//!
//! Generic over the transport handle type `H` and the [`crate::Environment`]
//! instant type `I`, so this crate never touches an actual socket: the
//! driver crate supplies `H` (its connection/writer handle) and `I`
//! (`Environment::Instant`).

use std::net::SocketAddr;

use crate::error::{ConferenceError, Result};

/// One active client's state.
#[derive(Debug)]
pub struct ClientRecord<H, I> {
    /// Transport handle used to send frames to this client.
    pub handle: H,
    /// Authenticated principal ID, unique among active clients (I1).
    pub id: String,
    /// Remote address the connection arrived from.
    pub addr: SocketAddr,
    /// Session IDs this client currently belongs to (I2), in join order.
    pub joined: Vec<String>,
    /// Last time this client was observed sending a frame.
    pub last_activity: I,
}

/// Catalog of active clients, keyed by slot index.
///
/// A `None` slot is a free one; `find_free_slot` / capacity are expressed in
/// terms of slot occupancy rather than a separate `active` flag, since the
/// two are equivalent: an inactive client has nothing left to reference it
/// by id or iterate over and is simply removed from its slot.
#[derive(Debug)]
pub struct ClientRegistry<H, I> {
    slots: Vec<Option<ClientRecord<H, I>>>,
}

impl<H, I: Copy> ClientRegistry<H, I> {
    /// Build a registry with room for `capacity` simultaneous clients.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self { slots: (0..capacity).map(|_| None).collect() }
    }

    /// Total slot capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Index of the first free slot, if any.
    #[must_use]
    pub fn find_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Slot index of the active client with principal ID `id`, if any.
    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<usize> {
        self.slots.iter().position(|slot| slot.as_ref().is_some_and(|r| r.id == id))
    }

    /// Record at `slot`, if occupied.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&ClientRecord<H, I>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Mutable record at `slot`, if occupied.
    pub fn get_mut(&mut self, slot: usize) -> Option<&mut ClientRecord<H, I>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    /// Register a newly logged-in client into a free slot.
    ///
    /// # Errors
    ///
    /// [`ConferenceError::ServerFull`] if no slot is free.
    pub fn register(&mut self, handle: H, id: String, addr: SocketAddr, now: I) -> Result<usize> {
        let slot = self
            .find_free_slot()
            .ok_or(ConferenceError::ServerFull { max: self.slots.len() })?;
        self.slots[slot] =
            Some(ClientRecord { handle, id, addr, joined: Vec::new(), last_activity: now });
        Ok(slot)
    }

    /// Free `slot`, returning the record that was there (including its
    /// handle, for the caller to close). The caller is responsible for
    /// removing this client from any sessions first.
    pub fn deactivate(&mut self, slot: usize) -> Option<ClientRecord<H, I>> {
        self.slots.get_mut(slot).and_then(Option::take)
    }

    /// Refresh `slot`'s last-activity timestamp to `now`.
    pub fn touch(&mut self, slot: usize, now: I) {
        if let Some(record) = self.get_mut(slot) {
            record.last_activity = now;
        }
    }

    /// Slot indices of every currently active client.
    pub fn active_slots(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().enumerate().filter_map(|(i, s)| s.is_some().then_some(i))
    }

    /// Number of currently active clients.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active_slots().count()
    }

    /// Human-readable client listing: `"  <id>"` per line, sorted by id for
    /// determinism.
    #[must_use]
    pub fn list_text(&self) -> String {
        let mut ids: Vec<&str> =
            self.active_slots().filter_map(|s| self.get(s)).map(|r| r.id.as_str()).collect();
        ids.sort_unstable();

        let mut out = String::new();
        for id in ids {
            out.push_str(&format!("  {id}\n"));
        }
        out
    }
}
