//! Capacity limits enforced by the registries (I6).

/// Maximum number of simultaneously active clients, and the maximum number
/// of members a single session may hold.
pub const MAX_CLIENTS: usize = 64;

/// Maximum number of simultaneously existing sessions, and the maximum
/// number of sessions a single client may be joined to at once.
pub const MAX_SESSIONS: usize = 64;
