//! Static credential check (A).
//!
//! Byte-equal lookup against a compiled-in user table. No hashing, no
//! timing-side-channel protection — both are explicitly out of scope.

/// Compiled-in `(username, password)` table.
const USERS: &[(&str, &str)] = &[
    ("alice", "12345"),
    ("bob", "hunter2"),
    ("carol", "swordfish"),
];

/// Check `username`/`password` against the static table as opaque byte
/// strings.
#[must_use]
pub fn authenticate(username: &str, password: &str) -> bool {
    USERS.iter().any(|&(u, p)| u.as_bytes() == username.as_bytes() && p.as_bytes() == password.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_pair() {
        assert!(authenticate("alice", "12345"));
    }

    #[test]
    fn rejects_wrong_password() {
        assert!(!authenticate("alice", "wrong"));
    }

    #[test]
    fn rejects_unknown_user() {
        assert!(!authenticate("mallory", "12345"));
    }

    #[test]
    fn is_case_and_byte_sensitive() {
        assert!(!authenticate("Alice", "12345"));
    }
}
