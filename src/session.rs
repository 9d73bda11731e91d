//! Session and identity boundary.

/// An authenticated identity supplied by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Stable user identifier.
    pub id: String,
    /// Opaque token scoping cached data to this user.
    pub token: String,
}

/// Supplies a stable per-session id and, when authentication is enabled, the
/// current identity. Implemented by the embedding application; the compiled
/// layout carries hidden session/user markers and the cache layer interposes
/// the identity token into its keys so cached data never leaks across users.
pub trait SessionProvider: Send + Sync {
    fn session_id(&self) -> String;

    fn current_identity(&self) -> Option<Identity> {
        None
    }
}
