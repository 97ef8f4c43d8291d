//! Identity boundary: which client is active and how to send them back to login.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::models::ClientId;

/// Source of the active session's client identity.
pub trait IdentityProvider: Send + Sync {
    /// The stored client identifier, or `None` when no session is active.
    fn client_id(&self) -> Option<ClientId>;

    /// Ends the session and hands control to the login boundary.
    fn redirect_to_login(&self);
}

/// Identity fixed at startup from a stored identifier string.
#[derive(Debug, Default)]
pub struct StaticIdentity {
    client_id: Option<ClientId>,
    redirected: AtomicBool,
}

impl StaticIdentity {
    pub fn new(client_id: Option<ClientId>) -> Self {
        Self {
            client_id,
            redirected: AtomicBool::new(false),
        }
    }

    /// Builds the identity from a stored identifier such as `"8625"`.
    pub fn from_stored(stored: Option<&str>) -> Self {
        Self::new(stored.and_then(parse_client_id))
    }

    /// True once the session has been sent back to the login boundary.
    pub fn redirect_requested(&self) -> bool {
        self.redirected.load(Ordering::SeqCst)
    }
}

impl IdentityProvider for StaticIdentity {
    fn client_id(&self) -> Option<ClientId> {
        self.client_id
    }

    fn redirect_to_login(&self) {
        tracing::info!("Session ended, redirecting to login");
        self.redirected.store(true, Ordering::SeqCst);
    }
}

/// Parses a stored identifier the way a lenient integer parse would: optional
/// sign, then leading digits; anything after the digits is ignored.
pub fn parse_client_id(stored: &str) -> Option<ClientId> {
    let trimmed = stored.trim_start();
    let (sign, rest) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    digits.parse::<ClientId>().ok().map(|id| id * sign)
}
