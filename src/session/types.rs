use serde::{Deserialize, Serialize};

/// Claims of the signed session token. Only the session id travels to the
/// client; the user it belongs to is resolved server-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub session_id: String,
    pub exp: usize, // Expiration timestamp (standard JWT claim)
    pub iat: usize, // Issued at timestamp (standard JWT claim)
}

/// A freshly created session, ready to be handed to the client
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session_id: String,
    pub token: String,
    pub max_age_secs: i64,
}
