mod message_link;

pub use message_link::{LinkType, MessageLink, NewLink};

use chrono::{DateTime, Duration, Utc};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: i64,
    pub discord_user: u64,
}

/// OAuth token pair for one account. The music service client refreshes the
/// access token itself, this is only what was last stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub account: i64,
    pub refresh_token: String,
    pub access_token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

/// A guild member's registration of a destination playlist. An empty playlist
/// means the member authorized but never registered one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscriber {
    pub id: i64,
    pub guild: u64,
    pub account: i64,
    pub playlist: String,
    pub credential: Option<Credential>,
}

impl Subscriber {
    #[inline]
    pub fn has_playlist(&self) -> bool {
        !self.playlist.is_empty()
    }
}

/// How long an authorization link stays usable.
pub const AUTH_REQUEST_TTL_MINUTES: i64 = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub state: String,
    pub account: i64,
    pub created_at: DateTime<Utc>,
}

impl AuthRequest {
    /// Requests created before this are stale at `now`.
    #[inline]
    pub fn expiry_cutoff(now: DateTime<Utc>) -> DateTime<Utc> {
        now - Duration::minutes(AUTH_REQUEST_TTL_MINUTES)
    }

    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.created_at < AuthRequest::expiry_cutoff(now)
    }
}
