use chrono::{DateTime, Duration, Utc};
use rand::{distr::Alphanumeric, Rng};

use super::{SessionData, SessionId};

/// Generate a cryptographically random session ID.
pub fn generate_session_id() -> SessionId {
    let id: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect();
    SessionId::new(id)
}

/// Check if a session has expired.
pub fn is_session_expired(session: &SessionData, now: DateTime<Utc>) -> bool {
    session.expires_at <= now
}

/// Calculate session expiry from creation time and TTL.
///
/// Returns `None` when the expiry falls outside the representable range.
pub fn calculate_expiry(created_at: DateTime<Utc>, ttl: Duration) -> Option<DateTime<Utc>> {
    created_at.checked_add_signed(ttl)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_session_id_produces_32_char_alphanumeric() {
        let id = generate_session_id();
        assert_eq!(id.as_str().len(), 32);
        assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn generate_session_id_is_unique() {
        assert_ne!(generate_session_id(), generate_session_id());
    }

    #[test]
    fn is_session_expired_returns_false_for_future_expiry() {
        let now = Utc::now();
        let session = SessionData::new(now, now + Duration::hours(1));
        assert!(!is_session_expired(&session, now));
    }

    #[test]
    fn is_session_expired_returns_true_at_exact_expiry() {
        let now = Utc::now();
        let session = SessionData::new(now - Duration::hours(1), now);
        assert!(is_session_expired(&session, now));
    }

    #[test]
    fn calculate_expiry_adds_ttl_to_created_at() {
        let created = Utc::now();
        let ttl = Duration::days(14);
        assert_eq!(calculate_expiry(created, ttl), Some(created + ttl));
    }

    #[test]
    fn calculate_expiry_out_of_range_is_none() {
        assert_eq!(calculate_expiry(Utc::now(), Duration::MAX), None);
    }
}
