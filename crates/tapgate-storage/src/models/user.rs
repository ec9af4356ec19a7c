use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tapgate_core::BadgeId;

/// User account with an assigned badge
///
/// Users are provisioned out of band (admin tooling or seed scripts); the
/// ingestion pipeline only ever reads them. A scan is attributed to a user
/// by looking up the badge UID, and the user must be active for the scan
/// to count as a successful attendance event.
///
/// # Fields
///
/// * `id` - Auto-increment primary key
/// * `full_name` - Display name sent back to the device on a successful scan
/// * `badge_uid` - Badge UID bound to this user (unique)
/// * `email` - Login identifier for the admin surface (unique)
/// * `password_hash` - Credential hash, never exposed through the pipeline
/// * `is_active` - Inactive users are rejected with `USER_NOT_ACTIVE`
/// * `is_admin` - Whether the user may issue device control commands
/// * `created_at` - Row creation timestamp
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Auto-increment primary key
    pub id: i64,

    /// Display name sent back to the device on a successful scan
    pub full_name: String,

    /// Badge UID bound to this user
    ///
    /// Stored as raw TEXT; use `badge()` for the validated form.
    pub badge_uid: String,

    /// Login identifier for the admin surface
    pub email: String,

    /// Credential hash, never exposed through the pipeline
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Whether scans by this user are accepted
    pub is_active: bool,

    /// Whether the user may issue device control commands
    pub is_admin: bool,

    /// Row creation timestamp
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Get the badge UID as a validated [`BadgeId`]
    ///
    /// # Errors
    /// Returns an error if the stored value no longer satisfies badge
    /// validation rules (only possible after manual database edits).
    pub fn badge(&self) -> tapgate_core::Result<BadgeId> {
        BadgeId::new(&self.badge_uid)
    }

    /// Check whether scans by this user should be accepted
    pub fn is_active(&self) -> bool {
        self.is_active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: 7,
            full_name: "Ada Lovelace".to_string(),
            badge_uid: "04A1B2C3".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: "hash".to_string(),
            is_active: true,
            is_admin: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_badge_accessor_validates() {
        let user = sample_user();
        assert_eq!(user.badge().unwrap().as_str(), "04A1B2C3");

        let mut broken = sample_user();
        broken.badge_uid = String::new();
        assert!(broken.badge().is_err());
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["full_name"], "Ada Lovelace");
    }
}
