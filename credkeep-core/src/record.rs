//! Durable representation of a stored credential.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::{Credential, Secret};

/// A credential record as held by a persistence engine.
///
/// Records are keyed by `user_id`; an engine holds at most one record per
/// user. `object_id` and `version` belong to the engine: the identity is fixed
/// when the record is created and the version is advanced by the engine on
/// every update. [`update_from`](Self::update_from) leaves both untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedCredential {
    /// Primary key.
    pub user_id: String,

    /// Engine-assigned identity.
    pub object_id: Uuid,

    /// Engine-managed revision, starting at 1.
    pub version: u64,

    pub access_token: Option<Secret>,

    pub refresh_token: Option<Secret>,

    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub scopes: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl PersistedCredential {
    /// Build a fresh record for `user_id` from the given credential.
    pub fn new(user_id: impl Into<String>, credential: &Credential) -> Self {
        let now = Utc::now();
        Self {
            user_id: user_id.into(),
            object_id: Uuid::new_v4(),
            version: 1,
            access_token: credential.access_token.clone(),
            refresh_token: credential.refresh_token.clone(),
            expires_at: credential.expires_at,
            scopes: credential.scopes.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy the credential's fields into this record in place.
    pub fn update_from(&mut self, credential: &Credential) {
        self.access_token = credential.access_token.clone();
        self.refresh_token = credential.refresh_token.clone();
        self.expires_at = credential.expires_at;
        self.scopes = credential.scopes.clone();
        self.updated_at = Utc::now();
    }

    /// Overwrite every field of `credential` with the persisted values.
    pub fn load_into(&self, credential: &mut Credential) {
        credential.access_token = self.access_token.clone();
        credential.refresh_token = self.refresh_token.clone();
        credential.expires_at = self.expires_at;
        credential.scopes = self.scopes.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Credential {
        Credential::new()
            .with_access_token("access-1")
            .with_refresh_token("refresh-1")
            .with_expires_in_seconds(3600)
            .unwrap()
            .with_scopes(vec!["email".to_string()])
    }

    #[test]
    fn test_new_record_copies_fields() {
        let credential = sample();
        let record = PersistedCredential::new("alice", &credential);

        assert_eq!(record.user_id, "alice");
        assert_eq!(record.version, 1);
        assert_eq!(record.access_token, credential.access_token);
        assert_eq!(record.refresh_token, credential.refresh_token);
        assert_eq!(record.expires_at, credential.expires_at);
        assert_eq!(record.scopes, credential.scopes);
    }

    #[test]
    fn test_update_preserves_identity() {
        let mut record = PersistedCredential::new("alice", &sample());
        let object_id = record.object_id;
        let created_at = record.created_at;

        let replacement = Credential::new().with_access_token("access-2");
        record.update_from(&replacement);

        assert_eq!(record.object_id, object_id);
        assert_eq!(record.version, 1);
        assert_eq!(record.created_at, created_at);
        assert_eq!(record.access_token, Some(Secret::new("access-2")));
        assert!(record.refresh_token.is_none());
        assert!(record.scopes.is_empty());
    }

    #[test]
    fn test_load_into_overwrites_every_field() {
        let record = PersistedCredential::new("alice", &Credential::new().with_access_token("a"));
        let mut target = sample();

        record.load_into(&mut target);

        assert_eq!(target, Credential::new().with_access_token("a"));
    }

    #[test]
    fn test_record_json_shape() {
        let record = PersistedCredential::new("alice", &sample());
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["user_id"], "alice");
        assert_eq!(value["access_token"], "access-1");
        assert_eq!(value["version"], 1);
    }
}
