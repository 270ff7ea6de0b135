use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Participant,
    Organizer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Participant => "participant",
            Role::Organizer => "organizer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "participant" => Ok(Role::Participant),
            "organizer" => Ok(Role::Organizer),
            "admin" => Ok(Role::Admin),
            other => Err(CoreError::IdentityError(format!("unknown role: {}", other))),
        }
    }
}

/// The authenticated caller, as supplied by the identity provider.
///
/// Passed explicitly into every protocol call; nothing in the workspace reads
/// the current user from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
}

impl Identity {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn participant(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Participant)
    }

    pub fn organizer(user_id: Uuid) -> Self {
        Self::new(user_id, Role::Organizer)
    }

    /// Organizers and admins browse but never book
    pub fn can_book(&self) -> bool {
        self.role == Role::Participant
    }
}

/// Public profile shown on participant lists and rosters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub full_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub role: Role,
}

impl UserProfile {
    /// The row provisioned for a user who has never edited their profile
    pub fn blank(identity: &Identity) -> Self {
        Self {
            id: identity.user_id,
            full_name: None,
            avatar_url: None,
            bio: None,
            role: identity.role,
        }
    }

    pub fn apply(&mut self, patch: &ProfilePatch) {
        if let Some(full_name) = &patch.full_name {
            self.full_name = full_name.clone();
        }
        if let Some(bio) = &patch.bio {
            self.bio = bio.clone();
        }
        if let Some(avatar_url) = &patch.avatar_url {
            self.avatar_url = avatar_url.clone();
        }
    }
}

/// Self-service profile edit; `Some(None)` clears a field.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfilePatch {
    #[serde(default, deserialize_with = "crate::tour::explicit_null")]
    pub full_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::tour::explicit_null")]
    pub bio: Option<Option<String>>,
    #[serde(default, deserialize_with = "crate::tour::explicit_null")]
    pub avatar_url: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && self.bio.is_none() && self.avatar_url.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("organizer".parse::<Role>().unwrap(), Role::Organizer);
        assert!("guest".parse::<Role>().is_err());
    }

    #[test]
    fn test_only_participants_book() {
        let id = Uuid::new_v4();
        assert!(Identity::participant(id).can_book());
        assert!(!Identity::organizer(id).can_book());
        assert!(!Identity::new(id, Role::Admin).can_book());
    }

    #[test]
    fn test_profile_patch_sets_clears_and_skips() {
        let me = Identity::organizer(Uuid::new_v4());
        let mut profile = UserProfile::blank(&me);
        profile.bio = Some("Breathwork teacher".to_string());
        profile.avatar_url = Some("https://cdn.example/a.png".to_string());

        let patch: ProfilePatch = serde_json::from_str(r#"{"full_name": "Asha", "avatar_url": null}"#).unwrap();
        assert!(!patch.is_empty());
        profile.apply(&patch);

        assert_eq!(profile.full_name.as_deref(), Some("Asha"));
        assert_eq!(profile.avatar_url, None);
        assert_eq!(profile.bio.as_deref(), Some("Breathwork teacher"));
        assert_eq!(profile.role, Role::Organizer);
        assert!(ProfilePatch::default().is_empty());
    }
}
