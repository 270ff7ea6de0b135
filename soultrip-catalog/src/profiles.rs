use soultrip_core::{Identity, ProfilePatch, ProfileRepository, UserProfile};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::{CatalogError, CatalogResult};

// Trimmed; a blank value clears the field
fn normalize(field: &mut Option<Option<String>>) {
    if let Some(value) = field {
        *value = value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string);
    }
}

/// Public profiles and the caller's own profile edits
pub struct ProfileManager {
    profiles: Arc<dyn ProfileRepository>,
}

impl ProfileManager {
    pub fn new(profiles: Arc<dyn ProfileRepository>) -> Self {
        Self { profiles }
    }

    pub async fn public(&self, id: Uuid) -> CatalogResult<UserProfile> {
        self.profiles
            .get_profile(id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("profile {}", id)))
    }

    /// Makes sure the caller has a user row before anything references it
    pub async fn provision(&self, identity: &Identity) -> CatalogResult<UserProfile> {
        Ok(self.profiles.ensure_profile(identity).await?)
    }

    pub async fn update_own(&self, identity: &Identity, mut patch: ProfilePatch) -> CatalogResult<UserProfile> {
        normalize(&mut patch.full_name);
        normalize(&mut patch.bio);
        normalize(&mut patch.avatar_url);

        self.provision(identity).await?;
        let profile = self
            .profiles
            .update_profile(identity.user_id, &patch)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("profile {}", identity.user_id)))?;

        info!("Profile {} updated", profile.id);
        Ok(profile)
    }
}
