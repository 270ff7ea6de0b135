use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use soultrip_core::{
    CoreError, Identity, ProfilePatch, ProfileRepository, StoreError, StoreResult, UserProfile,
};
use uuid::Uuid;

use crate::database::classify;

const PROFILE_COLUMNS: &str = "id, full_name, avatar_url, bio, role";

pub struct PgProfileRepository {
    pool: PgPool,
}

impl PgProfileRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    full_name: Option<String>,
    avatar_url: Option<String>,
    bio: Option<String>,
    role: String,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        Ok(UserProfile {
            id: row.id,
            full_name: row.full_name,
            avatar_url: row.avatar_url,
            bio: row.bio,
            role: row.role.parse().map_err(|e: CoreError| StoreError::Other(e.to_string()))?,
        })
    }
}

/// `None` for an empty patch, which has nothing to write
fn profile_update(id: Uuid, patch: &ProfilePatch) -> Option<QueryBuilder<'static, Postgres>> {
    if patch.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE users SET ");
    let mut set = qb.separated(", ");
    if let Some(full_name) = &patch.full_name {
        set.push("full_name = ").push_bind_unseparated(full_name.clone());
    }
    if let Some(bio) = &patch.bio {
        set.push("bio = ").push_bind_unseparated(bio.clone());
    }
    if let Some(avatar_url) = &patch.avatar_url {
        set.push("avatar_url = ").push_bind_unseparated(avatar_url.clone());
    }
    qb.push(" WHERE id = ").push_bind(id);
    qb.push(" RETURNING ").push(PROFILE_COLUMNS);
    Some(qb)
}

#[async_trait]
impl ProfileRepository for PgProfileRepository {
    async fn get_profiles(&self, ids: &[Uuid]) -> StoreResult<Vec<UserProfile>> {
        let rows = sqlx::query_as::<_, ProfileRow>(&format!(
            "SELECT {} FROM users WHERE id = ANY($1)",
            PROFILE_COLUMNS
        ))
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(classify)?;

        rows.into_iter().map(UserProfile::try_from).collect()
    }

    async fn ensure_profile(&self, identity: &Identity) -> StoreResult<UserProfile> {
        sqlx::query("INSERT INTO users (id, role) VALUES ($1, $2) ON CONFLICT (id) DO NOTHING")
            .bind(identity.user_id)
            .bind(identity.role.as_str())
            .execute(&self.pool)
            .await
            .map_err(classify)?;

        let row = sqlx::query_as::<_, ProfileRow>(&format!("SELECT {} FROM users WHERE id = $1", PROFILE_COLUMNS))
            .bind(identity.user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        row.try_into()
    }

    async fn update_profile(&self, id: Uuid, patch: &ProfilePatch) -> StoreResult<Option<UserProfile>> {
        let Some(mut qb) = profile_update(id, patch) else {
            return self.get_profile(id).await;
        };

        let row = qb
            .build_query_as::<ProfileRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(classify)?;
        row.map(UserProfile::try_from).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_sql_shape() {
        let patch = ProfilePatch {
            full_name: Some(Some("Asha".to_string())),
            bio: Some(None),
            avatar_url: None,
        };
        let qb = profile_update(Uuid::new_v4(), &patch).unwrap();
        assert_eq!(
            qb.sql(),
            "UPDATE users SET full_name = $1, bio = $2 WHERE id = $3 RETURNING id, full_name, avatar_url, bio, role"
        );
    }

    #[test]
    fn test_empty_profile_update_writes_nothing() {
        assert!(profile_update(Uuid::new_v4(), &ProfilePatch::default()).is_none());
    }

    #[test]
    fn test_unknown_role_is_a_storage_error() {
        let row = ProfileRow {
            id: Uuid::new_v4(),
            full_name: None,
            avatar_url: None,
            bio: None,
            role: "guest".to_string(),
        };
        assert!(matches!(UserProfile::try_from(row), Err(StoreError::Other(_))));
    }
}
