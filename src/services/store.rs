use async_trait::async_trait;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use crate::models::Profile;

/// Errors that can occur when loading profiles
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Decode error: {0}")]
    DecodeError(#[from] serde_json::Error),
}

/// Source of profiles for the matching engine
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Load one profile; `Ok(None)` when the id is unknown
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>, StoreError>;

    /// Load every candidate except `excluding`
    async fn fetch_candidate_pool(
        &self,
        excluding: &str,
        active_only: bool,
    ) -> Result<Vec<Profile>, StoreError>;

    async fn health_check(&self) -> bool {
        true
    }
}

const PROFILE_COLUMNS: &str = r#"
    id, first_name, last_name, middle_name, maiden_name, father_name, mother_name,
    gender, birth_date, location, profession, cultural_background, family_origin,
    interests, known_connections, signup_at, has_genetic_markers, is_active, schema_version
"#;

/// Profile store backed by a PostgreSQL `profiles` table
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    /// Connect with a bounded pool
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        tracing::info!("Connected to PostgreSQL profile store");
        Ok(Self { pool })
    }

    fn row_to_profile(row: &PgRow) -> Result<Profile, sqlx::Error> {
        Ok(Profile {
            id: row.try_get("id")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            middle_name: row.try_get("middle_name")?,
            maiden_name: row.try_get("maiden_name")?,
            father_name: row.try_get("father_name")?,
            mother_name: row.try_get("mother_name")?,
            gender: row.try_get("gender")?,
            birth_date: row.try_get("birth_date")?,
            location: row.try_get("location")?,
            profession: row.try_get("profession")?,
            cultural_background: row.try_get("cultural_background")?,
            family_origin: row.try_get("family_origin")?,
            interests: row.try_get::<Option<Vec<String>>, _>("interests")?.unwrap_or_default(),
            known_connections: row
                .try_get::<Option<Vec<String>>, _>("known_connections")?
                .unwrap_or_default(),
            signup_at: row.try_get("signup_at")?,
            has_genetic_markers: row.try_get::<Option<bool>, _>("has_genetic_markers")?.unwrap_or(false),
            is_active: row.try_get::<Option<bool>, _>("is_active")?.unwrap_or(true),
            schema_version: row
                .try_get::<Option<i16>, _>("schema_version")?
                .and_then(|v| u16::try_from(v).ok())
                .unwrap_or(1),
        })
    }
}

#[async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        let query = format!("SELECT {} FROM profiles WHERE id = $1", PROFILE_COLUMNS);

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        Ok(row.as_ref().map(Self::row_to_profile).transpose()?)
    }

    async fn fetch_candidate_pool(
        &self,
        excluding: &str,
        active_only: bool,
    ) -> Result<Vec<Profile>, StoreError> {
        let query = format!(
            "SELECT {} FROM profiles WHERE id <> $1 AND ($2 = FALSE OR COALESCE(is_active, TRUE))",
            PROFILE_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(excluding)
            .bind(active_only)
            .fetch_all(&self.pool)
            .await?;

        let profiles = rows
            .iter()
            .map(Self::row_to_profile)
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!("Loaded {} candidates excluding {}", profiles.len(), excluding);
        Ok(profiles)
    }

    async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await.is_ok()
    }
}

/// Profile store held in memory, for tests and file-seeded deployments
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileStore {
    pub fn new(profiles: impl IntoIterator<Item = Profile>) -> Self {
        Self {
            profiles: RwLock::new(profiles.into_iter().map(|p| (p.id.clone(), p)).collect()),
        }
    }

    /// Load a JSON array of profiles; unknown fields are ignored
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let profiles: Vec<Profile> = serde_json::from_str(&raw)?;
        Ok(Self::new(profiles))
    }

    pub async fn insert(&self, profile: Profile) {
        self.profiles.write().await.insert(profile.id.clone(), profile);
    }

    pub async fn len(&self) -> usize {
        self.profiles.read().await.len()
    }
}

#[async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profile(&self, id: &str) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn fetch_candidate_pool(
        &self,
        excluding: &str,
        active_only: bool,
    ) -> Result<Vec<Profile>, StoreError> {
        let profiles = self.profiles.read().await;
        let mut pool: Vec<Profile> = profiles
            .values()
            .filter(|p| p.id != excluding && (!active_only || p.is_active))
            .cloned()
            .collect();
        // HashMap order is random; keep the pool stable for callers
        pool.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_profile(id: &str, active: bool) -> Profile {
        let mut profile = Profile::new(id);
        profile.last_name = Some("Smith".to_string());
        profile.is_active = active;
        profile
    }

    #[tokio::test]
    async fn test_in_memory_pool_excludes_target_and_inactive() {
        let store = InMemoryProfileStore::new(vec![
            create_test_profile("a", true),
            create_test_profile("b", true),
            create_test_profile("c", false),
        ]);

        let pool = store.fetch_candidate_pool("a", true).await.unwrap();
        let ids: Vec<&str> = pool.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);

        let everyone = store.fetch_candidate_pool("a", false).await.unwrap();
        assert_eq!(everyone.len(), 2);
    }

    #[tokio::test]
    async fn test_in_memory_fetch_profile() {
        let store = InMemoryProfileStore::default();
        assert!(store.fetch_profile("missing").await.unwrap().is_none());

        store.insert(create_test_profile("x", true)).await;
        assert_eq!(store.len().await, 1);
        assert!(store.fetch_profile("x").await.unwrap().is_some());
    }

    #[test]
    fn test_json_seed_file_loads_profiles() {
        let path = std::env::temp_dir().join(format!("kindred-seed-{}.json", std::process::id()));
        std::fs::write(&path, r#"[{"id": "s1", "last_name": "Hassan"}, {"id": "s2"}]"#).unwrap();

        let store = InMemoryProfileStore::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(tokio_test::block_on(store.len()), 2);
        let profile = tokio_test::block_on(store.fetch_profile("s1")).unwrap().unwrap();
        assert_eq!(profile.last_name.as_deref(), Some("Hassan"));
        assert!(profile.is_active);
    }

    #[tokio::test]
    #[ignore = "Requires PostgreSQL"]
    async fn test_postgres_health_check() {
        let store = PostgresProfileStore::new("postgres://localhost/kindred", 2, 1)
            .await
            .expect("Failed to connect");
        assert!(store.health_check().await);
    }
}
