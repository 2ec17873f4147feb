//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `ComicStore`, `PreferencesStore` and `InteractionStore` ports from the
//! `core` crate. It handles all interactions with the PostgreSQL database using
//! `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use comic_courier_core::domain::{
    Comic, Explanation, InteractionEvent, PreferencesUpdate, UserPreferences,
};
use comic_courier_core::ports::{
    ComicStore, InteractionStore, PortError, PortResult, PreferencesStore,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct ComicRecord {
    num: i32,
    title: String,
    img: String,
    alt: String,
    date_fetched: DateTime<Utc>,
}
impl ComicRecord {
    fn to_domain(self) -> Comic {
        Comic {
            num: self.num,
            title: self.title,
            img: self.img,
            alt: self.alt,
            date_fetched: self.date_fetched,
        }
    }
}

#[derive(FromRow)]
struct ExplanationRecord {
    comic_num: i32,
    content: String,
    updated_at: DateTime<Utc>,
}
impl ExplanationRecord {
    fn to_domain(self) -> Explanation {
        Explanation {
            comic_num: self.comic_num,
            content: self.content,
            updated_at: self.updated_at,
        }
    }
}

#[derive(FromRow)]
struct PreferencesRecord {
    display_mode: String,
    random_range: i32,
}

//=========================================================================================
// `ComicStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl ComicStore for DbAdapter {
    async fn comic(&self, num: i32) -> PortResult<Option<Comic>> {
        let record = sqlx::query_as::<_, ComicRecord>(
            "SELECT num, title, img, alt, date_fetched FROM comics WHERE num = $1",
        )
        .bind(num)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(ComicRecord::to_domain))
    }

    async fn insert_comic(&self, comic: &Comic) -> PortResult<()> {
        // Cache entries are immutable, so a concurrent duplicate write
        // degrades to a no-op rather than an error.
        sqlx::query(
            "INSERT INTO comics (num, title, img, alt, date_fetched) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (num) DO NOTHING",
        )
        .bind(comic.num)
        .bind(&comic.title)
        .bind(&comic.img)
        .bind(&comic.alt)
        .bind(comic.date_fetched)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }

    async fn explanation(&self, num: i32) -> PortResult<Option<Explanation>> {
        let record = sqlx::query_as::<_, ExplanationRecord>(
            "SELECT comic_num, content, updated_at FROM explanations WHERE comic_num = $1",
        )
        .bind(num)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(record.map(ExplanationRecord::to_domain))
    }
}

//=========================================================================================
// `PreferencesStore` Trait Implementation
//=========================================================================================

impl DbAdapter {
    /// Fails with `UserNotFound` unless a user record exists.
    async fn require_user<'e, E>(executor: E, user_id: Uuid) -> PortResult<()>
    where
        E: sqlx::Executor<'e, Database = sqlx::Postgres>,
    {
        let found = sqlx::query_scalar::<_, Uuid>("SELECT user_id FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(executor)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        match found {
            Some(_) => Ok(()),
            None => Err(PortError::UserNotFound(format!("user {user_id} not found"))),
        }
    }
}

#[async_trait]
impl PreferencesStore for DbAdapter {
    async fn preferences(&self, user_id: Uuid) -> PortResult<UserPreferences> {
        Self::require_user(&self.pool, user_id).await?;

        // The preferences row is created lazily with defaults the first time
        // an existing user is looked up.
        sqlx::query(
            "INSERT INTO user_preferences (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let record = sqlx::query_as::<_, PreferencesRecord>(
            "SELECT display_mode, random_range FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let favorites = sqlx::query_scalar::<_, i32>(
            "SELECT comic_num FROM favorites WHERE user_id = $1 ORDER BY added_at, comic_num",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        let recent_views = sqlx::query_scalar::<_, i32>(
            "SELECT comic_num FROM view_history WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Ok(UserPreferences {
            user_id,
            favorites,
            recent_views,
            display_mode: record.display_mode,
            random_range: record.random_range,
        })
    }

    async fn update_preferences(
        &self,
        user_id: Uuid,
        update: PreferencesUpdate,
    ) -> PortResult<UserPreferences> {
        if let Some(range) = update.random_range {
            if range < 1 {
                return Err(PortError::InvalidRange(format!(
                    "range size must be at least 1, got {range}"
                )));
            }
        }

        // One transaction: the update must not leave a partial write behind,
        // and must not create the user as a side effect.
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        Self::require_user(&mut *tx, user_id).await?;

        sqlx::query(
            "INSERT INTO user_preferences (user_id) VALUES ($1) \
             ON CONFLICT (user_id) DO NOTHING",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        sqlx::query(
            "UPDATE user_preferences \
             SET display_mode = COALESCE($2, display_mode), \
                 random_range = COALESCE($3, random_range) \
             WHERE user_id = $1",
        )
        .bind(user_id)
        .bind(update.display_mode.as_deref())
        .bind(update.random_range)
        .execute(&mut *tx)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;

        if let Some(favorites) = &update.favorites {
            sqlx::query("DELETE FROM favorites WHERE user_id = $1")
                .bind(user_id)
                .execute(&mut *tx)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;

            for comic_num in favorites {
                sqlx::query(
                    "INSERT INTO favorites (user_id, comic_num) VALUES ($1, $2) \
                     ON CONFLICT (user_id, comic_num) DO NOTHING",
                )
                .bind(user_id)
                .bind(comic_num)
                .execute(&mut *tx)
                .await
                .map_err(|e| PortError::Unexpected(e.to_string()))?;
            }
        }

        tx.commit()
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;

        self.preferences(user_id).await
    }

    async fn record_view(&self, user_id: Uuid, comic_num: i32) -> PortResult<()> {
        sqlx::query("INSERT INTO view_history (user_id, comic_num) VALUES ($1, $2)")
            .bind(user_id)
            .bind(comic_num)
            .execute(&self.pool)
            .await
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}

//=========================================================================================
// `InteractionStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl InteractionStore for DbAdapter {
    async fn insert_event(&self, event: &InteractionEvent) -> PortResult<()> {
        sqlx::query(
            "INSERT INTO interaction_events (id, event_type, payload, user_id, occurred_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(event.id)
        .bind(&event.event_type)
        .bind(&event.payload)
        .bind(event.user_id)
        .bind(event.occurred_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PortError::Unexpected(e.to_string()))?;
        Ok(())
    }
}
