//! # User Repository
//!
//! Database operations for users.
//!
//! ## Upsert
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Insert-or-Update in One Statement                    │
//! │                                                                         │
//! │  INSERT INTO users (...) VALUES (...)                                  │
//! │  ON CONFLICT (telegram_id) DO UPDATE                                   │
//! │      SET full_name = EXCLUDED.full_name,                               │
//! │          user_name = EXCLUDED.user_name                                │
//! │  RETURNING *                                                           │
//! │                                                                         │
//! │  No SELECT-then-INSERT: two callers racing on the same id both         │
//! │  succeed and the row ends up with the last writer's names.             │
//! │  language_code and referred_id are only written on first insert.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{PgExecutor, PgPool};
use tracing::debug;

use crate::error::DbResult;
use bazaar_core::{validation, NewUser, Referral, User};

/// Repository for user database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.users();
///
/// let user = repo.upsert(&NewUser::new(1, "John Doe", "en")).await?;
/// let same = repo.get_by_id(1).await?;
/// let recent = repo.list(&["en", "uk", "fr"], 10).await?;
/// ```
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Creates a new UserRepository.
    pub fn new(pool: PgPool) -> Self {
        UserRepository { pool }
    }

    /// Inserts a user, or updates `full_name` / `user_name` if the id exists.
    ///
    /// ## Returns
    /// * `Ok(User)` - The row as stored after the statement
    /// * `Err(DbError::Validation)` - A field breaks a column rule
    /// * `Err(DbError::ForeignKeyViolation)` - `referred_id` is not a user
    pub async fn upsert(&self, user: &NewUser) -> DbResult<User> {
        upsert(&self.pool, user).await
    }

    /// Gets a user by Telegram id.
    ///
    /// ## Returns
    /// * `Ok(Some(User))` - User found
    /// * `Ok(None)` - User not found
    pub async fn get_by_id(&self, telegram_id: i64) -> DbResult<Option<User>> {
        get_by_id(&self.pool, telegram_id).await
    }

    /// Lists users whose language is in `languages`, newest first.
    ///
    /// ## Arguments
    /// * `languages` - Accepted language codes. Empty matches nothing.
    /// * `limit` - Maximum rows returned
    pub async fn list(&self, languages: &[&str], limit: u32) -> DbResult<Vec<User>> {
        if languages.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        debug!(?languages, limit, "Listing users");

        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT
                telegram_id, full_name, user_name, language_code, referred_id,
                created_at, updated_at
            FROM users
            WHERE language_code = ANY($1)
            ORDER BY created_at DESC, telegram_id DESC
            LIMIT $2
            "#,
        )
        .bind(languages)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = users.len(), "Listed users");
        Ok(users)
    }

    /// Gets a user's language code (projection only).
    pub async fn language(&self, telegram_id: i64) -> DbResult<Option<String>> {
        let language = sqlx::query_scalar::<_, String>(
            r#"
            SELECT language_code
            FROM users
            WHERE telegram_id = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(telegram_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(language)
    }

    /// Deletes a user.
    ///
    /// ## Cascade Rules
    /// - Users referred by this one keep existing; their `referred_id` is cleared
    /// - Orders keep existing; their `user_id` is cleared
    ///
    /// ## Returns
    /// `true` if a row was deleted.
    pub async fn delete(&self, telegram_id: i64) -> DbResult<bool> {
        debug!(telegram_id, "Deleting user");

        let result = sqlx::query("DELETE FROM users WHERE telegram_id = $1")
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists every (referrer, referral) pair.
    ///
    /// Inner self-join: users without a referrer don't appear as referrals,
    /// users who referred nobody don't appear as referrers.
    pub async fn referrals(&self) -> DbResult<Vec<Referral>> {
        let referrals = sqlx::query_as::<_, Referral>(
            r#"
            SELECT
                parent.telegram_id AS referrer_id,
                parent.full_name   AS referrer_name,
                child.telegram_id  AS referral_id,
                child.full_name    AS referral_name
            FROM users parent
            INNER JOIN users child ON child.referred_id = parent.telegram_id
            ORDER BY parent.telegram_id, child.telegram_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(referrals)
    }

    /// Counts users.
    pub async fn count(&self) -> DbResult<i64> {
        super::count_rows::<User>(&self.pool).await
    }
}

// =============================================================================
// Statements shared with UnitOfWork
// =============================================================================

pub(crate) async fn upsert<'e, E>(executor: E, user: &NewUser) -> DbResult<User>
where
    E: PgExecutor<'e>,
{
    validation::validate_new_user(user)?;

    debug!(telegram_id = user.telegram_id, "Upserting user");

    let row = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (telegram_id, full_name, user_name, language_code, referred_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (telegram_id) DO UPDATE SET
            full_name = EXCLUDED.full_name,
            user_name = EXCLUDED.user_name
        RETURNING
            telegram_id, full_name, user_name, language_code, referred_id,
            created_at, updated_at
        "#,
    )
    .bind(user.telegram_id)
    .bind(&user.full_name)
    .bind(&user.user_name)
    .bind(&user.language_code)
    .bind(user.referred_id)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub(crate) async fn get_by_id<'e, E>(executor: E, telegram_id: i64) -> DbResult<Option<User>>
where
    E: PgExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT
            telegram_id, full_name, user_name, language_code, referred_id,
            created_at, updated_at
        FROM users
        WHERE telegram_id = $1
        "#,
    )
    .bind(telegram_id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}
