//! Account and session queries.

use super::{Condition, Repository, Value};
use crate::db::error::StoreResult;
use crate::domain::{Session, User};
use chrono::Utc;

impl Repository<User> {
    /// Find the account registered under `email`.
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.find_one_by("email", email).await
    }
}

impl Repository<Session> {
    pub async fn find_by_token(&self, token: &str) -> StoreResult<Option<Session>> {
        self.find_one_by("token", token).await
    }

    /// Sessions of a user that are still valid and not yet expired.
    pub async fn find_valid_for_user(&self, user_id: &str) -> StoreResult<Vec<Session>> {
        self.find_where(
            &[
                Condition::eq("user_id", user_id),
                Condition::eq("is_valid", true),
                Condition::gt("expires_at", Utc::now()),
            ],
            None,
        )
        .await
    }

    /// Mark every valid session of a user invalid.
    ///
    /// Returns the number of sessions invalidated.
    pub async fn invalidate_for_user(&self, user_id: &str) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE sessions
            SET is_valid = 0, updated_at = ?
            WHERE user_id = ? AND is_valid = 1
            "#,
        )
        .bind(Value::Timestamp(Utc::now()))
        .bind(user_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected())
    }
}
