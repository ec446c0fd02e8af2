//! Profile, role and address queries.

use super::{Condition, Repository, Value};
use crate::db::error::StoreResult;
use crate::domain::{NewUserRole, UserAddress, UserProfile, UserRole, UserRoleRecord};
use chrono::Utc;
use tracing::info;

impl Repository<UserProfile> {
    pub async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Option<UserProfile>> {
        self.find_one_by("user_id", user_id).await
    }
}

impl Repository<UserRoleRecord> {
    pub async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Vec<UserRoleRecord>> {
        self.find_by("user_id", user_id).await
    }

    pub async fn add_role_to_user(
        &self,
        user_id: &str,
        role: UserRole,
    ) -> StoreResult<UserRoleRecord> {
        self.create(&NewUserRole {
            user_id: user_id.to_string(),
            role,
        })
        .await
    }

    /// Remove `role` from a user. Other roles of the user are untouched.
    ///
    /// Returns the number of role rows removed.
    pub async fn remove_role_from_user(&self, user_id: &str, role: UserRole) -> StoreResult<u64> {
        self.delete_where(&[
            Condition::eq("user_id", user_id),
            Condition::eq("role", role),
        ])
        .await
    }

    pub async fn has_role(&self, user_id: &str, role: UserRole) -> StoreResult<bool> {
        let count = self
            .count_where(&[
                Condition::eq("user_id", user_id),
                Condition::eq("role", role),
            ])
            .await?;
        Ok(count > 0)
    }
}

impl Repository<UserAddress> {
    pub async fn find_by_user_id(&self, user_id: &str) -> StoreResult<Vec<UserAddress>> {
        self.find_by("user_id", user_id).await
    }

    pub async fn find_default_for_user(&self, user_id: &str) -> StoreResult<Option<UserAddress>> {
        self.find_one_where(&[
            Condition::eq("user_id", user_id),
            Condition::eq("is_default", true),
        ])
        .await
    }

    /// Make `address_id` the only default address of its owner.
    ///
    /// Clearing the previous default and setting the new one happen in one
    /// transaction. Returns `None`, with nothing written, when the address
    /// does not exist.
    ///
    /// # Errors
    /// Returns an error if any statement fails; the transaction is rolled back.
    pub async fn set_default_address(&self, address_id: &str) -> StoreResult<Option<UserAddress>> {
        let mut tx = self.pool().begin().await?;

        let owner: Option<String> =
            sqlx::query_scalar("SELECT user_id FROM user_addresses WHERE id = ?")
                .bind(address_id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some(user_id) = owner else {
            return Ok(None);
        };

        let now = Value::Timestamp(Utc::now());

        sqlx::query(
            r#"
            UPDATE user_addresses
            SET is_default = 0, updated_at = ?
            WHERE user_id = ? AND is_default = 1 AND id != ?
            "#,
        )
        .bind(now.clone())
        .bind(user_id.as_str())
        .bind(address_id)
        .execute(&mut *tx)
        .await?;

        let sql = format!(
            "UPDATE user_addresses SET is_default = 1, updated_at = ? WHERE id = ?{}",
            Self::returning_sql()
        );
        let address = sqlx::query_as::<_, UserAddress>(&sql)
            .bind(now)
            .bind(address_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(user_id = %user_id, address_id = %address_id, "Default address changed");
        Ok(Some(address))
    }
}
