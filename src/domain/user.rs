//! Account and session records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::db::repo::{push_change, Changeset, Entity, Insertable, Value};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(skip_serializing)]
    pub salt: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    #[serde(skip_serializing)]
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing)]
    pub reset_password_token: Option<String>,
    pub reset_password_token_expires_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_active: bool,
    pub is_verified: bool,
    pub verification_token: Option<String>,
    pub verification_token_expires_at: Option<DateTime<Utc>>,
}

impl NewUser {
    /// An active, unverified account with no profile names.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        salt: impl Into<String>,
    ) -> Self {
        NewUser {
            email: email.into(),
            password_hash: password_hash.into(),
            salt: salt.into(),
            first_name: None,
            last_name: None,
            is_active: true,
            is_verified: false,
            verification_token: None,
            verification_token_expires_at: None,
        }
    }

    pub fn with_name(mut self, first: impl Into<String>, last: impl Into<String>) -> Self {
        self.first_name = Some(first.into());
        self.last_name = Some(last.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub salt: Option<String>,
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_verified: Option<bool>,
    pub verification_token: Option<Option<String>>,
    pub verification_token_expires_at: Option<Option<DateTime<Utc>>>,
    pub reset_password_token: Option<Option<String>>,
    pub reset_password_token_expires_at: Option<Option<DateTime<Utc>>>,
    pub last_login_at: Option<Option<DateTime<Utc>>>,
}

impl Entity for User {
    type Insert = NewUser;
    type Update = UserChanges;

    const TABLE: &'static str = "users";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "email",
        "password_hash",
        "salt",
        "first_name",
        "last_name",
        "is_active",
        "is_verified",
        "verification_token",
        "verification_token_expires_at",
        "reset_password_token",
        "reset_password_token_expires_at",
        "last_login_at",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Insertable for NewUser {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("email", self.email.as_str().into()),
            ("password_hash", self.password_hash.as_str().into()),
            ("salt", self.salt.as_str().into()),
            ("first_name", self.first_name.clone().into()),
            ("last_name", self.last_name.clone().into()),
            ("is_active", self.is_active.into()),
            ("is_verified", self.is_verified.into()),
            ("verification_token", self.verification_token.clone().into()),
            (
                "verification_token_expires_at",
                self.verification_token_expires_at.into(),
            ),
        ]
    }
}

impl Changeset for UserChanges {
    fn changes(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        push_change(&mut out, "email", self.email.clone());
        push_change(&mut out, "password_hash", self.password_hash.clone());
        push_change(&mut out, "salt", self.salt.clone());
        push_change(&mut out, "first_name", self.first_name.clone());
        push_change(&mut out, "last_name", self.last_name.clone());
        push_change(&mut out, "is_active", self.is_active);
        push_change(&mut out, "is_verified", self.is_verified);
        push_change(&mut out, "verification_token", self.verification_token.clone());
        push_change(
            &mut out,
            "verification_token_expires_at",
            self.verification_token_expires_at,
        );
        push_change(&mut out, "reset_password_token", self.reset_password_token.clone());
        push_change(
            &mut out,
            "reset_password_token_expires_at",
            self.reset_password_token_expires_at,
        );
        push_change(&mut out, "last_login_at", self.last_login_at);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub user_id: String,
    #[serde(skip_serializing)]
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
    pub is_valid: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn is_active_at(&self, at: DateTime<Utc>) -> bool {
        self.is_valid && self.expires_at > at
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub user_id: String,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionChanges {
    pub expires_at: Option<DateTime<Utc>>,
    pub is_valid: Option<bool>,
}

impl Entity for Session {
    type Insert = NewSession;
    type Update = SessionChanges;

    const TABLE: &'static str = "sessions";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "token",
        "expires_at",
        "user_agent",
        "ip_address",
        "is_valid",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Insertable for NewSession {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", self.user_id.as_str().into()),
            ("token", self.token.as_str().into()),
            ("expires_at", self.expires_at.into()),
            ("user_agent", self.user_agent.clone().into()),
            ("ip_address", self.ip_address.clone().into()),
            ("is_valid", true.into()),
        ]
    }
}

impl Changeset for SessionChanges {
    fn changes(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        push_change(&mut out, "expires_at", self.expires_at);
        push_change(&mut out, "is_valid", self.is_valid);
        out
    }
}
