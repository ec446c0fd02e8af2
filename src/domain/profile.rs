//! Profile, role, and address records attached to a user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::db::repo::{push_change, Changeset, Entity, Insertable, Value};

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub user_id: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub occupation: Option<String>,
    pub preferences: Option<Json<serde_json::Value>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUserProfile {
    pub user_id: String,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub website: Option<String>,
    pub occupation: Option<String>,
    pub preferences: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserProfileChanges {
    pub bio: Option<Option<String>>,
    pub avatar_url: Option<Option<String>>,
    pub phone_number: Option<Option<String>>,
    pub date_of_birth: Option<Option<DateTime<Utc>>>,
    pub location: Option<Option<String>>,
    pub website: Option<Option<String>>,
    pub occupation: Option<Option<String>>,
    pub preferences: Option<Option<serde_json::Value>>,
}

impl Entity for UserProfile {
    type Insert = NewUserProfile;
    type Update = UserProfileChanges;

    const TABLE: &'static str = "user_profiles";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "bio",
        "avatar_url",
        "phone_number",
        "date_of_birth",
        "location",
        "website",
        "occupation",
        "preferences",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Insertable for NewUserProfile {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", self.user_id.as_str().into()),
            ("bio", self.bio.clone().into()),
            ("avatar_url", self.avatar_url.clone().into()),
            ("phone_number", self.phone_number.clone().into()),
            ("date_of_birth", self.date_of_birth.into()),
            ("location", self.location.clone().into()),
            ("website", self.website.clone().into()),
            ("occupation", self.occupation.clone().into()),
            ("preferences", self.preferences.clone().into()),
        ]
    }
}

impl Changeset for UserProfileChanges {
    fn changes(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        push_change(&mut out, "bio", self.bio.clone());
        push_change(&mut out, "avatar_url", self.avatar_url.clone());
        push_change(&mut out, "phone_number", self.phone_number.clone());
        push_change(&mut out, "date_of_birth", self.date_of_birth);
        push_change(&mut out, "location", self.location.clone());
        push_change(&mut out, "website", self.website.clone());
        push_change(&mut out, "occupation", self.occupation.clone());
        push_change(&mut out, "preferences", self.preferences.clone());
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "text", rename_all = "UPPERCASE")]
pub enum UserRole {
    User,
    Admin,
    Moderator,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::User => "USER",
            UserRole::Admin => "ADMIN",
            UserRole::Moderator => "MODERATOR",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "USER" => Ok(UserRole::User),
            "ADMIN" => Ok(UserRole::Admin),
            "MODERATOR" => Ok(UserRole::Moderator),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

impl From<UserRole> for Value {
    fn from(role: UserRole) -> Self {
        Value::Text(role.as_str().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserRoleRecord {
    pub id: String,
    pub user_id: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewUserRole {
    pub user_id: String,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRoleChanges {
    pub role: Option<UserRole>,
}

impl Entity for UserRoleRecord {
    type Insert = NewUserRole;
    type Update = UserRoleChanges;

    const TABLE: &'static str = "user_roles";
    const COLUMNS: &'static [&'static str] =
        &["id", "user_id", "role", "created_at", "updated_at"];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Insertable for NewUserRole {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", self.user_id.as_str().into()),
            ("role", self.role.into()),
        ]
    }
}

impl Changeset for UserRoleChanges {
    fn changes(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        push_change(&mut out, "role", self.role);
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserAddress {
    pub id: String,
    pub user_id: String,
    /// `home`, `work`, ...
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub address_type: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewUserAddress {
    pub user_id: String,
    pub address_type: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserAddressChanges {
    pub address_type: Option<String>,
    pub address_line_1: Option<String>,
    pub address_line_2: Option<Option<String>>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

impl Entity for UserAddress {
    type Insert = NewUserAddress;
    type Update = UserAddressChanges;

    const TABLE: &'static str = "user_addresses";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "user_id",
        "type",
        "address_line_1",
        "address_line_2",
        "city",
        "state",
        "postal_code",
        "country",
        "is_default",
        "created_at",
        "updated_at",
    ];

    fn id(&self) -> &str {
        &self.id
    }
}

impl Insertable for NewUserAddress {
    fn values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("user_id", self.user_id.as_str().into()),
            ("type", self.address_type.as_str().into()),
            ("address_line_1", self.address_line_1.as_str().into()),
            ("address_line_2", self.address_line_2.clone().into()),
            ("city", self.city.as_str().into()),
            ("state", self.state.as_str().into()),
            ("postal_code", self.postal_code.as_str().into()),
            ("country", self.country.as_str().into()),
            ("is_default", self.is_default.into()),
        ]
    }
}

// `is_default` only changes through `set_default_address`.
impl Changeset for UserAddressChanges {
    fn changes(&self) -> Vec<(&'static str, Value)> {
        let mut out = Vec::new();
        push_change(&mut out, "type", self.address_type.clone());
        push_change(&mut out, "address_line_1", self.address_line_1.clone());
        push_change(&mut out, "address_line_2", self.address_line_2.clone());
        push_change(&mut out, "city", self.city.clone());
        push_change(&mut out, "state", self.state.clone());
        push_change(&mut out, "postal_code", self.postal_code.clone());
        push_change(&mut out, "country", self.country.clone());
        out
    }
}
