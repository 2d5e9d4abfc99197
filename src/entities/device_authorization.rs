use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "device_authorizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub application_id: String,
    pub environment_id: String,
    pub organization_id: Option<String>,
    pub client_id: String,
    #[sea_orm(unique)]
    pub device_code: String,
    #[sea_orm(unique)]
    pub user_code: String, // normalized: uppercase, no separators
    pub verification_uri: String,
    pub scope: String,
    pub status: String, // "pending" | "authorized" | "denied" | "expired" | "consumed"
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub interval: i64,
    pub poll_count: i64,
    pub last_polled_at: Option<i64>,
    pub expires_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
