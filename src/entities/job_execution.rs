use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One run of a cleanup job, written when the run starts and completed when it ends.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "job_executions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = true)]
    pub id: i64,
    pub job_name: String,
    pub started_at: i64,
    pub completed_at: Option<i64>,
    /// 1 on success, 0 on failure, NULL while running
    pub success: Option<i64>,
    pub error_message: Option<String>,
    /// Device authorizations deleted by the run
    pub records_processed: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// `None` while the run is still in progress.
    pub fn succeeded(&self) -> Option<bool> {
        self.success.map(|s| s != 0)
    }
}
