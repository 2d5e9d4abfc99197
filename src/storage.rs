use crate::entities;
use crate::errors::DeviceError;
use crate::settings::Database as DbCfg;
use async_trait::async_trait;
use base64ct::Encoding;
use rand::RngCore;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, DbErr, EntityTrait, QueryFilter,
    Set,
};
use sea_orm_migration::MigratorTrait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Pending,
    Authorized,
    Denied,
    Expired,
    Consumed,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Pending => "pending",
            DeviceStatus::Authorized => "authorized",
            DeviceStatus::Denied => "denied",
            DeviceStatus::Expired => "expired",
            DeviceStatus::Consumed => "consumed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeviceStatus::Denied | DeviceStatus::Expired | DeviceStatus::Consumed
        )
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = DbErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeviceStatus::Pending),
            "authorized" => Ok(DeviceStatus::Authorized),
            "denied" => Ok(DeviceStatus::Denied),
            "expired" => Ok(DeviceStatus::Expired),
            "consumed" => Ok(DeviceStatus::Consumed),
            other => Err(DbErr::Type(format!("unknown device status `{other}`"))),
        }
    }
}

/// Opaque tenancy keys, stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub application_id: String,
    pub environment_id: String,
    pub organization_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuthorization {
    pub id: String,
    pub tenant: TenantContext,
    pub client_id: String,
    pub device_code: String,
    pub user_code: String, // normalized
    pub verification_uri: String,
    pub scope: String,
    pub status: DeviceStatus,
    pub user_id: Option<String>,
    pub session_id: Option<String>,
    pub interval: i64,
    pub poll_count: i64,
    pub last_polled_at: Option<i64>,
    pub expires_at: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

impl DeviceAuthorization {
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// Seconds left before expiry, never negative.
    pub fn expires_in(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }
}

impl TryFrom<entities::device_authorization::Model> for DeviceAuthorization {
    type Error = DbErr;

    fn try_from(m: entities::device_authorization::Model) -> Result<Self, Self::Error> {
        Ok(DeviceAuthorization {
            id: m.id,
            tenant: TenantContext {
                application_id: m.application_id,
                environment_id: m.environment_id,
                organization_id: m.organization_id,
            },
            client_id: m.client_id,
            device_code: m.device_code,
            user_code: m.user_code,
            verification_uri: m.verification_uri,
            scope: m.scope,
            status: m.status.parse()?,
            user_id: m.user_id,
            session_id: m.session_id,
            interval: m.interval,
            poll_count: m.poll_count,
            last_polled_at: m.last_polled_at,
            expires_at: m.expires_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewDeviceAuthorization {
    pub tenant: TenantContext,
    pub client_id: String,
    pub device_code: String,
    pub user_code: String, // normalized
    pub verification_uri: String,
    pub scope: String,
    pub interval: i64,
    pub expires_at: i64,
    pub created_at: i64,
}

/// Persistence boundary for device authorizations.
///
/// Every method returning `bool` is a single conditional write: it reports
/// whether the row was in the required state and got transitioned. Callers
/// must not emulate these with a read followed by a write.
/// All timestamps are unix seconds supplied by the caller.
#[async_trait]
pub trait DeviceStore: Send + Sync {
    async fn create(&self, new: NewDeviceAuthorization) -> Result<DeviceAuthorization, DeviceError>;

    async fn find_by_user_code(
        &self,
        user_code: &str,
    ) -> Result<Option<DeviceAuthorization>, DeviceError>;

    async fn find_by_device_code(
        &self,
        device_code: &str,
    ) -> Result<Option<DeviceAuthorization>, DeviceError>;

    /// `pending -> authorized` for an unexpired record, stamping the user and session.
    async fn authorize_device(
        &self,
        user_code: &str,
        user_id: &str,
        session_id: &str,
        now: i64,
    ) -> Result<bool, DeviceError>;

    /// `pending -> denied` for an unexpired record.
    async fn deny_device(&self, user_code: &str, now: i64) -> Result<bool, DeviceError>;

    /// Increments `poll_count` and sets `last_polled_at = now`, whatever the status.
    async fn update_poll_info(&self, device_code: &str, now: i64) -> Result<bool, DeviceError>;

    /// `authorized -> consumed` for an unexpired record.
    async fn mark_consumed(&self, device_code: &str, now: i64) -> Result<bool, DeviceError>;

    /// `pending -> expired`, on timeout or after the poll ceiling. The only
    /// status write that is not driven by a user or token endpoint action.
    async fn mark_expired(&self, device_code: &str, now: i64) -> Result<bool, DeviceError>;

    /// Removes every record past its expiry that was never consumed.
    async fn delete_expired(&self, now: i64) -> Result<u64, DeviceError>;

    /// Removes consumed records last updated before `older_than`.
    async fn delete_old_consumed(&self, older_than: i64) -> Result<u64, DeviceError>;
}

pub async fn init(cfg: &DbCfg) -> Result<DatabaseConnection, DeviceError> {
    let db = Database::connect(&cfg.url)
        .await
        .map_err(DeviceError::db("connect to database"))?;
    Ok(db)
}

pub async fn migrate(db: &DatabaseConnection) -> Result<(), DeviceError> {
    migration::Migrator::up(db, None)
        .await
        .map_err(DeviceError::db("apply migrations"))
}

fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}

/// [`DeviceStore`] over any SeaORM-supported database.
#[derive(Debug, Clone)]
pub struct SeaOrmDeviceStore {
    db: DatabaseConnection,
}

impl SeaOrmDeviceStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

#[async_trait]
impl DeviceStore for SeaOrmDeviceStore {
    async fn create(&self, new: NewDeviceAuthorization) -> Result<DeviceAuthorization, DeviceError> {
        let model = entities::device_authorization::ActiveModel {
            id: Set(random_id()),
            application_id: Set(new.tenant.application_id),
            environment_id: Set(new.tenant.environment_id),
            organization_id: Set(new.tenant.organization_id),
            client_id: Set(new.client_id),
            device_code: Set(new.device_code),
            user_code: Set(new.user_code),
            verification_uri: Set(new.verification_uri),
            scope: Set(new.scope),
            status: Set(DeviceStatus::Pending.as_str().to_string()),
            user_id: Set(None),
            session_id: Set(None),
            interval: Set(new.interval),
            poll_count: Set(0),
            last_polled_at: Set(None),
            expires_at: Set(new.expires_at),
            created_at: Set(new.created_at),
            updated_at: Set(new.created_at),
        };

        let created = model
            .insert(&self.db)
            .await
            .map_err(DeviceError::db("create device authorization"))?;

        DeviceAuthorization::try_from(created).map_err(DeviceError::db("read device authorization"))
    }

    async fn find_by_user_code(
        &self,
        user_code: &str,
    ) -> Result<Option<DeviceAuthorization>, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::find()
            .filter(Column::UserCode.eq(user_code))
            .one(&self.db)
            .await
            .map_err(DeviceError::db("find device authorization by user code"))?;

        result
            .map(DeviceAuthorization::try_from)
            .transpose()
            .map_err(DeviceError::db("read device authorization"))
    }

    async fn find_by_device_code(
        &self,
        device_code: &str,
    ) -> Result<Option<DeviceAuthorization>, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::find()
            .filter(Column::DeviceCode.eq(device_code))
            .one(&self.db)
            .await
            .map_err(DeviceError::db("find device authorization by device code"))?;

        result
            .map(DeviceAuthorization::try_from)
            .transpose()
            .map_err(DeviceError::db("read device authorization"))
    }

    async fn authorize_device(
        &self,
        user_code: &str,
        user_id: &str,
        session_id: &str,
        now: i64,
    ) -> Result<bool, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(DeviceStatus::Authorized.as_str()))
            .col_expr(Column::UserId, Expr::value(user_id))
            .col_expr(Column::SessionId, Expr::value(session_id))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::UserCode.eq(user_code))
            .filter(Column::Status.eq(DeviceStatus::Pending.as_str()))
            .filter(Column::ExpiresAt.gte(now))
            .exec(&self.db)
            .await
            .map_err(DeviceError::db("authorize device"))?;

        Ok(result.rows_affected == 1)
    }

    async fn deny_device(&self, user_code: &str, now: i64) -> Result<bool, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(DeviceStatus::Denied.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::UserCode.eq(user_code))
            .filter(Column::Status.eq(DeviceStatus::Pending.as_str()))
            .filter(Column::ExpiresAt.gte(now))
            .exec(&self.db)
            .await
            .map_err(DeviceError::db("deny device"))?;

        Ok(result.rows_affected == 1)
    }

    async fn update_poll_info(&self, device_code: &str, now: i64) -> Result<bool, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::update_many()
            .col_expr(Column::PollCount, Expr::col(Column::PollCount).add(1))
            .col_expr(Column::LastPolledAt, Expr::value(now))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::DeviceCode.eq(device_code))
            .exec(&self.db)
            .await
            .map_err(DeviceError::db("record device poll"))?;

        Ok(result.rows_affected == 1)
    }

    async fn mark_consumed(&self, device_code: &str, now: i64) -> Result<bool, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(DeviceStatus::Consumed.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::DeviceCode.eq(device_code))
            .filter(Column::Status.eq(DeviceStatus::Authorized.as_str()))
            .filter(Column::ExpiresAt.gte(now))
            .exec(&self.db)
            .await
            .map_err(DeviceError::db("consume device code"))?;

        Ok(result.rows_affected == 1)
    }

    async fn mark_expired(&self, device_code: &str, now: i64) -> Result<bool, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::update_many()
            .col_expr(Column::Status, Expr::value(DeviceStatus::Expired.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(now))
            .filter(Column::DeviceCode.eq(device_code))
            .filter(Column::Status.eq(DeviceStatus::Pending.as_str()))
            .exec(&self.db)
            .await
            .map_err(DeviceError::db("expire device code"))?;

        Ok(result.rows_affected == 1)
    }

    async fn delete_expired(&self, now: i64) -> Result<u64, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::delete_many()
            .filter(Column::ExpiresAt.lt(now))
            .filter(Column::Status.ne(DeviceStatus::Consumed.as_str()))
            .exec(&self.db)
            .await
            .map_err(DeviceError::db("delete expired device authorizations"))?;

        Ok(result.rows_affected)
    }

    async fn delete_old_consumed(&self, older_than: i64) -> Result<u64, DeviceError> {
        use entities::device_authorization::{Column, Entity};

        let result = Entity::delete_many()
            .filter(Column::Status.eq(DeviceStatus::Consumed.as_str()))
            .filter(Column::UpdatedAt.lt(older_than))
            .exec(&self.db)
            .await
            .map_err(DeviceError::db("delete consumed device authorizations"))?;

        Ok(result.rows_affected)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::NamedTempFile;

    /// Test database with automatic cleanup. Same helper as the one under
    /// `tests/helpers/db.rs`, kept here because unit tests cannot reach it.
    pub(crate) struct TestDb {
        connection: DatabaseConnection,
        _temp_file: NamedTempFile,
    }

    impl TestDb {
        /// Create a new test database with migrations applied
        pub(crate) async fn new() -> Self {
            // Create temporary SQLite database file
            let temp_file = NamedTempFile::new().expect("Failed to create temp file");
            let db_path = temp_file.path().to_str().expect("Invalid temp file path");
            let db_url = format!("sqlite://{}?mode=rwc", db_path);

            // Connect to database
            let connection = Database::connect(&db_url)
                .await
                .expect("Failed to connect to test database");

            // Run migrations
            migration::Migrator::up(&connection, None)
                .await
                .expect("Failed to run migrations");

            Self {
                connection,
                _temp_file: temp_file,
            }
        }

        /// Get database connection
        pub(crate) fn connection(&self) -> &DatabaseConnection {
            &self.connection
        }

        /// A store over this database
        pub(crate) fn store(&self) -> SeaOrmDeviceStore {
            SeaOrmDeviceStore::new(self.connection.clone())
        }

        /// A service instance over this database. Calling it twice gives two
        /// independent replicas sharing one store.
        pub(crate) fn service(
            &self,
            config: crate::settings::DeviceFlowConfig,
        ) -> crate::device::DeviceAuthorizationService {
            crate::device::DeviceAuthorizationService::new(std::sync::Arc::new(self.store()), config)
                .expect("Failed to build service")
        }
    }

    pub(crate) fn new_record(device_code: &str, user_code: &str, now: i64) -> NewDeviceAuthorization {
        NewDeviceAuthorization {
            tenant: TenantContext {
                application_id: "app_1".to_string(),
                environment_id: "env_1".to_string(),
                organization_id: None,
            },
            client_id: "cli-tool".to_string(),
            device_code: device_code.to_string(),
            user_code: user_code.to_string(),
            verification_uri: "/device".to_string(),
            scope: "openid profile".to_string(),
            interval: 5,
            expires_at: now + 600,
            created_at: now,
        }
    }

    /// Shift a record's expiry relative to now
    pub(crate) async fn set_expires_at(db: &DatabaseConnection, device_code: &str, expires_at: i64) {
        use entities::device_authorization::{Column, Entity};

        Entity::update_many()
            .col_expr(Column::ExpiresAt, Expr::value(expires_at))
            .filter(Column::DeviceCode.eq(device_code))
            .exec(db)
            .await
            .expect("Failed to update expiry");
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let now = Utc::now().timestamp();

        let created = store
            .create(new_record("dc-1", "BCDFGHJK", now))
            .await
            .expect("Failed to create device authorization");

        assert!(!created.id.is_empty());
        assert_eq!(created.status, DeviceStatus::Pending);
        assert_eq!(created.poll_count, 0);
        assert_eq!(created.last_polled_at, None);
        assert_eq!(created.user_id, None);
        assert_eq!(created.tenant.application_id, "app_1");

        let by_user = store
            .find_by_user_code("BCDFGHJK")
            .await
            .expect("Query failed")
            .expect("Record not found");
        let by_device = store
            .find_by_device_code("dc-1")
            .await
            .expect("Query failed")
            .expect("Record not found");

        assert_eq!(by_user, created);
        assert_eq!(by_device, created);
    }

    #[tokio::test]
    async fn test_find_not_found() {
        let test_db = TestDb::new().await;
        let store = test_db.store();

        assert!(store.find_by_user_code("ZZZZZZZZ").await.unwrap().is_none());
        assert!(store.find_by_device_code("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_user_code_rejected() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let now = Utc::now().timestamp();

        store.create(new_record("dc-1", "BCDFGHJK", now)).await.unwrap();
        let err = store
            .create(new_record("dc-2", "BCDFGHJK", now))
            .await
            .unwrap_err();

        assert!(err.is_unique_violation());
    }

    #[tokio::test]
    async fn test_authorize_is_conditional() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let now = Utc::now().timestamp();
        store.create(new_record("dc-1", "BCDFGHJK", now)).await.unwrap();

        assert!(store
            .authorize_device("BCDFGHJK", "user-1", "sess-1", now)
            .await
            .unwrap());
        // Second attempt finds the row no longer pending
        assert!(!store
            .authorize_device("BCDFGHJK", "user-2", "sess-2", now)
            .await
            .unwrap());
        assert!(!store.deny_device("BCDFGHJK", now).await.unwrap());

        let record = store.find_by_device_code("dc-1").await.unwrap().unwrap();
        assert_eq!(record.status, DeviceStatus::Authorized);
        assert_eq!(record.user_id.as_deref(), Some("user-1"));
        assert_eq!(record.session_id.as_deref(), Some("sess-1"));
    }

    #[tokio::test]
    async fn test_authorize_refuses_expired_record() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let now = Utc::now().timestamp();
        store.create(new_record("dc-1", "BCDFGHJK", now)).await.unwrap();
        set_expires_at(test_db.connection(), "dc-1", now - 1).await;

        assert!(!store
            .authorize_device("BCDFGHJK", "user-1", "sess-1", now)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_mark_consumed_requires_authorized() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let now = Utc::now().timestamp();
        store.create(new_record("dc-1", "BCDFGHJK", now)).await.unwrap();

        assert!(!store.mark_consumed("dc-1", now).await.unwrap());

        store
            .authorize_device("BCDFGHJK", "user-1", "sess-1", now)
            .await
            .unwrap();
        assert!(store.mark_consumed("dc-1", now).await.unwrap());
        assert!(!store.mark_consumed("dc-1", now).await.unwrap());

        let record = store.find_by_device_code("dc-1").await.unwrap().unwrap();
        assert_eq!(record.status, DeviceStatus::Consumed);
        assert_eq!(record.user_id.as_deref(), Some("user-1"));
    }

    #[tokio::test]
    async fn test_update_poll_info_increments() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let now = Utc::now().timestamp();
        store.create(new_record("dc-1", "BCDFGHJK", now)).await.unwrap();

        assert!(store.update_poll_info("dc-1", now).await.unwrap());
        assert!(store.update_poll_info("dc-1", now + 5).await.unwrap());
        assert!(!store.update_poll_info("missing", now).await.unwrap());

        let record = store.find_by_device_code("dc-1").await.unwrap().unwrap();
        assert_eq!(record.poll_count, 2);
        assert_eq!(record.last_polled_at, Some(now + 5));
    }

    #[tokio::test]
    async fn test_mark_expired_only_from_pending() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let now = Utc::now().timestamp();
        store.create(new_record("dc-1", "BCDFGHJK", now)).await.unwrap();
        store.create(new_record("dc-2", "CDFGHJKL", now)).await.unwrap();
        store.create(new_record("dc-3", "DFGHJKLM", now)).await.unwrap();

        assert!(store.mark_expired("dc-1", now).await.unwrap());
        // Already expired: idempotent no-op
        assert!(!store.mark_expired("dc-1", now).await.unwrap());

        // Terminal and authorized records keep their status
        assert!(store.deny_device("CDFGHJKL", now).await.unwrap());
        assert!(store.authorize_device("DFGHJKLM", "u", "s", now).await.unwrap());
        assert!(store.mark_consumed("dc-3", now).await.unwrap());
        assert!(!store.mark_expired("dc-2", now).await.unwrap());
        assert!(!store.mark_expired("dc-3", now).await.unwrap());

        let denied = store.find_by_device_code("dc-2").await.unwrap().unwrap();
        assert_eq!(denied.status, DeviceStatus::Denied);
        let consumed = store.find_by_device_code("dc-3").await.unwrap().unwrap();
        assert_eq!(consumed.status, DeviceStatus::Consumed);
        assert!(!store.mark_expired("missing", now).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_keeps_consumed_and_live() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let db = test_db.connection();
        let now = Utc::now().timestamp();

        store.create(new_record("live", "BBBBBBBB", now)).await.unwrap();
        store.create(new_record("stale", "CCCCCCCC", now)).await.unwrap();
        store.create(new_record("used", "DDDDDDDD", now)).await.unwrap();
        store.authorize_device("DDDDDDDD", "u", "s", now).await.unwrap();
        store.mark_consumed("used", now).await.unwrap();

        set_expires_at(db, "stale", now - 10).await;
        set_expires_at(db, "used", now - 10).await;

        assert_eq!(store.delete_expired(now).await.unwrap(), 1);
        assert!(store.find_by_device_code("stale").await.unwrap().is_none());
        assert!(store.find_by_device_code("live").await.unwrap().is_some());
        assert!(store.find_by_device_code("used").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_old_consumed() {
        let test_db = TestDb::new().await;
        let store = test_db.store();
        let now = Utc::now().timestamp();
        let week = 7 * 24 * 60 * 60;

        store.create(new_record("old", "BBBBBBBB", now - week - 100)).await.unwrap();
        store.create(new_record("recent", "CCCCCCCC", now)).await.unwrap();
        for (dc, uc, at) in [("old", "BBBBBBBB", now - week - 50), ("recent", "CCCCCCCC", now)] {
            store.authorize_device(uc, "u", "s", at).await.unwrap();
            store.mark_consumed(dc, at).await.unwrap();
        }

        assert_eq!(store.delete_old_consumed(now - week).await.unwrap(), 1);
        assert!(store.find_by_device_code("old").await.unwrap().is_none());
        assert!(store.find_by_device_code("recent").await.unwrap().is_some());
    }

    #[test]
    fn test_status_strings_roundtrip() {
        for status in [
            DeviceStatus::Pending,
            DeviceStatus::Authorized,
            DeviceStatus::Denied,
            DeviceStatus::Expired,
            DeviceStatus::Consumed,
        ] {
            assert_eq!(status.as_str().parse::<DeviceStatus>().unwrap(), status);
        }
        assert!("approved".parse::<DeviceStatus>().is_err());
    }

    #[test]
    fn test_expiry_is_exact() {
        let now = 1_700_000_000;
        let mut record = DeviceAuthorization {
            id: "id".to_string(),
            tenant: TenantContext::default(),
            client_id: "cli-tool".to_string(),
            device_code: "dc".to_string(),
            user_code: "BCDFGHJK".to_string(),
            verification_uri: "/device".to_string(),
            scope: "openid".to_string(),
            status: DeviceStatus::Pending,
            user_id: None,
            session_id: None,
            interval: 5,
            poll_count: 0,
            last_polled_at: None,
            expires_at: now - 1,
            created_at: now - 600,
            updated_at: now - 600,
        };
        assert!(record.is_expired_at(now));
        assert_eq!(record.expires_in(now), 0);

        record.expires_at = now + 1;
        assert!(!record.is_expired_at(now));
        assert_eq!(record.expires_in(now), 1);
    }
}
