use device_grant::device::DeviceAuthorizationService;
use device_grant::settings::DeviceFlowConfig;
use device_grant::storage::SeaOrmDeviceStore;
use sea_orm::{Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Test database with automatic cleanup. Mirrors `storage::tests::TestDb`.
pub struct TestDb {
    connection: DatabaseConnection,
    _temp_file: NamedTempFile,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
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
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// A store over this database
    pub fn store(&self) -> SeaOrmDeviceStore {
        SeaOrmDeviceStore::new(self.connection.clone())
    }

    /// A service instance over this database. Calling it twice gives two
    /// independent replicas sharing one store.
    pub fn service(&self, config: DeviceFlowConfig) -> DeviceAuthorizationService {
        DeviceAuthorizationService::new(Arc::new(self.store()), config).expect("Failed to build service")
    }
}
