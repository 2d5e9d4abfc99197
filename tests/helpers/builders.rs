use chrono::Duration;
use device_grant::device::{DeviceAuthorizationService, IssuedDeviceCode, TenantContext};
use device_grant::settings::DeviceFlowConfig;

/// Builder for device flow configurations
pub struct FlowConfigBuilder {
    config: DeviceFlowConfig,
}

impl FlowConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: DeviceFlowConfig::default(),
        }
    }

    pub fn with_interval_secs(mut self, secs: i64) -> Self {
        self.config.interval = Duration::seconds(secs);
        self
    }

    pub fn with_max_poll_attempts(mut self, max: i64) -> Self {
        self.config.max_poll_attempts = max;
        self
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.config.consumed_retention = retention;
        self
    }

    pub fn allow_client(mut self, client_id: &str) -> Self {
        self.config.allowed_client_ids.push(client_id.to_string());
        self
    }

    pub fn build(self) -> DeviceFlowConfig {
        self.config
    }
}

/// Builder for device authorization requests
pub struct DeviceRequestBuilder {
    client_id: String,
    scope: String,
    tenant: TenantContext,
}

impl DeviceRequestBuilder {
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_string(),
            scope: "openid profile".to_string(),
            tenant: TenantContext {
                application_id: "app_test".to_string(),
                environment_id: "env_test".to_string(),
                organization_id: None,
            },
        }
    }

    pub fn with_scope(mut self, scope: &str) -> Self {
        self.scope = scope.to_string();
        self
    }

    pub fn in_organization(mut self, organization_id: &str) -> Self {
        self.tenant.organization_id = Some(organization_id.to_string());
        self
    }

    pub async fn initiate(self, service: &DeviceAuthorizationService) -> IssuedDeviceCode {
        service
            .initiate(&self.client_id, &self.scope, &self.tenant)
            .await
            .expect("Failed to initiate device flow")
    }
}
