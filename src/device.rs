//! OAuth 2.0 Device Authorization Grant (RFC 8628) state machine.
//!
//! ```text
//! pending --authorize--> authorized --consume--> consumed
//! pending --deny-------> denied
//! pending --expiry-----> expired
//! ```
//!
//! The service keeps no state between calls. Every transition that has to be
//! race free is a single conditional write in the [`DeviceStore`], so any
//! number of replicas can share one database.

use std::sync::Arc;

use chrono::{Duration, Utc};
use tracing::{debug, info, warn};

use crate::codes;
use crate::errors::DeviceError;
use crate::settings::DeviceFlowConfig;
pub use crate::storage::{DeviceAuthorization, DeviceStatus, DeviceStore, TenantContext};
use crate::storage::NewDeviceAuthorization;

/// Upper bound on user code draws per initiation.
pub const MAX_USER_CODE_ATTEMPTS: usize = 5;

/// What the device receives from a successful initiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedDeviceCode {
    pub record: DeviceAuthorization,
    /// Display form, e.g. `BCDF-GHJK`
    pub user_code: String,
    pub verification_uri: String,
    pub verification_uri_complete: String,
    pub expires_in: i64,
    pub interval: i64,
}

/// Outcome of a poll that did not fail outright.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollResult {
    /// State as persisted after this poll was recorded
    pub record: DeviceAuthorization,
    /// The device polled sooner than `record.interval` after its previous poll
    pub slow_down: bool,
}

impl PollResult {
    /// The authorized record, or the error the token endpoint should answer with.
    pub fn ready(self) -> Result<DeviceAuthorization, DeviceError> {
        if self.slow_down {
            return Err(DeviceError::SlowDown);
        }
        match self.record.status {
            DeviceStatus::Authorized => Ok(self.record),
            DeviceStatus::Pending => Err(DeviceError::AuthorizationPending),
            DeviceStatus::Denied => Err(DeviceError::AccessDenied),
            other => Err(DeviceError::wrong_state(DeviceStatus::Authorized, other)),
        }
    }
}

#[derive(Clone)]
pub struct DeviceAuthorizationService {
    store: Arc<dyn DeviceStore>,
    config: Arc<DeviceFlowConfig>,
}

impl DeviceAuthorizationService {
    pub fn new(store: Arc<dyn DeviceStore>, config: DeviceFlowConfig) -> Result<Self, DeviceError> {
        config.validate()?;
        Ok(Self {
            store,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &DeviceFlowConfig {
        &self.config
    }

    /// Start a flow for `client_id`.
    pub async fn initiate(
        &self,
        client_id: &str,
        scope: &str,
        tenant: &TenantContext,
    ) -> Result<IssuedDeviceCode, DeviceError> {
        if !self.config.enabled {
            return Err(DeviceError::FlowDisabled);
        }
        if !self.config.is_client_allowed(client_id) {
            warn!(client_id, "device authorization refused for client");
            return Err(DeviceError::ClientNotAllowed(client_id.to_string()));
        }

        let device_code = codes::generate_device_code()?;
        let now = Utc::now().timestamp();

        for attempt in 1..=MAX_USER_CODE_ATTEMPTS {
            let display = codes::generate_user_code(&self.config.user_code_format)?;
            let user_code = codes::normalize_user_code(&display);

            if self.store.find_by_user_code(&user_code).await?.is_some() {
                debug!(attempt, "user code collision, drawing again");
                continue;
            }

            let new = NewDeviceAuthorization {
                tenant: tenant.clone(),
                client_id: client_id.to_string(),
                device_code: device_code.clone(),
                user_code,
                verification_uri: self.config.verification_uri.clone(),
                scope: scope.to_string(),
                interval: self.config.interval.num_seconds(),
                expires_at: now + self.config.expires_in.num_seconds(),
                created_at: now,
            };

            match self.store.create(new).await {
                Ok(record) => {
                    info!(client_id, id = %record.id, "device authorization started");
                    return Ok(IssuedDeviceCode {
                        verification_uri_complete: verification_uri_complete(
                            &record.verification_uri,
                            &display,
                        ),
                        verification_uri: record.verification_uri.clone(),
                        expires_in: record.expires_in(now),
                        interval: record.interval,
                        user_code: display,
                        record,
                    });
                }
                // Another replica inserted the same user code between our check and insert
                Err(e) if e.is_unique_violation() => {
                    debug!(attempt, "user code taken concurrently, drawing again");
                    continue;
                }
                Err(e) => return Err(e),
            }
        }

        warn!(client_id, "no free user code after {MAX_USER_CODE_ATTEMPTS} attempts");
        Err(DeviceError::UserCodeCollision(MAX_USER_CODE_ATTEMPTS))
    }

    /// Look up by user code, ignoring case, hyphens and spaces.
    pub async fn find_by_user_code(&self, user_code: &str) -> Result<DeviceAuthorization, DeviceError> {
        let normalized = codes::normalize_user_code(user_code);
        self.store
            .find_by_user_code(&normalized)
            .await?
            .ok_or(DeviceError::UnknownUserCode)
    }

    pub async fn find_by_device_code(
        &self,
        device_code: &str,
    ) -> Result<DeviceAuthorization, DeviceError> {
        self.store
            .find_by_device_code(device_code)
            .await?
            .ok_or(DeviceError::UnknownDeviceCode)
    }

    /// User approval from the verification page.
    pub async fn authorize(
        &self,
        user_code: &str,
        user_id: &str,
        session_id: &str,
    ) -> Result<DeviceAuthorization, DeviceError> {
        let normalized = codes::normalize_user_code(user_code);
        let record = self.find_by_user_code(&normalized).await?;
        let now = Utc::now().timestamp();
        self.ensure_pending(&record, now).await?;

        if !self
            .store
            .authorize_device(&normalized, user_id, session_id, now)
            .await?
        {
            return Err(self.user_code_rejection(&normalized, now).await);
        }

        info!(id = %record.id, user_id, "device authorized");
        self.find_by_user_code(&normalized).await
    }

    /// User refusal from the verification page.
    pub async fn deny(&self, user_code: &str) -> Result<DeviceAuthorization, DeviceError> {
        let normalized = codes::normalize_user_code(user_code);
        let record = self.find_by_user_code(&normalized).await?;
        let now = Utc::now().timestamp();
        self.ensure_pending(&record, now).await?;

        if !self.store.deny_device(&normalized, now).await? {
            return Err(self.user_code_rejection(&normalized, now).await);
        }

        info!(id = %record.id, "device authorization denied");
        self.find_by_user_code(&normalized).await
    }

    /// One poll of the token endpoint by the device.
    ///
    /// The poll is recorded even when the device is told to slow down, so a
    /// device that ignores `slow_down` still runs into the attempt ceiling.
    pub async fn poll(&self, device_code: &str) -> Result<PollResult, DeviceError> {
        let record = self.find_by_device_code(device_code).await?;
        let now = Utc::now().timestamp();

        if record.is_expired_at(now) {
            self.store
                .mark_expired(device_code, now)
                .await?;
            return Err(DeviceError::Expired);
        }

        match record.status {
            DeviceStatus::Expired => return Err(DeviceError::Expired),
            DeviceStatus::Consumed => return Err(DeviceError::AlreadyConsumed),
            DeviceStatus::Denied => return Err(DeviceError::AccessDenied),
            DeviceStatus::Pending | DeviceStatus::Authorized => {}
        }

        let slow_down = record
            .last_polled_at
            .map_or(false, |last| now - last < record.interval);

        if !self.store.update_poll_info(device_code, now).await? {
            return Err(DeviceError::UnknownDeviceCode);
        }
        let record = self.find_by_device_code(device_code).await?;
        debug!(id = %record.id, poll_count = record.poll_count, slow_down, "device polled");

        if record.poll_count > self.config.max_poll_attempts {
            self.store
                .mark_expired(device_code, now)
                .await?;
            warn!(id = %record.id, poll_count = record.poll_count, "poll ceiling exceeded");
            return Err(DeviceError::TooManyAttempts {
                attempts: record.poll_count,
                max: self.config.max_poll_attempts,
            });
        }

        Ok(PollResult { record, slow_down })
    }

    /// Redeem an authorized record. Exactly one of several concurrent callers succeeds.
    pub async fn consume(&self, device_code: &str) -> Result<DeviceAuthorization, DeviceError> {
        let now = Utc::now().timestamp();

        if self.store.mark_consumed(device_code, now).await? {
            let record = self.find_by_device_code(device_code).await?;
            info!(id = %record.id, "device code consumed");
            return Ok(record);
        }

        let record = self.find_by_device_code(device_code).await?;
        warn!(id = %record.id, status = %record.status, "device code consumption refused");
        if record.status == DeviceStatus::Authorized && record.is_expired_at(now) {
            return Err(DeviceError::Expired);
        }
        Err(DeviceError::wrong_state(DeviceStatus::Authorized, record.status))
    }

    /// Delete every unconsumed record past its expiry.
    pub async fn cleanup_expired(&self) -> Result<u64, DeviceError> {
        let now = Utc::now().timestamp();
        self.store.delete_expired(now).await
    }

    /// Delete consumed records older than `retention`.
    pub async fn cleanup_old_consumed(&self, retention: Duration) -> Result<u64, DeviceError> {
        let cutoff = Utc::now().timestamp() - retention.num_seconds();
        self.store.delete_old_consumed(cutoff).await
    }

    pub fn display_user_code(&self, record: &DeviceAuthorization) -> String {
        codes::display_user_code(&record.user_code, &self.config.user_code_format)
    }

    /// Precondition shared by authorize and deny. An overdue pending record is
    /// flipped to expired on the spot.
    async fn ensure_pending(&self, record: &DeviceAuthorization, now: i64) -> Result<(), DeviceError> {
        if record.status != DeviceStatus::Pending {
            warn!(id = %record.id, status = %record.status, "device authorization not pending");
            return Err(DeviceError::wrong_state(DeviceStatus::Pending, record.status));
        }
        if record.is_expired_at(now) {
            self.store
                .mark_expired(&record.device_code, now)
                .await?;
            return Err(DeviceError::Expired);
        }
        Ok(())
    }

    /// Explain why a conditional write on a user code matched no row.
    async fn user_code_rejection(&self, normalized: &str, now: i64) -> DeviceError {
        match self.store.find_by_user_code(normalized).await {
            Ok(Some(record)) if record.status == DeviceStatus::Pending && record.is_expired_at(now) => {
                DeviceError::Expired
            }
            Ok(Some(record)) => DeviceError::wrong_state(DeviceStatus::Pending, record.status),
            Ok(None) => DeviceError::UnknownUserCode,
            Err(e) => e,
        }
    }
}

fn verification_uri_complete(verification_uri: &str, display_user_code: &str) -> String {
    let separator = if verification_uri.contains('?') { '&' } else { '?' };
    format!(
        "{}{}user_code={}",
        verification_uri,
        separator,
        urlencoding::encode(display_user_code)
    )
}
