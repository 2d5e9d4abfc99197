use miette::Diagnostic;
use thiserror::Error;

use crate::storage::DeviceStatus;

/// Coarse classification of [`DeviceError`], used by callers that map
/// failures onto protocol responses or retry policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown user code or device code.
    NotFound,
    /// The record exists but is not in the state the operation requires.
    InvalidState,
    /// Client not on the allow-list, flow disabled, or the user denied the request.
    PermissionDenied,
    /// Polling faster than the interval. Recoverable by waiting.
    RateLimited,
    /// Poll ceiling crossed. The device must restart the flow.
    AttemptsExceeded,
    /// Storage or randomness failure. The whole operation is safe to retry.
    Transient,
    /// Invalid configuration detected at construction time.
    Configuration,
}

#[derive(Debug, Error, Diagnostic)]
pub enum DeviceError {
    #[error("unknown user code")]
    #[diagnostic(code(device_grant::unknown_user_code))]
    UnknownUserCode,

    #[error("unknown device code")]
    #[diagnostic(code(device_grant::unknown_device_code))]
    UnknownDeviceCode,

    #[error("device code has expired")]
    #[diagnostic(
        code(device_grant::expired),
        help("Restart the flow from the device authorization endpoint")
    )]
    Expired,

    #[error("device code has already been used")]
    #[diagnostic(code(device_grant::already_consumed))]
    AlreadyConsumed,

    #[error("authorization is still pending")]
    #[diagnostic(code(device_grant::authorization_pending))]
    AuthorizationPending,

    #[error("device authorization is {actual}, expected {expected}")]
    #[diagnostic(code(device_grant::invalid_state))]
    InvalidState {
        expected: DeviceStatus,
        actual: DeviceStatus,
    },

    #[error("user denied the authorization request")]
    #[diagnostic(code(device_grant::access_denied))]
    AccessDenied,

    #[error("client `{0}` is not allowed to use the device flow")]
    #[diagnostic(code(device_grant::client_not_allowed))]
    ClientNotAllowed(String),

    #[error("device authorization flow is disabled")]
    #[diagnostic(
        code(device_grant::disabled),
        help("Set device_flow.enabled = true to accept device authorization requests")
    )]
    FlowDisabled,

    #[error("polling too frequently")]
    #[diagnostic(code(device_grant::slow_down))]
    SlowDown,

    #[error("too many polling attempts ({attempts} > {max})")]
    #[diagnostic(
        code(device_grant::too_many_attempts),
        help("Restart the flow from the device authorization endpoint")
    )]
    TooManyAttempts { attempts: i64, max: i64 },

    #[error("database error while trying to {operation}: {source}")]
    #[diagnostic(code(device_grant::db))]
    Db {
        operation: &'static str,
        #[source]
        source: sea_orm::DbErr,
    },

    #[error("secure random source unavailable: {0}")]
    #[diagnostic(code(device_grant::random))]
    RandomSource(#[from] rand::Error),

    #[error("could not allocate a unique user code after {0} attempts")]
    #[diagnostic(code(device_grant::user_code_collision))]
    UserCodeCollision(usize),

    #[error("Config error: {0}")]
    #[diagnostic(code(device_grant::config))]
    Config(String),

    #[error("Scheduler error: {0}")]
    #[diagnostic(code(device_grant::scheduler))]
    Scheduler(String),

    #[error("unknown job `{0}`")]
    #[diagnostic(
        code(device_grant::unknown_job),
        help("Known jobs: cleanup_expired_device_codes, cleanup_consumed_device_codes")
    )]
    UnknownJob(String),
}

impl DeviceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeviceError::UnknownUserCode
            | DeviceError::UnknownDeviceCode
            | DeviceError::UnknownJob(_) => ErrorKind::NotFound,
            DeviceError::Expired
            | DeviceError::AlreadyConsumed
            | DeviceError::AuthorizationPending
            | DeviceError::InvalidState { .. } => ErrorKind::InvalidState,
            DeviceError::AccessDenied
            | DeviceError::ClientNotAllowed(_)
            | DeviceError::FlowDisabled => ErrorKind::PermissionDenied,
            DeviceError::SlowDown => ErrorKind::RateLimited,
            DeviceError::TooManyAttempts { .. } => ErrorKind::AttemptsExceeded,
            DeviceError::Db { .. }
            | DeviceError::RandomSource(_)
            | DeviceError::UserCodeCollision(_)
            | DeviceError::Scheduler(_) => ErrorKind::Transient,
            DeviceError::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Adapter for `map_err` that records which store operation failed.
    pub(crate) fn db(operation: &'static str) -> impl FnOnce(sea_orm::DbErr) -> Self {
        move |source| DeviceError::Db { operation, source }
    }

    /// True when a write lost a race on a unique column, e.g. two replicas
    /// inserting the same user code.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            DeviceError::Db { source, .. } => matches!(
                source.sql_err(),
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
            ),
            _ => false,
        }
    }

    /// Rejection for an operation attempted on a record that left `expected`.
    /// Expired and consumed records get dedicated variants; both stay `InvalidState`.
    pub(crate) fn wrong_state(expected: DeviceStatus, actual: DeviceStatus) -> Self {
        match actual {
            DeviceStatus::Expired => DeviceError::Expired,
            DeviceStatus::Consumed => DeviceError::AlreadyConsumed,
            _ => DeviceError::InvalidState { expected, actual },
        }
    }
}
