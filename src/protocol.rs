//! Wire shapes for the device authorization and token endpoints (RFC 8628 §3.2, §3.5).

use serde::{Deserialize, Serialize};

use crate::device::IssuedDeviceCode;
use crate::errors::DeviceError;

/// Successful response of the device authorization endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAuthorizationResponse {
    pub device_code: String,
    pub user_code: String,
    pub verification_uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_uri_complete: Option<String>,
    pub expires_in: i64,
    pub interval: i64,
}

impl From<&IssuedDeviceCode> for DeviceAuthorizationResponse {
    fn from(issued: &IssuedDeviceCode) -> Self {
        Self {
            device_code: issued.record.device_code.clone(),
            user_code: issued.user_code.clone(),
            verification_uri: issued.verification_uri.clone(),
            verification_uri_complete: Some(issued.verification_uri_complete.clone()),
            expires_in: issued.expires_in,
            interval: issued.interval,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenErrorCode {
    AuthorizationPending,
    SlowDown,
    AccessDenied,
    ExpiredToken,
    InvalidGrant,
}

impl TokenErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenErrorCode::AuthorizationPending => "authorization_pending",
            TokenErrorCode::SlowDown => "slow_down",
            TokenErrorCode::AccessDenied => "access_denied",
            TokenErrorCode::ExpiredToken => "expired_token",
            TokenErrorCode::InvalidGrant => "invalid_grant",
        }
    }
}

/// Error body of the token endpoint while the device polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenErrorBody {
    pub error: TokenErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Map a poll or consume failure to the token endpoint error it stands for.
///
/// `None` means the failure is not part of the device grant vocabulary
/// (storage trouble, configuration) and should surface as a server error.
pub fn token_error(err: &DeviceError) -> Option<TokenErrorBody> {
    let error = match err {
        DeviceError::AuthorizationPending => TokenErrorCode::AuthorizationPending,
        DeviceError::SlowDown => TokenErrorCode::SlowDown,
        DeviceError::Expired | DeviceError::TooManyAttempts { .. } => TokenErrorCode::ExpiredToken,
        DeviceError::AccessDenied => TokenErrorCode::AccessDenied,
        DeviceError::AlreadyConsumed
        | DeviceError::UnknownDeviceCode
        | DeviceError::InvalidState { .. } => TokenErrorCode::InvalidGrant,
        _ => return None,
    };
    Some(TokenErrorBody {
        error,
        error_description: Some(err.to_string()),
    })
}
