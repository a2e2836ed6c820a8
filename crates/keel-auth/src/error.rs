//! Access denied error type.

use keel_types::ErrorCode;
use thiserror::Error;

/// Reasons a caller is refused by the auth boundary.
///
/// ```
/// use keel_auth::AccessDenied;
/// use keel_types::ErrorCode;
///
/// let err = AccessDenied::unauthenticated("mgr");
/// assert!(err.to_string().contains("mgr"));
/// assert_eq!(err.code(), "AUTH_UNAUTHENTICATED");
/// ```
#[derive(Debug, Error)]
pub enum AccessDenied {
    /// The caller has no authenticated session in the realm.
    #[error("not authenticated in realm '{realm}'")]
    Unauthenticated {
        /// The realm that was checked.
        realm: String,
    },

    /// The caller is authenticated but may not access the target.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}

impl AccessDenied {
    /// Creates an [`AccessDenied::Unauthenticated`] error.
    pub fn unauthenticated(realm: impl Into<String>) -> Self {
        Self::Unauthenticated {
            realm: realm.into(),
        }
    }

    /// Creates an [`AccessDenied::PermissionDenied`] error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }
}

impl ErrorCode for AccessDenied {
    fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "AUTH_UNAUTHENTICATED",
            Self::PermissionDenied(_) => "AUTH_PERMISSION_DENIED",
        }
    }

    fn is_recoverable(&self) -> bool {
        // logging in again fixes the first, nothing fixes the second
        matches!(self, Self::Unauthenticated { .. })
    }
}
