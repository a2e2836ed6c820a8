//! Principal (actor identity) types.
//!
//! A [`Principal`] says *who* is making the request. Whether that actor is
//! authenticated, and what it may do, is decided in `keel-auth`.

use crate::PrincipalId;
use serde::{Deserialize, Serialize};

/// The minimal identity record of a user.
///
/// This is exactly what leaves the process in the bootstrap payload:
/// no e-mail, no profile, no group membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// User-store identifier.
    pub id: PrincipalId,
    /// Login name.
    pub username: String,
}

/// The actor making a request.
///
/// | Variant | Typical Use |
/// |---------|-------------|
/// | `User` | A manager user with a known id and username |
/// | `Anonymous` | A caller with no user record (never authenticated) |
///
/// ```
/// use keel_types::{Principal, PrincipalId};
///
/// let user = Principal::user(PrincipalId::new(1), "admin");
/// assert!(user.is_user());
/// assert_eq!(user.to_string(), "user:1:admin");
///
/// assert!(Principal::Anonymous.identity().is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Principal {
    /// A known user.
    User(Identity),
    /// No user record.
    Anonymous,
}

impl Principal {
    /// Creates a user principal.
    #[must_use]
    pub fn user(id: PrincipalId, username: impl Into<String>) -> Self {
        Self::User(Identity {
            id,
            username: username.into(),
        })
    }

    /// Returns `true` for [`Principal::User`].
    #[must_use]
    pub fn is_user(&self) -> bool {
        matches!(self, Self::User(_))
    }

    /// Returns the identity record of a user principal.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Self::User(identity) => Some(identity),
            Self::Anonymous => None,
        }
    }

    /// Returns the user id, if any.
    #[must_use]
    pub fn id(&self) -> Option<PrincipalId> {
        self.identity().map(|i| i.id)
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User(identity) => write!(f, "user:{}:{}", identity.id, identity.username),
            Self::Anonymous => f.write_str("anonymous"),
        }
    }
}
