//! Session type (Principal + authenticated realms).

use crate::AccessDenied;
use keel_types::{Identity, Principal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The security context of one caller.
///
/// A session pairs a [`Principal`] with the set of realms (for example
/// `mgr` for the manager, `web` for the front end) the principal has
/// logged into.
///
/// # Immutability
///
/// Sessions are value types. [`authenticate`](Self::authenticate) and
/// [`logout`](Self::logout) return new sessions.
///
/// An [`Principal::Anonymous`] session is never authenticated, whatever
/// realms it carries.
///
/// ```
/// use keel_auth::Session;
/// use keel_types::{Principal, PrincipalId};
///
/// let session = Session::new(Principal::user(PrincipalId::new(1), "admin"));
/// assert!(!session.is_authenticated("mgr"));
///
/// let session = session.authenticate("mgr");
/// assert!(session.is_authenticated("mgr"));
/// assert!(!session.is_authenticated("web"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    principal: Principal,
    realms: BTreeSet<String>,
}

impl Session {
    /// Creates a session with no authenticated realm.
    #[must_use]
    pub fn new(principal: Principal) -> Self {
        Self {
            principal,
            realms: BTreeSet::new(),
        }
    }

    /// Creates an anonymous session.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::new(Principal::Anonymous)
    }

    /// Returns the principal.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    /// Returns the identity record, for user principals.
    #[must_use]
    pub fn identity(&self) -> Option<&Identity> {
        self.principal.identity()
    }

    /// Returns a new session additionally authenticated in `realm`.
    #[must_use]
    pub fn authenticate(&self, realm: impl Into<String>) -> Self {
        let mut realms = self.realms.clone();
        realms.insert(realm.into());
        Self {
            principal: self.principal.clone(),
            realms,
        }
    }

    /// Returns a new session with `realm` removed.
    #[must_use]
    pub fn logout(&self, realm: &str) -> Self {
        let mut realms = self.realms.clone();
        realms.remove(realm);
        Self {
            principal: self.principal.clone(),
            realms,
        }
    }

    /// Returns `true` if a user principal is authenticated in `realm`.
    #[must_use]
    pub fn is_authenticated(&self, realm: &str) -> bool {
        self.principal.is_user() && self.realms.contains(realm)
    }

    /// Fails with [`AccessDenied::Unauthenticated`] unless authenticated in `realm`.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied::Unauthenticated`] naming the realm.
    pub fn require_authenticated(&self, realm: &str) -> Result<&Identity, AccessDenied> {
        match self.identity() {
            Some(identity) if self.realms.contains(realm) => Ok(identity),
            _ => Err(AccessDenied::unauthenticated(realm)),
        }
    }
}

impl std::fmt::Display for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let realms: Vec<&str> = self.realms.iter().map(String::as_str).collect();
        write!(f, "{}@[{}]", self.principal, realms.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_types::PrincipalId;

    fn user() -> Session {
        Session::new(Principal::user(PrincipalId::new(5), "ed"))
    }

    #[test]
    fn new_session_is_not_authenticated() {
        assert!(!user().is_authenticated("mgr"));
        assert!(user().require_authenticated("mgr").is_err());
    }

    #[test]
    fn authenticate_returns_new_session() {
        let base = user();
        let authed = base.authenticate("mgr");
        assert!(!base.is_authenticated("mgr"));
        assert!(authed.is_authenticated("mgr"));
        let identity = authed.require_authenticated("mgr").expect("authenticated");
        assert_eq!(identity.username, "ed");
    }

    #[test]
    fn logout_drops_realm() {
        let authed = user().authenticate("mgr").authenticate("web");
        let out = authed.logout("mgr");
        assert!(!out.is_authenticated("mgr"));
        assert!(out.is_authenticated("web"));
    }

    #[test]
    fn anonymous_never_authenticated() {
        let anon = Session::anonymous().authenticate("mgr");
        assert!(!anon.is_authenticated("mgr"));
        assert!(matches!(
            anon.require_authenticated("mgr"),
            Err(AccessDenied::Unauthenticated { .. })
        ));
    }

    #[test]
    fn display_lists_realms() {
        let s = user().authenticate("mgr");
        assert_eq!(s.to_string(), "user:5:ed@[mgr]");
    }
}
