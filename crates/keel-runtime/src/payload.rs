//! Script payload rendering.
//!
//! The payload is a sequence of assignment statements on one client-side
//! global, not a JSON document:
//!
//! ```text
//! Keel = window.Keel || {};
//! Keel.config = {...};
//! Keel.perm = {};
//! Keel.action = {...};
//! Keel.perm = {...};
//! Keel.user = {"id":"5","username":"ed"};
//! ```
//!
//! Every value is JSON-encoded. The user line is present only for an
//! authenticated principal and carries id and username only.

use crate::config::PayloadConfig;
use crate::filter::SanitizedConfig;
use crate::permission::PermissionMap;
use keel_types::{ErrorCode, Identity};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;
use thiserror::Error;

/// Declared content type of a rendered payload.
pub const SCRIPT_CONTENT_TYPE: &str = "application/x-javascript";

/// Rendering failures.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The global name is not a script identifier.
    #[error("invalid payload global: {0:?}")]
    InvalidGlobal(String),

    /// A value could not be encoded.
    #[error("payload encoding failed: {0}")]
    Json(#[from] serde_json::Error),

    /// The body buffer rejected a write.
    #[error("payload write failed")]
    Write(#[from] std::fmt::Error),
}

impl ErrorCode for PayloadError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidGlobal(_) => "PAYLOAD_INVALID_GLOBAL",
            Self::Json(_) => "PAYLOAD_JSON",
            Self::Write(_) => "PAYLOAD_WRITE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[derive(Serialize)]
struct UserRecord<'a> {
    id: String,
    username: &'a str,
}

/// A rendered script body and its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPayload {
    body: String,
    content_type: &'static str,
}

impl ScriptPayload {
    /// Renders the payload.
    ///
    /// # Errors
    ///
    /// [`PayloadError::InvalidGlobal`] for a bad global name,
    /// [`PayloadError::Json`] if encoding fails,
    /// [`PayloadError::Write`] if the body cannot be written.
    pub fn render(
        settings: &PayloadConfig,
        config: &SanitizedConfig,
        routes: &Value,
        permissions: &PermissionMap,
        identity: Option<&Identity>,
    ) -> Result<Self, PayloadError> {
        let g = settings.global.as_str();
        if !crate::config::is_identifier(g) {
            return Err(PayloadError::InvalidGlobal(g.to_string()));
        }

        let mut body = String::new();
        writeln!(body, "{g} = window.{g} || {{}};")?;
        writeln!(body, "{g}.config = {};", serde_json::to_string(config)?)?;
        writeln!(body, "{g}.perm = {{}};")?;
        writeln!(body, "{g}.action = {};", serde_json::to_string(routes)?)?;
        writeln!(body, "{g}.perm = {};", serde_json::to_string(permissions)?)?;

        if let Some(identity) = identity {
            let user = UserRecord {
                id: identity.id.to_string(),
                username: &identity.username,
            };
            writeln!(body, "{g}.user = {};", serde_json::to_string(&user)?)?;
        }

        Ok(Self {
            body,
            content_type: SCRIPT_CONTENT_TYPE,
        })
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn content_type(&self) -> &'static str {
        self.content_type
    }

    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::SecurityFilter;
    use crate::options::ConfigLayer;
    use keel_types::PrincipalId;
    use serde_json::json;

    fn config() -> SanitizedConfig {
        let layer: ConfigLayer = [("site_name", json!("Demo")), ("password", json!("x"))]
            .into_iter()
            .collect();
        SecurityFilter::new().apply(layer).unwrap()
    }

    fn identity(name: &str) -> Identity {
        Identity {
            id: PrincipalId::new(5),
            username: name.to_string(),
        }
    }

    #[test]
    fn statements_in_order() {
        let payload = ScriptPayload::render(
            &PayloadConfig::default(),
            &config(),
            &json!({"12": "resource/update"}),
            &PermissionMap::default(),
            Some(&identity("ed")),
        )
        .unwrap();

        let lines: Vec<&str> = payload.body().lines().collect();
        assert_eq!(
            lines,
            vec![
                "Keel = window.Keel || {};",
                r#"Keel.config = {"site_name":"Demo"};"#,
                "Keel.perm = {};",
                r#"Keel.action = {"12":"resource/update"};"#,
                "Keel.perm = {};",
                r#"Keel.user = {"id":"5","username":"ed"};"#,
            ]
        );
        assert_eq!(payload.content_type(), "application/x-javascript");
    }

    #[test]
    fn no_user_line_without_identity() {
        let payload = ScriptPayload::render(
            &PayloadConfig::default(),
            &config(),
            &json!({}),
            &PermissionMap::default(),
            None,
        )
        .unwrap();
        assert!(!payload.body().contains(".user"));
    }

    #[test]
    fn username_cannot_break_out() {
        let payload = ScriptPayload::render(
            &PayloadConfig::default(),
            &config(),
            &json!({}),
            &PermissionMap::default(),
            Some(&identity(r#"x"};alert(1);//"#)),
        )
        .unwrap();

        let line = payload.body().lines().last().unwrap();
        let json_part = line
            .trim_start_matches("Keel.user = ")
            .trim_end_matches(';');
        let parsed: Value = serde_json::from_str(json_part).unwrap();
        assert_eq!(parsed["username"], r#"x"};alert(1);//"#);
    }

    #[test]
    fn custom_global() {
        let settings = PayloadConfig {
            global: "Admin".into(),
        };
        let payload = ScriptPayload::render(
            &settings,
            &config(),
            &json!({}),
            &PermissionMap::default(),
            None,
        )
        .unwrap();
        assert!(payload.body().starts_with("Admin = window.Admin || {};"));
    }

    #[test]
    fn invalid_global_rejected() {
        let settings = PayloadConfig {
            global: "window.x = 1;//".into(),
        };
        let err = ScriptPayload::render(
            &settings,
            &config(),
            &json!({}),
            &PermissionMap::default(),
            None,
        )
        .unwrap_err();
        assert!(matches!(err, PayloadError::InvalidGlobal(_)));
    }

    #[test]
    fn error_codes() {
        keel_types::assert_error_codes(
            &[
                PayloadError::InvalidGlobal("x y".into()),
                PayloadError::Write(std::fmt::Error),
            ],
            "PAYLOAD_",
        );
        let err = PayloadError::from(std::fmt::Error);
        assert_eq!(err.code(), "PAYLOAD_WRITE");
        assert!(!err.is_recoverable());
    }
}
