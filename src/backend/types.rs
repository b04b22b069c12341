//! Wire and data types shared across the backend client and the session
//! controller.

use serde::{Deserialize, Serialize};

// ── Todo items ───────────────────────────────────────────────────

/// A single todo entry, deserialized from a remote document.
///
/// Items live for one refresh cycle: the in-memory list is replaced
/// wholesale on every refresh, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    /// Backend-assigned document id.
    #[serde(rename = "_id")]
    pub id: String,
    /// Id of the user owning this item.
    #[serde(rename = "user")]
    pub owner_id: String,
    /// The todo text.
    pub text: String,
    /// Whether the item has been ticked off. Documents created by
    /// `insert` carry no flag, so absence deserializes to `false`.
    #[serde(default)]
    pub checked: bool,
}

// ── Auth provider configuration ──────────────────────────────────

/// Which external login methods the backend application has configured.
///
/// Fetched once at startup; immutable for the controller's purposes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthProviderInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<FacebookProviderConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google: Option<GoogleProviderConfig>,
}

impl AuthProviderInfo {
    /// Display names of the configured providers, in a stable order.
    pub fn provider_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        if self.facebook.is_some() {
            names.push("Facebook".to_string());
        }
        if self.google.is_some() {
            names.push("Google".to_string());
        }
        names
    }

    pub fn is_empty(&self) -> bool {
        self.facebook.is_none() && self.google.is_none()
    }
}

/// Facebook login configuration delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FacebookProviderConfig {
    /// Facebook application id.
    pub app_id: String,
    /// OAuth scopes to request.
    #[serde(default)]
    pub scopes: Vec<String>,
}

/// Google sign-in configuration delivered by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoogleProviderConfig {
    /// OAuth client id.
    pub client_id: String,
    /// OAuth scopes to request.
    #[serde(default)]
    pub scopes: Vec<String>,
}

// ── Credentials and sessions ─────────────────────────────────────

/// Opaque credential yielded by a provider login flow, consumed by the
/// backend's credential exchange. The token/code contents are never
/// inspected by this crate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCredential {
    Facebook { access_token: String },
    Google { auth_code: String },
}

impl ProviderCredential {
    /// Route segment identifying the provider on the backend.
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Facebook { .. } => "facebook",
            Self::Google { .. } => "google",
        }
    }

    /// JSON body for the credential exchange request.
    pub fn login_body(&self) -> serde_json::Value {
        match self {
            Self::Facebook { access_token } => {
                serde_json::json!({ "access_token": access_token })
            }
            Self::Google { auth_code } => serde_json::json!({ "auth_code": auth_code }),
        }
    }
}

/// Backend session produced by a successful credential exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    /// Backend user id the session belongs to.
    pub user_id: String,
    /// Bearer token for authenticated requests.
    pub access_token: String,
}

// ── Auth notifications ───────────────────────────────────────────

/// Login/logout notifications delivered on the backend's event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    LoggedIn { user_id: String },
    LoggedOut,
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn todo_item_checked_defaults_to_false() {
        let doc = r#"{"_id": "it-1", "user": "user-1", "text": "Buy milk"}"#;
        let item: TodoItem = serde_json::from_str(doc).unwrap();
        assert_eq!(item.id, "it-1");
        assert_eq!(item.owner_id, "user-1");
        assert_eq!(item.text, "Buy milk");
        assert!(!item.checked);
    }

    #[test]
    fn todo_item_roundtrips_renamed_fields() {
        let item = TodoItem {
            id: "it-2".into(),
            owner_id: "user-1".into(),
            text: "Walk the dog".into(),
            checked: true,
        };
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"_id\""));
        assert!(json.contains("\"user\""));

        let parsed: TodoItem = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, item);
    }

    #[test]
    fn provider_info_names_stable_order() {
        let info = AuthProviderInfo {
            facebook: Some(FacebookProviderConfig {
                app_id: "fb-app".into(),
                scopes: vec!["public_profile".into()],
            }),
            google: Some(GoogleProviderConfig {
                client_id: "g-client".into(),
                scopes: vec![],
            }),
        };
        assert_eq!(info.provider_names(), vec!["Facebook", "Google"]);
        assert!(!info.is_empty());
    }

    #[test]
    fn provider_info_deserializes_missing_providers() {
        let info: AuthProviderInfo = serde_json::from_str("{}").unwrap();
        assert!(info.is_empty());
        assert!(info.provider_names().is_empty());

        let info: AuthProviderInfo =
            serde_json::from_str(r#"{"facebook": {"app_id": "fb-app"}}"#).unwrap();
        assert!(info.facebook.is_some());
        assert!(info.google.is_none());
        assert!(info.facebook.unwrap().scopes.is_empty());
    }

    #[test]
    fn credential_routes_and_bodies() {
        let fb = ProviderCredential::Facebook {
            access_token: "tok".into(),
        };
        assert_eq!(fb.provider(), "facebook");
        assert_eq!(fb.login_body(), serde_json::json!({"access_token": "tok"}));

        let google = ProviderCredential::Google {
            auth_code: "code".into(),
        };
        assert_eq!(google.provider(), "google");
        assert_eq!(google.login_body(), serde_json::json!({"auth_code": "code"}));
    }
}
