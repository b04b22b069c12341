//! OAuth provider front-ends.
//!
//! Each provider opens its consent page in the system browser and reads
//! the resulting credential from a terminal prompt. Token issuance, scope
//! grants, and everything else OAuth live entirely on the provider side;
//! this module only carries the opaque credential to the backend for
//! exchange.

use anyhow::{bail, Result};
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;

use crate::backend::{AuthProviderInfo, FacebookProviderConfig, GoogleProviderConfig, ProviderCredential};
use crate::ui::{NoticeLevel, TodoView};

/// A configured login method the user can pick on the login screen.
pub trait LoginProvider: Send + Sync {
    /// Display name, e.g. "Facebook".
    fn name(&self) -> &'static str;

    /// Run the interactive login flow and yield the opaque credential.
    /// User-facing notices go through `view`. Blocks on terminal input;
    /// call from a blocking context.
    fn obtain_credential(&self, view: &dyn TodoView) -> Result<ProviderCredential>;
}

/// Build one provider front-end per configured login method, in a stable
/// order (Facebook, then Google).
pub fn providers_from_info(info: AuthProviderInfo) -> Vec<Box<dyn LoginProvider>> {
    let mut providers: Vec<Box<dyn LoginProvider>> = Vec::new();
    if let Some(config) = info.facebook {
        providers.push(Box::new(FacebookLogin { config }));
    }
    if let Some(config) = info.google {
        providers.push(Box::new(GoogleLogin { config }));
    }
    providers
}

// ── Facebook ─────────────────────────────────────────────────────

pub struct FacebookLogin {
    config: FacebookProviderConfig,
}

impl LoginProvider for FacebookLogin {
    fn name(&self) -> &'static str {
        "Facebook"
    }

    fn obtain_credential(&self, view: &dyn TodoView) -> Result<ProviderCredential> {
        let url = facebook_dialog_url(&self.config.app_id, &self.config.scopes);
        launch_consent_page(view, self.name(), &url);

        let access_token = prompt_credential("Paste the Facebook access token")?;
        Ok(ProviderCredential::Facebook { access_token })
    }
}

fn facebook_dialog_url(app_id: &str, scopes: &[String]) -> String {
    let mut url = format!(
        "https://www.facebook.com/dialog/oauth?client_id={}&response_type=token\
         &redirect_uri=https%3A%2F%2Fwww.facebook.com%2Fconnect%2Flogin_success.html",
        urlencoding::encode(app_id)
    );
    if !scopes.is_empty() {
        url.push_str("&scope=");
        url.push_str(&urlencoding::encode(&scopes.join(",")));
    }
    url
}

// ── Google ───────────────────────────────────────────────────────

pub struct GoogleLogin {
    config: GoogleProviderConfig,
}

impl LoginProvider for GoogleLogin {
    fn name(&self) -> &'static str {
        "Google"
    }

    fn obtain_credential(&self, view: &dyn TodoView) -> Result<ProviderCredential> {
        let url = google_consent_url(&self.config.client_id, &self.config.scopes);
        launch_consent_page(view, self.name(), &url);

        let auth_code = prompt_credential("Paste the Google authorization code")?;
        Ok(ProviderCredential::Google { auth_code })
    }
}

fn google_consent_url(client_id: &str, scopes: &[String]) -> String {
    let mut url = format!(
        "https://accounts.google.com/o/oauth2/v2/auth?client_id={}&response_type=code\
         &access_type=offline&redirect_uri=urn%3Aietf%3Awg%3Aoauth%3A2.0%3Aoob",
        urlencoding::encode(client_id)
    );
    if !scopes.is_empty() {
        url.push_str("&scope=");
        url.push_str(&urlencoding::encode(&scopes.join(" ")));
    }
    url
}

// ── Shared flow helpers ──────────────────────────────────────────

fn launch_consent_page(view: &dyn TodoView, provider: &str, url: &str) {
    view.notify(
        NoticeLevel::Info,
        &format!("Complete the {provider} login in your browser:\n  {url}"),
    );
    if let Err(e) = open::that(url) {
        // The notice above carries the URL, so the user can still open it
        // by hand.
        tracing::warn!(provider, error = %e, "could not open browser");
    }
}

fn prompt_credential(prompt: &str) -> Result<String> {
    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()?;
    let value = raw.trim().to_string();
    if value.is_empty() {
        bail!("login cancelled");
    }
    Ok(value)
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn facebook_url_carries_app_id_and_scopes() {
        let url = facebook_dialog_url("fb-app", &["public_profile".into(), "email".into()]);
        assert!(url.starts_with("https://www.facebook.com/dialog/oauth?"));
        assert!(url.contains("client_id=fb-app"));
        assert!(url.contains("response_type=token"));
        assert!(url.contains("scope=public_profile%2Cemail"));
    }

    #[test]
    fn facebook_url_omits_empty_scope() {
        let url = facebook_dialog_url("fb-app", &[]);
        assert!(!url.contains("scope="));
    }

    #[test]
    fn google_url_carries_client_id_and_scopes() {
        let url = google_consent_url(
            "g-client",
            &["https://www.googleapis.com/auth/userinfo.email".into()],
        );
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=g-client"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains("scope=https%3A%2F%2Fwww.googleapis.com"));
    }

    #[test]
    fn providers_built_in_stable_order() {
        let info = AuthProviderInfo {
            facebook: Some(FacebookProviderConfig {
                app_id: "fb-app".into(),
                scopes: vec![],
            }),
            google: Some(GoogleProviderConfig {
                client_id: "g-client".into(),
                scopes: vec![],
            }),
        };
        let providers = providers_from_info(info);
        let names: Vec<_> = providers.iter().map(|p| p.name()).collect();
        assert_eq!(names, vec!["Facebook", "Google"]);
    }

    #[test]
    fn providers_empty_when_none_configured() {
        assert!(providers_from_info(AuthProviderInfo::default()).is_empty());
    }

    #[test]
    fn providers_single_when_one_configured() {
        let info = AuthProviderInfo {
            facebook: None,
            google: Some(GoogleProviderConfig {
                client_id: "g-client".into(),
                scopes: vec![],
            }),
        };
        let providers = providers_from_info(info);
        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].name(), "Google");
    }
}
