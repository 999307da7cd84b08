pub mod firebase;

use async_trait::async_trait;
use firebase::FirebaseIdentity;
use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication required")]
    MissingCredential,
    #[error("Invalid or expired token")]
    InvalidCredential,
    #[error("Unknown subject")]
    UnknownSubject,
    #[error("Network Error: {0}")]
    Network(String),
}

/// Profile data the identity provider holds for a subject, used to
/// auto-provision a local user row on first sight.
#[derive(Debug, Clone)]
pub struct SubjectProfile {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Exchange a bearer credential for the provider's subject identifier.
    async fn verify_credential(&self, token: &str) -> Result<String, AuthError>;

    /// Fetch profile data for a known subject.
    async fn lookup_subject(&self, subject: &str) -> Result<SubjectProfile, AuthError>;
}

pub struct IdentityFactory;

impl IdentityFactory {
    pub fn create_default(config: &AppConfig) -> Option<Arc<dyn IdentityProvider>> {
        match config.identity.provider.as_str() {
            "firebase" => {
                let cfg = config.identity.firebase.as_ref()?;
                Some(Arc::new(FirebaseIdentity::new(
                    cfg.api_base.clone(),
                    cfg.api_key.clone(),
                )))
            }
            _ => None,
        }
    }
}
