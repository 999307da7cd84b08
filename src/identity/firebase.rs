use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;

use crate::identity::{AuthError, IdentityProvider, SubjectProfile};

/// Identity provider backed by the Firebase Auth REST surface
/// (`accounts:lookup` verifies an ID token and returns the account record).
pub struct FirebaseIdentity {
    client: Client,
    base_url: String,
    api_key: String,
}

impl FirebaseIdentity {
    pub fn new(base_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            api_key,
        }
    }

    async fn accounts_lookup(&self, body: serde_json::Value) -> Result<serde_json::Value, AuthError> {
        let response = self
            .client
            .post(format!(
                "{}/v1/accounts:lookup?key={}",
                self.base_url, self.api_key
            ))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::InvalidCredential);
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    fn name(&self) -> &str {
        "firebase"
    }

    async fn verify_credential(&self, token: &str) -> Result<String, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingCredential);
        }

        let json = self.accounts_lookup(json!({ "idToken": token })).await?;

        json["users"][0]["localId"]
            .as_str()
            .map(str::to_string)
            .ok_or(AuthError::InvalidCredential)
    }

    async fn lookup_subject(&self, subject: &str) -> Result<SubjectProfile, AuthError> {
        let json = self.accounts_lookup(json!({ "localId": [subject] })).await?;

        let user = &json["users"][0];
        if user.is_null() {
            return Err(AuthError::UnknownSubject);
        }

        Ok(SubjectProfile {
            email: user["email"].as_str().map(str::to_string),
            display_name: user["displayName"].as_str().map(str::to_string),
            avatar_url: user["photoUrl"].as_str().map(str::to_string),
        })
    }
}
