//! Login, signup, tier changes and API keys.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use orbitguard_api_client::{ApiKeyReply, AuthReply, CredentialsRequest, Endpoint, UpgradeReply};
use serde_json::{Map, json};

use crate::error::{ApplicationError, AuthInputError, ClientError};
use crate::exchange::Exchange;
use crate::session::{Session, SessionStore};

pub const API_KEY_VALIDITY_HOURS: i64 = 24;
pub const API_KEY_NOTICE: &str = "Your new key is valid for 24 hours. Please copy it now.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyGrant {
    pub api_key: String,
    pub issued_at: DateTime<Utc>,
    /// Display only; the service enforces the actual window.
    pub expires_at: DateTime<Utc>,
}

impl ApiKeyGrant {
    #[must_use]
    pub fn issued(api_key: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            api_key,
            issued_at,
            expires_at: issued_at + Duration::hours(API_KEY_VALIDITY_HOURS),
        }
    }
}

pub fn validate_credentials(
    email: &str,
    password: &str,
) -> Result<CredentialsRequest, AuthInputError> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AuthInputError::EmptyEmail);
    }
    if password.is_empty() {
        return Err(AuthInputError::EmptyPassword);
    }
    Ok(CredentialsRequest {
        email: email.to_string(),
        password: password.to_string(),
    })
}

pub struct AccountService {
    exchange: Arc<Exchange>,
}

impl AccountService {
    #[must_use]
    pub fn new(exchange: Arc<Exchange>) -> Self {
        Self { exchange }
    }

    fn sessions(&self) -> &Arc<dyn SessionStore> {
        self.exchange.sessions()
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.authenticate(Endpoint::Login, email, password).await
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        self.authenticate(Endpoint::Signup, email, password).await
    }

    async fn authenticate(
        &self,
        endpoint: Endpoint,
        email: &str,
        password: &str,
    ) -> Result<Session, ClientError> {
        let credentials = validate_credentials(email, password)?;
        let body = json!({
            "email": credentials.email,
            "password": credentials.password,
        });
        let reply = self.exchange.post_public(endpoint, &body).await?;
        let auth = reply.decode::<AuthReply>()?;
        if let Some(message) = auth.error.filter(|message| !message.trim().is_empty()) {
            return Err(ApplicationError::new(message).into());
        }
        let (Some(token), Some(user)) = (auth.token, auth.user) else {
            return Err(ApplicationError::new("An unknown error occurred.").into());
        };

        let session = Session::new(token, user);
        self.sessions().save(&session)?;
        tracing::info!(
            path = endpoint.path(),
            tier = session.tier().as_str(),
            "session established"
        );
        Ok(session)
    }

    pub fn logout(&self) -> Result<(), ClientError> {
        self.sessions().clear()?;
        tracing::info!("session cleared by logout");
        Ok(())
    }

    /// Moves the account to Pro. Only the profile half of the session is
    /// replaced; the credential is kept.
    pub async fn upgrade(&self) -> Result<Session, ClientError> {
        let reply = self
            .exchange
            .post_authenticated(Endpoint::Upgrade, Map::new(), None)
            .await?;
        if let Some(message) = reply.error_message() {
            return Err(ApplicationError::new(message).into());
        }
        let upgraded = reply.decode::<UpgradeReply>()?;
        let session = self
            .sessions()
            .replace_profile(&upgraded.user)?
            .ok_or(ClientError::Unauthenticated)?;
        tracing::info!(tier = session.tier().as_str(), "subscription tier changed");
        Ok(session)
    }

    /// The service has no downgrade operation.
    pub fn downgrade(&self) -> Result<Session, ClientError> {
        Err(ClientError::NotImplemented {
            operation: "downgrade to the free plan",
        })
    }

    pub async fn generate_api_key(&self) -> Result<ApiKeyGrant, ClientError> {
        let reply = self
            .exchange
            .post_authenticated(Endpoint::GenerateKey, Map::new(), None)
            .await?;
        if let Some(message) = reply.error_message() {
            return Err(ApplicationError::new(message).into());
        }
        let key = reply.decode::<ApiKeyReply>()?;
        Ok(ApiKeyGrant::issued(key.api_key, Utc::now()))
    }
}
