//! Credential attachment and reply classification shared by every channel.

use std::sync::Arc;

use orbitguard_api_client::{AnalysisTransport, Endpoint, TransportReply};
use serde_json::{Map, Value};

use crate::error::{ApplicationError, ClientError};
use crate::flight::{FlightTicket, SingleFlightSlot};
use crate::session::SessionStore;

const AUTH_FAILURE_MARKER: &str = "authentication failed";
const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Whether a service-reported error text means the credential was rejected.
#[must_use]
pub fn is_auth_failure_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains(AUTH_FAILURE_MARKER)
}

pub struct Exchange {
    transport: Arc<dyn AnalysisTransport>,
    sessions: Arc<dyn SessionStore>,
}

impl Exchange {
    pub fn new(transport: Arc<dyn AnalysisTransport>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            transport,
            sessions,
        }
    }

    #[must_use]
    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Sends an authenticated request. A 2xx reply is returned as is, even
    /// when it carries an `error` field, so the caller can render it in
    /// context. With a `flight`, a superseded request settles as
    /// [`ClientError::Cancelled`] and has no other effect.
    pub async fn post_authenticated(
        &self,
        endpoint: Endpoint,
        parameters: Map<String, Value>,
        flight: Option<(&SingleFlightSlot, &FlightTicket)>,
    ) -> Result<TransportReply, ClientError> {
        let Some(session) = self.sessions.load()? else {
            tracing::debug!(path = endpoint.path(), "no session; request not sent");
            return Err(ClientError::Unauthenticated);
        };

        let mut body = parameters;
        body.insert("email".to_string(), Value::String(session.profile.email.clone()));
        body.insert("token".to_string(), Value::String(session.credential.clone()));
        let body = Value::Object(body);

        let outcome = match flight {
            Some((_, ticket)) => {
                tokio::select! {
                    biased;
                    () = ticket.cancelled() => return Err(ClientError::Cancelled),
                    outcome = self.transport.post(endpoint, &body) => outcome,
                }
            }
            None => self.transport.post(endpoint, &body).await,
        };

        if let Some((slot, ticket)) = flight {
            if !slot.is_current(ticket) {
                tracing::debug!(
                    path = endpoint.path(),
                    generation = ticket.generation(),
                    "discarding superseded reply"
                );
                return Err(ClientError::Cancelled);
            }
        }

        let reply = outcome?;
        let error_message = reply.error_message();
        let auth_failure = reply.is_auth_rejection()
            || error_message.as_deref().is_some_and(is_auth_failure_message);
        if auth_failure {
            let message = error_message.unwrap_or_else(|| reply.body_text());
            let cleared = self.invalidate(&session.credential)?;
            return Err(ClientError::SessionInvalid { message, cleared });
        }

        if !reply.is_success() {
            return Err(ClientError::HttpStatus {
                status: reply.status,
                message: error_message.unwrap_or_else(|| reply.body_text()),
            });
        }
        Ok(reply)
    }

    /// Login and signup: no credentials attached, and any failure is reported
    /// as the service's message.
    pub async fn post_public(
        &self,
        endpoint: Endpoint,
        body: &Value,
    ) -> Result<TransportReply, ClientError> {
        let reply = self.transport.post(endpoint, body).await?;
        if let Some(message) = reply.error_message() {
            return Err(ApplicationError::new(message).into());
        }
        if !reply.is_success() {
            return Err(ApplicationError::new(UNKNOWN_ERROR_MESSAGE).into());
        }
        Ok(reply)
    }

    /// Clears the stored session only if it still holds the rejected
    /// credential, so a concurrent re-login survives.
    fn invalidate(&self, rejected_credential: &str) -> Result<bool, ClientError> {
        let still_stored = self
            .sessions
            .load()?
            .is_some_and(|current| current.credential == rejected_credential);
        if still_stored {
            self.sessions.clear()?;
            tracing::info!("server rejected the session credential; session cleared");
        }
        Ok(still_stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failure_text_is_case_insensitive() {
        assert!(is_auth_failure_message("Authentication failed."));
        assert!(is_auth_failure_message("error: AUTHENTICATION FAILED for token"));
        assert!(!is_auth_failure_message("Invalid altitude range."));
    }
}
