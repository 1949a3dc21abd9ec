use orbitguard_api_client::TransportError;

use crate::gate::GatedFeature;
use crate::query::QueryKind;
use crate::session::SessionStoreError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthInputError {
    #[error("email must not be empty")]
    EmptyEmail,
    #[error("password must not be empty")]
    EmptyPassword,
}

/// A well-formed reply whose body carried an `error` field.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ApplicationError {
    pub message: String,
}

impl ApplicationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Superseded by a newer request on the same channel. Never shown.
    #[error("request superseded")]
    Cancelled,
    #[error("no active session; log in first")]
    Unauthenticated,
    /// `cleared` is true for the one report that actually removed the session.
    #[error("session rejected by server: {message}")]
    SessionInvalid { message: String, cleared: bool },
    #[error(transparent)]
    Application(#[from] ApplicationError),
    #[error("HTTP error! Status: {status}: {message}")]
    HttpStatus { status: u16, message: String },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("{feature} requires the Pro plan")]
    Refused { feature: GatedFeature },
    #[error("{kind} requests do not travel on this channel")]
    WrongChannel { kind: QueryKind },
    #[error("{operation} is not yet implemented in the backend")]
    NotImplemented { operation: &'static str },
    #[error(transparent)]
    Store(#[from] SessionStoreError),
    #[error(transparent)]
    Input(#[from] AuthInputError),
}

impl ClientError {
    /// Only superseded requests are dropped without telling anyone.
    #[must_use]
    pub fn is_silent(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    #[must_use]
    pub fn forces_reauthentication(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::SessionInvalid { .. })
    }
}
