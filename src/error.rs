// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{io, result};

use thiserror::Error;

use crate::sync;

pub(crate) type Result<T, E = Error> = result::Result<T, E>;

#[derive(Error, Debug)]
pub(crate) enum Error {
    #[error("IO operation failed: {0}")]
    Io(#[from] io::Error),
    #[error("JSON format error: {0}")]
    Json(serde_json::Error),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("API error: {0}")]
    Api(#[from] Api),
    #[error("session error: {0}")]
    Session(#[from] Session),
    #[error("{0}")]
    Sync(#[from] sync::Failure),
    #[error("invariant violated: {0}")]
    Invariant(#[from] Invariant),
    #[error("storage error: {0}")]
    Storage(#[from] Storage),
    #[error("password retrieval error: {0}")]
    Password(#[from] Password),
    #[error("configuration error: {0}")]
    Config(#[from] Config),
    #[error("command execution failed")]
    Command,
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// The transport-level failure behind this error, if there is one.
    pub(crate) fn api(&self) -> Option<&Api> {
        match *self {
            Self::Api(ref e) => Some(e),
            Self::Sync(ref failure) => Some(failure.kind()),
            Self::Io(_)
            | Self::Json(_)
            | Self::Url(_)
            | Self::Session(_)
            | Self::Invariant(_)
            | Self::Storage(_)
            | Self::Password(_)
            | Self::Config(_)
            | Self::Command
            | Self::Cancelled => None,
        }
    }
}

impl From<pinentry::Error> for Error {
    fn from(value: pinentry::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(
            clippy::wildcard_enum_match_arm,
            clippy::match_wildcard_for_single_variants
        )]
        match value {
            pinentry::Error::Cancelled | pinentry::Error::Timeout => Self::Cancelled,
            pinentry::Error::Io(e) => Self::Io(e),
            _ => Self::Password(Password::Pinentry(value)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        // LINT: Deliberate fall-through that should catch future cases added to
        // the enum.
        #[allow(clippy::wildcard_enum_match_arm)]
        match value.classify() {
            serde_json::error::Category::Io => Self::Io(value.into()),
            _ => Self::Json(value),
        }
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(value: tokio::task::JoinError) -> Self {
        Self::Io(value.into())
    }
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Api(value.into())
    }
}

fn suffix(message: &Option<String>) -> String {
    message.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
}

/// Failures of a single request against the backend.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Api {
    #[error("no response from server: {0}")]
    Network(String),
    #[error("unauthorized{}", suffix(.message))]
    Unauthorized { message: Option<String> },
    #[error("request rejected ({status}){}", suffix(.message))]
    Validation {
        status: u16,
        message: Option<String>,
    },
    #[error("server failure ({status}){}", suffix(.message))]
    Server {
        status: u16,
        message: Option<String>,
    },
    #[error("server sent a response that we could not interpret: {0}")]
    InvalidResponse(String),
}

impl Api {
    /// The message the server attached to the failure, if any.
    pub(crate) fn message(&self) -> Option<&str> {
        match *self {
            Self::Unauthorized { ref message }
            | Self::Validation { ref message, .. }
            | Self::Server { ref message, .. } => message.as_deref(),
            Self::Network(_) | Self::InvalidResponse(_) => None,
        }
    }

    pub(crate) const fn is_unauthorized(&self) -> bool {
        matches!(*self, Self::Unauthorized { .. })
    }
}

impl From<reqwest::Error> for Api {
    fn from(value: reqwest::Error) -> Self {
        if value.is_decode() {
            Self::InvalidResponse(value.to_string())
        } else {
            Self::Network(value.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Session {
    #[error("server did not issue a credential")]
    MissingCredential,
    #[error("credential was issued, but the server did not confirm who we are: {0}")]
    VerificationFailed(Box<Api>),
    #[error("server returned a user without an email address")]
    InvalidUser,
    #[error("an account with this email already exists; log in instead")]
    AlreadyRegistered,
    #[error("{0}")]
    InvalidInput(String),
    #[error("not logged in")]
    NotAuthenticated,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Invariant {
    #[error(r#"no item with identifier "{}" is loaded"#, .0.escape_default())]
    UnknownItem(String),
}

#[derive(Error, Debug)]
pub(crate) enum Storage {
    #[error("could not determine a data directory for this user")]
    NoProjectDirs,
    #[cfg(feature = "secret-service")]
    #[error("secret service error: {0}")]
    SecretService(#[from] oo7::Error),
    #[cfg(feature = "keychain")]
    #[error("keychain error: {0}")]
    Keychain(#[from] security_framework::base::Error),
}

#[derive(Error, Debug)]
pub(crate) enum Password {
    #[error("no password prompt available")]
    NoPrompt,
    #[error("Pinentry implementation error: {0}")]
    Pinentry(pinentry::Error),
}

#[derive(Error, Debug)]
pub(crate) enum Config {
    #[error(r#"invalid credential header name "{}": {}"#, .0.escape_default(), .1)]
    HeaderName(String, reqwest::header::InvalidHeaderName),
    #[error("could not build HTTP client: {0}")]
    Client(reqwest::Error),
}
