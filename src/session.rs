// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use log::{debug, info, warn};
use secrecy::{ExposeSecret as _, SecretString};
use tokio::sync::watch;

use crate::{
    api::{self, Executor as _},
    config::Routes,
    credential::{self, Credential},
    error::{self, Result},
    model::User,
    transport::{Backend, Expiry, Transport},
};

const MIN_PASSWORD_LENGTH: usize = 6;

/// Why the session is not authenticated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Reason {
    /// The server rejected the credential we were using.
    SessionExpired,
    /// The server issued a credential at login but would not tell us who we
    /// are with it.
    LoginSucceededButVerificationFailed,
    SignupSucceededButVerificationFailed,
    /// The server refused the login or signup outright.
    Rejected(String),
    /// A credential from an earlier run could not be validated.
    RestoreFailed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum State {
    Anonymous,
    Authenticating,
    Authenticated(User),
    /// Anonymous, remembering why.
    Failed(Reason),
}

impl State {
    pub(crate) const fn is_anonymous(&self) -> bool {
        matches!(*self, Self::Anonymous | Self::Failed(_))
    }

    pub(crate) const fn user(&self) -> Option<&User> {
        match *self {
            Self::Authenticated(ref user) => Some(user),
            Self::Anonymous | Self::Authenticating | Self::Failed(_) => None,
        }
    }

    pub(crate) const fn reason(&self) -> Option<&Reason> {
        match *self {
            Self::Failed(ref reason) => Some(reason),
            Self::Anonymous | Self::Authenticating | Self::Authenticated(_) => None,
        }
    }
}

/// The writing end of the session state, shared with the transport so that a
/// rejected credential ends the session no matter who made the request.
#[derive(Clone)]
pub(crate) struct Signal(Arc<watch::Sender<State>>);

impl Signal {
    fn set(&self, state: State) {
        debug!("Session is now {:?}", state);
        let _ = self.0.send_replace(state);
    }
}

impl Expiry for Signal {
    fn expire(&self) {
        info!("The server rejected our credential, so the session has ended");
        self.set(State::Failed(Reason::SessionExpired));
    }
}

pub(crate) fn channel() -> (Signal, watch::Receiver<State>) {
    let (tx, rx) = watch::channel(State::Anonymous);
    (Signal(Arc::new(tx)), rx)
}

/// Owns the session state machine.
pub(crate) struct Manager<B> {
    transport: Arc<Transport<B>>,
    store: credential::Store,
    routes: Routes,
    signal: Signal,
}

impl<B: Backend> Manager<B> {
    pub(crate) const fn new(
        transport: Arc<Transport<B>>,
        store: credential::Store,
        routes: Routes,
        signal: Signal,
    ) -> Self {
        Self {
            transport,
            store,
            routes,
            signal,
        }
    }

    pub(crate) fn state(&self) -> State {
        self.signal.0.borrow().clone()
    }

    pub(crate) fn current_user(&self) -> Option<User> {
        self.state().user().cloned()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<State> {
        self.signal.0.subscribe()
    }

    /// Picks up the session left by an earlier run, if it is still good.
    pub(crate) async fn restore(&self) -> State {
        if self.store.get().await.is_none() {
            self.signal.set(State::Anonymous);
            return self.state();
        }

        self.signal.set(State::Authenticating);
        match self.who_am_i().await {
            Ok(user) => {
                debug!("Restored session for {}", user.email);
                self.signal.set(State::Authenticated(user));
            }
            Err(e) => {
                warn!("We could not restore the previous session: {}", e);
                self.store.clear().await;
                let reason = if e.api().map_or(false, error::Api::is_unauthorized) {
                    Reason::SessionExpired
                } else {
                    Reason::RestoreFailed
                };
                self.signal.set(State::Failed(reason));
            }
        }
        self.state()
    }

    pub(crate) async fn login(&self, email: &str, password: SecretString) -> Result<User> {
        self.begin().await;

        let issued = api::Login {
            email: email.trim().to_owned(),
            password,
        }
        .execute(self.transport.as_ref(), &self.routes)
        .await;
        let credential = self.issued(issued, |_| None)?;

        self.verify(credential, Reason::LoginSucceededButVerificationFailed)
            .await
    }

    pub(crate) async fn signup(
        &self,
        name: &str,
        email: &str,
        password: SecretString,
    ) -> Result<User> {
        let (name, email) = (name.trim(), email.trim());
        if name.is_empty() || email.is_empty() || password.expose_secret().trim().is_empty() {
            return Err(error::Session::InvalidInput("Please fill in all fields.".to_owned()).into());
        }
        if password.expose_secret().chars().count() < MIN_PASSWORD_LENGTH {
            return Err(error::Session::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long."
            ))
            .into());
        }

        self.begin().await;

        let issued = api::Register {
            name: name.to_owned(),
            email: email.to_owned(),
            password,
        }
        .execute(self.transport.as_ref(), &self.routes)
        .await;
        let credential = self.issued(issued, |e| {
            (matches!(*e, error::Api::Validation { .. })
                && e.message().map_or(false, |m| m.contains("already registered")))
            .then(|| error::Session::AlreadyRegistered.into())
        })?;

        self.verify(credential, Reason::SignupSucceededButVerificationFailed)
            .await
    }

    /// Forgets the session. The state always ends up anonymous; a failure to
    /// tell the server is returned afterwards.
    pub(crate) async fn logout(&self) -> Result<()> {
        let result = if self.store.get().await.is_some() {
            api::Logout
                .execute(self.transport.as_ref(), &self.routes)
                .await
        } else {
            Ok(())
        };

        self.store.clear().await;
        self.signal.set(State::Anonymous);

        result.map_err(|e| {
            debug!("The server did not confirm the logout: {}", e);
            e.into()
        })
    }

    async fn begin(&self) {
        self.store.clear().await;
        self.signal.set(State::Authenticating);
    }

    /// Settles the credential-issuing step. Nothing is persisted unless the
    /// server actually issued a credential.
    fn issued<F>(&self, result: Result<api::Issued, error::Api>, translate: F) -> Result<Credential>
    where
        F: FnOnce(&error::Api) -> Option<error::Error>,
    {
        match result {
            Ok(api::Issued {
                credential: Some(credential),
                user,
            }) => {
                if let Some(user) = user {
                    debug!("The server issued a credential for {}", user.email);
                }
                Ok(credential)
            }
            Ok(api::Issued {
                credential: None, ..
            }) => {
                self.signal.set(State::Anonymous);
                Err(error::Session::MissingCredential.into())
            }
            Err(e) => {
                let state = match e {
                    error::Api::Validation { ref message, .. }
                    | error::Api::Unauthorized { ref message } => State::Failed(Reason::Rejected(
                        message
                            .clone()
                            .unwrap_or_else(|| "The server refused the request.".to_owned()),
                    )),
                    error::Api::Network(_)
                    | error::Api::Server { .. }
                    | error::Api::InvalidResponse(_) => State::Anonymous,
                };
                self.signal.set(state);
                Err(translate(&e).unwrap_or_else(|| e.into()))
            }
        }
    }

    /// Persists a freshly issued credential and only reports success once the
    /// server tells us who it belongs to.
    async fn verify(&self, credential: Credential, failure: Reason) -> Result<User> {
        self.store.set(&credential).await;

        match self.who_am_i().await {
            Ok(user) => {
                info!("Logged in as {}", user.email);
                self.signal.set(State::Authenticated(user.clone()));
                Ok(user)
            }
            Err(e) => {
                warn!("The server issued a credential but did not confirm it: {}", e);
                self.store.clear().await;
                self.signal.set(State::Failed(failure));
                // LINT: Only transport failures are rewrapped; anything else
                // passes through untouched.
                #[allow(clippy::wildcard_enum_match_arm)]
                let e = match e {
                    error::Error::Api(api) => error::Session::VerificationFailed(Box::new(api)).into(),
                    other => other,
                };
                Err(e)
            }
        }
    }

    async fn who_am_i(&self) -> Result<User> {
        Ok(api::CurrentUser
            .execute(self.transport.as_ref(), &self.routes)
            .await?
            .validated()?)
    }
}
