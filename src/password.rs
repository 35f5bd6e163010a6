// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{ffi::OsString, path::Path};

use async_trait::async_trait;
use secrecy::{ExposeSecret as _, SecretString};
use tokio::task;

use crate::{error::Result, metadata};

#[derive(Debug, Clone)]
pub(crate) struct Request {
    description: String,
    confirm: bool,
    error: Option<String>,
}

pub(crate) struct RequestBuilder {
    description: String,
    confirm: bool,
    error: Option<String>,
}

impl RequestBuilder {
    pub(crate) fn new(description: &str) -> Self {
        Self {
            description: description.to_owned(),
            confirm: false,
            error: None,
        }
    }

    /// Asks for the password twice, for when it is being chosen rather than
    /// recalled.
    #[must_use]
    pub(crate) const fn confirmed(mut self) -> Self {
        self.confirm = true;
        self
    }

    #[must_use]
    pub(crate) fn with_error(mut self, error: &str) -> Self {
        self.error = Some(error.to_owned());
        self
    }

    pub(crate) fn into_request(self) -> Request {
        Request {
            description: self.description,
            confirm: self.confirm,
            error: self.error,
        }
    }
}

#[async_trait]
pub(crate) trait Prompt: Send + Sync {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>>;
}

#[async_trait]
impl<T: Prompt + ?Sized> Prompt for Box<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        (**self).prompt(req).await
    }
}

#[async_trait]
impl<T: Prompt> Prompt for Vec<T> {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        for candidate in self {
            if let r @ (Ok(Some(_)) | Err(_)) = candidate.prompt(req.clone()).await {
                return r;
            }
        }

        Ok(None)
    }
}

pub(crate) struct PinentryPrompt {
    executable: Option<OsString>,
}

impl PinentryPrompt {
    pub(crate) const fn new() -> Self {
        Self { executable: None }
    }

    pub(crate) fn new_with_executable<P: AsRef<Path>>(executable: P) -> Self {
        Self {
            executable: Some(executable.as_ref().as_os_str().into()),
        }
    }
}

#[async_trait]
impl Prompt for PinentryPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        fn interact<'input>(
            mut input: pinentry::PassphraseInput<'input>,
            title: &'input str,
            req: &'input Request,
        ) -> Result<SecretString> {
            _ = input.required("You must enter a password to continue.");
            _ = input.with_title(title);
            _ = input.with_description(&req.description);
            _ = input.with_prompt("Password");
            if req.confirm {
                _ = input.with_confirmation("Confirm", "The passwords do not match.");
            }
            if let Some(ref e) = req.error {
                _ = input.with_error(e);
            }

            Ok(input.interact()?)
        }

        let title = format!("Password - {}", *metadata::CLIENT_DISPLAY_NAME);

        let input = self
            .executable
            .as_ref()
            .and_then(pinentry::PassphraseInput::with_binary)
            .or_else(pinentry::PassphraseInput::with_default_binary)
            .map(|input| task::spawn_blocking(move || interact(input, &title, &req)));

        Ok(match input {
            Some(fut) => Some(fut.await??),
            None => None,
        })
    }
}

pub(crate) struct RpasswordPrompt;

#[async_trait]
impl Prompt for RpasswordPrompt {
    async fn prompt(&self, req: Request) -> Result<Option<SecretString>> {
        task::spawn_blocking(move || -> Result<Option<SecretString>> {
            if let Some(ref error) = req.error {
                eprintln!("Error: {error}");
            }
            eprintln!("{}", req.description);

            loop {
                let password = SecretString::new(rpassword::prompt_password("Password: ")?);
                if !req.confirm {
                    return Ok(Some(password));
                }

                let confirmation = rpassword::prompt_password("Confirm: ")?;
                if password.expose_secret() == &confirmation {
                    return Ok(Some(password));
                }
                eprintln!("The passwords do not match.");
            }
        })
        .await?
    }
}
