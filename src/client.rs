// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use secrecy::SecretString;

use crate::{
    config::Config,
    credential,
    error::{self, Result},
    model::User,
    password::{self, Prompt as _},
    session,
    sync::{self, Synchronizer},
    transport::{Backend, Transport},
};

/// Everything a command works with: the session and the synchronized
/// movie collection, both talking through one transport.
pub(crate) struct Client<B> {
    pub(crate) session: session::Manager<B>,
    pub(crate) movies: Synchronizer<sync::Movies, B>,
    prompt: Box<dyn password::Prompt>,
}

impl<B: Backend> Client<B> {
    pub(crate) fn new(
        backend: B,
        store: credential::Store,
        config: &Config,
        prompt: Box<dyn password::Prompt>,
    ) -> Self {
        let (signal, _) = session::channel();
        let transport = Arc::new(Transport::new(
            backend,
            store.clone(),
            config.scheme.clone(),
            Arc::new(signal.clone()),
        ));

        Self {
            session: session::Manager::new(
                Arc::clone(&transport),
                store,
                config.routes.clone(),
                signal,
            ),
            movies: Synchronizer::new(transport, config.routes.clone()),
            prompt,
        }
    }

    /// The logged-in user, for commands that only make sense with one.
    pub(crate) fn user(&self) -> Result<User> {
        self.session
            .current_user()
            .ok_or_else(|| error::Session::NotAuthenticated.into())
    }

    pub(crate) async fn password(&self, req: password::Request) -> Result<SecretString> {
        self.prompt
            .prompt(req)
            .await?
            .ok_or_else(|| error::Password::NoPrompt.into())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::storage::Memory;

    /// Answers password prompts from a fixed list.
    pub(crate) struct Answers(Mutex<Vec<String>>);

    #[async_trait]
    impl password::Prompt for Answers {
        async fn prompt(&self, _: password::Request) -> Result<Option<SecretString>> {
            let mut answers = self.0.lock().map_err(|_| error::Error::Command)?;
            Ok((!answers.is_empty()).then(|| SecretString::new(answers.remove(0))))
        }
    }

    pub(crate) fn client<B: Backend>(backend: B, passwords: &[&str]) -> Result<Client<B>> {
        Ok(Client::new(
            backend,
            credential::Store::new(Memory::new()),
            &Config::new(url::Url::parse("http://vidly.test")?),
            Box::new(Answers(Mutex::new(
                passwords.iter().map(|p| (*p).to_owned()).collect(),
            ))),
        ))
    }
}
