// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::info;

use crate::{client::Client, error::Result, transport::Backend};

/// End the current session and forget its credential.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute<B: Backend>(self, client: &Client<B>) -> Result<()> {
        let user = client.user()?;

        if let Err(e) = client.session.logout().await {
            info!(
                "The server did not confirm the logout, but the credential has been forgotten anyway: {}",
                e
            );
        }
        println!("Logged out {}", user.email);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::{
        client::testing::client, command::Command as _, error, session::State,
        transport::testing::Scripted,
    };

    async fn logged_in(backend: &Arc<Scripted>) -> Result<Client<Arc<Scripted>>> {
        backend.reply(Method::POST, "/api/auth/login", 200, json!("eyJ.token"));
        backend.reply(
            Method::GET,
            "/api/auth/me",
            200,
            json!({ "_id": "u1", "name": "Ada", "email": "ada@example.com" }),
        );
        let client = client(Arc::clone(backend), &[])?;
        let _ = client
            .session
            .login("ada@example.com", secrecy::SecretString::new("hunter22".to_owned()))
            .await?;
        Ok(client)
    }

    #[tokio::test]
    async fn logout_succeeds_when_the_server_fails() -> Result<()> {
        let backend = Scripted::new();
        let client = logged_in(&backend).await?;
        backend.reply(Method::POST, "/api/auth/logout", 503, json!(null));

        Command {}.execute(&client).await?;

        assert_eq!(backend.requests_to(&Method::POST, "/api/auth/logout"), 1);
        assert_eq!(client.session.state(), State::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn logout_requires_a_session() -> Result<()> {
        let backend = Scripted::new();
        let client = client(Arc::clone(&backend), &[])?;

        let result = Command {}.execute(&client).await;

        assert!(matches!(
            result,
            Err(error::Error::Session(error::Session::NotAuthenticated))
        ));
        assert_eq!(backend.requests_to(&Method::POST, "/api/auth/logout"), 0);
        Ok(())
    }
}
