// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{client::Client, error::Result, password::RequestBuilder, transport::Backend};

/// Create an account and log in to it. The password is prompted for.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The name to show for the account.
    #[arg(long, short)]
    name: String,

    /// The email address to register.
    #[arg(long, short, env = "VIDLY_EMAIL")]
    email: String,
}

#[async_trait]
impl super::Command for Command {
    async fn execute<B: Backend>(self, client: &Client<B>) -> Result<()> {
        if let Some(user) = client.session.current_user() {
            println!("Already logged in as {} <{}>", user.name, user.email);
            return Ok(());
        }

        let password = client
            .password(
                RequestBuilder::new(&format!("Choose a password for {}.", self.email))
                    .confirmed()
                    .into_request(),
            )
            .await?;
        let user = client
            .session
            .signup(&self.name, &self.email, password)
            .await?;

        println!("Signed up and logged in as {} <{}>", user.name, user.email);
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
        client::testing::client, command::Command as _, error, transport::testing::Scripted,
    };

    #[tokio::test]
    async fn short_passwords_never_reach_the_server() -> Result<()> {
        let backend = Scripted::new();
        let client = client(Arc::clone(&backend), &["12345"])?;

        let result = Command {
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
        }
        .execute(&client)
        .await;

        assert!(matches!(
            result,
            Err(error::Error::Session(error::Session::InvalidInput(_)))
        ));
        assert!(backend.requests().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn signs_up_and_logs_in() -> Result<()> {
        let backend = Scripted::new();
        backend.reply_with_header(
            Method::POST,
            "/api/auth/register",
            200,
            json!({ "_id": "u1", "name": "Ada", "email": "ada@example.com" }),
            ("x-auth-token", "eyJ.new"),
        );
        backend.reply(
            Method::GET,
            "/api/auth/me",
            200,
            json!({ "_id": "u1", "name": "Ada", "email": "ada@example.com" }),
        );
        let client = client(Arc::clone(&backend), &["hunter22"])?;

        Command {
            name: "Ada".to_owned(),
            email: "ada@example.com".to_owned(),
        }
        .execute(&client)
        .await?;

        assert_eq!(client.user()?.email, "ada@example.com");
        Ok(())
    }
}
