// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use log::info;

use crate::{
    client::Client,
    error::Result,
    password::RequestBuilder,
    session::{Reason, State},
    transport::Backend,
};

const ATTEMPTS: usize = 3;

/// Log in to an existing account. The password is prompted for.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// The email address of the account.
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

        let description = format!("Enter the password for {}.", self.email);
        let mut req = RequestBuilder::new(&description);
        let mut attempt = 1;
        loop {
            let password = client.password(req.into_request()).await?;
            match client.session.login(&self.email, password).await {
                Ok(user) => {
                    println!("Logged in as {} <{}>", user.name, user.email);
                    return Ok(());
                }
                Err(e) if attempt < ATTEMPTS => {
                    let State::Failed(Reason::Rejected(message)) = client.session.state() else {
                        return Err(e);
                    };
                    info!("Login attempt {} was rejected: {}", attempt, e);
                    attempt += 1;
                    req = RequestBuilder::new(&description).with_error(&message);
                }
                Err(e) => return Err(e),
            }
        }
    }
}
