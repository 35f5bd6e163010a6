// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;

use crate::{client::Client, error::Result, transport::Backend};

/// Show who the current session belongs to.
#[derive(Debug, Parser)]
pub(crate) struct Command {
    /// Print only the user's identifier.
    #[arg(long)]
    id: bool,
}

#[async_trait]
impl super::Command for Command {
    async fn execute<B: Backend>(self, client: &Client<B>) -> Result<()> {
        let user = client.user()?;
        if self.id {
            println!("{}", user.id);
        } else {
            println!("{} <{}>", user.name, user.email);
        }
        Ok(())
    }
}
