// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use clap::Parser;
use tabled::{settings::Style, Table};

use crate::{client::Client, error::Result, transport::Backend};

/// List the genres a movie can belong to.
#[derive(Debug, Parser)]
pub(crate) struct Command {}

#[async_trait]
impl super::Command for Command {
    async fn execute<B: Backend>(self, client: &Client<B>) -> Result<()> {
        let _ = client.user()?;
        let _ = client.movies.load().await?;

        let genres = client.movies.references().await;
        if !genres.is_empty() {
            println!("{}", Table::new(genres).with(Style::rounded()));
        }
        Ok(())
    }
}
