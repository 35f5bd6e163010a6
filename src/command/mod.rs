// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;

use crate::{client::Client, error::Result, transport::Backend};

pub(crate) mod genres;
pub(crate) mod login;
pub(crate) mod logout;
pub(crate) mod movies;
pub(crate) mod signup;
pub(crate) mod whoami;

#[async_trait]
pub(crate) trait Command {
    async fn execute<B: Backend>(self, client: &Client<B>) -> Result<()>;
}
