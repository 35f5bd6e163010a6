// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use serde::Deserialize;

use crate::error;

/// The authenticated principal, as reported by the backend.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub(crate) struct User {
    #[serde(alias = "_id", default)]
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) email: String,
    #[serde(default)]
    pub(crate) name: String,
}

impl User {
    /// Checks that the payload actually identifies somebody.
    pub(crate) fn validated(self) -> Result<Self, error::Session> {
        if self.email.trim().is_empty() {
            Err(error::Session::InvalidUser)
        } else {
            Ok(self)
        }
    }
}
