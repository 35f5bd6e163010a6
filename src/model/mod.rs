// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod listing;
mod movie;
mod user;

pub(crate) use listing::Listing;
pub(crate) use movie::{Genre, GenreField, Movie, MovieDraft, Rate};
pub(crate) use user::User;

/// Anything the backend hands out with its own identifier.
pub(crate) trait Identified {
    fn id(&self) -> &str;
}
