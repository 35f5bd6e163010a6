// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use super::Identified;

#[derive(Clone, Debug, Deserialize, PartialEq, Eq, Tabled)]
pub(crate) struct Genre {
    #[serde(alias = "_id")]
    #[tabled(rename = "ID")]
    pub(crate) id: String,
    #[tabled(rename = "Name")]
    pub(crate) name: String,
}

impl Identified for Genre {
    fn id(&self) -> &str {
        &self.id
    }
}

/// How a movie refers to its genre on the wire: populated with the genre
/// itself, or just its identifier.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub(crate) enum GenreField {
    Embedded(Genre),
    Reference(String),
}

impl GenreField {
    pub(crate) fn id(&self) -> &str {
        match *self {
            Self::Embedded(ref genre) => &genre.id,
            Self::Reference(ref id) => id,
        }
    }

    pub(crate) fn name(&self) -> Option<&str> {
        match *self {
            Self::Embedded(ref genre) => Some(&genre.name),
            Self::Reference(_) => None,
        }
    }
}

/// A daily rental rate between 0 and 255, inclusive.
#[derive(Copy, Clone, Debug, Deserialize, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "f64", into = "f64")]
pub(crate) struct Rate(f64);

impl Rate {
    pub(crate) const MAX: f64 = 255.0;
}

impl TryFrom<f64> for Rate {
    type Error = String;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        if value.is_finite() && (0.0..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "daily rental rate must be between 0 and {}, but got {value}",
                Self::MAX
            ))
        }
    }
}

impl From<Rate> for f64 {
    fn from(value: Rate) -> Self {
        value.0
    }
}

impl FromStr for Rate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<f64>()
            .map_err(|e| format!("{s:?} is not a number: {e}"))
            .and_then(Self::try_from)
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// The server's canonical representation of a movie.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Movie {
    #[serde(alias = "_id")]
    pub(crate) id: String,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) genre: Option<GenreField>,
    pub(crate) number_in_stock: u8,
    pub(crate) daily_rental_rate: Rate,
}

impl Identified for Movie {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Movie {
    /// Prefills a draft with this movie's current values, ready for editing.
    /// A movie without a genre cannot be prefilled, since the draft would
    /// have nothing to send for it.
    pub(crate) fn to_draft(&self) -> Option<MovieDraft> {
        let genre = self.genre.as_ref().map(GenreField::id)?;
        (!genre.trim().is_empty()).then(|| self.to_draft_with_genre(genre.to_owned()))
    }

    /// Prefills a draft with this movie's current values and a new genre.
    pub(crate) fn to_draft_with_genre(&self, genre: String) -> MovieDraft {
        MovieDraft {
            title: self.title.clone(),
            genre,
            number_in_stock: self.number_in_stock,
            daily_rental_rate: self.daily_rental_rate,
        }
    }
}

/// A movie as submitted by the user. The genre is whatever identifier the
/// user picked; it is sent as-is even when it matches no known genre.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MovieDraft {
    pub(crate) title: String,
    pub(crate) genre: String,
    pub(crate) number_in_stock: u8,
    pub(crate) daily_rental_rate: Rate,
}
