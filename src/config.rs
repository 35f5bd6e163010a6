// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use reqwest::header::HeaderName;
use url::Url;

use crate::error::{self, Result};

/// Paths of the backend operations, relative to the base URL. Movie routes
/// take the movie identifier as a trailing path segment.
#[derive(Clone, Debug)]
pub(crate) struct Routes {
    pub(crate) register: String,
    pub(crate) login: String,
    pub(crate) current_user: String,
    pub(crate) logout: String,
    pub(crate) movies: String,
    pub(crate) genres: String,
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            register: "/api/auth/register".to_owned(),
            login: "/api/auth/login".to_owned(),
            current_user: "/api/auth/me".to_owned(),
            logout: "/api/auth/logout".to_owned(),
            movies: "/api/movies".to_owned(),
            genres: "/api/genres".to_owned(),
        }
    }
}

impl Routes {
    pub(crate) fn movie(&self, id: &str) -> String {
        member(&self.movies, id)
    }
}

fn member(collection: &str, id: &str) -> String {
    format!(
        "{}/{}",
        collection.trim_end_matches('/'),
        urlencoding::encode(id)
    )
}

/// How the credential travels: the request header carrying it, an optional
/// scheme prefix such as `Bearer`, and the response header a freshly issued
/// credential may arrive in.
#[derive(Clone, Debug)]
pub(crate) struct CredentialScheme {
    pub(crate) header: HeaderName,
    pub(crate) prefix: Option<String>,
    pub(crate) issued_header: HeaderName,
}

impl CredentialScheme {
    pub(crate) fn new(header: &str, prefix: &str, issued_header: &str) -> Result<Self> {
        let prefix = prefix.trim();
        Ok(Self {
            header: parse_header(header)?,
            prefix: (!prefix.is_empty()).then(|| prefix.to_owned()),
            issued_header: parse_header(issued_header)?,
        })
    }

    pub(crate) fn bearer() -> Self {
        Self {
            header: reqwest::header::AUTHORIZATION,
            prefix: Some("Bearer".to_owned()),
            issued_header: HeaderName::from_static("x-auth-token"),
        }
    }

    /// The header value carrying `token`.
    pub(crate) fn render(&self, token: &str) -> String {
        match self.prefix {
            Some(ref prefix) => format!("{prefix} {token}"),
            None => token.to_owned(),
        }
    }
}

fn parse_header(name: &str) -> Result<HeaderName> {
    HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| error::Config::HeaderName(name.to_owned(), e).into())
}

#[derive(Clone, Debug)]
pub(crate) struct Config {
    pub(crate) base_url: Url,
    pub(crate) scheme: CredentialScheme,
    pub(crate) routes: Routes,
    pub(crate) timeout: Duration,
}

impl Config {
    pub(crate) fn new(base_url: Url) -> Self {
        Self {
            base_url,
            scheme: CredentialScheme::bearer(),
            routes: Routes::default(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub(crate) fn with_scheme(mut self, scheme: CredentialScheme) -> Self {
        self.scheme = scheme;
        self
    }

    #[must_use]
    pub(crate) const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
