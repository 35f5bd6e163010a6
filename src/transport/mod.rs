// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

mod http;
#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::{config::CredentialScheme, credential, error};

pub(crate) use http::HttpBackend;

#[derive(Clone, Debug)]
pub(crate) struct Request {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Option<Value>,
}

impl Request {
    pub(crate) fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    #[must_use]
    pub(crate) fn with_json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

#[derive(Clone, Debug)]
pub(crate) struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

impl Response {
    pub(crate) fn json<T: DeserializeOwned>(&self) -> Result<T, error::Api> {
        serde_json::from_slice(&self.body).map_err(|e| error::Api::InvalidResponse(e.to_string()))
    }

    pub(crate) fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub(crate) fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// The human-readable message of an error response, preferring the
    /// structured forms the API uses over whatever text came back.
    pub(crate) fn message(&self) -> Option<String> {
        let text = match serde_json::from_slice::<Value>(&self.body) {
            Ok(Value::Object(map)) => ["message", "error"]
                .iter()
                .find_map(|key| map.get(*key).and_then(Value::as_str))
                .map(str::to_owned),
            Ok(Value::String(s)) => Some(s),
            Ok(_) => None,
            Err(_) => Some(self.text()),
        }?;

        let text = text.trim();
        (!text.is_empty()).then(|| text.to_owned())
    }
}

/// Something that can deliver a request and hand back whatever the server
/// answered. An error means there was no answer at all.
#[async_trait]
pub(crate) trait Backend: Send + Sync {
    async fn execute(&self, req: Request) -> Result<Response, error::Api>;
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Arc<T> {
    async fn execute(&self, req: Request) -> Result<Response, error::Api> {
        (**self).execute(req).await
    }
}

#[async_trait]
impl<T: Backend + ?Sized> Backend for Box<T> {
    async fn execute(&self, req: Request) -> Result<Response, error::Api> {
        (**self).execute(req).await
    }
}

/// Notified whenever the server rejects our credential.
pub(crate) trait Expiry: Send + Sync {
    fn expire(&self);
}

/// Sends requests on behalf of the current session.
///
/// Every request carries the stored credential, if there is one. When the
/// server answers 401, the credential is cleared and the session told before
/// the caller sees the error, so anything the caller does in response
/// already runs without the stale credential.
pub(crate) struct Transport<B> {
    backend: B,
    store: credential::Store,
    scheme: CredentialScheme,
    expiry: Arc<dyn Expiry>,
}

impl<B: Backend> Transport<B> {
    pub(crate) fn new(
        backend: B,
        store: credential::Store,
        scheme: CredentialScheme,
        expiry: Arc<dyn Expiry>,
    ) -> Self {
        Self {
            backend,
            store,
            scheme,
            expiry,
        }
    }

    pub(crate) const fn scheme(&self) -> &CredentialScheme {
        &self.scheme
    }

    pub(crate) async fn send(&self, mut req: Request) -> Result<Response, error::Api> {
        if let Some(credential) = self.store.get().await {
            match HeaderValue::from_str(&self.scheme.render(credential.expose())) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    let _ = req.headers.insert(self.scheme.header.clone(), value);
                }
                Err(_) => warn!(
                    "The stored credential cannot be sent in the {} header, so this request goes out without it",
                    self.scheme.header
                ),
            }
        }

        let method = req.method.clone();
        let path = req.path.clone();
        debug!("Sending {} {}", method, path);
        let resp = self.backend.execute(req).await.map_err(|e| {
            debug!("{} {} got no response: {}", method, path, e);
            e
        })?;
        debug!("{} {} answered {}", method, path, resp.status);

        self.classify(resp).await
    }

    async fn classify(&self, resp: Response) -> Result<Response, error::Api> {
        if resp.status.is_success() {
            return Ok(resp);
        }

        let message = resp.message();
        Err(match resp.status {
            StatusCode::UNAUTHORIZED => {
                self.store.clear().await;
                self.expiry.expire();
                error::Api::Unauthorized { message }
            }
            status if status.is_client_error() => error::Api::Validation {
                status: status.as_u16(),
                message,
            },
            status => error::Api::Server {
                status: status.as_u16(),
                message,
            },
        })
    }
}
