// SPDX-FileCopyrightText: 2022-2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret as _, SecretString};
use serde_json::{json, Value};

use crate::{
    config::{CredentialScheme, Routes},
    credential::Credential,
    error,
    model::User,
    transport::{Backend, Request, Response, Transport},
};

/// One operation of the authentication API.
#[async_trait]
pub(crate) trait Executor: Send + Sized {
    type Response: Send;

    fn to_request(&self, routes: &Routes) -> Request;

    fn parse(resp: &Response, scheme: &CredentialScheme) -> Result<Self::Response, error::Api>;

    async fn execute<B: Backend>(
        self,
        transport: &Transport<B>,
        routes: &Routes,
    ) -> Result<Self::Response, error::Api> {
        let resp = transport.send(self.to_request(routes)).await?;
        Self::parse(&resp, transport.scheme())
    }
}

/// What the server handed out when it accepted a login or registration.
#[derive(Debug)]
pub(crate) struct Issued {
    pub(crate) credential: Option<Credential>,
    pub(crate) user: Option<User>,
}

impl Issued {
    fn from_response(resp: &Response, scheme: &CredentialScheme) -> Self {
        let body = serde_json::from_slice::<Value>(&resp.body);
        let user = match body {
            Ok(ref value @ Value::Object(_)) => serde_json::from_value::<User>(value.clone())
                .ok()
                .and_then(|user| user.validated().ok()),
            Ok(_) | Err(_) => None,
        };

        let credential = resp
            .header(&scheme.issued_header)
            .and_then(Credential::issued)
            .or_else(|| match body {
                Ok(Value::String(ref token)) => Credential::issued(token),
                Ok(Value::Object(ref map)) => map
                    .get("token")
                    .and_then(Value::as_str)
                    .and_then(Credential::issued),
                Ok(_) => None,
                Err(_) => Credential::issued(&resp.text()),
            });

        Self { credential, user }
    }
}

pub(crate) struct Login {
    pub(crate) email: String,
    pub(crate) password: SecretString,
}

impl Executor for Login {
    type Response = Issued;

    fn to_request(&self, routes: &Routes) -> Request {
        Request::new(Method::POST, routes.login.as_str()).with_json(json!({
            "email": self.email,
            "password": self.password.expose_secret(),
        }))
    }

    fn parse(resp: &Response, scheme: &CredentialScheme) -> Result<Issued, error::Api> {
        Ok(Issued::from_response(resp, scheme))
    }
}

pub(crate) struct Register {
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) password: SecretString,
}

impl Executor for Register {
    type Response = Issued;

    fn to_request(&self, routes: &Routes) -> Request {
        Request::new(Method::POST, routes.register.as_str()).with_json(json!({
            "name": self.name,
            "email": self.email,
            "password": self.password.expose_secret(),
        }))
    }

    fn parse(resp: &Response, scheme: &CredentialScheme) -> Result<Issued, error::Api> {
        Ok(Issued::from_response(resp, scheme))
    }
}

pub(crate) struct CurrentUser;

impl Executor for CurrentUser {
    type Response = User;

    fn to_request(&self, routes: &Routes) -> Request {
        Request::new(Method::GET, routes.current_user.as_str())
    }

    fn parse(resp: &Response, _: &CredentialScheme) -> Result<User, error::Api> {
        resp.json()
    }
}

pub(crate) struct Logout;

impl Executor for Logout {
    type Response = ();

    fn to_request(&self, routes: &Routes) -> Request {
        Request::new(Method::POST, routes.logout.as_str())
    }

    fn parse(_: &Response, _: &CredentialScheme) -> Result<(), error::Api> {
        Ok(())
    }
}
