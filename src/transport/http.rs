// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use reqwest::{header, Client};
use url::Url;

use crate::{
    config::Config,
    error::{self, Result},
    metadata,
};

use super::{Backend, Request, Response};

/// Delivers requests over HTTP, relative to the configured base URL.
pub(crate) struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    pub(crate) fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(metadata::CLIENT_USER_AGENT.as_str())
            .build()
            .map_err(error::Config::Client)?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn execute(&self, req: Request) -> Result<Response, error::Api> {
        let mut builder = self
            .client
            .request(req.method, self.url(&req.path))
            .headers(req.headers)
            .header(header::ACCEPT, "application/json");
        if let Some(ref body) = req.body {
            builder = builder.json(body);
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?.to_vec();

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use reqwest::Method;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header as header_is, method, path},
        Mock, MockServer, ResponseTemplate,
    };

    use super::*;

    async fn backend(server: &MockServer) -> Result<HttpBackend> {
        HttpBackend::new(&Config::new(Url::parse(&server.uri())?))
    }

    #[tokio::test]
    async fn sends_json_and_headers() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/movies"))
            .and(header_is("x-auth-token", "abc"))
            .and(body_json(json!({ "title": "Dune" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "_id": "m2" })))
            .expect(1)
            .mount(&server)
            .await;

        let mut req = Request::new(Method::POST, "/api/movies").with_json(json!({ "title": "Dune" }));
        let _ = req
            .headers
            .insert("x-auth-token", header::HeaderValue::from_static("abc"));

        let resp = backend(&server).await?.execute(req).await?;
        assert!(resp.status.is_success());
        assert_eq!(resp.json::<serde_json::Value>()?, json!({ "_id": "m2" }));
        Ok(())
    }

    #[tokio::test]
    async fn error_statuses_are_responses() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/auth/me"))
            .respond_with(
                ResponseTemplate::new(401)
                    .insert_header("x-auth-token", "none")
                    .set_body_string("Access denied. No token provided."),
            )
            .mount(&server)
            .await;

        let resp = backend(&server)
            .await?
            .execute(Request::new(Method::GET, "/api/auth/me"))
            .await?;
        assert_eq!(resp.status.as_u16(), 401);
        assert_eq!(
            resp.header(&header::HeaderName::from_static("x-auth-token")),
            Some("none")
        );
        assert_eq!(
            resp.message().as_deref(),
            Some("Access denied. No token provided.")
        );
        Ok(())
    }

    #[tokio::test]
    async fn base_url_path_is_kept() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/vidly/api/genres"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let config = Config::new(Url::parse(&format!("{}/vidly/", server.uri()))?);
        let resp = HttpBackend::new(&config)?
            .execute(Request::new(Method::GET, "/api/genres"))
            .await?;
        assert!(resp.status.is_success());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_failure() -> Result<()> {
        let config = Config::new(Url::parse("http://127.0.0.1:9/")?);
        let result = HttpBackend::new(&config)?
            .execute(Request::new(Method::GET, "/api/genres"))
            .await;
        assert!(matches!(result, Err(error::Api::Network(_))));
        Ok(())
    }
}
