// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

//! A backend that answers from a script, for exercising everything above the
//! wire without a server.

// LINT: Test helpers may panic on a broken script.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    Method, StatusCode,
};
use serde_json::Value;
use tokio::sync::oneshot;

use crate::error;

use super::{Backend, Expiry, Request, Response};

type Outcome = Result<Response, error::Api>;

enum Reply {
    Ready(Outcome),
    Pending(oneshot::Receiver<Outcome>),
}

#[derive(Default)]
pub(crate) struct Scripted {
    replies: Mutex<HashMap<(Method, String), VecDeque<Reply>>>,
    requests: Mutex<Vec<Request>>,
}

pub(crate) fn response(status: u16, body: &Value) -> Response {
    Response {
        status: StatusCode::from_u16(status).unwrap(),
        headers: HeaderMap::new(),
        body: serde_json::to_vec(body).unwrap(),
    }
}

impl Scripted {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_owned()))
            .or_default()
            .push_back(reply);
    }

    pub(crate) fn reply(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Reply::Ready(Ok(response(status, &body))));
    }

    pub(crate) fn reply_raw(&self, method: Method, path: &str, status: u16, body: &[u8]) {
        let mut resp = response(status, &Value::Null);
        resp.body = body.to_vec();
        self.push(method, path, Reply::Ready(Ok(resp)));
    }

    pub(crate) fn reply_with_header(
        &self,
        method: Method,
        path: &str,
        status: u16,
        body: Value,
        header: (&'static str, &str),
    ) {
        let mut resp = response(status, &body);
        let _ = resp.headers.insert(
            HeaderName::from_static(header.0),
            HeaderValue::from_str(header.1).unwrap(),
        );
        self.push(method, path, Reply::Ready(Ok(resp)));
    }

    pub(crate) fn fail(&self, method: Method, path: &str, err: error::Api) {
        self.push(method, path, Reply::Ready(Err(err)));
    }

    /// Scripts a reply that is only delivered once the returned sender fires.
    pub(crate) fn gate(&self, method: Method, path: &str) -> oneshot::Sender<Outcome> {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Reply::Pending(rx));
        tx
    }

    pub(crate) fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn requests_to(&self, method: &Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|req| req.method == *method && req.path == path)
            .count()
    }
}

#[async_trait]
impl Backend for Scripted {
    async fn execute(&self, req: Request) -> Result<Response, error::Api> {
        let key = (req.method.clone(), req.path.clone());
        self.requests.lock().unwrap().push(req);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        match reply {
            Some(Reply::Ready(outcome)) => outcome,
            Some(Reply::Pending(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(error::Api::Network("gate dropped".to_owned()))),
            None => Err(error::Api::Network(format!(
                "no reply scripted for {} {}",
                key.0, key.1
            ))),
        }
    }
}

#[derive(Default)]
pub(crate) struct CountingExpiry(AtomicUsize);

impl CountingExpiry {
    pub(crate) fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl Expiry for CountingExpiry {
    fn expire(&self) {
        let _ = self.0.fetch_add(1, Ordering::SeqCst);
    }
}
