// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{
    fmt,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use log::{debug, warn};
use reqwest::Method;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tokio::sync::{RwLock, RwLockWriteGuard};

use crate::{
    config::Routes,
    error::{self, Result},
    model::{Genre, GenreField, Identified, Listing, Movie, MovieDraft},
    transport::{Backend, Request, Transport},
};

/// A remote collection kept in step with the server, together with the
/// reference data its items point into.
pub(crate) trait Resource: Send + Sync + 'static {
    type Item: Identified + DeserializeOwned + Clone + Send + Sync;
    type Draft: Serialize + Send + Sync;
    type Reference: Identified + DeserializeOwned + Clone + Send + Sync;

    /// What one item is called in messages.
    const NOUN: &'static str;
    /// The field carrying the items when the server wraps its listing.
    const ITEMS_FIELD: &'static str;
    const REFERENCES_FIELD: &'static str;

    fn collection(routes: &Routes) -> &str;
    fn references(routes: &Routes) -> &str;
    fn member(routes: &Routes, id: &str) -> String;

    fn draft_reference(draft: &Self::Draft) -> &str;
    fn item_reference(item: &Self::Item) -> Option<&str>;
    /// The reference name the server embedded in the item itself, if any.
    fn embedded_name(item: &Self::Item) -> Option<&str>;
    fn reference_name(reference: &Self::Reference) -> &str;
}

pub(crate) struct Movies;

impl Resource for Movies {
    type Item = Movie;
    type Draft = MovieDraft;
    type Reference = Genre;

    const NOUN: &'static str = "movie";
    const ITEMS_FIELD: &'static str = "movies";
    const REFERENCES_FIELD: &'static str = "genres";

    fn collection(routes: &Routes) -> &str {
        &routes.movies
    }

    fn references(routes: &Routes) -> &str {
        &routes.genres
    }

    fn member(routes: &Routes, id: &str) -> String {
        routes.movie(id)
    }

    fn draft_reference(draft: &MovieDraft) -> &str {
        &draft.genre
    }

    fn item_reference(item: &Movie) -> Option<&str> {
        item.genre.as_ref().map(GenreField::id)
    }

    fn embedded_name(item: &Movie) -> Option<&str> {
        item.genre.as_ref().and_then(GenreField::name)
    }

    fn reference_name(reference: &Genre) -> &str {
        &reference.name
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    Load,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match *self {
            Self::Load => "load",
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// The one reportable outcome of a synchronizer operation that the server
/// (or the lack of one) turned down.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub(crate) struct Failure {
    operation: Operation,
    kind: error::Api,
    message: String,
}

impl Failure {
    fn new<R: Resource>(operation: Operation, kind: error::Api) -> Self {
        let message = if kind.is_unauthorized() {
            "Unauthorized. Please log in.".to_owned()
        } else if let Some(message) = kind.message() {
            message.to_owned()
        } else {
            match operation {
                Operation::Load => "Failed to fetch data. Please try again.".to_owned(),
                Operation::Create | Operation::Update => format!("Failed to save {}", R::NOUN),
                Operation::Delete => format!("Failed to delete {}", R::NOUN),
            }
        };

        Self {
            operation,
            kind,
            message,
        }
    }

    pub(crate) const fn operation(&self) -> Operation {
        self.operation
    }

    pub(crate) const fn kind(&self) -> &error::Api {
        &self.kind
    }

    pub(crate) fn message(&self) -> &str {
        &self.message
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum LoadOutcome {
    Loaded,
    /// A later load was started, or a change was confirmed, before this one
    /// finished, so its result was thrown away.
    Superseded,
}

struct Snapshot<R: Resource> {
    items: Vec<R::Item>,
    references: Vec<R::Reference>,
}

impl<R: Resource> Snapshot<R> {
    fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    fn knows_reference(&self, id: &str) -> bool {
        self.references.iter().any(|r| r.id() == id)
    }
}

/// Keeps a local copy of a collection, applying changes only once the server
/// has confirmed them and always in the server's canonical form.
pub(crate) struct Synchronizer<R: Resource, B> {
    transport: Arc<Transport<B>>,
    routes: Routes,
    state: RwLock<Snapshot<R>>,
    generation: AtomicU64,
}

impl<R: Resource, B: Backend> Synchronizer<R, B> {
    pub(crate) fn new(transport: Arc<Transport<B>>, routes: Routes) -> Self {
        Self {
            transport,
            routes,
            state: RwLock::new(Snapshot {
                items: Vec::new(),
                references: Vec::new(),
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub(crate) async fn items(&self) -> Vec<R::Item> {
        self.state.read().await.items.clone()
    }

    pub(crate) async fn references(&self) -> Vec<R::Reference> {
        self.state.read().await.references.clone()
    }

    pub(crate) async fn get(&self, id: &str) -> Option<R::Item> {
        let state = self.state.read().await;
        state.position(id).map(|i| state.items[i].clone())
    }

    /// The display name of the item's reference, looked up in the reference
    /// set first and then in whatever the server embedded.
    pub(crate) async fn resolve(&self, item: &R::Item) -> Option<String> {
        let state = self.state.read().await;
        R::item_reference(item)
            .and_then(|id| state.references.iter().find(|r| r.id() == id))
            .map(R::reference_name)
            .or_else(|| R::embedded_name(item))
            .map(str::to_owned)
    }

    /// Fetches the collection and the reference set together. Either failing
    /// leaves both empty. The result is only applied if nothing newer, another
    /// load or a confirmed change, was started or applied in the meantime.
    pub(crate) async fn load(&self) -> Result<LoadOutcome, Failure> {
        let ticket = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let result = futures_util::try_join!(
            self.list::<R::Item>(R::collection(&self.routes), R::ITEMS_FIELD),
            self.list::<R::Reference>(R::references(&self.routes), R::REFERENCES_FIELD),
        );

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != ticket {
            debug!("Discarding the result of load {} in favor of a newer one", ticket);
            return Ok(LoadOutcome::Superseded);
        }

        match result {
            Ok((items, references)) => {
                debug!(
                    "Loaded {} {}s and {} references",
                    items.len(),
                    R::NOUN,
                    references.len()
                );
                state.items = items;
                state.references = references;
                Ok(LoadOutcome::Loaded)
            }
            Err(e) => {
                state.items.clear();
                state.references.clear();
                Err(Failure::new::<R>(Operation::Load, e))
            }
        }
    }

    pub(crate) async fn create(&self, draft: &R::Draft) -> Result<R::Item> {
        self.check_reference(draft).await;

        let req = Request::new(Method::POST, R::collection(&self.routes))
            .with_json(serde_json::to_value(draft)?);
        let item = self
            .send::<R::Item>(req)
            .await
            .map_err(|e| Failure::new::<R>(Operation::Create, e))?;

        let mut state = self.confirmed().await;
        match state.position(item.id()) {
            Some(i) => {
                warn!(
                    r#"The server returned the new {} as "{}", which we already had; replacing it"#,
                    R::NOUN,
                    item.id().escape_default()
                );
                state.items[i] = item.clone();
            }
            None => state.items.push(item.clone()),
        }
        Ok(item)
    }

    pub(crate) async fn update(&self, id: &str, draft: &R::Draft) -> Result<R::Item> {
        if self.state.read().await.position(id).is_none() {
            return Err(error::Invariant::UnknownItem(id.to_owned()).into());
        }
        self.check_reference(draft).await;

        let req = Request::new(Method::PUT, R::member(&self.routes, id))
            .with_json(serde_json::to_value(draft)?);
        let item = self
            .send::<R::Item>(req)
            .await
            .map_err(|e| Failure::new::<R>(Operation::Update, e))?;

        let mut state = self.confirmed().await;
        match state.position(id) {
            Some(i) => state.items[i] = item.clone(),
            None => debug!(
                r#"The {} "{}" went away while it was being updated"#,
                R::NOUN,
                id.escape_default()
            ),
        }
        Ok(item)
    }

    pub(crate) async fn delete(&self, id: &str) -> Result<()> {
        let _ = self
            .transport
            .send(Request::new(Method::DELETE, R::member(&self.routes, id)))
            .await
            .map_err(|e| Failure::new::<R>(Operation::Delete, e))?;

        let mut state = self.confirmed().await;
        if let Some(i) = state.position(id) {
            let _ = state.items.remove(i);
        }
        Ok(())
    }

    /// Locks the state to apply a change the server has confirmed. Loads
    /// still in flight were answered before the change, so they are
    /// superseded.
    async fn confirmed(&self) -> RwLockWriteGuard<'_, Snapshot<R>> {
        let state = self.state.write().await;
        let _ = self.generation.fetch_add(1, Ordering::SeqCst);
        state
    }

    async fn check_reference(&self, draft: &R::Draft) {
        let reference = R::draft_reference(draft);
        if !self.state.read().await.knows_reference(reference) {
            warn!(
                r#"The {} refers to "{}", which is not a known reference; sending it unchanged"#,
                R::NOUN,
                reference.escape_default()
            );
        }
    }

    async fn send<T: DeserializeOwned>(&self, req: Request) -> Result<T, error::Api> {
        self.transport.send(req).await?.json()
    }

    async fn list<T: DeserializeOwned>(&self, path: &str, field: &str) -> Result<Vec<T>, error::Api> {
        let value = self.send(Request::new(Method::GET, path)).await?;
        Ok(Listing::from_value(value, field)?.into_items())
    }
}
