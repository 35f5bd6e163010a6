// SPDX-FileCopyrightText: 2024 Noah Fontes
//
// SPDX-License-Identifier: Apache-2.0

use std::{fmt, sync::Arc};

use futures_util::lock::Mutex;
use log::{debug, warn};
use secrecy::{ExposeSecret as _, SecretString};
use serde::{Deserialize, Serialize, Serializer};

use crate::storage::Storage;

/// An opaque token proving an authenticated session.
#[derive(Clone, Deserialize)]
#[serde(transparent)]
pub(crate) struct Credential(SecretString);

impl Credential {
    /// Accepts a credential as handed out by the server. Blank values are
    /// treated as no credential at all.
    pub(crate) fn issued(value: &str) -> Option<Self> {
        let value = value.trim();
        (!value.is_empty()).then(|| Self(SecretString::new(value.to_owned())))
    }

    pub(crate) fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.expose() == other.expose()
    }
}

impl Serialize for Credential {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.expose())
    }
}

/// The one slot holding the session credential.
///
/// Failures of the underlying storage are logged and otherwise hidden: a
/// credential that cannot be read is indistinguishable from no credential.
#[derive(Clone)]
pub(crate) struct Store {
    storage: Arc<Mutex<Box<dyn Storage<Credential>>>>,
}

impl Store {
    pub(crate) fn new<S: Storage<Credential> + 'static>(storage: S) -> Self {
        Self {
            storage: Arc::new(Mutex::new(Box::new(storage))),
        }
    }

    pub(crate) async fn get(&self) -> Option<Credential> {
        match self.storage.lock().await.get().await {
            Ok(credential) => credential,
            Err(e) => {
                warn!("We could not read the stored credential, so we will act as if there is none: {}", e);
                None
            }
        }
    }

    pub(crate) async fn set(&self, credential: &Credential) {
        let mut storage = self.storage.lock().await;
        if let Err(e) = storage.update(credential).await {
            warn!(
                "We could not store the credential; it will only last as long as this process: {}",
                e
            );
        }
        debug!(
            "Stored credential (persistent: {})",
            storage.is_persistent()
        );
    }

    pub(crate) async fn clear(&self) {
        if let Err(e) = self.storage.lock().await.clear().await {
            warn!("We could not remove the stored credential: {}", e);
        }
    }
}
