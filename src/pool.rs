//! Document pool: decoded documents cached by canonical (fragment-free) URI.
//!
//! One pool lives for one top-level parse. Entries are never evicted or
//! mutated once inserted, so handing out `Rc` clones is enough for every
//! subschema that needs to look into the same document.
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::loader::{DocumentLoader, FetchError};
use crate::reference::Reference;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to fetch {uri}: {source}")]
    Fetch {
        uri: String,
        #[source]
        source: FetchError,
    },

    #[error("failed to decode {uri}: {source}")]
    Decode {
        uri: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot fetch relative reference `{reference}` without a base")]
    NotAbsolute { reference: String },
}

#[derive(Debug)]
pub struct PoolEntry {
    reference: Reference,
    document: Value,
}

impl PoolEntry {
    /// The canonical reference this document was fetched under.
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn document(&self) -> &Value {
        &self.document
    }
}

pub struct DocumentPool {
    loader: Box<dyn DocumentLoader>,
    entries: HashMap<String, Rc<PoolEntry>>,
}

impl DocumentPool {
    pub fn new(loader: impl DocumentLoader + 'static) -> Self {
        Self {
            loader: Box::new(loader),
            entries: HashMap::new(),
        }
    }

    /// Return the document `reference` points into, fetching it on first use.
    pub fn get_document(&mut self, reference: &Reference) -> Result<Rc<PoolEntry>, PoolError> {
        let canonical = reference.canonical().ok_or_else(|| PoolError::NotAbsolute {
            reference: reference.to_string(),
        })?;
        let key = canonical.to_string();

        if let Some(entry) = self.entries.get(&key) {
            trace!(uri = %key, "document pool hit");
            return Ok(Rc::clone(entry));
        }

        debug!(uri = %key, "fetching schema document");
        let bytes = self.loader.fetch(&canonical).map_err(|source| PoolError::Fetch {
            uri: key.clone(),
            source,
        })?;
        let document = serde_json::from_slice::<Value>(&bytes).map_err(|source| PoolError::Decode {
            uri: key.clone(),
            source,
        })?;

        let entry = Rc::new(PoolEntry {
            reference: Reference::from_url(canonical),
            document,
        });
        self.entries.insert(key, Rc::clone(&entry));
        Ok(entry)
    }

    pub fn contains(&self, reference: &Reference) -> bool {
        reference
            .canonical()
            .is_some_and(|canonical| self.entries.contains_key(canonical.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for DocumentPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentPool")
            .field("documents", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ------------------------------- Tests ------------------------------------ //
