//! Fetch collaborators: turn a canonical URI into raw document bytes.
//!
//! Decoding is the pool's job; loaders only move bytes.
use std::cell::Cell;
use std::collections::HashMap;
use std::path::PathBuf;

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no document registered under {0}")]
    NotRegistered(String),

    #[error("unsupported URI scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("{0} does not name a local file")]
    NotAFilePath(String),

    #[cfg(feature = "http")]
    #[error("http request for {uri} failed: {message}")]
    Http { uri: String, message: String },

    #[cfg(feature = "http")]
    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

pub trait DocumentLoader {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>, FetchError>;
}

// ------------------------------- Memory ---------------------------------- //

/// Pre-registered documents keyed by canonical URI.
#[derive(Debug, Default)]
pub struct MemoryLoader {
    documents: HashMap<String, Vec<u8>>,
    fetches: Cell<usize>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `source` under `uri`. Any fragment on `uri` is ignored.
    pub fn register(&mut self, uri: &Url, source: impl Into<Vec<u8>>) {
        let mut key = uri.clone();
        key.set_fragment(None);
        self.documents.insert(key.to_string(), source.into());
    }

    pub fn with_document(mut self, uri: &Url, source: impl Into<Vec<u8>>) -> Self {
        self.register(uri, source);
        self
    }

    pub fn contains(&self, uri: &Url) -> bool {
        self.documents.contains_key(uri.as_str())
    }

    /// How many successful fetches this loader has served.
    pub fn fetch_count(&self) -> usize {
        self.fetches.get()
    }
}

impl DocumentLoader for MemoryLoader {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>, FetchError> {
        let source = self
            .documents
            .get(uri.as_str())
            .ok_or_else(|| FetchError::NotRegistered(uri.to_string()))?;
        self.fetches.set(self.fetches.get() + 1);
        Ok(source.clone())
    }
}

// -------------------------------- File ----------------------------------- //

#[derive(Debug, Default, Clone, Copy)]
pub struct FileLoader;

impl DocumentLoader for FileLoader {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>, FetchError> {
        if uri.scheme() != "file" {
            return Err(FetchError::UnsupportedScheme(uri.scheme().to_string()));
        }
        let path = uri
            .to_file_path()
            .map_err(|()| FetchError::NotAFilePath(uri.to_string()))?;
        std::fs::read(&path).map_err(|source| FetchError::Io { path, source })
    }
}

// -------------------------------- HTTP ----------------------------------- //

#[cfg(feature = "http")]
const DEFAULT_HTTP_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

#[cfg(feature = "http")]
pub struct HttpLoader {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "http")]
impl HttpLoader {
    pub fn new(timeout: std::time::Duration) -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| FetchError::HttpClient(error.to_string()))?;
        Ok(Self { client })
    }
}

#[cfg(feature = "http")]
impl DocumentLoader for HttpLoader {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>, FetchError> {
        let http_error = |message: String| FetchError::Http {
            uri: uri.to_string(),
            message,
        };
        let response = self
            .client
            .get(uri.clone())
            .send()
            .map_err(|error| http_error(error.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(http_error(format!("status {status}")));
        }
        let body = response.bytes().map_err(|error| http_error(error.to_string()))?;
        Ok(body.to_vec())
    }
}

// ------------------------------- Scheme ---------------------------------- //

/// Default loader: in-memory registry first, then dispatch on URI scheme.
#[derive(Default)]
pub struct SchemeLoader {
    memory: MemoryLoader,
    file: FileLoader,
    /// Set by `with_http`, otherwise built on the first http(s) fetch.
    #[cfg(feature = "http")]
    http: once_cell::unsync::OnceCell<HttpLoader>,
}

impl SchemeLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn memory_mut(&mut self) -> &mut MemoryLoader {
        &mut self.memory
    }

    #[cfg(feature = "http")]
    pub fn with_http(mut self, http: HttpLoader) -> Self {
        self.http = once_cell::unsync::OnceCell::with_value(http);
        self
    }
}

impl DocumentLoader for SchemeLoader {
    fn fetch(&self, uri: &Url) -> Result<Vec<u8>, FetchError> {
        if self.memory.contains(uri) {
            return self.memory.fetch(uri);
        }
        match uri.scheme() {
            "file" => self.file.fetch(uri),
            #[cfg(feature = "http")]
            "http" | "https" => self
                .http
                .get_or_try_init(|| HttpLoader::new(DEFAULT_HTTP_TIMEOUT))?
                .fetch(uri),
            other => Err(FetchError::UnsupportedScheme(other.to_string())),
        }
    }
}

// ------------------------------- Tests ------------------------------------ //
