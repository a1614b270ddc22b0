//! Parse JSON Schema (draft-04 style) documents into an owned schema tree.
//!
//! ```no_run
//! use json_schema_tree::SchemaDocument;
//!
//! let document = SchemaDocument::new("schemas/person.json")?;
//! for (name, child) in document.root().properties() {
//!     println!("{name}: {}", document[*child].schema_type());
//! }
//! # Ok::<(), json_schema_tree::SchemaError>(())
//! ```
//!
//! `$ref`s are resolved while parsing, across documents when needed. Every
//! document touched during one parse is fetched once and cached in that
//! parse's [`DocumentPool`].
pub mod document;
pub mod error;
pub mod loader;
pub mod node;
pub mod outline;
pub mod pool;
pub mod reference;

pub use document::SchemaDocument;
pub use error::SchemaError;
pub use loader::{DocumentLoader, FetchError, FileLoader, MemoryLoader, SchemeLoader};
#[cfg(feature = "http")]
pub use loader::HttpLoader;
pub use node::{Keyword, NodeId, SchemaNode, SchemaType, ROOT_PROPERTY};
pub use pool::{DocumentPool, PoolEntry, PoolError};
pub use reference::{Reference, ReferenceError};
