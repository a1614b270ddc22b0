//! Schema document: fetch a root document and parse it into a node tree.
//!
//! Parsing is a depth-first recursive descent. Keywords are looked up in a
//! fixed order (`$schema`, `$ref`, `$id`, `title`, `description`, `type`,
//! `properties`, `items`) so the first error reported for a broken schema
//! never depends on map iteration order.
//!
//! `$ref` is resolved by substitution: the referencing node keeps its place
//! in the tree and its (updated) reference scope, but takes every other
//! keyword from the target schema.
use std::ops::Index;
use std::rc::Rc;

use indexmap::IndexMap;
use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::error::SchemaError;
use crate::loader::{DocumentLoader, SchemeLoader};
use crate::node::{Keyword, NodeId, ROOT_PROPERTY, SchemaNode, SchemaType};
use crate::pool::{DocumentPool, PoolEntry};
use crate::reference::Reference;

#[derive(Debug)]
pub struct SchemaDocument {
    reference: Reference,
    nodes: Vec<SchemaNode>,
    root: NodeId,
    pool: DocumentPool,
}

// ----------------------------- Construction ------------------------------ //

impl SchemaDocument {
    /// Parse the schema at `location` (URL or filesystem path) with the
    /// default scheme-dispatching loader.
    pub fn new(location: &str) -> Result<Self, SchemaError> {
        Self::with_loader(location, SchemeLoader::new())
    }

    pub fn with_loader(
        location: &str,
        loader: impl DocumentLoader + 'static,
    ) -> Result<Self, SchemaError> {
        let reference = Reference::for_location(location).map_err(|source| SchemaError::Reference {
            path: ROOT_PROPERTY.to_string(),
            source,
        })?;
        Self::with_pool(reference, DocumentPool::new(loader))
    }

    /// Parse the document at `reference`, fetching through `pool`.
    pub fn with_pool(reference: Reference, mut pool: DocumentPool) -> Result<Self, SchemaError> {
        let entry = pool.get_document(&reference).map_err(|source| SchemaError::Pool {
            path: ROOT_PROPERTY.to_string(),
            source,
        })?;
        debug!(document = %reference, "parsing schema document");

        let mut parser = Parser {
            document: &reference,
            pool: &mut pool,
            nodes: Vec::new(),
            expanding: vec![expansion_key(&reference)],
        };
        let root = parser.parse_schema(
            entry.document(),
            Frame {
                property: ROOT_PROPERTY.to_string(),
                parent: None,
                scope: reference.clone(),
                path: ROOT_PROPERTY.to_string(),
            },
        )?;
        let nodes = parser.nodes;

        Ok(Self { reference, nodes, root, pool })
    }
}

// ------------------------------- Queries --------------------------------- //

impl SchemaDocument {
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn root(&self) -> &SchemaNode {
        &self.nodes[self.root.0]
    }

    pub fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.0)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &SchemaNode)> {
        self.nodes.iter().enumerate().map(|(i, node)| (NodeId(i), node))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn pool(&self) -> &DocumentPool {
        &self.pool
    }

    pub fn into_pool(self) -> DocumentPool {
        self.pool
    }

    /// Follow property names (and `[]` for `items`) down from the root.
    pub fn lookup(&self, path: &[&str]) -> Option<&SchemaNode> {
        let mut current = self.root();
        for segment in path {
            let next = if *segment == "[]" {
                current.items()?
            } else {
                current.property_child(segment)?
            };
            current = self.node(next)?;
        }
        Some(current)
    }

    /// Dotted diagnostic path of a node, e.g. `(root).tags[].name`.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut segments = Vec::new();
        let mut current = id;
        while let Some(node) = self.node(current) {
            let Some(parent) = node.parent() else {
                segments.push(node.property().to_string());
                break;
            };
            if self.nodes[parent.0].items() == Some(current) {
                segments.push("[]".to_string());
            } else {
                segments.push(format!(".{}", node.property()));
            }
            current = parent;
        }
        segments.reverse();
        segments.concat()
    }
}

impl Index<NodeId> for SchemaDocument {
    type Output = SchemaNode;

    fn index(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0]
    }
}

// -------------------------------- Parser --------------------------------- //

struct Frame {
    property: String,
    parent: Option<NodeId>,
    scope: Reference,
    path: String,
}

struct Parser<'a> {
    document: &'a Reference,
    pool: &'a mut DocumentPool,
    nodes: Vec<SchemaNode>,
    /// `$ref` targets being expanded on the current recursion path.
    expanding: Vec<String>,
}

impl Parser<'_> {
    fn parse_schema(&mut self, value: &Value, frame: Frame) -> Result<NodeId, SchemaError> {
        let Frame { property, parent, mut scope, path } = frame;

        let Value::Object(node) = value else {
            return Err(SchemaError::NotAnObject { context: "schema", path });
        };
        let mut keywords: &Map<String, Value> = node;

        // $schema (root only)
        let mut schema_dialect = None;
        if parent.is_none() {
            let raw = match keywords.get(Keyword::Schema.key()) {
                None => {
                    return Err(SchemaError::MissingRequiredKeyword { keyword: Keyword::Schema, path });
                }
                Some(Value::String(raw)) => raw,
                Some(_) => {
                    return Err(SchemaError::WrongType {
                        keyword: Keyword::Schema,
                        expected: "string",
                        path,
                    });
                }
            };
            let dialect = Reference::parse(raw).map_err(|source| SchemaError::Reference {
                path: path.clone(),
                source,
            })?;
            schema_dialect = Some(dialect);
            scope = self.document.clone();

            if keywords.contains_key(Keyword::Ref.key()) {
                return Err(SchemaError::RefInRoot { path });
            }
        }

        // $ref
        let target: Rc<PoolEntry>;
        let mut expanded = false;
        match keywords.get(Keyword::Ref.key()) {
            None => {}
            Some(Value::String(raw)) => {
                let parsed = Reference::parse(raw).map_err(|source| SchemaError::Reference {
                    path: path.clone(),
                    source,
                })?;
                scope = if parsed.has_full_url() {
                    parsed
                } else {
                    scope.inherit(&parsed).map_err(|source| SchemaError::Reference {
                        path: path.clone(),
                        source,
                    })?
                };

                let key = expansion_key(&scope);
                if self.expanding.contains(&key) {
                    return Err(SchemaError::ReferenceCycle { reference: key, path });
                }

                target = self.pool.get_document(&scope).map_err(|source| SchemaError::Pool {
                    path: path.clone(),
                    source,
                })?;
                let pointer = scope.pointer();
                trace!(reference = %scope, %path, "substituting $ref target");
                keywords = match target.document().pointer(&pointer) {
                    Some(Value::Object(resolved)) => resolved,
                    Some(_) => return Err(SchemaError::NotAnObject { context: "schema", path }),
                    None => {
                        return Err(SchemaError::PointerNotFound {
                            pointer,
                            document: target.reference().to_string(),
                            path,
                        });
                    }
                };
                self.expanding.push(key);
                expanded = true;
            }
            Some(_) => {
                return Err(SchemaError::WrongType {
                    keyword: Keyword::Ref,
                    expected: "string",
                    path,
                });
            }
        }

        let id = optional_string(keywords, Keyword::Id, &path)?;
        let title = optional_string(keywords, Keyword::Title, &path)?;
        let description = optional_string(keywords, Keyword::Description, &path)?;

        // type
        let schema_type = match keywords.get(Keyword::Type.key()) {
            Some(Value::String(name)) => name.parse::<SchemaType>().map_err(|_| SchemaError::InvalidType {
                value: name.clone(),
                path: path.clone(),
            })?,
            _ => {
                return Err(SchemaError::MissingRequiredKeyword { keyword: Keyword::Type, path });
            }
        };

        let node_id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            property,
            schema_dialect,
            reference: scope.clone(),
            id,
            title,
            description,
            schema_type,
            parent,
            properties: IndexMap::new(),
            items: None,
        });

        if let Some(properties) = keywords.get(Keyword::Properties.key()) {
            self.parse_properties(properties, node_id, &scope, &path)?;
        }

        if let Some(items) = keywords.get(Keyword::Items.key()) {
            let child = self.parse_schema(
                items,
                Frame {
                    property: String::new(),
                    parent: Some(node_id),
                    scope: scope.clone(),
                    path: format!("{path}[]"),
                },
            )?;
            self.nodes[node_id.0].items = Some(child);
        }

        if expanded {
            self.expanding.pop();
        }
        Ok(node_id)
    }

    fn parse_properties(
        &mut self,
        value: &Value,
        owner: NodeId,
        scope: &Reference,
        path: &str,
    ) -> Result<(), SchemaError> {
        let Value::Object(properties) = value else {
            return Err(SchemaError::NotAnObject {
                context: "properties",
                path: path.to_string(),
            });
        };

        for (name, schema) in properties {
            let child = self.parse_schema(
                schema,
                Frame {
                    property: name.clone(),
                    parent: Some(owner),
                    scope: scope.clone(),
                    path: format!("{path}.{name}"),
                },
            )?;
            self.nodes[owner.0].properties.insert(name.clone(), child);
        }
        Ok(())
    }
}

// ------------------------------- Helpers --------------------------------- //

fn optional_string(
    keywords: &Map<String, Value>,
    keyword: Keyword,
    path: &str,
) -> Result<Option<String>, SchemaError> {
    match keywords.get(keyword.key()) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(SchemaError::WrongType {
            keyword,
            expected: "string",
            path: path.to_string(),
        }),
    }
}

/// Identity of a `$ref` target: canonical document URI plus pointer.
fn expansion_key(reference: &Reference) -> String {
    match reference.canonical() {
        Some(canonical) => format!("{canonical}#{}", reference.pointer()),
        None => reference.to_string(),
    }
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MemoryLoader;
    use url::Url;

    fn parse(root: Value) -> SchemaDocument {
        let uri = Url::parse("mem://unit/root.json").unwrap();
        let loader = MemoryLoader::new().with_document(&uri, root.to_string());
        SchemaDocument::with_loader(uri.as_str(), loader).unwrap()
    }

    #[test]
    fn root_is_first_node_in_arena() {
        let document = parse(serde_json::json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "properties": {"a": {"type": "null"}}
        }));
        assert_eq!(document.root_id(), NodeId(0));
        assert!(document.root().is_root());
        assert_eq!(document.nodes().count(), 2);
    }

    #[test]
    fn paths_describe_position_in_tree() {
        let document = parse(serde_json::json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "object",
            "properties": {
                "tags": {
                    "type": "array",
                    "items": {"type": "object", "properties": {"name": {"type": "string"}}}
                }
            }
        }));
        let paths: Vec<String> = document.nodes().map(|(id, _)| document.path_of(id)).collect();
        assert_eq!(paths, ["(root)", "(root).tags", "(root).tags[]", "(root).tags[].name"]);
    }

    #[test]
    fn expansion_key_normalizes_empty_fragment() {
        let bare = Reference::parse("mem://unit/a.json").unwrap();
        let hashed = Reference::parse("mem://unit/a.json#").unwrap();
        assert_eq!(expansion_key(&bare), expansion_key(&hashed));
    }

    #[test]
    fn pool_stays_with_document() {
        let document = parse(serde_json::json!({
            "$schema": "http://json-schema.org/draft-04/schema#",
            "type": "string"
        }));
        let pool = document.into_pool();
        assert!(pool.contains(&Reference::parse("mem://unit/root.json").unwrap()));
    }
}
