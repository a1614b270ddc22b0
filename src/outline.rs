//! Compact JSON view of a parsed schema tree, for humans and snapshots.
use serde_json::{Map, Value, json};

use crate::document::SchemaDocument;
use crate::node::NodeId;

pub fn emit_outline(document: &SchemaDocument) -> Value {
    let mut out = emit_node(document, document.root_id());
    if let Some(dialect) = document.root().schema_dialect() {
        out["$schema"] = Value::from(dialect.to_string());
    }
    out
}

fn emit_node(document: &SchemaDocument, id: NodeId) -> Value {
    let node = &document[id];
    let mut o = json!({
        "type": node.schema_type().as_str(),
        "ref": node.reference().to_string(),
    });
    if let Some(x) = node.id() {
        o["$id"] = Value::from(x);
    }
    if let Some(x) = node.title() {
        o["title"] = Value::from(x);
    }
    if let Some(x) = node.description() {
        o["description"] = Value::from(x);
    }
    if !node.properties().is_empty() {
        let properties: Map<String, Value> = node
            .properties()
            .iter()
            .map(|(name, child)| (name.clone(), emit_node(document, *child)))
            .collect();
        o["properties"] = Value::Object(properties);
    }
    if let Some(items) = node.items() {
        o["items"] = emit_node(document, items);
    }
    o
}
