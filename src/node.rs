//! Schema tree model. Nodes live in an arena owned by the document and point
//! at each other through [`NodeId`]s, so the `parent` back-link never owns.
use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;

use crate::reference::Reference;

/// Label of the document root node.
pub const ROOT_PROPERTY: &str = "(root)";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

// ------------------------------ Primitives -------------------------------- //

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Number,
    Integer,
    Boolean,
    Null,
}

impl SchemaType {
    pub const ALL: [SchemaType; 7] = [
        SchemaType::Object,
        SchemaType::Array,
        SchemaType::String,
        SchemaType::Number,
        SchemaType::Integer,
        SchemaType::Boolean,
        SchemaType::Null,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SchemaType::Object => "object",
            SchemaType::Array => "array",
            SchemaType::String => "string",
            SchemaType::Number => "number",
            SchemaType::Integer => "integer",
            SchemaType::Boolean => "boolean",
            SchemaType::Null => "null",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSchemaType(pub String);

impl FromStr for SchemaType {
    type Err = UnknownSchemaType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SchemaType::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| UnknownSchemaType(s.to_string()))
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keywords the parser understands, listed in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Schema,
    Ref,
    Id,
    Title,
    Description,
    Type,
    Properties,
    Items,
}

impl Keyword {
    /// Order in which the parser reports keyword errors.
    pub const CHECK_ORDER: [Keyword; 8] = [
        Keyword::Schema,
        Keyword::Ref,
        Keyword::Id,
        Keyword::Title,
        Keyword::Description,
        Keyword::Type,
        Keyword::Properties,
        Keyword::Items,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Keyword::Schema => "$schema",
            Keyword::Ref => "$ref",
            Keyword::Id => "$id",
            Keyword::Title => "title",
            Keyword::Description => "description",
            Keyword::Type => "type",
            Keyword::Properties => "properties",
            Keyword::Items => "items",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// -------------------------------- Node ----------------------------------- //

#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) property: String,
    pub(crate) schema_dialect: Option<Reference>,
    pub(crate) reference: Reference,
    pub(crate) id: Option<String>,
    pub(crate) title: Option<String>,
    pub(crate) description: Option<String>,
    pub(crate) schema_type: SchemaType,
    pub(crate) parent: Option<NodeId>,
    pub(crate) properties: IndexMap<String, NodeId>,
    pub(crate) items: Option<NodeId>,
}

impl SchemaNode {
    /// Owning property name, `"(root)"` for the root, empty for `items`.
    pub fn property(&self) -> &str {
        &self.property
    }

    /// `$schema` dialect; only ever set on the root.
    pub fn schema_dialect(&self) -> Option<&Reference> {
        self.schema_dialect.as_ref()
    }

    /// Reference scope used to resolve this node's relative `$ref`s; children
    /// start from it too.
    pub fn reference(&self) -> &Reference {
        &self.reference
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn schema_type(&self) -> SchemaType {
        self.schema_type
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn properties(&self) -> &IndexMap<String, NodeId> {
        &self.properties
    }

    pub fn property_child(&self, name: &str) -> Option<NodeId> {
        self.properties.get(name).copied()
    }

    pub fn items(&self) -> Option<NodeId> {
        self.items
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_types_round_trip_through_names() {
        for ty in SchemaType::ALL {
            assert_eq!(ty.as_str().parse::<SchemaType>(), Ok(ty));
        }
    }

    #[test]
    fn unknown_type_names_are_rejected() {
        for name in ["Object", "any", "", "int", "float"] {
            assert_eq!(name.parse::<SchemaType>(), Err(UnknownSchemaType(name.to_string())));
        }
    }

    #[test]
    fn keyword_order_is_fixed() {
        let keys: Vec<_> = Keyword::CHECK_ORDER.iter().map(|k| k.key()).collect();
        assert_eq!(
            keys,
            ["$schema", "$ref", "$id", "title", "description", "type", "properties", "items"]
        );
    }
}
