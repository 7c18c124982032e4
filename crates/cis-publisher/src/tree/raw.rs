//! The raw signed profile tree.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::attribute::SignableAttribute;
use crate::error::Result;

/// One node of the raw tree, classified once when the document is parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum RawNode {
    /// Unsigned string such as `schema`.
    Text(String),
    /// Unsigned nesting such as `identities`.
    Container(RawTree),
    /// A signed attribute.
    Signed(SignableAttribute),
}

impl RawNode {
    pub fn to_wire(&self) -> Result<Value> {
        match self {
            Self::Text(s) => Ok(Value::String(s.clone())),
            Self::Container(tree) => tree.to_document(),
            Self::Signed(attribute) => attribute.to_wire(),
        }
    }
}

/// A mapping of attribute names to raw nodes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTree {
    nodes: BTreeMap<String, RawNode>,
}

impl RawTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, node: RawNode) {
        self.nodes.insert(key.into(), node);
    }

    pub fn get(&self, key: &str) -> Option<&RawNode> {
        self.nodes.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut RawNode> {
        self.nodes.get_mut(key)
    }

    /// Look up a signed attribute by dotted path, e.g. `identities.mozilla_ldap_id`.
    pub fn attribute(&self, path: &str) -> Option<&SignableAttribute> {
        let mut segments = path.split('.');
        let mut node = self.get(segments.next()?)?;
        for segment in segments {
            match node {
                RawNode::Container(tree) => node = tree.get(segment)?,
                _ => return None,
            }
        }
        match node {
            RawNode::Signed(attribute) => Some(attribute),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawNode)> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Serialise the tree back into a provider document.
    pub fn to_document(&self) -> Result<Value> {
        let mut object = serde_json::Map::new();
        for (key, node) in &self.nodes {
            object.insert(key.clone(), node.to_wire()?);
        }
        Ok(Value::Object(object))
    }
}
