//! Projection between the provider document, the raw tree and the flat view.
//!
//! Three passes cover the directions the profile needs:
//!
//! - [`bootstrap`]: provider document → raw tree, wrapping every object that
//!   carries `value`/`values` in a [`SignableAttribute`].
//! - [`flatten`]: raw tree → flat view, exposing only current values.
//! - [`synchronize`]: flat view → raw tree, routing every value that lands
//!   on a signed attribute through [`SignableAttribute::write`].
//!
//! Within a pass, a node is matched against the rules in this order:
//!
//! 1. unsigned string → copied verbatim;
//! 2. signed attribute in the target, plain value in the source → write;
//! 3. signed attribute in the source, nothing in the target → its value;
//! 4. object with `value`/`values` while bootstrapping → new attribute;
//! 5. object without `metadata`/`signature` markers → container, recurse;
//! 6. raw container while flattening → empty flat map, recurse;
//! 7. anything else → schema violation.
//!
//! Rule 4 must be tried before rule 5: an attribute object is also a
//! mapping, and only the `value`/`values` markers tell them apart.

use serde_json::Value;

use super::flat::{FlatMap, FlatValue};
use super::raw::{RawNode, RawTree};
use crate::attribute::{SignableAttribute, WriteContext};
use crate::error::{PublisherError, Result};
use crate::profile::Notification;

const ROOT: &str = "<root>";

fn join(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

fn is_absent(object: &serde_json::Map<String, Value>, key: &str) -> bool {
    object.get(key).map_or(true, Value::is_null)
}

/// Parse a provider document into a raw tree.
pub fn bootstrap(document: &Value) -> Result<RawTree> {
    match document {
        Value::Object(object) => bootstrap_object("", object),
        _ => Err(PublisherError::schema(ROOT, "profile document must be an object")),
    }
}

fn bootstrap_object(parent: &str, object: &serde_json::Map<String, Value>) -> Result<RawTree> {
    let mut tree = RawTree::new();

    for (key, value) in object {
        let path = join(parent, key);
        let node = match value {
            // rule 1
            Value::String(s) => RawNode::Text(s.clone()),
            // rule 4
            Value::Object(inner) if inner.contains_key("value") || inner.contains_key("values") => {
                RawNode::Signed(SignableAttribute::from_wire(&path, inner)?)
            }
            // rule 5
            Value::Object(inner) if is_absent(inner, "metadata") && is_absent(inner, "signature") => {
                RawNode::Container(bootstrap_object(&path, inner)?)
            }
            // rule 7
            other => {
                return Err(PublisherError::schema(
                    path,
                    format!("cannot represent {} in a profile", kind_of(other)),
                ))
            }
        };
        tree.insert(key.clone(), node);
    }

    Ok(tree)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object with metadata but no value",
    }
}

/// Project a raw tree into its flat view.
pub fn flatten(raw: &RawTree) -> FlatMap {
    raw.iter()
        .map(|(key, node)| {
            let value = match node {
                // rule 1
                RawNode::Text(s) => FlatValue::Text(s.clone()),
                // rule 3
                RawNode::Signed(attribute) => attribute.value().to_flat(),
                // rule 6
                RawNode::Container(tree) => FlatValue::Map(flatten(tree)),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Push the flat view back into the raw tree.
///
/// Appends one notification per attribute that actually changed, keyed by
/// its dotted path. Keys present in the raw tree but missing from the flat
/// view are left alone. The first error aborts the pass; attributes
/// written before it keep their new values and their notifications stay in
/// `notifications`.
pub fn synchronize(
    flat: &FlatMap,
    raw: &mut RawTree,
    ctx: &WriteContext<'_>,
    notifications: &mut Vec<Notification>,
) -> Result<()> {
    synchronize_into("", flat, raw, ctx, notifications)
}

fn synchronize_into(
    parent: &str,
    flat: &FlatMap,
    raw: &mut RawTree,
    ctx: &WriteContext<'_>,
    notifications: &mut Vec<Notification>,
) -> Result<()> {
    for (key, value) in flat {
        let path = join(parent, key);

        match (raw.get_mut(key), value) {
            // rule 1
            (Some(RawNode::Text(current)), FlatValue::Text(text)) => {
                if current != text {
                    *current = text.clone();
                }
            }
            (Some(RawNode::Text(_)), _) => {
                return Err(PublisherError::schema(
                    path,
                    "unsigned attribute only accepts strings",
                ))
            }
            // rule 2
            (Some(RawNode::Signed(attribute)), value) => {
                if let Some(description) = attribute.write(&path, value, ctx)? {
                    notifications.push(Notification::new(path, description));
                }
            }
            // rule 5
            (Some(RawNode::Container(tree)), FlatValue::Map(inner)) => {
                synchronize_into(&path, inner, tree, ctx, notifications)?;
            }
            (Some(RawNode::Container(_)), _) => {
                return Err(PublisherError::schema(
                    path,
                    "attempted to overwrite profile dictionary with single value",
                ))
            }
            // rule 7
            (None, _) => {
                return Err(PublisherError::schema(
                    path,
                    "attribute is not part of the profile schema",
                ))
            }
        }
    }

    Ok(())
}
