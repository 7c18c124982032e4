//! Shared test documents.

use serde_json::{json, Value};

const SKELETON: &str = include_str!("../../../tests/fixtures/skeleton.json");

/// The null profile: every attribute present, nothing set.
pub fn skeleton() -> Value {
    serde_json::from_str(SKELETON).expect("skeleton fixture is valid JSON")
}

/// A stored profile for `email` with `active` set as given.
pub fn person(email: &str, user_id: &str, active: bool) -> Value {
    let mut document = skeleton();
    document["active"]["value"] = json!(active);
    document["primary_email"]["value"] = json!(email);
    document["user_id"]["value"] = json!(user_id);
    document["primary_username"]["value"] = json!(email.split('@').next().unwrap_or(email));
    document["first_name"]["value"] = json!("Jane");
    document["first_name"]["metadata"]["display"] = json!("staff");
    document
}
