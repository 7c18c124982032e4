//! Edge case tests: normalisation, empty values, schema errors, unsigned
//! leaves and placeholder usernames.

use std::sync::Arc;

use serde_json::{json, Value};

use cis_publisher::{
    is_deletable, DisplayLevel, Ed25519KeyPair, FlatValue, LeafSigner, Profile, Publisher,
    PublisherError, PublisherSigner, SigningConfigError,
};

const SKELETON: &str = include_str!("../fixtures/skeleton.json");

fn skeleton() -> Value {
    serde_json::from_str(SKELETON).unwrap()
}

fn publisher() -> Publisher {
    let signer: Arc<dyn LeafSigner> =
        Arc::new(PublisherSigner::new("ldap", Ed25519KeyPair::generate()));
    Publisher::new(Some(signer))
}

fn skeleton_profile() -> Profile {
    Profile::from_document(None, &skeleton(), false).unwrap()
}

// === Normalisation ===

#[test]
fn edge_number_written_as_string_is_noop() {
    let mut profile = skeleton_profile();
    profile.set("timezone", 5i64).unwrap();
    profile.sign(&publisher(), Some(DisplayLevel::Public)).unwrap();
    assert_eq!(profile.notifications().len(), 1);

    profile.set("timezone", "5").unwrap();
    profile.sign(&publisher(), None).unwrap();
    assert_eq!(profile.notifications().len(), 1);
}

#[test]
fn edge_list_order_and_duplicates_ignored() {
    let mut profile = skeleton_profile();
    profile.set("languages", vec!["fr", "en"]).unwrap();
    profile.sign(&publisher(), Some(DisplayLevel::Public)).unwrap();

    profile.set("languages", vec!["en", "fr", "en"]).unwrap();
    profile.sign(&publisher(), None).unwrap();
    assert_eq!(profile.notifications().len(), 1);
    assert_eq!(profile.notifications()[0].description.as_str(), "+en, +fr");
}

// === Empty values ===

#[test]
fn edge_empty_forms_are_equivalent() {
    let mut profile = skeleton_profile();
    profile.set("tags", Vec::<String>::new()).unwrap();
    profile.set("location", FlatValue::Null).unwrap();
    profile.set("pronouns", Vec::<String>::new()).unwrap();

    // no display level is needed because nothing changes
    profile.sign(&publisher(), None).unwrap();
    assert!(profile.notifications().is_empty());
}

#[test]
fn edge_empty_string_is_a_value() {
    let mut profile = skeleton_profile();
    profile.set("alternative_name", "").unwrap();
    profile.sign(&publisher(), Some(DisplayLevel::Staff)).unwrap();
    assert_eq!(profile.notifications().len(), 1);
}

#[test]
fn edge_clearing_a_value_is_a_change() {
    let mut doc = skeleton();
    doc["fun_title"]["value"] = json!("Tinkerer");
    let mut profile = Profile::from_document(None, &doc, false).unwrap();
    profile.set("fun_title", FlatValue::Null).unwrap();
    profile.sign(&publisher(), Some(DisplayLevel::Staff)).unwrap();

    let notes = profile.notifications();
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].description.as_str(), "Tinkerer --> null");
}

// === Schema errors ===

#[test]
fn edge_collection_into_scalar_rejected() {
    let mut profile = skeleton_profile();
    profile.set("first_name", vec!["a", "b"]).unwrap();
    let err = profile
        .sign(&publisher(), Some(DisplayLevel::Staff))
        .unwrap_err();
    assert!(matches!(err, PublisherError::SchemaViolation { ref path, .. } if path == "first_name"));
}

#[test]
fn edge_scalar_into_set_rejected() {
    let mut profile = skeleton_profile();
    profile.set("usernames", "jdoe").unwrap();
    assert!(matches!(
        profile.sign(&publisher(), Some(DisplayLevel::Staff)),
        Err(PublisherError::SchemaViolation { .. })
    ));
}

#[test]
fn edge_unknown_document_shape_rejected() {
    let mut doc = skeleton();
    doc["identities"]["weird"] = json!(42);
    assert!(matches!(
        Profile::from_document(None, &doc, false),
        Err(PublisherError::SchemaViolation { ref path, .. }) if path == "identities.weird"
    ));
}

#[test]
fn edge_missing_display_level_names_attribute() {
    let mut profile = skeleton_profile();
    profile.set_path("staff_information.title", "Engineer").unwrap();
    let err = profile.sign(&publisher(), None).unwrap_err();
    assert!(matches!(
        err,
        PublisherError::SigningConfig(SigningConfigError::MissingDisplayLevel { ref attribute })
            if attribute == "staff_information.title"
    ));
}

// === Unsigned leaves ===

#[test]
fn edge_plain_strings_are_copied_without_signing() {
    let mut profile = skeleton_profile();
    profile
        .set("schema", "https://example.com/schema/v3")
        .unwrap();
    profile.sign(&Publisher::new(None), None).unwrap();
    assert!(profile.notifications().is_empty());
    assert_eq!(
        profile.to_document().unwrap()["schema"],
        json!("https://example.com/schema/v3")
    );
}

// === Deletable profiles ===

#[test]
fn edge_placeholder_usernames_do_not_count() {
    let mut profile = skeleton_profile();
    profile.set("usernames", vec!["HACK#GITHUB"]).unwrap();
    assert!(profile.is_empty());

    profile.set("usernames", vec!["HACK#GITHUB", "LDAP-jdoe"]).unwrap();
    assert!(!profile.is_empty());
    assert!(!is_deletable(profile.flat()));
}

#[test]
fn edge_nested_attribute_keeps_profile() {
    let mut profile = skeleton_profile();
    profile
        .set_path("access_information.ldap", vec!["team_moco"])
        .unwrap();
    assert!(!profile.is_empty());
}
