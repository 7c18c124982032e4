//! Stress test: many profiles signed and published concurrently through
//! one shared publisher and one shared store.

use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value};

use cis_publisher::crypto::verify_leaf_signature;
use cis_publisher::sync::{self, LdapDump};
use cis_publisher::{
    DisplayLevel, Ed25519KeyPair, FlatValue, IdentityKey, LeafSigner, MemoryStore, Profile,
    PublishOutcome, Publisher, PublisherSigner,
};

const SKELETON: &str = include_str!("../fixtures/skeleton.json");

fn person(n: usize) -> Value {
    let mut doc: Value = serde_json::from_str(SKELETON).unwrap();
    doc["active"]["value"] = json!(true);
    doc["primary_email"]["value"] = json!(format!("user{n}@example.com"));
    doc["primary_username"]["value"] = json!(format!("user{n}"));
    doc["user_id"]["value"] = json!(format!("ad|Example-LDAP|user{n}"));
    doc
}

fn shared_store(count: usize) -> MemoryStore {
    let store = MemoryStore::new(serde_json::from_str(SKELETON).unwrap());
    for n in 0..count {
        store.insert(person(n));
    }
    store
}

#[test]
fn stress_concurrent_publish_100_profiles() {
    let store = Arc::new(shared_store(100));
    let signer = Arc::new(PublisherSigner::new("ldap", Ed25519KeyPair::generate()));
    let dyn_signer: Arc<dyn LeafSigner> = signer.clone();
    let publisher = Publisher::new(Some(dyn_signer));
    let outcomes = Arc::new(Mutex::new(Vec::new()));

    let handles: Vec<_> = (0..10)
        .map(|t| {
            let store = Arc::clone(&store);
            let publisher = publisher.clone();
            let outcomes = Arc::clone(&outcomes);
            thread::spawn(move || {
                for n in (t * 10)..(t * 10 + 10) {
                    let key = IdentityKey::UserId(format!("ad|Example-LDAP|user{n}"));
                    let mut profile = Profile::load(store.as_ref(), Some(key), false)
                        .expect("profile should load");
                    profile
                        .set("tags", vec![format!("thread-{t}"), format!("user-{n}")])
                        .unwrap();
                    let outcome = profile
                        .publish(&publisher, store.as_ref(), Some(DisplayLevel::Staff), false)
                        .expect("publish should succeed");
                    outcomes.lock().unwrap().push(outcome);
                }
            })
        })
        .collect();

    for h in handles {
        h.join().expect("thread should not panic");
    }

    let outcomes = outcomes.lock().unwrap();
    assert_eq!(outcomes.len(), 100);
    assert!(outcomes.iter().all(|o| *o == PublishOutcome::Published));
    assert_eq!(store.submissions(), 100);

    for doc in store.submitted() {
        let profile = Profile::from_document(None, &doc, false).unwrap();
        let tags = profile.raw().attribute("tags").unwrap();
        verify_leaf_signature(tags, signer.verifying_key()).expect("tags should verify");
        assert_eq!(tags.metadata().unwrap().display, Some(DisplayLevel::Staff));
    }
}

#[test]
fn stress_display_levels_do_not_leak_between_threads() {
    let store = Arc::new(shared_store(40));
    let signer: Arc<dyn LeafSigner> =
        Arc::new(PublisherSigner::new("ldap", Ed25519KeyPair::generate()));
    let publisher = Publisher::new(Some(signer));

    let handles: Vec<_> = (0..40)
        .map(|n| {
            let store = Arc::clone(&store);
            let publisher = publisher.clone();
            thread::spawn(move || {
                let level = if n % 2 == 0 {
                    DisplayLevel::Staff
                } else {
                    DisplayLevel::Private
                };
                let key = IdentityKey::PrimaryEmail(format!("user{n}@example.com"));
                let mut profile = Profile::load(store.as_ref(), Some(key), false).unwrap();
                profile
                    .set_path("identities.mozilla_posix_id", format!("user{n}"))
                    .unwrap();
                profile.sign(&publisher, Some(level)).unwrap();
                let attr = profile.raw().attribute("identities.mozilla_posix_id").unwrap();
                assert_eq!(attr.metadata().unwrap().display, Some(level));
            })
        })
        .collect();

    for h in handles {
        h.join().expect("thread should not panic");
    }
}

#[test]
fn stress_batch_sync_500_records() {
    let store = shared_store(500);
    let signer: Arc<dyn LeafSigner> =
        Arc::new(PublisherSigner::new("ldap", Ed25519KeyPair::generate()));
    let publisher = Publisher::new(Some(signer));

    let mut dump = LdapDump::new();
    for n in 0..500 {
        let record = serde_json::from_value(json!({
            "distinguished_name": format!("mail=user{n}@example.com,o=com,dc=example"),
            "user_id": format!("user{n}"),
            "groups": ["team_moco"],
            "pgp_public_keys": [format!("{n:08X}")],
            "posix": {"uid": format!("user{n}")},
        }))
        .unwrap();
        dump.insert(format!("user{n}@example.com"), record);
    }

    let report = sync::run(dump.clone(), &store, &publisher, 32).unwrap();
    assert_eq!(report.synced.len(), 500);
    assert!(report.desynced.is_empty());
    assert!(report.failed.is_empty());
    assert_eq!(store.submissions(), 500);

    // A second run over the same dump finds nothing to change.
    let report = sync::run(dump, &store, &publisher, 32).unwrap();
    assert_eq!(report.synced.len(), 500);
    assert_eq!(store.submissions(), 500);

    let doc = store
        .submitted()
        .into_iter()
        .find(|d| d["user_id"]["value"] == "ad|Example-LDAP|user42")
        .unwrap();
    let profile = Profile::from_document(None, &doc, false).unwrap();
    assert_eq!(
        profile.get_path("identities.mozilla_posix_id"),
        Some(&FlatValue::from("user42"))
    );
}
