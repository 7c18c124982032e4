//! Batch synchronisation of directory (LDAP) records into profiles.
//!
//! A dump maps each primary email to the directory's view of that person.
//! Every record is applied to the matching stored profile and the profile
//! is published if anything changed. Records run on a fixed pool of worker
//! threads; the only state they share is the publisher and the store.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Mutex};
use std::time::{Duration, Instant};

use serde::Deserialize;

use crate::attribute::DisplayLevel;
use crate::error::{PublisherError, Result};
use crate::profile::{Profile, PublishOutcome};
use crate::provider::{IdentityKey, ProfileSink, ProfileSource};
use crate::publisher::Publisher;
use crate::tree::{FlatMap, FlatValue};

/// Default size of the worker pool.
pub const DEFAULT_WORKERS: usize = 32;

// ── Dump format ───────────────────────────────────────────────────────────────

/// POSIX account details of a directory record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PosixAccount {
    #[serde(default)]
    pub uid: Option<String>,
}

/// One person as exported from the directory.
#[derive(Debug, Clone, Deserialize)]
pub struct LdapRecord {
    pub distinguished_name: String,
    pub user_id: String,
    #[serde(default)]
    pub groups: Option<Vec<String>>,
    #[serde(default)]
    pub pgp_public_keys: Vec<String>,
    #[serde(default)]
    pub ssh_public_keys: Vec<String>,
    #[serde(default)]
    pub posix: PosixAccount,
}

impl LdapRecord {
    /// Staff for people in the `o=com` or `o=org` trees, private otherwise.
    pub fn display_level(&self) -> DisplayLevel {
        let dn = &self.distinguished_name;
        if dn.contains("o=com") || dn.contains("o=org") {
            DisplayLevel::Staff
        } else {
            DisplayLevel::Private
        }
    }

    /// PGP fingerprints keyed `LDAP-1`, `LDAP-2`, ... with a single `0x`
    /// prefix and no spaces.
    pub fn pgp_key_map(&self) -> FlatValue {
        numbered(&self.pgp_public_keys, |key| {
            format!("0x{key}").replace(' ', "").replace("0x0x", "0x")
        })
    }

    /// SSH keys keyed `LDAP-1`, `LDAP-2`, ... with surrounding whitespace
    /// removed.
    pub fn ssh_key_map(&self) -> FlatValue {
        numbered(&self.ssh_public_keys, |key| key.trim().to_string())
    }
}

fn numbered(keys: &[String], render: impl Fn(&str) -> String) -> FlatValue {
    let map = keys
        .iter()
        .enumerate()
        .map(|(i, key)| (format!("LDAP-{}", i + 1), FlatValue::Text(render(key))))
        .collect::<FlatMap>();
    FlatValue::Map(map)
}

/// Records keyed by primary email.
pub type LdapDump = BTreeMap<String, LdapRecord>;

/// Read a JSON dump from disk.
pub fn load_dump(path: &Path) -> Result<LdapDump> {
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        PublisherError::InvalidFileFormat(format!(
            "failed to parse directory dump {}: {e}",
            path.display()
        ))
    })
}

// ── Outcomes ──────────────────────────────────────────────────────────────────

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The profile matches the directory, whether or not it had to be
    /// published.
    Synced,
    /// The directory lists someone the profile store has no active
    /// profile for.
    Desynced,
    /// The record could not be applied.
    Failed(String),
}

/// Result of a whole run.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub synced: Vec<String>,
    pub desynced: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub elapsed: Duration,
}

impl SyncReport {
    fn record(&mut self, email: String, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Synced => self.synced.push(email),
            SyncOutcome::Desynced => self.desynced.push(email),
            SyncOutcome::Failed(reason) => self.failed.push((email, reason)),
        }
    }

    fn sort(&mut self) {
        self.synced.sort();
        self.desynced.sort();
        self.failed.sort();
    }

    pub fn total(&self) -> usize {
        self.synced.len() + self.desynced.len() + self.failed.len()
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "LDAP publisher results:")?;
        writeln!(f, "  {} accounts synchronized.", self.synced.len())?;

        write!(f, "  {} accounts have CIS/HRIS/LDAP mismatches", self.desynced.len())?;
        if !self.desynced.is_empty() {
            write!(f, ": {}", self.desynced.join(", "))?;
        }
        writeln!(f)?;

        write!(f, "  {} accounts failed to synchronize", self.failed.len())?;
        if !self.failed.is_empty() {
            let names: Vec<&str> = self.failed.iter().map(|(email, _)| email.as_str()).collect();
            write!(f, ": {}", names.join(", "))?;
        }
        writeln!(f)?;

        write!(f, "LDAP publisher completed in {:.2}s.", self.elapsed.as_secs_f64())
    }
}

// ── Per-record sync ───────────────────────────────────────────────────────────

/// Apply one directory record to its profile and publish the result.
///
/// Only errors that doom every other record too (a missing signing key)
/// are returned; everything else becomes an outcome.
pub fn synchronize(
    email: &str,
    record: &LdapRecord,
    source: &dyn ProfileSource,
    sink: &dyn ProfileSink,
    publisher: &Publisher,
) -> Result<SyncOutcome> {
    match apply(email, record, source, sink, publisher) {
        Ok(outcome) => Ok(outcome),
        Err(e) if e.aborts_run() => Err(e),
        Err(PublisherError::InactiveProfile(_)) => {
            log::warn!("Profile for {email} is inactive but still present in LDAP");
            Ok(SyncOutcome::Desynced)
        }
        Err(PublisherError::NotFound(_)) => {
            log::debug!("No profile for {email}; not creating one");
            Ok(SyncOutcome::Desynced)
        }
        Err(e) => {
            log::error!("Unable to synchronize {email}: {e}");
            Ok(SyncOutcome::Failed(e.to_string()))
        }
    }
}

fn apply(
    email: &str,
    record: &LdapRecord,
    source: &dyn ProfileSource,
    sink: &dyn ProfileSink,
    publisher: &Publisher,
) -> Result<SyncOutcome> {
    let key = IdentityKey::PrimaryEmail(email.to_string());
    let mut profile = Profile::load(source, Some(key), false)?;
    log::debug!("Updating user: {} ({email})", record.user_id);

    profile.update([
        ("pgp_public_keys", record.pgp_key_map()),
        ("ssh_public_keys", record.ssh_key_map()),
        ("access_information.ldap", FlatValue::from(record.groups.clone())),
        (
            "identities.mozilla_ldap_id",
            FlatValue::from(record.distinguished_name.as_str()),
        ),
        ("identities.mozilla_ldap_primary_email", FlatValue::from(email)),
        (
            "identities.mozilla_posix_id",
            FlatValue::from(record.posix.uid.clone()),
        ),
    ])?;

    match profile.publish(publisher, sink, Some(record.display_level()), false)? {
        PublishOutcome::Rejected => Ok(SyncOutcome::Failed("submission rejected".to_string())),
        PublishOutcome::Unchanged | PublishOutcome::DryRun | PublishOutcome::Published => {
            Ok(SyncOutcome::Synced)
        }
    }
}

// ── Batch run ─────────────────────────────────────────────────────────────────

/// Synchronise every record of `dump` on `workers` threads.
///
/// # Errors
///
/// Stops handing out records and returns the error as soon as any record
/// hits an error that [`PublisherError::aborts_run`].
pub fn run<S>(dump: LdapDump, store: &S, publisher: &Publisher, workers: usize) -> Result<SyncReport>
where
    S: ProfileSource + ProfileSink,
{
    let started = Instant::now();
    let queue = Mutex::new(dump.into_iter());
    let aborted = AtomicBool::new(false);
    let (tx, rx) = mpsc::channel::<(String, Result<SyncOutcome>)>();

    std::thread::scope(|scope| {
        for _ in 0..workers.max(1) {
            let tx = tx.clone();
            let queue = &queue;
            let aborted = &aborted;
            scope.spawn(move || loop {
                if aborted.load(Ordering::Relaxed) {
                    break;
                }
                let next = queue
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .next();
                let Some((email, record)) = next else {
                    break;
                };

                let result = synchronize(&email, &record, store, store, publisher);
                if result.is_err() {
                    aborted.store(true, Ordering::Relaxed);
                }
                if tx.send((email, result)).is_err() {
                    break;
                }
            });
        }
    });
    drop(tx);

    let mut report = SyncReport::default();
    for (email, result) in rx {
        report.record(email, result?);
    }
    report.sort();
    report.elapsed = started.elapsed();

    log::info!("{report}");
    Ok(report)
}
