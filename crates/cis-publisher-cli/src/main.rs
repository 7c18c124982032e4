//! CIS publisher CLI: the `cis-publish` command.
//!
//! Inspects and edits profiles held in a local profile store, signs every
//! changed attribute with the publisher key, and runs the LDAP batch sync.

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde_json::Value;

use cis_publisher::config::DEFAULT_PUBLISHER_NAME;
use cis_publisher::sync::{self, DEFAULT_WORKERS};
use cis_publisher::{
    DirectoryStore, DisplayLevel, Ed25519KeyPair, FlatValue, IdentityKey, Profile,
    PublishOutcome, Publisher, PublisherConfig,
};

// ── CLI structure ─────────────────────────────────────────────────────────────

/// CIS publisher CLI: inspect, edit and synchronise signed identity
/// profiles.
#[derive(Parser, Debug)]
#[command(
    name = "cis-publish",
    about = "CIS publisher CLI",
    version,
    long_about = "cis-publish: CIS publisher CLI\n\nInspect and edit identity profiles in a local store, re-sign changed\nattributes, and synchronise profiles from an LDAP dump."
)]
struct Cli {
    /// Profile store directory
    #[arg(long, global = true, env = "CIS_STORE", default_value = "cis-store")]
    store: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Publisher name written into every signature
    #[arg(long, global = true, env = "PUBLISHER_NAME", default_value = DEFAULT_PUBLISHER_NAME)]
    publisher_name: String,

    /// Base64 Ed25519 seed used to sign attributes
    #[arg(long, global = true, env = "PUBLISHER_SIGNING_KEY", hide_env_values = true)]
    signing_key: Option<String>,

    /// Report changes without publishing them. Setting DRY_RUN to any
    /// value, even an empty one, does the same.
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Which stored profile to work on. Omit all three for the skeleton.
#[derive(Args, Debug)]
#[group(multiple = false)]
struct Selector {
    /// Select by primary email
    #[arg(long)]
    email: Option<String>,

    /// Select by user id
    #[arg(long)]
    user_id: Option<String>,

    /// Select by primary username
    #[arg(long)]
    username: Option<String>,
}

impl Selector {
    fn key(&self) -> Option<IdentityKey> {
        match (&self.email, &self.user_id, &self.username) {
            (Some(email), _, _) => Some(IdentityKey::PrimaryEmail(email.clone())),
            (_, Some(user_id), _) => Some(IdentityKey::UserId(user_id.clone())),
            (_, _, Some(username)) => Some(IdentityKey::PrimaryUsername(username.clone())),
            _ => None,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate a new publisher signing key
    Keygen,

    /// Copy provider documents into the store
    Import {
        /// Skeleton (null) profile document
        #[arg(long)]
        skeleton: Option<PathBuf>,

        /// Profile documents to store under their user ids
        profiles: Vec<PathBuf>,
    },

    /// Print a profile's flat view
    Show {
        #[command(flatten)]
        selector: Selector,

        /// Load the profile even if it is inactive
        #[arg(long)]
        allow_inactive: bool,

        /// Print the signed document instead of the flat view
        #[arg(long)]
        raw: bool,
    },

    /// Change one attribute, re-sign and publish
    Set {
        #[command(flatten)]
        selector: Selector,

        /// Dotted attribute path, e.g. identities.mozilla_posix_id
        #[arg(long)]
        field: String,

        /// New value as JSON; anything that is not valid JSON is taken as a string
        #[arg(long)]
        value: String,

        /// Display level for attributes that do not have one yet
        #[arg(long)]
        display_level: Option<DisplayLevel>,

        /// Load the profile even if it is inactive
        #[arg(long)]
        allow_inactive: bool,
    },

    /// Synchronise profiles from an LDAP dump
    Sync {
        /// JSON dump mapping primary email to LDAP record
        #[arg(long)]
        dump: PathBuf,

        /// Number of worker threads
        #[arg(long, default_value_t = DEFAULT_WORKERS)]
        workers: usize,
    },

    /// Report whether a profile holds nothing worth keeping
    CheckEmpty {
        #[command(flatten)]
        selector: Selector,
    },
}

// ── Main entry point ──────────────────────────────────────────────────────────

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let config = PublisherConfig {
        publisher_name: cli.publisher_name.clone(),
        signing_key: cli.signing_key.clone(),
        dry_run: cli.dry_run || std::env::var_os("DRY_RUN").is_some(),
    };
    log::debug!("Using {config:?}");

    let result = match cli.command {
        Commands::Keygen => cmd_keygen(),
        Commands::Import { skeleton, profiles } => {
            cmd_import(&cli.store, skeleton.as_deref(), &profiles)
        }
        Commands::Show {
            selector,
            allow_inactive,
            raw,
        } => cmd_show(&cli.store, selector.key(), allow_inactive, raw),
        Commands::Set {
            selector,
            field,
            value,
            display_level,
            allow_inactive,
        } => cmd_set(
            &cli.store,
            &config,
            selector.key(),
            &field,
            &value,
            display_level,
            allow_inactive,
        ),
        Commands::Sync { dump, workers } => cmd_sync(&cli.store, &config, &dump, workers),
        Commands::CheckEmpty { selector } => cmd_check_empty(&cli.store, selector.key()),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

// ── Command implementations ───────────────────────────────────────────────────

/// `cis-publish keygen`
fn cmd_keygen() -> Result<()> {
    let key_pair = Ed25519KeyPair::generate();
    println!("PUBLISHER_SIGNING_KEY={}", key_pair.seed_base64());
    println!("Key ID: {}", key_pair.key_id());
    Ok(())
}

/// `cis-publish import [--skeleton FILE] [PROFILE...]`
fn cmd_import(store_dir: &Path, skeleton: Option<&Path>, profiles: &[PathBuf]) -> Result<()> {
    let store = open_store(store_dir)?;

    if let Some(path) = skeleton {
        store
            .save_skeleton(&read_json(path)?)
            .context("failed to store skeleton profile")?;
        println!("Stored skeleton profile from {}", path.display());
    }

    for path in profiles {
        let stored = store
            .save(&read_json(path)?)
            .with_context(|| format!("failed to store {}", path.display()))?;
        println!("Stored {} as {}", path.display(), stored.display());
    }

    Ok(())
}

/// `cis-publish show [SELECTOR] [--allow-inactive] [--raw]`
fn cmd_show(
    store_dir: &Path,
    key: Option<IdentityKey>,
    allow_inactive: bool,
    raw: bool,
) -> Result<()> {
    let store = open_store(store_dir)?;
    let profile = Profile::load(&store, key, allow_inactive).context("failed to load profile")?;

    if raw {
        println!("{}", serde_json::to_string_pretty(&profile.to_document()?)?);
    } else {
        println!("{profile}");
    }
    Ok(())
}

/// `cis-publish set SELECTOR --field PATH --value JSON [--display-level L]`
fn cmd_set(
    store_dir: &Path,
    config: &PublisherConfig,
    key: Option<IdentityKey>,
    field: &str,
    value: &str,
    display_level: Option<DisplayLevel>,
    allow_inactive: bool,
) -> Result<()> {
    let key = key.ok_or_else(|| anyhow!("select a profile with --email, --user-id or --username"))?;
    let store = open_store(store_dir)?;
    let publisher = Publisher::from_config(config).context("failed to load signing key")?;

    let mut profile = Profile::load(&store, Some(key), allow_inactive)
        .context("failed to load profile")?;

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    profile.set_path(field, FlatValue::from_json(value)?)?;
    profile
        .sign(&publisher, display_level)
        .with_context(|| format!("failed to sign {field}"))?;
    let changes = profile.notifications().to_vec();

    let outcome = profile.publish(&publisher, &store, None, false)?;
    for change in &changes {
        println!("  {change}");
    }
    match outcome {
        PublishOutcome::Unchanged => println!("No changes"),
        PublishOutcome::DryRun => println!("Dry run: {} change(s) not published", changes.len()),
        PublishOutcome::Published => println!("Published {} change(s)", changes.len()),
        PublishOutcome::Rejected => return Err(anyhow!("the store rejected the profile")),
    }
    Ok(())
}

/// `cis-publish sync --dump FILE [--workers N]`
fn cmd_sync(store_dir: &Path, config: &PublisherConfig, dump: &Path, workers: usize) -> Result<()> {
    let store = open_store(store_dir)?;
    let publisher = Publisher::from_config(config).context("failed to load signing key")?;
    if !publisher.has_signer() {
        return Err(anyhow!("no signing key: set PUBLISHER_SIGNING_KEY or --signing-key"));
    }

    let records = sync::load_dump(dump).context("invalid LDAP export")?;
    let report = sync::run(records, &store, &publisher, workers)?;

    println!("{report}");
    for (email, reason) in &report.failed {
        println!("  {email}: {reason}");
    }
    Ok(())
}

/// `cis-publish check-empty [SELECTOR]`
fn cmd_check_empty(store_dir: &Path, key: Option<IdentityKey>) -> Result<()> {
    let store = open_store(store_dir)?;
    let profile = Profile::load(&store, key, true).context("failed to load profile")?;

    if profile.is_empty() {
        println!("{} is empty", profile.display_name());
    } else {
        println!("{} has data", profile.display_name());
    }
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn open_store(dir: &Path) -> Result<DirectoryStore> {
    DirectoryStore::open(dir)
        .with_context(|| format!("failed to open profile store at {}", dir.display()))
}

fn read_json(path: &Path) -> Result<Value> {
    let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("{} is not valid JSON", path.display()))
}
