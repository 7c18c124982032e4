//! Shared signing capabilities for profile work.
//!
//! A [`Publisher`] bundles the signer, the clock and the dry-run switch.
//! It is immutable and cheap to clone, so one instance serves every worker
//! thread of a batch run. Display levels are not part of it:
//! they travel with each sign call.

use std::sync::Arc;

use crate::attribute::{DisplayLevel, WriteContext};
use crate::config::PublisherConfig;
use crate::crypto::LeafSigner;
use crate::error::Result;
use crate::time::{Clock, SystemClock};

#[derive(Clone)]
pub struct Publisher {
    signer: Option<Arc<dyn LeafSigner>>,
    clock: Arc<dyn Clock>,
    dry_run: bool,
}

impl Publisher {
    /// A publisher on the system clock.
    pub fn new(signer: Option<Arc<dyn LeafSigner>>) -> Self {
        Self {
            signer,
            clock: Arc::new(SystemClock),
            dry_run: false,
        }
    }

    pub fn from_config(config: &PublisherConfig) -> Result<Self> {
        let signer = config
            .signer()?
            .map(|s| Arc::new(s) as Arc<dyn LeafSigner>);
        Ok(Self::new(signer).with_dry_run(config.dry_run))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn has_signer(&self) -> bool {
        self.signer.is_some()
    }

    /// Context for one synchronisation pass, stamped with the current time.
    pub fn write_context(&self, display_level: Option<DisplayLevel>) -> WriteContext<'_> {
        WriteContext {
            now: self.clock.now(),
            signer: self.signer.as_deref(),
            display_level,
        }
    }
}

impl std::fmt::Debug for Publisher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Publisher")
            .field("has_signer", &self.has_signer())
            .field("dry_run", &self.dry_run)
            .finish()
    }
}
