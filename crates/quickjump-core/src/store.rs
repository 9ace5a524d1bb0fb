//! Process-wide configuration handle.
//!
//! The application owns one [`ConfigStore`] and passes it (or snapshots taken
//! from it) to every resolver and search call. Readers take an
//! `Arc<Configuration>` snapshot and keep a complete tree for as long as they
//! hold it; the single writer replaces the whole tree in one atomic store.

use crate::config::{self, Configuration};
use crate::Result;
use arc_swap::ArcSwap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Callback fired after every swap with the new configuration and version.
pub type SwapHook = Box<dyn Fn(&Arc<Configuration>, u64) + Send + Sync>;

/// Holder of the current configuration.
pub struct ConfigStore {
    current: ArcSwap<Configuration>,
    version: AtomicU64,
    path: Option<PathBuf>,
    hooks: Vec<SwapHook>,
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("version", &self.version())
            .field("path", &self.path)
            .field("sites", &self.current.load().sites.len())
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl ConfigStore {
    /// In-memory store; [`commit`](Self::commit) only swaps.
    pub fn new(config: Configuration) -> Self {
        Self {
            current: ArcSwap::from_pointee(config),
            version: AtomicU64::new(0),
            path: None,
            hooks: Vec::new(),
        }
    }

    /// Store backed by `path`, loaded now and saved on every commit.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Configuration::load_from(&path)?;
        Ok(Self {
            path: Some(path),
            ..Self::new(config)
        })
    }

    /// Store backed by the user rules file.
    pub fn open_default() -> Result<Self> {
        Self::open(config::rules_path()?)
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> Arc<Configuration> {
        self.current.load_full()
    }

    /// Number of swaps performed so far.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// File this store persists to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Register a hook fired after every swap.
    pub fn on_swap(&mut self, hook: impl Fn(&Arc<Configuration>, u64) + Send + Sync + 'static) {
        self.hooks.push(Box::new(hook));
    }

    /// Replace the configuration without persisting it.
    ///
    /// Returns the new snapshot.
    pub fn swap(&self, config: Configuration) -> Arc<Configuration> {
        let config = Arc::new(config);
        self.current.store(Arc::clone(&config));
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        info!(version, sites = config.sites.len(), "configuration swapped");
        for hook in &self.hooks {
            hook(&config, version);
        }
        config
    }

    /// Replace the configuration, then persist it when backed by a file.
    ///
    /// The swap is visible to readers even if saving fails.
    pub fn commit(&self, config: Configuration) -> Result<Arc<Configuration>> {
        let config = self.swap(config);
        if let Some(path) = &self.path {
            config.save_to(path)?;
        }
        Ok(config)
    }

    /// Persist the current configuration when backed by a file.
    pub fn save(&self) -> Result<()> {
        match &self.path {
            Some(path) => self.current().save_to(path),
            None => Ok(()),
        }
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(Configuration::default())
    }
}
