//! DomainFilter - live skip/allow sets shared by all sink workers

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use contracts::FilterMode;
use tracing::{info, instrument, warn};

use crate::{load_domain_file, DomainSet, FilterError};

/// Which of the two domain lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListKind {
    Skip,
    Allow,
}

impl ListKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Skip => "skip",
            Self::Allow => "allow",
        }
    }
}

impl fmt::Display for ListKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One list: the live set and where it is reloaded from
#[derive(Debug)]
struct ListSlot {
    set: ArcSwap<DomainSet>,
    source: Option<PathBuf>,
}

impl ListSlot {
    fn new(set: DomainSet, source: Option<PathBuf>) -> Self {
        Self {
            set: ArcSwap::from_pointee(set),
            source,
        }
    }
}

/// Skip-list and allow-list filter
///
/// Both sets are replaced wholesale through [`ArcSwap`]; a lookup works on
/// one loaded snapshot, so concurrent readers see either the old or the
/// new set, never a mix.
#[derive(Debug)]
pub struct DomainFilter {
    skip: ListSlot,
    allow: ListSlot,
}

impl DomainFilter {
    /// Create a filter with empty sets and optional backing files
    pub fn new(skip_source: Option<PathBuf>, allow_source: Option<PathBuf>) -> Self {
        Self {
            skip: ListSlot::new(DomainSet::new(), skip_source),
            allow: ListSlot::new(DomainSet::new(), allow_source),
        }
    }

    /// Create a filter from fixed sets without backing files
    pub fn from_sets(skip: DomainSet, allow: DomainSet) -> Self {
        Self {
            skip: ListSlot::new(skip, None),
            allow: ListSlot::new(allow, None),
        }
    }

    fn slot(&self, list: ListKind) -> &ListSlot {
        match list {
            ListKind::Skip => &self.skip,
            ListKind::Allow => &self.allow,
        }
    }

    /// Decide whether a query name is dropped under `mode`
    pub fn should_skip(&self, mode: FilterMode, name: &str) -> bool {
        match mode {
            FilterMode::Disabled | FilterMode::NoFilter => false,
            FilterMode::SkipListOnly => self.skip.set.load().matches(name),
            FilterMode::AllowListOnly => !self.allow.set.load().matches(name),
            FilterMode::SkipAndAllow => {
                self.skip.set.load().matches(name) && !self.allow.set.load().matches(name)
            }
        }
    }

    /// Current snapshot of a list
    pub fn snapshot(&self, list: ListKind) -> Arc<DomainSet> {
        self.slot(list).set.load_full()
    }

    /// Backing file of a list, if any
    pub fn source(&self, list: ListKind) -> Option<&Path> {
        self.slot(list).source.as_deref()
    }

    /// Atomically replace a list
    pub fn replace(&self, list: ListKind, set: DomainSet) {
        self.slot(list).set.store(Arc::new(set));
    }

    /// Reload a list from its backing file
    ///
    /// On failure the previous set stays live and a warning is logged.
    /// Returns the number of entries now active.
    #[instrument(name = "domain_filter_reload", skip(self), fields(list = %list))]
    pub async fn reload(&self, list: ListKind) -> Result<usize, FilterError> {
        let Some(path) = self.source(list) else {
            return Err(FilterError::NoSource(list));
        };

        match load_domain_file(list, path).await {
            Ok(set) => {
                let entries = set.len();
                self.replace(list, set);
                observability::record_filter_reload(list.as_str(), true, entries);
                info!(list = %list, path = %path.display(), entries, "Domain list reloaded");
                Ok(entries)
            }
            Err(e) => {
                observability::record_filter_reload(list.as_str(), false, 0);
                warn!(
                    list = %list,
                    error = %e,
                    kept = self.slot(list).set.load().len(),
                    "Domain list reload failed, keeping previous set"
                );
                Err(e)
            }
        }
    }

    /// Load every list that has a backing file
    ///
    /// Failures are logged and leave the list empty.
    pub async fn load_all(&self) {
        for list in [ListKind::Skip, ListKind::Allow] {
            if self.source(list).is_some() {
                let _ = self.reload(list).await;
            }
        }
    }
}
