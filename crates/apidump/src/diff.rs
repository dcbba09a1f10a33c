//! Set differences between two snapshots.

use crate::types::{ApiEntry, Snapshot};
use std::collections::BTreeSet;
use std::io::{self, Write};

/// What changed between an older and a newer snapshot.
///
/// Entries are compared as opaque facts: a renamed parameter shows up as one
/// removed entry and one added entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiDiff {
    /// Entries present only in the older snapshot, in canonical order.
    pub removed: Vec<ApiEntry>,
    /// Entries present only in the newer snapshot, in canonical order.
    pub added: Vec<ApiEntry>,
    pub versions: Vec<VersionChange>,
}

/// A module whose recorded version differs between two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionChange {
    pub module: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl ApiDiff {
    /// Nothing differs, versions included.
    pub fn is_empty(&self) -> bool {
        self.api_unchanged() && self.versions.is_empty()
    }

    /// The API entries match; versions may still differ.
    pub fn api_unchanged(&self) -> bool {
        self.removed.is_empty() && self.added.is_empty()
    }

    /// Write version changes, then removed (`- `) and added (`+ `) entries.
    pub fn render<W: Write>(&self, to: &mut W) -> io::Result<()> {
        for change in &self.versions {
            writeln!(
                to,
                "version {}: {} -> {}",
                change.module,
                change.old.as_deref().unwrap_or("<none>"),
                change.new.as_deref().unwrap_or("<none>"),
            )?;
        }
        for entry in &self.removed {
            writeln!(to, "- {}", entry)?;
        }
        for entry in &self.added {
            writeln!(to, "+ {}", entry)?;
        }
        Ok(())
    }
}

impl Snapshot {
    /// Compare this (older) snapshot against a newer one.
    pub fn diff(&self, newer: &Snapshot) -> ApiDiff {
        let removed = self.api.difference(&newer.api).cloned().collect();
        let added = newer.api.difference(&self.api).cloned().collect();

        let modules: BTreeSet<&String> =
            self.versions.keys().chain(newer.versions.keys()).collect();
        let versions = modules
            .into_iter()
            .filter_map(|module| {
                let old = self.versions.get(module).cloned().flatten();
                let new = newer.versions.get(module).cloned().flatten();
                (old != new).then(|| VersionChange {
                    module: module.clone(),
                    old,
                    new,
                })
            })
            .collect();

        ApiDiff {
            removed,
            added,
            versions,
        }
    }
}
