//! Project metadata, as returned by `gcloud compute project-info describe`.
use std::collections::BTreeSet;
use std::io;
use std::iter::FromIterator;

use serde::Deserialize;

use crate::error::Error;
use crate::keys::Entry;

/// Metadata key holding the project's authorized SSH keys.
pub const SSH_KEYS: &str = "ssh-keys";

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInfo {
    #[serde(default)]
    pub common_instance_metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Item {
    pub key: String,
    #[serde(default)]
    pub value: String,
}

impl ProjectInfo {
    pub fn from_yaml(s: &str) -> Result<Self, Error> {
        // An empty document is a project without metadata.
        if s.trim().is_empty() {
            return Ok(Self::default());
        }
        let info = serde_yaml::from_str(s)?;

        Ok(info)
    }

    /// Value of the given metadata item, if set.
    pub fn item(&self, key: &str) -> Option<&str> {
        self.common_instance_metadata
            .items
            .iter()
            .find(|i| i.key == key)
            .map(|i| i.value.as_str())
    }

    /// Existing SSH key entries, one per non-blank line of the `ssh-keys` item.
    pub fn ssh_keys(&self) -> Vec<Entry> {
        self.item(SSH_KEYS)
            .map(|value| {
                value
                    .lines()
                    .filter(|l| !l.trim().is_empty())
                    .map(Entry::from)
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// A deduplicated set of key entries.
///
/// Entries are compared as plain text, so two entries for the same key
/// material with different comments are kept apart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySet(BTreeSet<Entry>);

impl KeySet {
    /// Union of new and existing entries.
    pub fn merge(
        new: impl IntoIterator<Item = Entry>,
        existing: impl IntoIterator<Item = Entry>,
    ) -> Self {
        new.into_iter().chain(existing).collect()
    }

    pub fn contains(&self, entry: &Entry) -> bool {
        self.0.contains(entry)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.0.iter()
    }

    /// Write one entry per line.
    pub fn write_to(&self, mut w: impl io::Write) -> io::Result<()> {
        for entry in self.iter() {
            writeln!(w, "{}", entry)?;
        }
        Ok(())
    }
}

impl FromIterator<Entry> for KeySet {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
