use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One fetch target. The identity is what checkpoints are matched on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkItem {
    identity: String,
    label: String,
}

impl WorkItem {
    pub fn new(identity: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            label: label.into(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Ordered, immutable sequence of work items. Position is scrape order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WorkList {
    items: Vec<WorkItem>,
}

impl WorkList {
    pub fn new(items: Vec<WorkItem>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&WorkItem> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WorkItem> {
        self.items.iter()
    }

    pub fn identities(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(WorkItem::identity)
    }

    /// Items from `cursor` onwards, paired with their position in the list.
    pub fn remaining(&self, cursor: usize) -> impl Iterator<Item = (usize, &WorkItem)> + '_ {
        self.items.iter().enumerate().skip(cursor)
    }
}

impl FromIterator<WorkItem> for WorkList {
    fn from_iter<T: IntoIterator<Item = WorkItem>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a WorkList {
    type Item = &'a WorkItem;
    type IntoIter = std::slice::Iter<'a, WorkItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// First four bytes of the SHA-256 digest, hex encoded.
pub fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
