//! Style ledger
//!
//! Remembers the value every engine-touched (element, property) pair had
//! before the engine first wrote it, plus the elements the engine created.
//! Restoring a concern writes the originals back and drops its elements.

use std::collections::HashSet;

use eyebrowse_dom::{Document, DomResult, NodeId};

/// Category of engine mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Concern {
    Filter,
    Font,
    TextSize,
    TextSettings,
    Zoom,
}

impl Concern {
    pub const ALL: [Concern; 5] = [
        Concern::Filter,
        Concern::Font,
        Concern::TextSize,
        Concern::TextSettings,
        Concern::Zoom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Concern::Filter => "filter",
            Concern::Font => "font",
            Concern::TextSize => "text-size",
            Concern::TextSettings => "text-settings",
            Concern::Zoom => "zoom",
        }
    }
}

impl std::fmt::Display for Concern {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What on an element was modified
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LedgerTarget {
    /// Inline style property
    Style(String),
    /// Attribute (including `class`)
    Attribute(String),
}

/// Value before the first engine write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginalValue {
    pub value: String,
    pub important: bool,
}

#[derive(Debug, Clone)]
struct Entry {
    concern: Concern,
    element: NodeId,
    target: LedgerTarget,
    original: Option<OriginalValue>,
}

/// Outcome of a restore pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RestoreReport {
    /// Entries written back
    pub restored: usize,
    /// Engine-created elements removed
    pub removed: usize,
    /// Entries or elements no longer in the document
    pub skipped: usize,
}

impl RestoreReport {
    pub(crate) fn merge(&mut self, other: RestoreReport) {
        self.restored += other.restored;
        self.removed += other.removed;
        self.skipped += other.skipped;
    }
}

/// Undo bookkeeping for one document
#[derive(Debug, Default)]
pub struct StyleLedger {
    entries: Vec<Entry>,
    recorded: HashSet<(NodeId, LedgerTarget)>,
    owned: Vec<(Concern, NodeId)>,
}

impl StyleLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `original` unless the pair is already recorded. Returns whether it was stored.
    pub fn record(
        &mut self,
        concern: Concern,
        element: NodeId,
        target: LedgerTarget,
        original: Option<OriginalValue>,
    ) -> bool {
        if !self.recorded.insert((element, target.clone())) {
            return false;
        }
        self.entries.push(Entry {
            concern,
            element,
            target,
            original,
        });
        true
    }

    /// Record the current inline value of `property`
    pub fn record_style(
        &mut self,
        doc: &Document,
        concern: Concern,
        element: NodeId,
        property: &str,
    ) -> bool {
        let original = doc.tree().element(element).and_then(|e| {
            e.style.get(property).map(|value| OriginalValue {
                value: value.to_string(),
                important: e.style.is_important(property),
            })
        });
        self.record(
            concern,
            element,
            LedgerTarget::Style(property.to_string()),
            original,
        )
    }

    /// Record the current value of attribute `name`
    pub fn record_attribute(
        &mut self,
        doc: &Document,
        concern: Concern,
        element: NodeId,
        name: &str,
    ) -> bool {
        let original = doc.get_attribute(element, name).map(|value| OriginalValue {
            value,
            important: false,
        });
        self.record(
            concern,
            element,
            LedgerTarget::Attribute(name.to_ascii_lowercase()),
            original,
        )
    }

    /// Record, then write an inline style property
    pub fn set_style(
        &mut self,
        doc: &mut Document,
        concern: Concern,
        element: NodeId,
        property: &str,
        value: &str,
        important: bool,
    ) -> DomResult<()> {
        self.record_style(doc, concern, element, property);
        doc.set_style_property(element, property, value, important)
    }

    /// Record, then write an attribute
    pub fn set_attribute(
        &mut self,
        doc: &mut Document,
        concern: Concern,
        element: NodeId,
        name: &str,
        value: &str,
    ) -> DomResult<()> {
        self.record_attribute(doc, concern, element, name);
        doc.set_attribute(element, name, value)
    }

    /// Register an engine-created element for removal on restore
    pub fn adopt(&mut self, concern: Concern, element: NodeId) {
        if !self.owned.iter().any(|&(_, e)| e == element) {
            self.owned.push((concern, element));
        }
    }

    /// Recorded original, if any
    pub fn original(&self, element: NodeId, target: &LedgerTarget) -> Option<&OriginalValue> {
        self.entries
            .iter()
            .find(|e| e.element == element && &e.target == target)
            .and_then(|e| e.original.as_ref())
    }

    pub fn is_recorded(&self, element: NodeId, target: &LedgerTarget) -> bool {
        self.recorded.contains(&(element, target.clone()))
    }

    /// Elements adopted under `concern`
    pub fn owned(&self, concern: Concern) -> Vec<NodeId> {
        self.owned
            .iter()
            .filter(|(c, _)| *c == concern)
            .map(|&(_, e)| e)
            .collect()
    }

    /// Number of recorded entries for a concern
    pub fn entry_count(&self, concern: Concern) -> usize {
        self.entries.iter().filter(|e| e.concern == concern).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.owned.is_empty()
    }

    /// Undo everything recorded under `concern`
    pub fn restore(&mut self, doc: &mut Document, concern: Concern) -> RestoreReport {
        let mut report = RestoreReport::default();

        let (mine, rest): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.entries)
            .into_iter()
            .partition(|e| e.concern == concern);
        self.entries = rest;

        for entry in mine {
            self.recorded.remove(&(entry.element, entry.target.clone()));
            if !doc.is_connected(entry.element) {
                report.skipped += 1;
                continue;
            }
            match write_back(doc, &entry) {
                Ok(()) => report.restored += 1,
                Err(e) => {
                    tracing::debug!("Skipping {} restore on {}: {}", concern, entry.element, e);
                    report.skipped += 1;
                }
            }
        }

        let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.owned)
            .into_iter()
            .partition(|(c, _)| *c == concern);
        self.owned = rest;
        for (_, element) in mine {
            if doc.remove(element) {
                report.removed += 1;
            } else {
                report.skipped += 1;
            }
        }

        if report != RestoreReport::default() {
            tracing::debug!(
                "Restored {}: {} values, {} elements removed, {} skipped",
                concern,
                report.restored,
                report.removed,
                report.skipped
            );
        }
        report
    }

    /// Undo every concern
    pub fn restore_all(&mut self, doc: &mut Document) -> RestoreReport {
        let mut report = RestoreReport::default();
        for concern in Concern::ALL {
            report.merge(self.restore(doc, concern));
        }
        report
    }
}

fn write_back(doc: &mut Document, entry: &Entry) -> DomResult<()> {
    match (&entry.target, &entry.original) {
        (LedgerTarget::Style(property), Some(original)) => {
            doc.set_style_property(entry.element, property, &original.value, original.important)
        }
        (LedgerTarget::Style(property), None) => {
            doc.remove_style_property(entry.element, property).map(|_| ())
        }
        (LedgerTarget::Attribute(name), Some(original)) => {
            doc.set_attribute(entry.element, name, &original.value)
        }
        (LedgerTarget::Attribute(name), None) => doc.remove_attribute(entry.element, name).map(|_| ()),
    }
}
