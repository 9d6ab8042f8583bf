//! Mutation Observer API
//!
//! Observers queue records when the [`crate::Document`] is mutated. Records
//! are pulled with [`MutationObserverManager::take_records`]; callback
//! scheduling is left to the embedder.

use crate::{DomTree, NodeId};

/// Observer handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u32);

/// Mutation type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationType {
    Attributes,
    ChildList,
}

/// Mutation record
#[derive(Debug, Clone, PartialEq)]
pub struct MutationRecord {
    pub mutation_type: MutationType,
    pub target: NodeId,
    pub added_nodes: Vec<NodeId>,
    pub removed_nodes: Vec<NodeId>,
    pub attribute_name: Option<String>,
    pub old_value: Option<String>,
}

impl MutationRecord {
    pub fn child_list(target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) -> Self {
        Self {
            mutation_type: MutationType::ChildList,
            target,
            added_nodes: added,
            removed_nodes: removed,
            attribute_name: None,
            old_value: None,
        }
    }

    pub fn attribute(target: NodeId, name: &str, old_value: Option<String>) -> Self {
        Self {
            mutation_type: MutationType::Attributes,
            target,
            added_nodes: Vec::new(),
            removed_nodes: Vec::new(),
            attribute_name: Some(name.to_string()),
            old_value,
        }
    }
}

/// Mutation observer options
#[derive(Debug, Clone, Default)]
pub struct MutationObserverInit {
    pub child_list: bool,
    pub attributes: bool,
    pub subtree: bool,
    pub attribute_old_value: bool,
    pub attribute_filter: Option<Vec<String>>,
}

impl MutationObserverInit {
    /// `{ childList: true, subtree: true }`
    pub fn subtree_insertions() -> Self {
        Self {
            child_list: true,
            subtree: true,
            ..Default::default()
        }
    }
}

#[derive(Debug)]
struct MutationObserver {
    id: ObserverId,
    observations: Vec<(NodeId, MutationObserverInit)>,
    pending_records: Vec<MutationRecord>,
}

impl MutationObserver {
    fn wants(&self, tree: &DomTree, record: &MutationRecord) -> Option<&MutationObserverInit> {
        self.observations.iter().find_map(|(target, options)| {
            let in_scope = *target == record.target
                || (options.subtree && tree.contains(*target, record.target));
            let matches_type = match record.mutation_type {
                MutationType::Attributes => options.attributes,
                MutationType::ChildList => options.child_list,
            };
            let passes_filter = match (&options.attribute_filter, &record.attribute_name) {
                (Some(filter), Some(attr)) => filter.iter().any(|f| f == attr),
                _ => true,
            };
            (in_scope && matches_type && passes_filter).then_some(options)
        })
    }
}

/// Registry of live observers for one document
#[derive(Debug, Default)]
pub struct MutationObserverManager {
    observers: Vec<MutationObserver>,
    next_id: u32,
}

impl MutationObserverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create observer
    pub fn create(&mut self) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id += 1;
        self.observers.push(MutationObserver {
            id,
            observations: Vec::new(),
            pending_records: Vec::new(),
        });
        id
    }

    fn get_mut(&mut self, id: ObserverId) -> Option<&mut MutationObserver> {
        self.observers.iter_mut().find(|o| o.id == id)
    }

    /// Observe a target. Re-observing a target replaces its options.
    pub fn observe(&mut self, id: ObserverId, target: NodeId, options: MutationObserverInit) -> bool {
        let Some(observer) = self.get_mut(id) else {
            return false;
        };
        observer.observations.retain(|(t, _)| *t != target);
        observer.observations.push((target, options));
        true
    }

    /// Stop observing and drop queued records
    pub fn disconnect(&mut self, id: ObserverId) {
        if let Some(observer) = self.get_mut(id) {
            observer.observations.clear();
            observer.pending_records.clear();
        }
    }

    /// Remove observer entirely
    pub fn remove(&mut self, id: ObserverId) {
        self.observers.retain(|o| o.id != id);
    }

    /// Take pending records
    pub fn take_records(&mut self, id: ObserverId) -> Vec<MutationRecord> {
        self.get_mut(id)
            .map(|o| std::mem::take(&mut o.pending_records))
            .unwrap_or_default()
    }

    /// Has pending records
    pub fn has_pending(&self, id: ObserverId) -> bool {
        self.observers
            .iter()
            .any(|o| o.id == id && !o.pending_records.is_empty())
    }

    /// Whether the observer watches at least one target
    pub fn is_observing(&self, id: ObserverId) -> bool {
        self.observers
            .iter()
            .any(|o| o.id == id && !o.observations.is_empty())
    }

    /// Number of observers watching at least one target
    pub fn live_count(&self) -> usize {
        self.observers
            .iter()
            .filter(|o| !o.observations.is_empty())
            .count()
    }

    /// Queue a record on every interested observer
    pub(crate) fn notify(&mut self, tree: &DomTree, record: &MutationRecord) {
        for observer in &mut self.observers {
            let Some(options) = observer.wants(tree, record) else {
                continue;
            };
            let mut record = record.clone();
            if record.mutation_type == MutationType::Attributes && !options.attribute_old_value {
                record.old_value = None;
            }
            observer.pending_records.push(record);
        }
    }
}
