//! Observer registry
//!
//! At most one body-subtree subscription per [`Concern`]. Records queue on
//! the document as it is mutated; [`ObserverRegistry::dispatch`] drains them
//! and hands every newly inserted matching element to the concern's handler.

use std::collections::{BTreeMap, HashSet};

use eyebrowse_dom::{Document, MutationObserverInit, NodeId, ObserverId};

use crate::ledger::{Concern, StyleLedger};

/// Decides whether an inserted node concerns a subscription
pub type NodePredicate = fn(&Document, NodeId) -> bool;

/// Treatment applied to each matching inserted node
pub type NodeHandler = Box<dyn FnMut(&mut Document, &mut StyleLedger, NodeId)>;

struct Subscription {
    observer: ObserverId,
    predicate: NodePredicate,
    handler: NodeHandler,
}

/// Live subscriptions keyed by concern
#[derive(Default)]
pub struct ObserverRegistry {
    subscriptions: BTreeMap<Concern, Subscription>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("concerns", &self.subscriptions.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the subscription for `concern`.
    ///
    /// Returns `false` without subscribing when the document has no body yet.
    pub fn subscribe(
        &mut self,
        doc: &mut Document,
        concern: Concern,
        predicate: NodePredicate,
        handler: NodeHandler,
    ) -> bool {
        self.unsubscribe(doc, concern);
        let Some(body) = doc.body() else {
            tracing::debug!("No body yet, {} observer deferred", concern);
            return false;
        };
        let observer = doc.observe(body, MutationObserverInit::subtree_insertions());
        self.subscriptions.insert(
            concern,
            Subscription {
                observer,
                predicate,
                handler,
            },
        );
        tracing::debug!("Subscribed {} observer", concern);
        true
    }

    /// Disconnect the subscription for `concern`, if any
    pub fn unsubscribe(&mut self, doc: &mut Document, concern: Concern) -> bool {
        match self.subscriptions.remove(&concern) {
            Some(sub) => {
                doc.disconnect(sub.observer);
                tracing::debug!("Unsubscribed {} observer", concern);
                true
            }
            None => false,
        }
    }

    /// Disconnect every subscription
    pub fn unsubscribe_all(&mut self, doc: &mut Document) {
        for concern in Concern::ALL {
            self.unsubscribe(doc, concern);
        }
    }

    pub fn is_subscribed(&self, concern: Concern) -> bool {
        self.subscriptions.contains_key(&concern)
    }

    /// Number of live subscriptions
    pub fn active_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Deliver queued insertions. Returns the number of handler invocations.
    pub fn dispatch(&mut self, doc: &mut Document, ledger: &mut StyleLedger) -> usize {
        let mut handled = 0;
        for (concern, sub) in self.subscriptions.iter_mut() {
            let records = doc.take_records(sub.observer);
            if records.is_empty() {
                continue;
            }

            let mut seen = HashSet::new();
            let mut candidates = Vec::new();
            for added in records.iter().flat_map(|r| r.added_nodes.iter().copied()) {
                if !doc.is_connected(added) {
                    continue;
                }
                let subtree = std::iter::once(added).chain(doc.tree().descendants(added));
                for node in subtree {
                    if seen.insert(node) {
                        candidates.push(node);
                    }
                }
            }

            let mut count = 0;
            for node in candidates {
                if (sub.predicate)(doc, node) {
                    (sub.handler)(doc, ledger, node);
                    count += 1;
                }
            }
            if count > 0 {
                tracing::debug!("{} observer treated {} inserted nodes", concern, count);
            }
            handled += count;
        }
        handled
    }
}
