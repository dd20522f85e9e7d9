//! Binder registry: idempotent direct binding and delegated click dispatch
//!
//! Direct binders (forms) own a [`BoundSet`] and attach a submit listener to
//! each element at most once, however often they are re-run. Delegated
//! binders register a single entry in the click table; the concrete target is
//! resolved per event by ancestor search, so elements inserted later are
//! covered without re-binding.

use std::collections::{HashMap, HashSet};

use crate::dom::{Document, NodeId, Selector};

/// Marker mirrored onto directly bound elements
pub const BOUND_ATTR: &str = "data-bound";

/// Listeners attached directly to a form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmitKind {
    AjaxForm,
    CommentForm,
    Search,
}

/// Handlers reached through the delegated click table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClickKind {
    Like,
    Delete,
    Follow,
}

/// Whether an event's native default action still runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A handler called preventDefault
    Intercepted,
    /// Nothing handled the event
    Default,
}

/// Elements a direct binder has already attached to
#[derive(Debug, Clone, Default)]
pub struct BoundSet {
    bound: HashSet<NodeId>,
}

impl BoundSet {
    /// Check-and-set: `true` only the first time `node` is seen
    pub fn insert(&mut self, node: NodeId) -> bool {
        self.bound.insert(node)
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.bound.contains(&node)
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    ajax_forms: BoundSet,
    comment_forms: BoundSet,
    search_forms: BoundSet,
    /// Submit listeners per element, in attach order
    submit_listeners: HashMap<NodeId, Vec<SubmitKind>>,
    /// Delegated click table, in install order
    delegated: Vec<(ClickKind, Selector)>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bound(&self, kind: SubmitKind) -> &BoundSet {
        match kind {
            SubmitKind::AjaxForm => &self.ajax_forms,
            SubmitKind::CommentForm => &self.comment_forms,
            SubmitKind::Search => &self.search_forms,
        }
    }

    fn bound_mut(&mut self, kind: SubmitKind) -> &mut BoundSet {
        match kind {
            SubmitKind::AjaxForm => &mut self.ajax_forms,
            SubmitKind::CommentForm => &mut self.comment_forms,
            SubmitKind::Search => &mut self.search_forms,
        }
    }

    /// Attach a submit listener of `kind` to `form` unless already attached
    ///
    /// Returns `true` when a listener was attached.
    pub fn bind_submit(&mut self, doc: &mut Document, kind: SubmitKind, form: NodeId) -> bool {
        if !self.bound_mut(kind).insert(form) {
            return false;
        }
        doc.set_attr(form, BOUND_ATTR, "1");
        self.submit_listeners.entry(form).or_default().push(kind);
        tracing::debug!("Bound {:?} listener to {:?}", kind, form);
        true
    }

    /// Install a delegated click entry; a second install of the same kind is ignored
    pub fn install_delegated(&mut self, kind: ClickKind, selector: Selector) -> bool {
        if self.delegated.iter().any(|(k, _)| *k == kind) {
            return false;
        }
        tracing::debug!("Delegated {:?} clicks for {}", kind, selector);
        self.delegated.push((kind, selector));
        true
    }

    pub fn submit_listeners(&self, form: NodeId) -> Vec<SubmitKind> {
        self.submit_listeners.get(&form).cloned().unwrap_or_default()
    }

    /// Number of listeners attached directly to `node`
    pub fn listener_count(&self, node: NodeId) -> usize {
        self.submit_listeners.get(&node).map_or(0, Vec::len)
    }

    pub fn delegated_kinds(&self) -> Vec<ClickKind> {
        self.delegated.iter().map(|(k, _)| *k).collect()
    }

    /// Resolve a click on `target` against the delegated table
    ///
    /// Every entry is resolved before any handler runs, matching listeners
    /// that all see the event before the first one yields.
    pub fn resolve_click(&self, doc: &Document, target: NodeId) -> Vec<(ClickKind, NodeId)> {
        self.delegated
            .iter()
            .filter_map(|(kind, selector)| doc.closest(target, selector).map(|el| (*kind, el)))
            .collect()
    }
}
