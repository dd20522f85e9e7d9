//! Action handlers
//!
//! Each submodule adds one binder and one handler to [`Session`]. A handler
//! gathers its inputs, makes exactly one call through the request helper and,
//! only on success, applies its DOM patch. Failures become a single alert.

use crate::dom::{NodeId, Position};
use crate::request::Transport;
use crate::session::Session;
use crate::ui::Ui;

mod ajax_form;
mod comment_form;
mod delete;
mod follow;
mod like;
mod search;

impl<T: Transport, U: Ui> Session<T, U> {
    /// Insert a fragment into the container named by `form`'s `data-target`
    ///
    /// Returns `true` if markup was inserted. Newly inserted forms are bound
    /// by the caller.
    pub(crate) fn insert_fragment(&mut self, form: NodeId, position: Position, html: &str) -> bool {
        let Some(target) = self.document.data(form, "target").map(str::to_string) else {
            tracing::warn!("Form {:?} has no data-target; fragment dropped", form);
            return false;
        };
        let Some(container) = self.target_container(&target) else {
            tracing::warn!("Target container {:?} not found; fragment dropped", target);
            return false;
        };
        self.document.insert_adjacent_html(container, position, html);
        tracing::info!("Inserted fragment into {} ({:?})", target, position);
        true
    }
}
