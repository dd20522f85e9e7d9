//! Delete a post or comment after confirmation, then drop its card

use crate::binder::ClickKind;
use crate::dom::NodeId;
use crate::request::{fetch_json, ApiRequest, Method, Transport};
use crate::session::Session;
use crate::ui::Ui;

impl<T: Transport, U: Ui> Session<T, U> {
    pub fn bind_delete_buttons(&mut self) -> bool {
        self.registry
            .install_delegated(ClickKind::Delete, self.markup.delete.clone())
    }

    pub(crate) async fn handle_delete(&mut self, button: NodeId) {
        if !self.ui.confirm(&self.markup.delete_confirm) {
            tracing::debug!("Delete on {:?} declined", button);
            return;
        }

        let Some(address) = self.document.data(button, "url").map(str::to_string) else {
            tracing::warn!("Delete button {:?} has no data-url", button);
            return;
        };
        let Some(url) = self.resolve(&address) else {
            return;
        };

        if let Err(e) = fetch_json(&self.transport, ApiRequest::new(Method::Delete, url)).await {
            self.report("Delete", e);
            return;
        }

        match self.document.closest(button, &self.markup.card) {
            Some(card) => {
                self.document.remove(card);
                tracing::info!("Removed {}", address);
            }
            None => tracing::warn!("Deleted {} but found no card to remove", address),
        }
    }
}
