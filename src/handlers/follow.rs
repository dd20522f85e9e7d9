//! Follow toggle: POST /api/follow/{id}, then swap the button label

use crate::binder::ClickKind;
use crate::dom::NodeId;
use crate::request::{decode, fetch_json, ApiRequest, FollowResponse, Method, Transport};
use crate::session::Session;
use crate::ui::Ui;

impl<T: Transport, U: Ui> Session<T, U> {
    pub fn bind_follow_buttons(&mut self) -> bool {
        self.registry
            .install_delegated(ClickKind::Follow, self.markup.follow.clone())
    }

    pub(crate) async fn handle_follow(&mut self, button: NodeId) {
        let Some(user_id) = self.document.data(button, "user").map(str::to_string) else {
            tracing::warn!("Follow button {:?} has no data-user", button);
            return;
        };
        let Some(url) = self.api_url(&["api", "follow", &user_id]) else {
            return;
        };

        let follow = match fetch_json(&self.transport, ApiRequest::new(Method::Post, url))
            .await
            .and_then(decode::<FollowResponse>)
        {
            Ok(follow) => follow,
            Err(e) => {
                self.report("Follow", e);
                return;
            }
        };

        // Label pair comes from data-unfollow / data-follow on the button
        let key = if follow.following { "unfollow" } else { "follow" };
        match self.document.data(button, key).map(str::to_string) {
            Some(label) => self.document.set_text_content(button, &label),
            None => tracing::warn!("Follow button {:?} has no data-{}", button, key),
        }
        tracing::info!("User {} following = {}", user_id, follow.following);
    }
}
