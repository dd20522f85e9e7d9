//! Like toggle: POST /api/posts/{id}/like, then patch count and icon

use crate::binder::ClickKind;
use crate::dom::NodeId;
use crate::request::{decode, fetch_json, ApiRequest, LikeResponse, Method, Transport};
use crate::session::Session;
use crate::ui::Ui;

impl<T: Transport, U: Ui> Session<T, U> {
    pub fn bind_like_buttons(&mut self) -> bool {
        self.registry
            .install_delegated(ClickKind::Like, self.markup.like.clone())
    }

    pub(crate) async fn handle_like(&mut self, button: NodeId) {
        let Some(post_id) = self.document.data(button, "post").map(str::to_string) else {
            tracing::warn!("Like button {:?} has no data-post", button);
            return;
        };
        let Some(url) = self.api_url(&["api", "posts", &post_id, "like"]) else {
            return;
        };

        let like = match fetch_json(&self.transport, ApiRequest::new(Method::Post, url))
            .await
            .and_then(decode::<LikeResponse>)
        {
            Ok(like) => like,
            Err(e) => {
                self.report("Like", e);
                return;
            }
        };

        if let Some(count) = self.document.select_in(button, &self.markup.like_count) {
            self.document.set_text_content(count, &like.likes.to_string());
        }
        if let Some(icon) = self.document.select_in(button, &self.markup.like_icon) {
            let class_name = if like.liked {
                &self.markup.liked_icon
            } else {
                &self.markup.unliked_icon
            };
            self.document.set_class_name(icon, class_name);
        }
        tracing::info!("Post {} now has {} like(s)", post_id, like.likes);
    }
}

#[cfg(test)]
mod tests {
    use crate::binder::Dispatch;
    use crate::testing::{session, MockTransport};

    const PAGE: &str = r#"<body><article data-post="42">
        <button class="js-like" data-post="42">
            <i class="fa-regular fa-heart"></i> <span class="like-count">4</span>
        </button>
    </article></body>"#;

    #[tokio::test]
    async fn test_like_toggle_updates_count_and_icon() {
        let transport = MockTransport::new();
        transport.respond(200, r#"{"status":"ok","likes":5,"liked":true}"#);
        transport.respond(200, r#"{"status":"ok","likes":4,"liked":false}"#);
        let mut s = session(PAGE, transport);
        s.bootstrap();

        let icon = s.document().query_selector("i").unwrap().unwrap();
        let count = s.document().query_selector(".like-count").unwrap().unwrap();

        // Clicking the icon resolves to the button
        assert_eq!(s.click(icon).await, Dispatch::Intercepted);
        assert_eq!(s.document().text_content(count), "5");
        assert_eq!(s.document().attr(icon, "class"), Some("fa-solid fa-heart"));

        s.click(count).await;
        assert_eq!(s.document().text_content(count), "4");
        assert_eq!(s.document().attr(icon, "class"), Some("fa-regular fa-heart"));

        let requests = s.transport().requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url.as_str(), "http://localhost/api/posts/42/like");
        assert!(requests[0].body.is_none());
    }

    #[tokio::test]
    async fn test_like_error_alerts_without_mutation() {
        let transport = MockTransport::new();
        transport.respond(401, r#"{"status":"error","message":"X"}"#);
        let mut s = session(PAGE, transport);
        s.bootstrap();

        let button = s.document().query_selector(".js-like").unwrap().unwrap();
        let before = s.document().inner_html(s.document().root());
        s.click(button).await;

        assert_eq!(s.ui().alerts(), ["X".to_string()]);
        assert_eq!(s.document().inner_html(s.document().root()), before);
    }

    #[tokio::test]
    async fn test_button_added_later_is_handled() {
        let transport = MockTransport::new();
        transport.respond(200, r#"{"likes":1,"liked":true}"#);
        let mut s = session("<body><main></main></body>", transport);
        s.bootstrap();

        let main = s.document().query_selector("main").unwrap().unwrap();
        s.document_mut().set_inner_html(
            main,
            r#"<button class="js-like" data-post="9"><span class="like-count">0</span></button>"#,
        );
        let button = s.document().query_selector(".js-like").unwrap().unwrap();
        s.click(button).await;

        let count = s.document().query_selector(".like-count").unwrap().unwrap();
        assert_eq!(s.document().text_content(count), "1");
    }

    #[tokio::test]
    async fn test_missing_post_id_sends_nothing() {
        let mut s = session(r#"<button class="js-like">x</button>"#, MockTransport::new());
        s.bootstrap();

        let button = s.document().query_selector("button").unwrap().unwrap();
        assert_eq!(s.click(button).await, Dispatch::Intercepted);
        assert!(s.transport().requests().is_empty());
        assert!(s.ui().alerts().is_empty());
    }
}
