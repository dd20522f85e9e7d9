//! Comment forms: always POST, always append

use crate::binder::SubmitKind;
use crate::dom::{NodeId, Position};
use crate::request::{decode, fetch_json, FragmentResponse, Method, Transport};
use crate::session::Session;
use crate::ui::Ui;

impl<T: Transport, U: Ui> Session<T, U> {
    pub fn bind_comment_forms(&mut self) -> usize {
        let mut attached = 0;
        for form in self.document.select_all(&self.markup.comment_form) {
            if self.document.tag_name(form) != Some("form") {
                continue;
            }
            if self
                .registry
                .bind_submit(&mut self.document, SubmitKind::CommentForm, form)
            {
                attached += 1;
            }
        }
        attached
    }

    pub(crate) async fn handle_comment_form(&mut self, form: NodeId) {
        let Some(request) = self.form_request(form, Method::Post) else {
            return;
        };

        let response = match fetch_json(&self.transport, request)
            .await
            .and_then(decode::<FragmentResponse>)
        {
            Ok(response) => response,
            Err(e) => {
                self.report("Comment", e);
                return;
            }
        };

        // Comment forms ignore `redirect`
        if let Some(html) = response.html() {
            if self.insert_fragment(form, Position::BeforeEnd, html) {
                self.bind_ajax_forms();
            }
        }

        self.document.reset_form(form);
    }
}

#[cfg(test)]
mod tests {
    use crate::request::Method;
    use crate::testing::{session, MockTransport};

    const PAGE: &str = r##"<body>
        <article data-post="7">
            <ul id="comments-7"><li data-comment="1">old</li></ul>
            <form class="comment-form" action="/api/posts/7/comment" method="get"
                  data-target="#comments-7">
                <input name="comment_message" value="">
                <button type="submit">Send</button>
            </form>
        </article>
    </body>"##;

    #[tokio::test]
    async fn test_appends_comment_and_resets() {
        let transport = MockTransport::new();
        transport.respond(200, r#"{"status":"ok","html":"<li data-comment=\"2\">new</li>"}"#);
        let mut s = session(PAGE, transport);
        s.bootstrap();

        let form = s.document().query_selector("form").unwrap().unwrap();
        let input = s.document().query_selector("input").unwrap().unwrap();
        s.document_mut().set_value(input, "nice post");
        s.submit(form).await;

        let requests = s.transport().requests();
        // The form's own method is ignored
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(
            requests[0].url.as_str(),
            "http://localhost/api/posts/7/comment"
        );
        assert_eq!(
            requests[0].body.as_ref().unwrap().get("comment_message"),
            Some("nice post")
        );

        let list = s.document().query_selector("#comments-7").unwrap().unwrap();
        assert_eq!(
            s.document().inner_html(list),
            r#"<li data-comment="1">old</li><li data-comment="2">new</li>"#
        );
        assert_eq!(s.document().value(input), "");
    }

    #[tokio::test]
    async fn test_inserted_ajax_forms_are_bound() {
        let transport = MockTransport::new();
        transport.respond(
            200,
            r#"{"html":"<li data-comment=\"3\"><form class=\"js-ajax\" action=\"/api/comments/3\"></form></li>"}"#,
        );
        let mut s = session(PAGE, transport);
        s.bootstrap();

        let form = s.document().query_selector(".comment-form").unwrap().unwrap();
        s.submit(form).await;

        let inserted = s.document().query_selector("form.js-ajax").unwrap().unwrap();
        assert_eq!(s.registry().listener_count(inserted), 1);
    }

    #[tokio::test]
    async fn test_missing_container_still_resets() {
        let page = r##"<form class="comment-form" action="/c" data-target="#gone">
            <input name="comment_message" value="">
        </form>"##;
        let transport = MockTransport::new();
        transport.respond(200, r#"{"html":"<li>new</li>"}"#);
        let mut s = session(page, transport);
        s.bootstrap();

        let form = s.document().query_selector("form").unwrap().unwrap();
        let input = s.document().query_selector("input").unwrap().unwrap();
        s.document_mut().set_value(input, "typed");
        s.submit(form).await;

        assert!(s.ui().alerts().is_empty());
        assert_eq!(s.document().value(input), "");
        assert!(s.document().query_selector("li").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_error_leaves_comments_untouched() {
        let transport = MockTransport::new();
        transport.respond(200, r#"{"status":"error","message":"Comment cannot be empty"}"#);
        let mut s = session(PAGE, transport);
        s.bootstrap();

        let form = s.document().query_selector("form").unwrap().unwrap();
        s.submit(form).await;

        assert_eq!(s.ui().alerts(), ["Comment cannot be empty".to_string()]);
        assert_eq!(s.document().query_selector_all("li").unwrap().len(), 1);
    }
}
