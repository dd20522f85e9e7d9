//! A page session: the document plus everything bound to it
//!
//! Bootstrap runs every binder once; afterwards user interactions are
//! dispatched through the registry to the handlers in `handlers/`.

use anyhow::{Context, Result};
use reqwest::Url;

use crate::binder::{ClickKind, Dispatch, Registry, SubmitKind};
use crate::config::Config;
use crate::dom::{Document, NodeId, Selector};
use crate::markup::Markup;
use crate::request::{ApiRequest, HttpTransport, Method, RequestError, Transport};
use crate::ui::{HeadlessUi, Ui};

pub struct Session<T, U> {
    pub(crate) document: Document,
    pub(crate) page_url: Url,
    pub(crate) transport: T,
    pub(crate) ui: U,
    pub(crate) markup: Markup,
    pub(crate) registry: Registry,
}

impl Session<HttpTransport, HeadlessUi> {
    /// Load a page over HTTP and bootstrap it
    pub async fn open(config: &Config, page_url: Url) -> Result<Self> {
        let markup = Markup::compile(&config.markup).context("Invalid [markup] selector")?;
        let transport = HttpTransport::new(config)?;
        let html = transport.fetch_page(&page_url).await?;
        let document = Document::parse(&html);
        tracing::info!("Loaded {} ({} bytes)", page_url, html.len());

        let mut session = Session::new(
            document,
            page_url,
            transport,
            HeadlessUi::new(config.assume_yes),
            markup,
        );
        session.bootstrap();
        Ok(session)
    }
}

impl<T: Transport, U: Ui> Session<T, U> {
    pub fn new(document: Document, page_url: Url, transport: T, ui: U, markup: Markup) -> Self {
        Self {
            document,
            page_url,
            transport,
            ui,
            markup,
            registry: Registry::new(),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Mutable access for simulated typing before a submit
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn page_url(&self) -> &Url {
        &self.page_url
    }

    /// Run every binder once, in the fixed order
    pub fn bootstrap(&mut self) {
        self.bind_ajax_forms();
        self.bind_comment_forms();
        self.bind_like_buttons();
        self.bind_delete_buttons();
        self.bind_follow_buttons();
        self.bind_search();
        tracing::debug!(
            "Bootstrap complete: {} ajax, {} comment, {} search form(s), delegated {:?}",
            self.registry.bound(SubmitKind::AjaxForm).len(),
            self.registry.bound(SubmitKind::CommentForm).len(),
            self.registry.bound(SubmitKind::Search).len(),
            self.registry.delegated_kinds()
        );
    }

    /// Fire a submit event at `form`
    pub async fn submit(&mut self, form: NodeId) -> Dispatch {
        let listeners = self.registry.submit_listeners(form);
        if listeners.is_empty() {
            tracing::debug!("Submit on {:?} not intercepted", form);
            return Dispatch::Default;
        }
        for kind in listeners {
            match kind {
                SubmitKind::AjaxForm => self.handle_ajax_form(form).await,
                SubmitKind::CommentForm => self.handle_comment_form(form).await,
                SubmitKind::Search => self.handle_search(form).await,
            }
        }
        Dispatch::Intercepted
    }

    /// Fire a click event at `target`
    ///
    /// Delegated handlers get the first chance; an unhandled click on a submit
    /// button falls through to submitting its form.
    pub async fn click(&mut self, target: NodeId) -> Dispatch {
        let resolved = self.registry.resolve_click(&self.document, target);
        if resolved.is_empty() {
            return match self.submit_button_form(target) {
                Some(form) => self.submit(form).await,
                None => Dispatch::Default,
            };
        }
        for (kind, element) in resolved {
            match kind {
                ClickKind::Like => self.handle_like(element).await,
                ClickKind::Delete => self.handle_delete(element).await,
                ClickKind::Follow => self.handle_follow(element).await,
            }
        }
        Dispatch::Intercepted
    }

    /// The form a click on `target` would submit natively
    fn submit_button_form(&self, target: NodeId) -> Option<NodeId> {
        let button = Selector::parse("button, input").ok()?;
        let control = self.document.closest(target, &button)?;
        let kind = self
            .document
            .attr(control, "type")
            .unwrap_or(if self.document.tag_name(control) == Some("button") {
                "submit"
            } else {
                "text"
            })
            .to_ascii_lowercase();
        if kind != "submit" && kind != "image" {
            return None;
        }
        let form = Selector::parse("form").ok()?;
        self.document.closest(control, &form)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Shared handler plumbing
    // ─────────────────────────────────────────────────────────────────────

    /// Resolve an address the way a browser resolves it against the page
    pub(crate) fn resolve(&self, address: &str) -> Option<Url> {
        match self.page_url.join(address) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Cannot resolve {:?} against {}: {}", address, self.page_url, e);
                None
            }
        }
    }

    /// Root-relative API address built from percent-encoded path segments
    pub(crate) fn api_url(&self, segments: &[&str]) -> Option<Url> {
        let mut url = self.page_url.clone();
        url.set_query(None);
        url.set_fragment(None);
        url.path_segments_mut().ok()?.clear().extend(segments);
        Some(url)
    }

    /// The form's target address; a missing `action` posts back to the page
    pub(crate) fn form_action(&self, form: NodeId) -> Option<Url> {
        match self.document.attr(form, "action") {
            Some(action) if !action.trim().is_empty() => self.resolve(action.trim()),
            _ => Some(self.page_url.clone()),
        }
    }

    /// Build a request carrying the form's current field values
    pub(crate) fn form_request(&self, form: NodeId, method: Method) -> Option<ApiRequest> {
        let url = self.form_action(form)?;
        Some(ApiRequest::new(method, url).with_form(self.document.form_data(form)))
    }

    /// Look up a container named by a `data-target` attribute value
    pub(crate) fn target_container(&self, selector: &str) -> Option<NodeId> {
        match Selector::parse(selector) {
            Ok(selector) => self.document.select(&selector),
            Err(e) => {
                tracing::warn!("Ignoring invalid target selector: {}", e);
                None
            }
        }
    }

    /// Surface a failed request as a blocking alert
    pub(crate) fn report(&mut self, context: &str, err: RequestError) {
        tracing::error!("{} failed: {}", context, err);
        self.ui.alert(&err.to_string());
    }
}

#[cfg(test)]
mod tests {
    use crate::binder::{Dispatch, SubmitKind};
    use crate::testing::{session, MockTransport};

    const PAGE: &str = r##"<body>
        <form id="post" class="js-ajax" action="/api/posts" data-target="#feed" data-mode="prepend">
            <textarea name="post_message"></textarea><button type="submit">Post</button>
        </form>
        <form id="comment" class="comment-form" action="/api/posts/1/comment" data-target="#comments-1">
            <input name="comment"><button>Send</button>
        </form>
        <form id="plain" action="/login"><button>Login</button></form>
        <form id="search" class="js-search" action="/api/search"><input name="search_for"></form>
        <form id="search2" class="js-search" action="/api/search"></form>
        <div id="feed"></div><ul id="comments-1"></ul><div id="search_results"></div>
    </body>"##;

    #[tokio::test]
    async fn test_bootstrap_binds_every_binder_once() {
        let mut s = session(PAGE, MockTransport::new());
        s.bootstrap();
        s.bootstrap();

        let doc = s.document();
        let post = doc.query_selector("#post").unwrap().unwrap();
        let comment = doc.query_selector("#comment").unwrap().unwrap();
        let search2 = doc.query_selector("#search2").unwrap().unwrap();

        assert_eq!(s.registry().submit_listeners(post), vec![SubmitKind::AjaxForm]);
        assert_eq!(
            s.registry().submit_listeners(comment),
            vec![SubmitKind::CommentForm]
        );
        // Only the first search form is bound
        assert_eq!(s.registry().listener_count(search2), 0);
        assert_eq!(s.registry().bound(SubmitKind::Search).len(), 1);
        assert_eq!(s.registry().delegated_kinds().len(), 3);
    }

    #[tokio::test]
    async fn test_unbound_form_keeps_default_action() {
        let transport = MockTransport::new();
        let mut s = session(PAGE, transport);
        s.bootstrap();
        let plain = s.document().query_selector("#plain").unwrap().unwrap();

        assert_eq!(s.submit(plain).await, Dispatch::Default);
        assert!(s.transport().requests().is_empty());
    }

    #[tokio::test]
    async fn test_clicking_submit_button_submits_bound_form() {
        let transport = MockTransport::new();
        transport.respond(200, r#"{"status":"ok","html":"<article>new</article>"}"#);
        let mut s = session(PAGE, transport);
        s.bootstrap();

        let button = s
            .document()
            .query_selector("#post button")
            .unwrap()
            .unwrap();
        assert_eq!(s.click(button).await, Dispatch::Intercepted);

        let requests = s.transport().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].url.as_str(), "http://localhost/api/posts");
    }

    #[test]
    fn test_api_url_encodes_segments() {
        let s = session("<body></body>", MockTransport::new());
        let url = s.api_url(&["api", "posts", "a b/c", "like"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost/api/posts/a%20b%2Fc/like");
    }

    #[test]
    fn test_form_action_defaults_to_page() {
        let s = session(r#"<form id="f"></form>"#, MockTransport::new());
        let form = s.document().query_selector("#f").unwrap().unwrap();
        assert_eq!(s.form_action(form).unwrap().as_str(), "http://localhost/home");
    }
}
