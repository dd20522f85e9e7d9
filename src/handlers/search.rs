//! Search form: render user and post hits into the results container

use crate::binder::SubmitKind;
use crate::dom::{escape_text, NodeId};
use crate::request::{decode, fetch_json, Method, SearchResponse, Transport};
use crate::session::Session;
use crate::ui::Ui;

/// Result rows for a search payload, users first
fn render_results(results: &SearchResponse) -> String {
    let users = results.users.iter().map(|u| {
        format!(
            r#"<div class="search-row"><strong>{}</strong> @{}</div>"#,
            escape_text(&u.user_first_name),
            escape_text(&u.user_username)
        )
    });
    let posts = results.posts.iter().map(|p| {
        format!(
            r#"<div class="search-row">{} <span class="muted">@{}</span></div>"#,
            escape_text(&p.post_message),
            escape_text(&p.user_username)
        )
    });
    users.chain(posts).collect()
}

impl<T: Transport, U: Ui> Session<T, U> {
    /// Bind the first search form on the page, if any
    pub fn bind_search(&mut self) -> bool {
        let Some(form) = self.document.select(&self.markup.search) else {
            return false;
        };
        self.registry
            .bind_submit(&mut self.document, SubmitKind::Search, form)
    }

    pub(crate) async fn handle_search(&mut self, form: NodeId) {
        let Some(request) = self.form_request(form, Method::Post) else {
            return;
        };

        let results = match fetch_json(&self.transport, request)
            .await
            .and_then(decode::<SearchResponse>)
        {
            Ok(results) => results,
            Err(e) => {
                self.report("Search", e);
                return;
            }
        };

        let Some(container) = self.document.select(&self.markup.search_results) else {
            tracing::warn!("No {} container; search results dropped", self.markup.search_results);
            return;
        };
        self.document
            .set_inner_html(container, &render_results(&results));
        tracing::info!(
            "Search returned {} user(s), {} post(s)",
            results.users.len(),
            results.posts.len()
        );
    }
}
