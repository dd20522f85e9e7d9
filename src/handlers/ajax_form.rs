//! Generic ajax forms: submit, then redirect or insert the returned fragment

use crate::binder::SubmitKind;
use crate::dom::{NodeId, Position};
use crate::request::{decode, fetch_json, FragmentResponse, Method, Transport};
use crate::session::Session;
use crate::ui::Ui;

impl<T: Transport, U: Ui> Session<T, U> {
    /// Attach the ajax listener to every matching form not yet bound
    ///
    /// Safe to re-run after fragment insertion; returns how many forms were
    /// newly bound.
    pub fn bind_ajax_forms(&mut self) -> usize {
        let mut attached = 0;
        for form in self.document.select_all(&self.markup.ajax_form) {
            if self.document.tag_name(form) != Some("form") {
                continue;
            }
            if self
                .registry
                .bind_submit(&mut self.document, SubmitKind::AjaxForm, form)
            {
                attached += 1;
            }
        }
        attached
    }

    pub(crate) async fn handle_ajax_form(&mut self, form: NodeId) {
        let method = Method::from_form(&self.document.form_method(form));
        let Some(request) = self.form_request(form, method) else {
            return;
        };

        let response = match fetch_json(&self.transport, request)
            .await
            .and_then(decode::<FragmentResponse>)
        {
            Ok(response) => response,
            Err(e) => {
                self.report("Form submission", e);
                return;
            }
        };

        if let Some(redirect) = response.redirect() {
            if let Some(url) = self.resolve(redirect) {
                self.ui.navigate(&url);
            }
            return;
        }

        if let Some(html) = response.html() {
            let position = match self.document.data(form, "mode") {
                Some("prepend") => Position::AfterBegin,
                _ => Position::BeforeEnd,
            };
            if self.document.has_attr(form, "data-target")
                && self.insert_fragment(form, position, html)
            {
                self.bind_ajax_forms();
            }
        }

        self.document.reset_form(form);
    }
}
