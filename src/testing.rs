//! Test doubles shared by handler and request tests

use std::cell::RefCell;
use std::collections::VecDeque;

use reqwest::Url;

use crate::dom::Document;
use crate::config::MarkupConfig;
use crate::markup::Markup;
use crate::request::{ApiRequest, ApiResponse, Transport, TransportError};
use crate::session::Session;
use crate::ui::HeadlessUi;

/// Replays scripted responses in order and records every request
#[derive(Debug, Default)]
pub struct MockTransport {
    script: RefCell<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, status: u16, body: &str) {
        self.script.borrow_mut().push_back(Ok(ApiResponse {
            status,
            body: body.to_string(),
        }));
    }

    pub fn fail(&self, error: TransportError) {
        self.script.borrow_mut().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.borrow_mut().push(request);
        self.script
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("no scripted response".to_string())))
    }
}

/// A session on `http://localhost/home` that confirms every prompt
///
/// Bootstrap is left to the caller.
pub fn session(html: &str, transport: MockTransport) -> Session<MockTransport, HeadlessUi> {
    Session::new(
        Document::parse(html),
        Url::parse("http://localhost/home").unwrap(),
        transport,
        HeadlessUi::new(true),
        Markup::compile(&MarkupConfig::default()).unwrap(),
    )
}
