// Blocking dialogs and navigation
//
// In a browser these are window.alert / window.confirm / location assignment.
// The headless implementation records every call so the CLI can report what
// the user would have seen, and so tests can assert on it.

use reqwest::Url;

/// User-facing side effects a handler may trigger
pub trait Ui {
    /// Show a blocking message
    fn alert(&mut self, message: &str);

    /// Ask a yes/no question; `false` means the user declined
    fn confirm(&mut self, message: &str) -> bool;

    /// Leave the current page
    fn navigate(&mut self, url: &Url);
}

/// Records dialogs and navigations instead of showing them
#[derive(Debug, Clone, Default)]
pub struct HeadlessUi {
    /// Answer given to every confirmation prompt
    confirm_answer: bool,
    alerts: Vec<String>,
    confirms: Vec<String>,
    navigations: Vec<Url>,
}

impl HeadlessUi {
    pub fn new(confirm_answer: bool) -> Self {
        Self {
            confirm_answer,
            ..Default::default()
        }
    }

    pub fn set_confirm_answer(&mut self, answer: bool) {
        self.confirm_answer = answer;
    }

    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    pub fn confirms(&self) -> &[String] {
        &self.confirms
    }

    pub fn navigations(&self) -> &[Url] {
        &self.navigations
    }

    /// Most recent navigation target, if the page was left
    pub fn location(&self) -> Option<&Url> {
        self.navigations.last()
    }

    /// Drop everything recorded so far (between scripted steps)
    pub fn clear(&mut self) {
        self.alerts.clear();
        self.confirms.clear();
        self.navigations.clear();
    }
}

impl Ui for HeadlessUi {
    fn alert(&mut self, message: &str) {
        tracing::info!("alert: {}", message);
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, message: &str) -> bool {
        tracing::info!("confirm: {} -> {}", message, self.confirm_answer);
        self.confirms.push(message.to_string());
        self.confirm_answer
    }

    fn navigate(&mut self, url: &Url) {
        tracing::info!("navigate: {}", url);
        self.navigations.push(url.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_dialogs_and_answers_confirm() {
        let mut ui = HeadlessUi::new(false);
        ui.alert("Login required");
        assert!(!ui.confirm("Delete?"));
        ui.set_confirm_answer(true);
        assert!(ui.confirm("Delete?"));
        ui.navigate(&Url::parse("http://localhost/").unwrap());

        assert_eq!(ui.alerts(), ["Login required"]);
        assert_eq!(ui.confirms().len(), 2);
        assert_eq!(ui.location().map(Url::as_str), Some("http://localhost/"));

        ui.clear();
        assert!(ui.alerts().is_empty());
        assert!(ui.location().is_none());
    }
}
