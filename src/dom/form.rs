//! Form controls: value collection and reset

use super::{Document, NodeId};

/// Input types that never contribute to a form's data set
const EXCLUDED_INPUT_TYPES: &[&str] = &["submit", "button", "reset", "image", "file"];

/// Ordered name/value pairs collected from a form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, String)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.entries.push((name.into(), value.into()));
    }

    /// First value for `name`
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn into_entries(self) -> Vec<(String, String)> {
        self.entries
    }
}

impl Document {
    /// Form-associated controls under `form`, in document order
    fn controls(&self, form: NodeId) -> Vec<NodeId> {
        self.descendants(form)
            .into_iter()
            .filter(|&id| matches!(self.tag_name(id), Some("input" | "textarea" | "select")))
            .collect()
    }

    pub(crate) fn input_type(&self, control: NodeId) -> String {
        self.attr(control, "type")
            .unwrap_or("text")
            .to_ascii_lowercase()
    }

    /// Current value of an input, textarea or select
    pub fn value(&self, control: NodeId) -> String {
        let Some(element) = self.element(control) else {
            return String::new();
        };
        if let Some(dirty) = &element.dirty_value {
            return dirty.clone();
        }
        match element.tag.as_str() {
            "textarea" => self.text_content(control),
            "select" => self
                .selected_option(control)
                .map(|option| self.option_value(option))
                .unwrap_or_default(),
            _ => match element.attr("value") {
                Some(value) => value.to_string(),
                None if matches!(self.input_type(control).as_str(), "checkbox" | "radio") => {
                    "on".to_string()
                }
                None => String::new(),
            },
        }
    }

    /// Set the user-entered value (cleared again by [`Document::reset_form`])
    pub fn set_value(&mut self, control: NodeId, value: &str) {
        if let Some(element) = self.element_mut(control) {
            element.dirty_value = Some(value.to_string());
        }
    }

    pub fn is_checked(&self, control: NodeId) -> bool {
        match self.element(control) {
            Some(element) => element
                .dirty_checked
                .unwrap_or_else(|| element.attr("checked").is_some()),
            None => false,
        }
    }

    pub fn set_checked(&mut self, control: NodeId, checked: bool) {
        if let Some(element) = self.element_mut(control) {
            element.dirty_checked = Some(checked);
        }
    }

    fn selected_option(&self, select: NodeId) -> Option<NodeId> {
        let options: Vec<NodeId> = self
            .descendants(select)
            .into_iter()
            .filter(|&id| self.tag_name(id) == Some("option"))
            .collect();
        options
            .iter()
            .copied()
            .find(|&id| self.has_attr(id, "selected"))
            .or_else(|| options.first().copied())
    }

    fn option_value(&self, option: NodeId) -> String {
        match self.attr(option, "value") {
            Some(value) => value.to_string(),
            None => self.text_content(option).trim().to_string(),
        }
    }

    /// Collect the successful controls of `form`
    pub fn form_data(&self, form: NodeId) -> FormData {
        let mut data = FormData::new();
        for control in self.controls(form) {
            let Some(name) = self.attr(control, "name").filter(|n| !n.is_empty()) else {
                continue;
            };
            if self.has_attr(control, "disabled") {
                continue;
            }
            if self.tag_name(control) == Some("input") {
                let kind = self.input_type(control);
                if EXCLUDED_INPUT_TYPES.contains(&kind.as_str()) {
                    continue;
                }
                if matches!(kind.as_str(), "checkbox" | "radio") && !self.is_checked(control) {
                    continue;
                }
            }
            data.append(name, self.value(control));
        }
        data
    }

    /// Restore every control in `form` to its markup default
    pub fn reset_form(&mut self, form: NodeId) {
        for control in self.controls(form) {
            if let Some(element) = self.element_mut(control) {
                element.dirty_value = None;
                element.dirty_checked = None;
            }
        }
    }

    /// The `method` attribute upper-cased, `POST` when absent or empty
    pub fn form_method(&self, form: NodeId) -> String {
        self.attr(form, "method")
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_ascii_uppercase)
            .unwrap_or_else(|| "POST".to_string())
    }
}
