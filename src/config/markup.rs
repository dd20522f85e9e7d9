//! Markup contract: the selectors and labels the layer reads from the page
//!
//! Defaults match the class names and attributes the server templates emit.

use serde::Deserialize;

/// Selectors and labels of the DOM attribute contract
#[derive(Debug, Clone, PartialEq)]
pub struct MarkupConfig {
    /// Forms submitted asynchronously with fragment/redirect handling
    pub ajax_form: String,
    /// Comment forms (always append)
    pub comment_form: String,
    /// Delegated like buttons (carry `data-post`)
    pub like: String,
    /// Delegated delete buttons (carry `data-url`)
    pub delete: String,
    /// Delegated follow buttons (carry `data-user`, `data-follow`, `data-unfollow`)
    pub follow: String,
    /// The search form (first match only)
    pub search: String,
    /// Container replaced with rendered search rows
    pub search_results: String,
    /// Ancestor removed after a successful delete
    pub card: String,
    /// Count element inside a like button
    pub like_count: String,
    /// Icon element inside a like button
    pub like_icon: String,
    /// Icon class when the post is liked
    pub liked_icon: String,
    /// Icon class when the post is not liked
    pub unliked_icon: String,
    /// Confirmation prompt shown before deleting
    pub delete_confirm: String,
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            ajax_form: "form.js-ajax".to_string(),
            comment_form: "form.comment-form".to_string(),
            like: ".js-like".to_string(),
            delete: ".js-delete".to_string(),
            follow: ".js-follow".to_string(),
            search: ".js-search".to_string(),
            search_results: "#search_results".to_string(),
            card: "[data-post], [data-comment]".to_string(),
            like_count: ".like-count".to_string(),
            like_icon: "i".to_string(),
            liked_icon: "fa-solid fa-heart".to_string(),
            unliked_icon: "fa-regular fa-heart".to_string(),
            delete_confirm: "Delete?".to_string(),
        }
    }
}

/// Markup settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
pub struct FileMarkup {
    pub ajax_form: Option<String>,
    pub comment_form: Option<String>,
    pub like: Option<String>,
    pub delete: Option<String>,
    pub follow: Option<String>,
    pub search: Option<String>,
    pub search_results: Option<String>,
    pub card: Option<String>,
    pub like_count: Option<String>,
    pub like_icon: Option<String>,
    pub liked_icon: Option<String>,
    pub unliked_icon: Option<String>,
    pub delete_confirm: Option<String>,
}

impl MarkupConfig {
    /// Create from file config with defaults
    pub fn from_file(file: Option<FileMarkup>) -> Self {
        let file = file.unwrap_or_default();
        let defaults = Self::default();

        Self {
            ajax_form: file.ajax_form.unwrap_or(defaults.ajax_form),
            comment_form: file.comment_form.unwrap_or(defaults.comment_form),
            like: file.like.unwrap_or(defaults.like),
            delete: file.delete.unwrap_or(defaults.delete),
            follow: file.follow.unwrap_or(defaults.follow),
            search: file.search.unwrap_or(defaults.search),
            search_results: file.search_results.unwrap_or(defaults.search_results),
            card: file.card.unwrap_or(defaults.card),
            like_count: file.like_count.unwrap_or(defaults.like_count),
            like_icon: file.like_icon.unwrap_or(defaults.like_icon),
            liked_icon: file.liked_icon.unwrap_or(defaults.liked_icon),
            unliked_icon: file.unliked_icon.unwrap_or(defaults.unliked_icon),
            delete_confirm: file.delete_confirm.unwrap_or(defaults.delete_confirm),
        }
    }
}
