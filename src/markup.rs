//! Compiled markup contract
//!
//! [`MarkupConfig`] holds selector strings as written in the config file; a
//! [`Markup`] holds them parsed, so a bad selector is reported once at session
//! start instead of on every event.

use crate::config::MarkupConfig;
use crate::dom::{Selector, SelectorError};

#[derive(Debug, Clone)]
pub struct Markup {
    pub ajax_form: Selector,
    pub comment_form: Selector,
    pub like: Selector,
    pub delete: Selector,
    pub follow: Selector,
    pub search: Selector,
    pub search_results: Selector,
    pub card: Selector,
    pub like_count: Selector,
    pub like_icon: Selector,
    pub liked_icon: String,
    pub unliked_icon: String,
    pub delete_confirm: String,
}

impl Markup {
    pub fn compile(config: &MarkupConfig) -> Result<Self, SelectorError> {
        Ok(Self {
            ajax_form: Selector::parse(&config.ajax_form)?,
            comment_form: Selector::parse(&config.comment_form)?,
            like: Selector::parse(&config.like)?,
            delete: Selector::parse(&config.delete)?,
            follow: Selector::parse(&config.follow)?,
            search: Selector::parse(&config.search)?,
            search_results: Selector::parse(&config.search_results)?,
            card: Selector::parse(&config.card)?,
            like_count: Selector::parse(&config.like_count)?,
            like_icon: Selector::parse(&config.like_icon)?,
            liked_icon: config.liked_icon.clone(),
            unliked_icon: config.unliked_icon.clone(),
            delete_confirm: config.delete_confirm.clone(),
        })
    }
}
