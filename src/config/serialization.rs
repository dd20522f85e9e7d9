//! Config serialization to TOML
//!
//! Single source of truth for config file format.

use super::Config;

impl Config {
    /// Serialize the full config as a commented TOML document
    pub fn to_toml(&self) -> String {
        let m = &self.markup;
        let session_cookie = match &self.session_cookie {
            Some(cookie) => format!("session_cookie = {:?}", cookie),
            None => "# session_cookie = \"session=...\"".to_string(),
        };

        format!(
            r#"# postwire configuration

# Server that relative page paths resolve against
base_url = {base_url:?}

# Per-request timeout in seconds (page loads and API calls)
timeout_secs = {timeout}

# User-Agent sent with every request
user_agent = {user_agent:?}

# Cookie header for an authenticated session (POSTWIRE_COOKIE overrides)
{session_cookie}

# Answer to confirmation prompts such as "Delete?"
assume_yes = {assume_yes}

# Markup contract: selectors and labels read from the page
[markup]
ajax_form = {ajax_form:?}
comment_form = {comment_form:?}
like = {like:?}
delete = {delete:?}
follow = {follow:?}
search = {search:?}
search_results = {search_results:?}
card = {card:?}
like_count = {like_count:?}
like_icon = {like_icon:?}
liked_icon = {liked_icon:?}
unliked_icon = {unliked_icon:?}
delete_confirm = {delete_confirm:?}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = {log_level:?}
# JSON file logging (in addition to stderr)
file_enabled = {log_file_enabled}
file_dir = {log_file_dir:?}
file_rotation = "{log_file_rotation}"  # hourly, daily, never
file_prefix = {log_file_prefix:?}
"#,
            base_url = self.base_url,
            timeout = self.timeout_secs,
            user_agent = self.user_agent,
            session_cookie = session_cookie,
            assume_yes = self.assume_yes,
            ajax_form = m.ajax_form,
            comment_form = m.comment_form,
            like = m.like,
            delete = m.delete,
            follow = m.follow,
            search = m.search,
            search_results = m.search_results,
            card = m.card,
            like_count = m.like_count,
            like_icon = m.like_icon,
            liked_icon = m.liked_icon,
            unliked_icon = m.unliked_icon,
            delete_confirm = m.delete_confirm,
            log_level = self.logging.level,
            log_file_enabled = self.logging.file_enabled,
            log_file_dir = self.logging.file_dir.display().to_string(),
            log_file_rotation = self.logging.file_rotation.as_str(),
            log_file_prefix = self.logging.file_prefix,
        )
    }
}
