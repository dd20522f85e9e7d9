// CLI module - command-line argument parsing and handlers
//
// Page commands load a page, bootstrap it and replay one interaction:
// - open <url>: load and bootstrap, report what got bound
// - click <url> <selector>: dispatch a click at the first match
// - submit <url> <selector> [--field name=value]...: fill and submit a form
// - demo: run a scripted session against a local backend
//
// Configuration management:
// - config --show: Display effective configuration
// - config --reset: Regenerate config file with defaults
// - config --edit: Open config file in $EDITOR
// - config --update: Merge new defaults into existing config

use crate::binder::{Dispatch, SubmitKind};
use crate::config::{Config, VERSION};
use crate::dom::{Document, NodeId, Selector};
use crate::request::{HttpTransport, Transport};
use crate::session::Session;
use crate::ui::HeadlessUi;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reqwest::Url;
use std::io::Write;
use std::process::Command;

/// postwire - progressive-enhancement layer for server-rendered pages, run headless
#[derive(Parser)]
#[command(name = "postwire")]
#[command(version = VERSION)]
#[command(about = "Drive a server-rendered social app the way its enhancement script does", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Answer yes to confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Print the page body after the interaction
    #[arg(long, global = true)]
    pub dump: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a page and bootstrap it
    Open {
        /// Page URL, absolute or relative to base_url
        url: String,
    },

    /// Click the first element matching a selector
    Click {
        url: String,
        selector: String,
    },

    /// Fill in and submit the first form matching a selector
    Submit {
        url: String,
        selector: String,

        /// Field value as name=value (repeatable)
        #[arg(long = "field", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Run a scripted session against a local demo backend
    Demo,

    /// Manage configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Reset config file to defaults
        #[arg(long)]
        reset: bool,

        /// Open config file in $EDITOR
        #[arg(long)]
        edit: bool,

        /// Update config with new defaults (preserves user values)
        #[arg(long)]
        update: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },
}

fn parse_field(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.is_empty() => Ok((name.to_string(), value.to_string())),
        _ => Err(format!("expected name=value, got {:?}", raw)),
    }
}

/// Handle config commands. Returns true if a command was handled (exit after).
pub fn handle_config_command(command: &Commands) -> bool {
    let Commands::Config {
        show,
        reset,
        edit,
        update,
        path,
    } = command
    else {
        return false;
    };

    if *path {
        handle_config_path();
    } else if *show {
        handle_config_show();
    } else if *reset {
        handle_config_reset();
    } else if *edit {
        handle_config_edit();
    } else if *update {
        handle_config_update();
    } else {
        // No flag provided, show help
        println!("Usage: postwire config [--show|--reset|--edit|--update|--path]");
        println!();
        println!("Options:");
        println!("  --show    Display effective configuration");
        println!("  --reset   Reset config file to defaults");
        println!("  --edit    Open config file in $EDITOR");
        println!("  --update  Update config with new defaults (preserves user values)");
        println!("  --path    Show config file path");
    }
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Page commands
// ─────────────────────────────────────────────────────────────────────────────

/// Resolve a page argument against the configured base URL
pub fn page_url(base_url: &str, page: &str) -> Result<Url> {
    let base = Url::parse(base_url).with_context(|| format!("Invalid base_url {:?}", base_url))?;
    base.join(page)
        .with_context(|| format!("Cannot resolve page {:?} against {}", page, base))
}

/// Run a page command
pub async fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Demo => crate::demo::run(&config).await,
        Commands::Open { url } => {
            let session = Session::open(&config, page_url(&config.base_url, &url)?).await?;
            print_bindings(&session);
            if cli.dump {
                print_body(&session);
            }
            Ok(())
        }
        Commands::Click { url, selector } => {
            let mut session = Session::open(&config, page_url(&config.base_url, &url)?).await?;
            let target = first_match(&session, &selector)?;
            let dispatch = session.click(target).await;
            print_outcome(&session, dispatch);
            if cli.dump {
                print_body(&session);
            }
            Ok(())
        }
        Commands::Submit {
            url,
            selector,
            fields,
        } => {
            let mut session = Session::open(&config, page_url(&config.base_url, &url)?).await?;
            let form = first_match(&session, &selector)?;
            fill_form(&mut session, form, &fields)?;
            let dispatch = session.submit(form).await;
            print_outcome(&session, dispatch);
            if cli.dump {
                print_body(&session);
            }
            Ok(())
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn first_match(session: &Session<HttpTransport, HeadlessUi>, selector: &str) -> Result<NodeId> {
    session
        .document()
        .query_selector(selector)
        .with_context(|| format!("Invalid selector {:?}", selector))?
        .with_context(|| format!("No element matches {:?}", selector))
}

/// Set each named control inside `form`; unknown names are an error
fn fill_form<T: Transport>(
    session: &mut Session<T, HeadlessUi>,
    form: NodeId,
    fields: &[(String, String)],
) -> Result<()> {
    for (name, value) in fields {
        let selector = Selector::parse(&format!("[name={:?}]", name))
            .with_context(|| format!("Invalid field name {:?}", name))?;
        let controls = session.document().select_all_in(form, &selector);
        let control = *controls
            .first()
            .with_context(|| format!("Form has no control named {:?}", name))?;

        let kind = session.document().input_type(control);
        if session.document().tag_name(control) == Some("input")
            && matches!(kind.as_str(), "checkbox" | "radio")
        {
            check_control(session.document_mut(), &controls, &kind, value);
        } else {
            session.document_mut().set_value(control, value);
        }
    }
    Ok(())
}

/// Tick the checkbox or radio whose value matches, as a click would
///
/// With no match the first control is ticked and takes the value. Ticking a
/// radio clears the rest of its group.
fn check_control(doc: &mut Document, controls: &[NodeId], kind: &str, value: &str) {
    let matching = controls.iter().copied().find(|&c| doc.value(c) == value);
    let target = match matching {
        Some(control) => control,
        None => {
            let first = controls[0];
            doc.set_value(first, value);
            first
        }
    };
    if kind == "radio" {
        for &other in controls {
            doc.set_checked(other, other == target);
        }
    } else {
        doc.set_checked(target, true);
    }
}

fn print_bindings<T: Transport>(session: &Session<T, HeadlessUi>) {
    let registry = session.registry();
    println!("Page: {}", session.page_url());
    println!(
        "  ajax forms: {}",
        registry.bound(SubmitKind::AjaxForm).len()
    );
    println!(
        "  comment forms: {}",
        registry.bound(SubmitKind::CommentForm).len()
    );
    println!(
        "  search forms: {}",
        registry.bound(SubmitKind::Search).len()
    );
    println!("  delegated clicks: {:?}", registry.delegated_kinds());
}

/// Report what the user would have seen after one interaction
pub fn print_outcome<T: Transport>(session: &Session<T, HeadlessUi>, dispatch: Dispatch) {
    match dispatch {
        Dispatch::Intercepted => println!("  handled in page"),
        Dispatch::Default => println!("  not intercepted (browser default action)"),
    }
    for message in session.ui().confirms() {
        println!("  confirm: {}", message);
    }
    for message in session.ui().alerts() {
        println!("  alert: {}", message);
    }
    for url in session.ui().navigations() {
        println!("  navigate: {}", url);
    }
}

fn print_body<T: Transport>(session: &Session<T, HeadlessUi>) {
    let doc = session.document();
    println!();
    println!("{}", doc.outer_html(doc.body()));
}

// ─────────────────────────────────────────────────────────────────────────────
// Config commands
// ─────────────────────────────────────────────────────────────────────────────

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => {
            eprintln!("Error: Could not determine config path");
            std::process::exit(1);
        }
    }
}

fn handle_config_show() {
    let config = Config::from_env();

    println!("# Effective configuration (env > file > defaults)");
    println!();
    print!("{}", config.to_toml());

    // Show source info
    println!();
    if let Some(path) = Config::config_path() {
        if path.exists() {
            println!("# Source: {}", path.display());
        } else {
            println!("# Source: defaults (no config file)");
        }
    }
}

fn handle_config_reset() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    // Confirm if file exists
    if path.exists() {
        eprint!(
            "Config file exists at {}. Overwrite? [y/N] ",
            path.display()
        );
        let _ = std::io::stderr().flush();

        let mut input = String::new();
        if std::io::stdin().read_line(&mut input).is_err()
            || !input.trim().eq_ignore_ascii_case("y")
        {
            println!("Aborted.");
            return;
        }
    }

    // Create parent directory
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            eprintln!("Error creating directory: {}", e);
            std::process::exit(1);
        }
    }

    // Write the default config (using Config's single source of truth)
    if let Err(e) = std::fs::write(&path, Config::default().to_toml()) {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config reset to defaults: {}", path.display());
}

fn handle_config_edit() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    // Ensure config exists
    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(windows) {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    println!("Opening {} with {}", path.display(), editor);

    match Command::new(&editor).arg(&path).status() {
        Ok(s) if s.success() => {}
        Ok(s) => {
            eprintln!("Editor exited with status: {}", s);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Failed to launch editor '{}': {}", editor, e);
            eprintln!("Set $EDITOR environment variable to your preferred editor");
            std::process::exit(1);
        }
    }
}

fn handle_config_update() {
    let Some(path) = Config::config_path() else {
        eprintln!("Error: Could not determine config path");
        std::process::exit(1);
    };

    if !path.exists() {
        Config::ensure_config_exists();
        println!("Created new config file: {}", path.display());
        return;
    }

    // Re-serialize the effective values with the current template
    let updated = Config::from_env().to_toml();

    let backup_path = path.with_extension("toml.bak");
    if let Err(e) = std::fs::copy(&path, &backup_path) {
        eprintln!("Warning: Could not create backup: {}", e);
    } else {
        println!("Backup created: {}", backup_path.display());
    }

    if let Err(e) = std::fs::write(&path, updated) {
        eprintln!("Error writing config: {}", e);
        std::process::exit(1);
    }

    println!("Config updated with latest structure: {}", path.display());
    println!("Your values have been preserved.");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{session, MockTransport};

    #[test]
    fn test_page_url_resolution() {
        let base = "http://127.0.0.1:5000";
        assert_eq!(
            page_url(base, "/home").unwrap().as_str(),
            "http://127.0.0.1:5000/home"
        );
        assert_eq!(
            page_url(base, "https://other.example/feed").unwrap().as_str(),
            "https://other.example/feed"
        );
        assert!(page_url("not a url", "/home").is_err());
    }

    #[test]
    fn test_parse_field() {
        assert_eq!(
            parse_field("message=a=b").unwrap(),
            ("message".to_string(), "a=b".to_string())
        );
        assert_eq!(
            parse_field("empty=").unwrap(),
            ("empty".to_string(), String::new())
        );
        assert!(parse_field("=x").is_err());
        assert!(parse_field("novalue").is_err());
    }

    #[test]
    fn test_fill_form_sets_named_controls() {
        let mut s = session(
            r#"<form><input name="search_for"><textarea name="message"></textarea></form>"#,
            MockTransport::new(),
        );
        let form = s.document().query_selector("form").unwrap().unwrap();
        let fields = vec![
            ("search_for".to_string(), "ann".to_string()),
            ("message".to_string(), "hi".to_string()),
        ];
        fill_form(&mut s, form, &fields).unwrap();

        let data = s.document().form_data(form);
        assert_eq!(data.get("search_for"), Some("ann"));
        assert_eq!(data.get("message"), Some("hi"));

        let missing = vec![("nope".to_string(), "x".to_string())];
        assert!(fill_form(&mut s, form, &missing).is_err());
    }

    #[test]
    fn test_fill_form_ticks_checkboxes_and_radios() {
        let mut s = session(
            r#"<form>
                <input type="checkbox" name="notify">
                <input type="checkbox" name="tag" value="news">
                <input type="radio" name="audience" value="all" checked>
                <input type="radio" name="audience" value="friends">
            </form>"#,
            MockTransport::new(),
        );
        let form = s.document().query_selector("form").unwrap().unwrap();
        let fields = vec![
            ("notify".to_string(), "on".to_string()),
            ("tag".to_string(), "sports".to_string()),
            ("audience".to_string(), "friends".to_string()),
        ];
        fill_form(&mut s, form, &fields).unwrap();

        let data = s.document().form_data(form);
        assert_eq!(data.get("notify"), Some("on"));
        assert_eq!(data.get("tag"), Some("sports"));
        assert_eq!(data.get("audience"), Some("friends"));
        let entries: Vec<(&str, &str)> = data.iter().collect();
        assert_eq!(entries.iter().filter(|(n, _)| *n == "audience").count(), 1);
    }

    #[test]
    fn test_cli_parses_submit_fields() {
        let cli = Cli::try_parse_from([
            "postwire",
            "submit",
            "/home",
            "#composer",
            "--field",
            "message=hello",
            "--yes",
        ])
        .unwrap();
        assert!(cli.yes);
        match cli.command {
            Commands::Submit { fields, .. } => {
                assert_eq!(fields, vec![("message".to_string(), "hello".to_string())]);
            }
            _ => panic!("expected submit"),
        }
    }
}
