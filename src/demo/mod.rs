// Demo mode: run the enhancement layer against a local in-memory backend
//
// Starts the demo backend on an ephemeral port, opens its home page, and
// replays a scripted session: post, like, comment, follow, search, a
// rejected empty post, a comment delete, and an account delete that
// redirects.
//
// Run with: postwire demo

pub mod backend;

use crate::binder::Dispatch;
use crate::cli::print_outcome;
use crate::config::Config;
use crate::request::HttpTransport;
use crate::session::Session;
use crate::ui::HeadlessUi;
use anyhow::{Context, Result};
use backend::Store;
use reqwest::Url;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

type DemoSession = Session<HttpTransport, HeadlessUi>;

/// A running demo backend
pub struct DemoServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl DemoServer {
    /// Bind 127.0.0.1 on an ephemeral port and serve `store`
    pub async fn start(store: Store) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("Failed to bind demo backend")?;
        let addr = listener
            .local_addr()
            .context("Failed to read demo backend address")?;
        let app = backend::router(Arc::new(Mutex::new(store)));

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let handle = tokio::spawn(async move {
            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    shutdown_rx.await.ok();
                })
                .await;
            if let Err(e) = served {
                tracing::error!("Demo backend error: {}", e);
            }
        });

        tracing::info!("Demo backend listening on {}", addr);
        Ok(Self {
            addr,
            shutdown_tx,
            handle,
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop accepting connections and wait for in-flight requests
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.handle.await;
        tracing::debug!("Demo backend shut down");
    }
}

/// One scripted user action
enum Action<'a> {
    Click(&'a str),
    Submit(&'a str),
    /// Set a control's value; not an event
    Type(&'a str, &'a str),
}

/// Run the scripted session against a fresh backend
pub async fn run(config: &Config) -> Result<()> {
    let server = DemoServer::start(Store::seeded()).await?;

    let mut config = config.clone();
    config.base_url = server.base_url();
    config.session_cookie = None;
    config.assume_yes = true;

    let result = script(&config).await;
    server.shutdown().await;
    result
}

async fn script(config: &Config) -> Result<()> {
    let home = Url::parse(&config.base_url)
        .and_then(|base| base.join("/"))
        .context("Invalid demo base URL")?;
    let mut session = Session::open(config, home).await?;
    println!("Opened {}", session.page_url());

    let steps: &[(&str, &[Action], Option<&str>)] = &[
        (
            "Publish a post",
            &[
                Action::Type("#composer textarea", "Hello from postwire"),
                Action::Submit("#composer"),
            ],
            Some("#posts article .message"),
        ),
        (
            "Like the new post",
            &[Action::Click("#posts article .js-like i")],
            Some("#posts article .like-count"),
        ),
        (
            "Comment on Ann's post",
            &[
                Action::Type("[data-post=p5] .comment-form input", "Nice tomatoes"),
                Action::Submit("[data-post=p5] .comment-form"),
            ],
            Some("#comments-p5"),
        ),
        (
            "Follow Ann",
            &[Action::Click("#people .js-follow")],
            Some("#people .js-follow"),
        ),
        (
            "Search for \"an\"",
            &[
                Action::Type(".js-search input", "an"),
                Action::Submit(".js-search"),
            ],
            Some("#search_results"),
        ),
        (
            "Publish an empty post",
            &[Action::Submit("#composer")],
            None,
        ),
        (
            "Delete the comment",
            &[Action::Click("#comments-p5 .js-delete")],
            Some("#comments-p5"),
        ),
        (
            "Delete the account",
            &[Action::Submit("#delete-account")],
            None,
        ),
    ];

    for (label, actions, show) in steps {
        println!();
        println!("── {}", label);
        for action in actions.iter() {
            if let Some(dispatch) = perform(&mut session, action).await? {
                print_outcome(&session, dispatch);
            }
        }
        if let Some(selector) = show {
            let node = find(&session, selector)?;
            println!("  {} => {:?}", selector, session.document().text_content(node).trim());
        }
        session.ui_mut().clear();
    }

    Ok(())
}

async fn perform(session: &mut DemoSession, action: &Action<'_>) -> Result<Option<Dispatch>> {
    match action {
        Action::Type(selector, value) => {
            let control = find(session, selector)?;
            session.document_mut().set_value(control, value);
            Ok(None)
        }
        Action::Click(selector) => {
            let target = find(session, selector)?;
            Ok(Some(session.click(target).await))
        }
        Action::Submit(selector) => {
            let form = find(session, selector)?;
            Ok(Some(session.submit(form).await))
        }
    }
}

fn find(session: &DemoSession, selector: &str) -> Result<crate::dom::NodeId> {
    session
        .document()
        .query_selector(selector)?
        .with_context(|| format!("No element matches {}", selector))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::FormData;
    use crate::request::{decode, fetch_json, ApiRequest, LikeResponse, Method, RequestError};

    async fn server_config() -> (DemoServer, Config) {
        let server = DemoServer::start(Store::seeded()).await.unwrap();
        let config = Config {
            base_url: server.base_url(),
            timeout_secs: 5,
            assume_yes: true,
            ..Config::default()
        };
        (server, config)
    }

    fn url(config: &Config, path: &str) -> Url {
        Url::parse(&config.base_url).unwrap().join(path).unwrap()
    }

    #[tokio::test]
    async fn test_http_transport_speaks_envelope() {
        let (server, config) = server_config().await;
        let transport = HttpTransport::new(&config).unwrap();

        // Seeded ids: users u1..u3, posts p4 (Bo) and p5 (Ann)
        let payload = fetch_json(
            &transport,
            ApiRequest::new(Method::Post, url(&config, "/api/posts/p4/like")),
        )
        .await
        .unwrap();
        let like: LikeResponse = decode(payload).unwrap();
        assert!(like.liked);
        assert_eq!(like.likes, 3);

        let err = fetch_json(
            &transport,
            ApiRequest::new(Method::Post, url(&config, "/api/posts/nope/like")),
        )
        .await
        .unwrap_err();
        assert_eq!(err, RequestError::Application("Post not found".to_string()));

        let mut short = FormData::new();
        short.append("search_for", "a");
        let err = fetch_json(
            &transport,
            ApiRequest::new(Method::Post, url(&config, "/api/search")).with_form(short),
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Search needs 2+ characters");

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_session_against_backend() {
        let (server, config) = server_config().await;
        let mut session = Session::open(&config, url(&config, "/")).await.unwrap();

        let textarea = find(&session, "#composer textarea").unwrap();
        session.document_mut().set_value(textarea, "hi there");
        let composer = find(&session, "#composer").unwrap();
        assert_eq!(session.submit(composer).await, Dispatch::Intercepted);
        assert!(session.ui().alerts().is_empty());

        let articles = session.document().query_selector_all("#posts article").unwrap();
        assert_eq!(articles.len(), 3);
        let message = find(&session, "#posts article .message").unwrap();
        assert_eq!(session.document().text_content(message), "hi there");
        // Composer was reset after insertion
        assert_eq!(session.document().value(textarea), "");

        let like = find(&session, "#posts article .js-like").unwrap();
        session.click(like).await;
        let count = find(&session, "#posts article .like-count").unwrap();
        assert_eq!(session.document().text_content(count), "1");

        let search_input = find(&session, ".js-search input").unwrap();
        session.document_mut().set_value(search_input, "ann");
        let search = find(&session, ".js-search").unwrap();
        session.submit(search).await;
        let rows = session
            .document()
            .query_selector_all("#search_results .search-row")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(session.document().text_content(rows[0]).contains("@ann"));

        let account = find(&session, "#delete-account").unwrap();
        session.submit(account).await;
        assert_eq!(
            session.ui().location().map(Url::path),
            Some("/")
        );

        server.shutdown().await;
    }

    #[tokio::test]
    async fn test_scripted_demo_completes() {
        let config = Config {
            timeout_secs: 5,
            ..Config::default()
        };
        run(&config).await.unwrap();
    }
}
