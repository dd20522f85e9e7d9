// Demo backend - in-memory social feed speaking the JSON envelope contract
//
// Every API route answers `{"status": "ok", ...}` on success and
// `{"status": "error", "message": ...}` with a 4xx/5xx status on failure.
// Form bodies arrive as multipart, the way the client sends them.

use crate::dom::escape_text;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{delete, get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

const POST_MAX_LEN: usize = 280;
const COMMENT_MAX_LEN: usize = 240;
const SEARCH_MIN_LEN: usize = 2;
const SEARCH_LIMIT: usize = 10;

/// Username every write is attributed to
const SESSION_USER: &str = "demo";

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
struct User {
    id: String,
    username: String,
    first_name: String,
    following: bool,
}

#[derive(Debug, Clone)]
struct Comment {
    id: String,
    username: String,
    body: String,
}

#[derive(Debug, Clone)]
struct Post {
    id: String,
    username: String,
    first_name: String,
    message: String,
    likes: i64,
    liked_by_me: bool,
    comments: Vec<Comment>,
}

/// Posts (newest first), users, and an id counter
#[derive(Debug, Default)]
pub struct Store {
    users: Vec<User>,
    posts: Vec<Post>,
    next_id: u64,
}

impl Store {
    /// A small feed with a few users, posts and one comment
    pub fn seeded() -> Self {
        let mut store = Self::default();
        for (username, first_name) in [("ann", "Ann"), ("bo", "Bo"), ("carl", "Carl")] {
            let id = store.next_id("u");
            store.users.push(User {
                id,
                username: username.to_string(),
                first_name: first_name.to_string(),
                following: false,
            });
        }

        let first = store.insert_post("bo", "Bo", "Anyone up for a bike ride?");
        store.insert_post("ann", "Ann", "Planted tomatoes today");
        if let Some(post) = store.posts.iter_mut().find(|p| p.id == first) {
            post.likes = 2;
        }
        let comment_id = store.next_id("c");
        if let Some(post) = store.posts.iter_mut().find(|p| p.id == first) {
            post.comments.push(Comment {
                id: comment_id,
                username: "carl".to_string(),
                body: "Count me in".to_string(),
            });
        }
        store
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}{}", prefix, self.next_id)
    }

    fn insert_post(&mut self, username: &str, first_name: &str, message: &str) -> String {
        let id = self.next_id("p");
        self.posts.insert(
            0,
            Post {
                id: id.clone(),
                username: username.to_string(),
                first_name: first_name.to_string(),
                message: message.to_string(),
                likes: 0,
                liked_by_me: false,
                comments: Vec::new(),
            },
        );
        id
    }

    fn post_mut(&mut self, id: &str) -> Result<&mut Post, ApiError> {
        self.posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ApiError::NotFound("Post not found".to_string()))
    }
}

pub type SharedStore = Arc<Mutex<Store>>;

fn lock(store: &SharedStore) -> Result<MutexGuard<'_, Store>, ApiError> {
    store
        .lock()
        .map_err(|e| ApiError::Internal(format!("Failed to lock store: {}", e)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Errors
// ─────────────────────────────────────────────────────────────────────────────

/// API error responses, rendered as an error envelope
#[derive(Debug)]
pub enum ApiError {
    Internal(String),
    BadRequest(String),
    NotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        tracing::warn!("Demo API error: {} - {}", status, message);

        (status, Json(json!({"status": "error", "message": message}))).into_response()
    }
}

/// Collect the text fields of a multipart body
async fn form_fields(mut multipart: Multipart) -> Result<HashMap<String, String>, ApiError> {
    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed form body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Malformed form field: {}", e)))?;
        fields.insert(name, value);
    }
    Ok(fields)
}

/// Trimmed field value, length-checked in characters
fn text_field(
    fields: &HashMap<String, String>,
    name: &str,
    max: usize,
    error: &str,
) -> Result<String, ApiError> {
    let value = fields.get(name).map(|v| v.trim()).unwrap_or_default();
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(ApiError::BadRequest(error.to_string()));
    }
    Ok(value.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/api/posts", post(create_post))
        .route("/api/posts/:id", delete(delete_post))
        .route("/api/posts/:id/like", post(toggle_like))
        .route("/api/posts/:id/comment", post(add_comment))
        .route("/api/comments/:id", delete(delete_comment))
        .route("/api/follow/:id", post(toggle_follow))
        .route("/api/search", post(search))
        .route("/api/account/delete", post(delete_account))
        .with_state(store)
}

async fn home(State(store): State<SharedStore>) -> Result<Html<String>, ApiError> {
    let store = lock(&store)?;
    Ok(Html(render_home(&store)))
}

async fn create_post(
    State(store): State<SharedStore>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let fields = form_fields(multipart).await?;
    let message = text_field(
        &fields,
        "message",
        POST_MAX_LEN,
        "Post must be 1-280 characters",
    )?;

    let mut store = lock(&store)?;
    let id = store.insert_post(SESSION_USER, "Demo", &message);
    let post = store.post_mut(&id)?;
    tracing::info!("Created post {}", id);
    Ok(Json(json!({
        "status": "ok",
        "html": render_post(post),
        "message": "The world is reading your post",
    })))
}

async fn delete_post(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut store = lock(&store)?;
    let before = store.posts.len();
    store.posts.retain(|p| p.id != id);
    if store.posts.len() == before {
        return Err(ApiError::NotFound("Post not found".to_string()));
    }
    Ok(Json(json!({"status": "ok", "message": "Post deleted"})))
}

async fn toggle_like(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut store = lock(&store)?;
    let post = store.post_mut(&id)?;
    post.liked_by_me = !post.liked_by_me;
    post.likes += if post.liked_by_me { 1 } else { -1 };
    Ok(Json(json!({
        "status": "ok",
        "liked": post.liked_by_me,
        "likes": post.likes,
    })))
}

async fn add_comment(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let fields = form_fields(multipart).await?;
    let body = text_field(
        &fields,
        "comment",
        COMMENT_MAX_LEN,
        "Comment must be 1-240 characters",
    )?;

    let mut store = lock(&store)?;
    let comment_id = store.next_id("c");
    let comment = Comment {
        id: comment_id,
        username: SESSION_USER.to_string(),
        body,
    };
    let html = render_comment(&comment);
    store.post_mut(&id)?.comments.push(comment);
    Ok(Json(json!({"status": "ok", "html": html, "post_pk": id})))
}

async fn delete_comment(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut store = lock(&store)?;
    for post in store.posts.iter_mut() {
        if let Some(index) = post.comments.iter().position(|c| c.id == id) {
            post.comments.remove(index);
            return Ok(Json(json!({"status": "ok", "post_pk": post.id})));
        }
    }
    Err(ApiError::NotFound("Comment not found".to_string()))
}

async fn toggle_follow(
    State(store): State<SharedStore>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut store = lock(&store)?;
    let user = store
        .users
        .iter_mut()
        .find(|u| u.id == id)
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
    user.following = !user.following;
    Ok(Json(json!({"status": "ok", "following": user.following})))
}

#[derive(Debug, Serialize)]
struct UserRow {
    user_first_name: String,
    user_username: String,
}

#[derive(Debug, Serialize)]
struct PostRow {
    post_message: String,
    user_username: String,
}

async fn search(
    State(store): State<SharedStore>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let fields = form_fields(multipart).await?;
    let term = fields
        .get("search_for")
        .map(|v| v.trim().to_lowercase())
        .unwrap_or_default();
    if term.chars().count() < SEARCH_MIN_LEN {
        return Err(ApiError::BadRequest(
            "Search needs 2+ characters".to_string(),
        ));
    }

    let store = lock(&store)?;
    let users: Vec<UserRow> = store
        .users
        .iter()
        .filter(|u| {
            u.username.to_lowercase().contains(&term) || u.first_name.to_lowercase().contains(&term)
        })
        .take(SEARCH_LIMIT)
        .map(|u| UserRow {
            user_first_name: u.first_name.clone(),
            user_username: u.username.clone(),
        })
        .collect();
    let posts: Vec<PostRow> = store
        .posts
        .iter()
        .filter(|p| p.message.to_lowercase().contains(&term))
        .take(SEARCH_LIMIT)
        .map(|p| PostRow {
            post_message: p.message.clone(),
            user_username: p.username.clone(),
        })
        .collect();

    Ok(Json(json!({"status": "ok", "users": users, "posts": posts})))
}

async fn delete_account() -> Json<Value> {
    tracing::info!("Account deleted (demo)");
    Json(json!({"status": "ok", "redirect": "/"}))
}

// ─────────────────────────────────────────────────────────────────────────────
// Templates
// ─────────────────────────────────────────────────────────────────────────────

fn render_comment(comment: &Comment) -> String {
    format!(
        concat!(
            r#"<li class="comment" data-comment="{id}"><strong>@{user}</strong> {body} "#,
            r#"<button class="js-delete" data-url="/api/comments/{id}">Delete</button></li>"#
        ),
        id = comment.id,
        user = escape_text(&comment.username),
        body = escape_text(&comment.body),
    )
}

fn render_post(post: &Post) -> String {
    let icon = if post.liked_by_me {
        "fa-solid fa-heart"
    } else {
        "fa-regular fa-heart"
    };
    let comments: String = post.comments.iter().map(render_comment).collect();
    format!(
        concat!(
            r#"<article class="post" data-post="{id}">"#,
            r#"<p><strong>{first}</strong> @{user}</p>"#,
            r#"<p class="message">{message}</p>"#,
            r#"<button class="js-like" data-post="{id}"><i class="{icon}"></i> <span class="like-count">{likes}</span></button>"#,
            r#"<button class="js-delete" data-url="/api/posts/{id}">Delete</button>"#,
            r#"<ul class="comments" id="comments-{id}">{comments}</ul>"#,
            r##"<form class="comment-form" action="/api/posts/{id}/comment" method="post" data-target="#comments-{id}">"##,
            r#"<input name="comment" value=""><button type="submit">Comment</button></form>"#,
            r#"</article>"#
        ),
        id = post.id,
        first = escape_text(&post.first_name),
        user = escape_text(&post.username),
        message = escape_text(&post.message),
        icon = icon,
        likes = post.likes,
        comments = comments,
    )
}

fn render_user(user: &User) -> String {
    let label = if user.following { "Unfollow" } else { "Follow" };
    format!(
        concat!(
            r#"<div class="user">{first} @{user} "#,
            r#"<button class="js-follow" data-user="{id}" data-follow="Follow" data-unfollow="Unfollow">{label}</button>"#,
            r#"</div>"#
        ),
        first = escape_text(&user.first_name),
        user = escape_text(&user.username),
        id = user.id,
        label = label,
    )
}

fn render_home(store: &Store) -> String {
    let users: String = store.users.iter().map(render_user).collect();
    let posts: String = store.posts.iter().map(render_post).collect();
    format!(
        r##"<!DOCTYPE html>
<html>
<head><title>postwire demo</title></head>
<body>
<form class="js-search" action="/api/search" method="post">
<input name="search_for" value=""><button type="submit">Search</button>
</form>
<div id="search_results"></div>
<section id="people">{users}</section>
<form id="composer" class="js-ajax" action="/api/posts" method="post" data-target="#posts" data-mode="prepend">
<textarea name="message"></textarea><button type="submit">Post</button>
</form>
<section id="posts">{posts}</section>
<form id="delete-account" class="js-ajax" action="/api/account/delete" method="post">
<button type="submit">Delete account</button>
</form>
</body>
</html>
"##,
        users = users,
        posts = posts,
    )
}
