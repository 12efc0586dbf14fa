use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use hive_shared::{CommentId, PostId};
use hive_store::{Post, PostDraft, PostPatch};

use crate::config::ServerConfig;
use crate::enrich::{CommentView, PostView};
use crate::error::ServerError;
use crate::feed::{CommentEdit, Feed, Liker, NewComment};

#[derive(Clone)]
pub struct AppState {
    pub feed: Feed,
    pub config: Arc<ServerConfig>,
}

pub fn build_router(state: AppState) -> Router {
    let origin = match state.config.cors_origin.as_deref() {
        Some(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => AllowOrigin::exact(value),
            Err(_) => {
                tracing::warn!(%origin, "Invalid CORS_ORIGIN, allowing any origin");
                AllowOrigin::any()
            }
        },
        None => AllowOrigin::any(),
    };
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_check))
        .route("/posts", get(list_posts).post(create_post))
        .route("/posts/search", get(search_posts))
        .route("/posts/recommended", get(recommended_posts))
        .route("/posts/user/{user_id}", get(posts_by_author))
        .route("/posts/{id}", put(update_post).delete(delete_post))
        .route("/posts/{id}/like", post(like_post))
        .route("/posts/{id}/unlike", post(unlike_post))
        .route("/posts/{id}/comments", get(list_comments).post(add_comment))
        .route(
            "/posts/{id}/comments/{comment_id}",
            put(edit_comment).delete(delete_comment),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct LikesResponse {
    likes: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CommentCreatedResponse {
    comment_id: CommentId,
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecommendParams {
    user_id: Option<String>,
}

/// Ids that are not UUIDs can never match a stored record.
fn parse_post_id(raw: &str) -> Result<PostId, ServerError> {
    PostId::parse(raw).map_err(|_| ServerError::NotFound(format!("post not found: {raw}")))
}

fn parse_comment_id(raw: &str) -> Result<CommentId, ServerError> {
    CommentId::parse(raw).map_err(|_| ServerError::NotFound(format!("comment not found: {raw}")))
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ─── Posts ───

async fn list_posts(State(state): State<AppState>) -> Result<Json<Vec<PostView>>, ServerError> {
    Ok(Json(state.feed.all_posts().await?))
}

async fn posts_by_author(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PostView>>, ServerError> {
    Ok(Json(state.feed.posts_by_author(&user_id).await?))
}

async fn search_posts(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<PostView>>, ServerError> {
    let keyword = params
        .q
        .ok_or_else(|| ServerError::Validation("q is required".into()))?;
    Ok(Json(state.feed.search_posts(&keyword).await?))
}

async fn recommended_posts(
    State(state): State<AppState>,
    Query(params): Query<RecommendParams>,
) -> Result<Json<Vec<PostView>>, ServerError> {
    let user_id = params
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ServerError::Validation("userId is required".into()))?;
    Ok(Json(state.feed.recommended_posts(&user_id).await?))
}

async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<PostDraft>, JsonRejection>,
) -> Result<Json<Post>, ServerError> {
    let Json(draft) = payload?;
    Ok(Json(state.feed.create_post(draft).await?))
}

async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<PostPatch>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let post_id = parse_post_id(&id)?;
    let Json(patch) = payload?;
    state.feed.update_post(post_id, patch).await?;
    Ok(Json(serde_json::json!({ "updated": true })))
}

async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let post_id = parse_post_id(&id)?;
    state.feed.delete_post(post_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Liker>, JsonRejection>,
) -> Result<Json<LikesResponse>, ServerError> {
    let post_id = parse_post_id(&id)?;
    let Json(liker) = payload?;
    let likes = state.feed.like_post(post_id, liker).await?;
    Ok(Json(LikesResponse { likes }))
}

async fn unlike_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<Liker>, JsonRejection>,
) -> Result<Json<LikesResponse>, ServerError> {
    let post_id = parse_post_id(&id)?;
    let Json(liker) = payload?;
    let likes = state.feed.unlike_post(post_id, liker).await?;
    Ok(Json(LikesResponse { likes }))
}

// ─── Comments ───

async fn list_comments(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CommentView>>, ServerError> {
    let post_id = parse_post_id(&id)?;
    Ok(Json(state.feed.comments(post_id).await?))
}

async fn add_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<NewComment>, JsonRejection>,
) -> Result<Json<CommentCreatedResponse>, ServerError> {
    let post_id = parse_post_id(&id)?;
    let Json(request) = payload?;
    let comment = state.feed.add_comment(post_id, request).await?;
    Ok(Json(CommentCreatedResponse {
        comment_id: comment.comment_id,
    }))
}

async fn edit_comment(
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(String, String)>,
    payload: Result<Json<CommentEdit>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let post_id = parse_post_id(&id)?;
    let comment_id = parse_comment_id(&comment_id)?;
    let Json(edit) = payload?;
    state.feed.edit_comment(post_id, comment_id, edit).await?;
    Ok(Json(serde_json::json!({ "edited": true })))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path((id, comment_id)): Path<(String, String)>,
) -> Result<Json<serde_json::Value>, ServerError> {
    let post_id = parse_post_id(&id)?;
    let comment_id = parse_comment_id(&comment_id)?;
    state.feed.delete_comment(post_id, comment_id).await?;
    Ok(Json(serde_json::json!({ "deleted": true })))
}

pub async fn serve(state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let app = build_router(state);

    info!(addr = %addr, "Starting HTTP API server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::directory::testing::user;
    use crate::feed::testing::in_memory_feed;
    use crate::store::FeedStore;

    fn test_app() -> (Router, FeedStore) {
        let (feed, store, _) = in_memory_feed();
        let state = AppState {
            feed,
            config: Arc::new(ServerConfig::default()),
        };
        (build_router(state), store)
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    async fn publish(app: &Router, body: Value) -> String {
        let (status, post) = send(app, Method::POST, "/posts", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        post["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let (app, _) = test_app();
        let (status, body) = send(&app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn create_like_unlike_flow() {
        let (app, _) = test_app();
        let id = publish(&app, json!({ "content": "hello", "authorId": "author" })).await;

        let liker = json!({ "email": "a@example.com", "username": "alice" });
        let (status, body) = send(&app, Method::POST, &format!("/posts/{id}/like"), Some(liker.clone())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "likes": 1 }));

        let (_, body) = send(&app, Method::POST, &format!("/posts/{id}/unlike"), Some(liker)).await;
        assert_eq!(body, json!({ "likes": 0 }));
    }

    #[tokio::test]
    async fn created_post_echoes_stored_fields() {
        let (app, _) = test_app();
        let (status, post) = send(
            &app,
            Method::POST,
            "/posts",
            Some(json!({
                "content": "grid study",
                "authorId": "u1",
                "authorEmail": "u1@example.com",
                "authorUsername": "u1",
                "mediaUrls": ["https://cdn.example.com/grid.png"],
                "tools": ["Figma"],
                "designProcess": null,
                "skillLevel": "Beginner",
                "likes": 99
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(post["likes"], 0);
        assert_eq!(post["tools"], json!(["Figma"]));
        assert_eq!(post["designProcess"], json!([]));
        assert_eq!(post["skillLevel"], "Beginner");
        assert!(post["createdAt"].is_string());
    }

    #[tokio::test]
    async fn feed_lists_enriched_posts_newest_first() {
        let (app, store) = test_app();
        store
            .transact(|db| db.upsert_user(&user("u1", &[])))
            .await
            .unwrap();
        publish(&app, json!({ "content": "older", "authorId": "u1" })).await;
        publish(&app, json!({ "content": "newer", "authorId": "u1" })).await;

        let (status, body) = send(&app, Method::GET, "/posts", None).await;
        assert_eq!(status, StatusCode::OK);
        let posts = body.as_array().unwrap();
        assert_eq!(posts.len(), 2);
        assert!(posts[0]["createdAt"].as_str() >= posts[1]["createdAt"].as_str());
        assert_eq!(posts[0]["user"]["avatarUrl"], "https://cdn.example.com/u1.png");

        let (_, body) = send(&app, Method::GET, "/posts/user/u1", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_and_recommend_queries() {
        let (app, store) = test_app();
        store
            .transact(|db| db.upsert_user(&user("reader", &["figma"])))
            .await
            .unwrap();
        publish(&app, json!({ "content": "DesignHive rocks", "tools": ["Figma"] })).await;
        publish(&app, json!({ "content": "No match here", "tools": ["Sketch"] })).await;

        let (_, body) = send(&app, Method::GET, "/posts/search?q=hive", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["content"], "DesignHive rocks");

        let (_, body) = send(&app, Method::GET, "/posts/recommended?userId=reader", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["tools"], json!(["Figma"]));

        let (status, body) = send(&app, Method::GET, "/posts/search", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");

        let (status, _) = send(&app, Method::GET, "/posts/recommended", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn update_and_delete_post() {
        let (app, _) = test_app();
        let id = publish(&app, json!({ "content": "v1" })).await;

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("/posts/{id}"),
            Some(json!({ "content": "v2", "likes": 500 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "updated": true }));

        let (_, body) = send(&app, Method::GET, "/posts", None).await;
        assert_eq!(body[0]["content"], "v2");
        assert_eq!(body[0]["likes"], 0);
        assert!(body[0]["updatedAt"].is_string());

        let (status, body) = send(&app, Method::DELETE, &format!("/posts/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "deleted": true }));

        let (status, body) = send(&app, Method::DELETE, &format!("/posts/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }

    #[tokio::test]
    async fn malformed_ids_are_not_found() {
        let (app, _) = test_app();
        let liker = json!({ "email": "a@example.com" });
        let (status, _) = send(&app, Method::POST, "/posts/not-a-uuid/like", Some(liker)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let id = publish(&app, json!({ "content": "x" })).await;
        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/posts/{id}/comments/nope"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unreadable_bodies_are_validation_errors() {
        let (app, _) = test_app();
        let id = publish(&app, json!({ "content": "x" })).await;

        let cases = [
            ("/posts".to_string(), Some("application/json"), "not json"),
            ("/posts".to_string(), Some("application/json"), r#"{"tools":"Figma"}"#),
            (format!("/posts/{id}/like"), None, r#"{"email":"a@example.com","username":"a"}"#),
        ];
        for (uri, content_type, body) in cases {
            let mut builder = Request::builder().method(Method::POST).uri(&uri);
            if let Some(content_type) = content_type {
                builder = builder.header(header::CONTENT_TYPE, content_type);
            }
            let request = builder.body(Body::from(body)).unwrap();

            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri} {body}");
            let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let json: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(json["error"], "ValidationError");
            assert!(json["message"].is_string());
        }

        let (_, body) = send(&app, Method::GET, "/posts", None).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["likes"], 0);
    }

    #[tokio::test]
    async fn like_requires_username() {
        let (app, _) = test_app();
        let id = publish(&app, json!({ "content": "x" })).await;

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/posts/{id}/like"),
            Some(json!({ "email": "a@example.com" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");

        let (_, body) = send(&app, Method::GET, "/posts", None).await;
        assert_eq!(body[0]["likes"], 0);
    }

    #[tokio::test]
    async fn comment_lifecycle() {
        let (app, store) = test_app();
        store
            .transact(|db| db.upsert_user(&user("carol", &[])))
            .await
            .unwrap();
        let id = publish(&app, json!({ "content": "critique me" })).await;
        let comments_uri = format!("/posts/{id}/comments");

        let (status, body) = send(
            &app,
            Method::POST,
            &comments_uri,
            Some(json!({ "email": "carol@example.com", "username": "carol", "text": "nice" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let comment_id = body["commentId"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            Method::POST,
            &comments_uri,
            Some(json!({ "email": "nobody@example.com", "username": "x", "text": "spam" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "ValidationError");

        let (status, body) = send(
            &app,
            Method::PUT,
            &format!("{comments_uri}/{comment_id}"),
            Some(json!({ "text": "very nice" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "edited": true }));

        let (_, body) = send(&app, Method::GET, &comments_uri, None).await;
        let list = body.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["text"], "very nice");
        assert!(list[0]["editedAt"].is_string());
        assert_eq!(list[0]["user"]["username"], "carol");

        let (status, body) = send(
            &app,
            Method::DELETE,
            &format!("{comments_uri}/{comment_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "deleted": true }));

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("{comments_uri}/{comment_id}"),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_like_requests_are_all_counted() {
        let (app, _) = test_app();
        let id = publish(&app, json!({ "content": "viral" })).await;

        let mut handles = Vec::new();
        for i in 0..20 {
            let app = app.clone();
            let uri = format!("/posts/{id}/like");
            handles.push(tokio::spawn(async move {
                let liker = json!({ "email": format!("fan{i}@example.com"), "username": "fan" });
                send(&app, Method::POST, &uri, Some(liker)).await.0
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), StatusCode::OK);
        }

        let (_, body) = send(&app, Method::GET, "/posts", None).await;
        assert_eq!(body[0]["likes"], 20);
    }
}
