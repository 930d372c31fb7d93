use actix_web::{HttpResponse, web};

use scribe_core::domain::Comment;
use scribe_shared::dto::{CommentResponse, CreateCommentRequest};

use crate::middleware::error::AppResult;
use crate::middleware::identity::Caller;
use crate::state::AppState;

fn comment_response(comment: Comment) -> CommentResponse {
    CommentResponse {
        id: comment.id,
        post_id: comment.post_id,
        user_id: comment.user_id,
        user_name: comment.user_name,
        content: comment.content,
        created_at: comment.created_at,
    }
}

/// GET /api/posts/{slug}/comments - newest first
pub async fn list_comments(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let comments: Vec<CommentResponse> = state
        .comments
        .list(&slug)
        .await
        .into_iter()
        .map(comment_response)
        .collect();
    Ok(HttpResponse::Ok().json(comments))
}

/// POST /api/posts/{slug}/comments
pub async fn create_comment(
    state: web::Data<AppState>,
    caller: Caller,
    slug: web::Path<String>,
    body: web::Json<CreateCommentRequest>,
) -> AppResult<HttpResponse> {
    let comment = state
        .comments
        .add(&slug, &caller.commenter(), &body.content)
        .await?;
    Ok(HttpResponse::Created().json(comment_response(comment)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use crate::handlers::test_support::{app, state};

    fn comment(user: &str, name: Option<&str>, content: &str) -> test::TestRequest {
        let mut req = test::TestRequest::post()
            .uri("/api/posts/p1/comments")
            .insert_header(("X-User-Id", user))
            .set_json(json!({ "content": content }));
        if let Some(name) = name {
            req = req.insert_header(("X-User-Name", name));
        }
        req
    }

    #[actix_web::test]
    async fn test_comment_uses_caller_name() {
        let app = app!(state().await);
        let before = chrono::Utc::now();

        let resp = test::call_service(&app, comment("u1", Some("Bob"), "hello").to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;

        assert_eq!(body["userName"], "Bob");
        assert_eq!(body["content"], "hello");
        assert_eq!(body["postId"], "p1");
        let created: chrono::DateTime<chrono::Utc> =
            body["createdAt"].as_str().unwrap().parse().unwrap();
        assert!(created >= before && created <= chrono::Utc::now());
    }

    #[actix_web::test]
    async fn test_nameless_caller_is_anonymous() {
        let app = app!(state().await);
        let body: Value =
            test::call_and_read_body_json(&app, comment("u1", None, "hi").to_request()).await;
        assert_eq!(body["userName"], "Anonymous");
    }

    #[actix_web::test]
    async fn test_blank_comment_is_unprocessable() {
        let app = app!(state().await);
        let resp = test::call_service(&app, comment("u1", None, "   ").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_list_is_newest_first() {
        let app = app!(state().await);
        for text in ["first", "second"] {
            test::call_service(&app, comment("u1", None, text).to_request()).await;
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let req = test::TestRequest::get().uri("/api/posts/p1/comments").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body[0]["content"], "second");
        assert_eq!(body[1]["content"], "first");

        let req = test::TestRequest::get().uri("/api/posts/p2/comments").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, json!([]));
    }
}
