//! Featured image upload and URL lookup.
//!
//! Images are released only through their post: on post deletion, when an
//! update replaces them, or when a publish fails.

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use scribe_core::domain::{ObjectUpload, ObjectUrls};
use scribe_shared::dto::{FileResponse, FileUrlsResponse};

use crate::middleware::error::{AppError, AppResult};
use crate::middleware::identity::Caller;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct UploadQuery {
    #[serde(default)]
    pub name: Option<String>,
}

fn urls_response(urls: ObjectUrls) -> FileUrlsResponse {
    FileUrlsResponse {
        preview: urls.preview,
        view: urls.view,
        download: urls.download,
    }
}

/// POST /api/files?name= - raw image bytes as the body
pub async fn upload_file(
    state: web::Data<AppState>,
    _caller: Caller,
    req: HttpRequest,
    query: web::Query<UploadQuery>,
    body: web::Bytes,
) -> AppResult<HttpResponse> {
    if body.is_empty() {
        return Err(AppError::Validation("file body is empty".to_string()));
    }
    let mime_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let file_name = query
        .into_inner()
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| "upload".to_string());

    let media = state.content.media();
    let object = media
        .upload(ObjectUpload {
            file_name,
            mime_type,
            bytes: body.to_vec(),
        })
        .await
        .ok_or_else(|| AppError::BadGateway("image upload failed".to_string()))?;

    let urls = media
        .urls(&object.id)
        .ok_or_else(|| AppError::BadGateway(format!("unusable file id '{}'", object.id)))?;
    Ok(HttpResponse::Created().json(FileResponse {
        urls: urls_response(urls),
        id: object.id,
        name: object.name,
        mime_type: object.mime_type,
        size: object.size,
    }))
}

/// GET /api/files/{id}/urls
pub async fn file_urls(
    state: web::Data<AppState>,
    id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let urls = state
        .content
        .media()
        .urls(&id)
        .ok_or_else(|| AppError::NotFound(format!("file '{id}' not found")))?;
    Ok(HttpResponse::Ok().json(urls_response(urls)))
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::test;
    use serde_json::{Value, json};

    use crate::handlers::test_support::{app, state};

    fn upload(bytes: &'static [u8]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/files?name=cover.png")
            .insert_header(("X-User-Id", "u1"))
            .insert_header(("content-type", "image/png"))
            .set_payload(bytes)
    }

    #[actix_web::test]
    async fn test_upload_reports_object() {
        let app = app!(state().await);

        let resp = test::call_service(&app, upload(b"\x89PNG").to_request()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        let id = body["id"].as_str().unwrap().to_string();
        assert_eq!(body["name"], "cover.png");
        assert_eq!(body["mimeType"], "image/png");
        assert_eq!(body["size"], 4);
        assert_eq!(body["urls"]["preview"], format!("memory://files/{id}/preview"));
    }

    #[actix_web::test]
    async fn test_other_author_cannot_remove_image() {
        let app = app!(state().await);
        let body: Value = test::call_and_read_body_json(&app, upload(b"img").to_request()).await;
        let image = body["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("X-User-Id", "u1"))
            .set_json(json!({
                "slug": "mine",
                "title": "Mine",
                "content": "text",
                "featuredImage": image,
            }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/files/{image}"))
            .insert_header(("X-User-Id", "u2"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert!(resp.status().is_client_error());

        let req = test::TestRequest::patch()
            .uri("/api/posts/mine")
            .insert_header(("X-User-Id", "u2"))
            .set_json(json!({ "featuredImage": null }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri("/api/posts/mine")
            .insert_header(("X-User-Id", "u1"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["attachment"], "released");
        assert_eq!(body["data"]["objectId"], image.as_str());
    }

    #[actix_web::test]
    async fn test_urls_for_malformed_id_are_not_found() {
        let app = app!(state().await);
        let req = test::TestRequest::get().uri("/api/files/..%2Fx/urls").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_empty_upload_is_rejected() {
        let app = app!(state().await);
        let resp = test::call_service(&app, upload(b"").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[actix_web::test]
    async fn test_urls_are_derived_without_lookup() {
        let app = app!(state().await);
        let req = test::TestRequest::get().uri("/api/files/img123/urls").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(
            body,
            json!({
                "preview": "memory://files/img123/preview",
                "view": "memory://files/img123/view",
                "download": "memory://files/img123/download",
            })
        );
    }

    #[actix_web::test]
    async fn test_post_delete_releases_image() {
        let app = app!(state().await);
        let body: Value = test::call_and_read_body_json(&app, upload(b"img").to_request()).await;
        let image = body["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(("X-User-Id", "u1"))
            .set_json(json!({
                "slug": "my-post",
                "title": "Mine",
                "content": "text",
                "featuredImage": image,
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["featuredImageUrl"], format!("memory://files/{image}/preview"));

        let req = test::TestRequest::delete()
            .uri("/api/posts/my-post")
            .insert_header(("X-User-Id", "u1"))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["attachment"], "released");
        assert_eq!(body["data"]["objectId"], image.as_str());
    }
}
