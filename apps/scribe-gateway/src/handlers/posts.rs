//! Post handlers: cached listing, single-post reads and owner-only writes.

use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use futures::StreamExt;

use scribe_core::domain::{
    AuthorLookup, NewPost, ObjectUpload, Post, PostFilter, PostPatch, PostStatus, validate_user_id,
};
use scribe_core::services::{AttachmentCleanup, SlotState};
use scribe_shared::ApiResponse;
use scribe_shared::dto::{
    CreatePostRequest, DeletePostResponse, ListPostsQuery, ListingResponse, PostCardResponse,
    PostResponse, UpdatePostRequest,
};

use crate::config::UploadLimit;
use crate::middleware::error::{AppError, AppResult};
use crate::middleware::identity::Caller;
use crate::state::AppState;

fn parse_status(raw: &str) -> AppResult<PostStatus> {
    raw.parse::<PostStatus>().map_err(AppError::from)
}

fn filter_from(query: &ListPostsQuery) -> AppResult<PostFilter> {
    let mut filter = match query.status.as_deref().map(str::trim) {
        None | Some("") => PostFilter::default(),
        Some(s) if s.eq_ignore_ascii_case("all") => PostFilter::all(),
        Some(s) => PostFilter {
            status: Some(parse_status(s)?),
            user_id: None,
        },
    };
    if let Some(author) = query.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        validate_user_id(author)?;
        filter = filter.by_author(author);
    }
    Ok(filter)
}

fn post_response(state: &AppState, post: Post) -> PostResponse {
    let read_time_minutes = post.read_time_minutes();
    PostResponse {
        featured_image_url: post
            .featured_image
            .as_deref()
            .map(|id| state.content.media().preview_url(id)),
        status: post.status.to_string(),
        read_time_minutes,
        slug: post.slug,
        title: post.title,
        content: post.content,
        featured_image: post.featured_image,
        user_id: post.user_id,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

/// Turn a sorted listing into cards, resolving each distinct author once.
async fn listing_response(state: &AppState, filter: &PostFilter, posts: Vec<Post>) -> ListingResponse {
    let authors = state
        .authors
        .resolve_many(posts.iter().map(|p| p.user_id.as_str()))
        .await;

    let items = posts
        .into_iter()
        .map(|post| {
            let author = AuthorLookup::from(authors.get(&post.user_id).cloned());
            PostCardResponse {
                summary: post.summary(),
                read_time_minutes: post.read_time_minutes(),
                featured_image_url: post
                    .featured_image
                    .as_deref()
                    .map(|id| state.content.media().preview_url(id)),
                status: post.status.to_string(),
                author_name: author.display_name().to_string(),
                slug: post.slug,
                title: post.title,
                author_id: post.user_id,
                created_at: post.created_at,
            }
        })
        .collect();

    let cache = match state.listing.state(filter).await {
        SlotState::Fresh => "fresh",
        SlotState::Stale => "stale",
        SlotState::Empty => "empty",
    };
    ListingResponse {
        items,
        fetched_at: state.listing.peek(filter).await.map(|l| l.fetched_at),
        cache: cache.to_string(),
    }
}

/// GET /api/posts?status=&author=
///
/// Served stale-while-revalidate: an expired snapshot is returned at once and
/// refreshed in the background.
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let filter = filter_from(&query)?;
    let posts = state.listing.get_stale_while_revalidate(&filter).await;
    Ok(HttpResponse::Ok().json(listing_response(&state, &filter, posts).await))
}

/// POST /api/posts/refresh?status=&author=
pub async fn refresh_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> AppResult<HttpResponse> {
    let filter = filter_from(&query)?;
    state.listing.invalidate(&filter).await;
    let posts = state.listing.refresh(&filter).await?;
    let listing = listing_response(&state, &filter, posts).await;
    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(listing, "Listing refreshed")))
}

/// POST /api/posts
pub async fn create_post(
    state: web::Data<AppState>,
    caller: Caller,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let status = match req.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => PostStatus::Active,
    };

    let post = state
        .content
        .create_post(NewPost {
            slug: req.slug,
            title: req.title,
            content: req.content,
            featured_image: req.featured_image.filter(|id| !id.is_empty()),
            status,
            user_id: caller.user_id,
        })
        .await?;

    Ok(HttpResponse::Created().json(post_response(&state, post)))
}

/// Text fields and the optional image of a publish form.
#[derive(Debug, Default)]
struct PublishForm {
    slug: String,
    title: String,
    content: String,
    status: Option<String>,
    image: Option<ObjectUpload>,
}

fn field_text(name: &str, data: Vec<u8>) -> AppResult<String> {
    String::from_utf8(data).map_err(|_| AppError::Validation(format!("field '{name}' is not UTF-8")))
}

async fn read_publish_form(mut payload: Multipart, limit: usize) -> AppResult<PublishForm> {
    let mut form = PublishForm::default();

    while let Some(item) = payload.next().await {
        let mut field =
            item.map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?;
        let Some(disposition) = field.content_disposition() else {
            continue;
        };
        let name = disposition.get_name().unwrap_or("").to_string();
        let file_name = disposition.get_filename().map(str::to_string);
        let mime_type = field.content_type().map(|ct| ct.to_string());

        let mut data = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?;
            if data.len() + chunk.len() > limit {
                return Err(AppError::Validation(format!(
                    "field '{name}' exceeds {limit} bytes"
                )));
            }
            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "slug" => form.slug = field_text(&name, data)?,
            "title" => form.title = field_text(&name, data)?,
            "content" => form.content = field_text(&name, data)?,
            "status" => form.status = Some(field_text(&name, data)?),
            "image" if !data.is_empty() => {
                form.image = Some(ObjectUpload {
                    file_name: file_name.unwrap_or_else(|| "upload".to_string()),
                    mime_type,
                    bytes: data,
                });
            }
            _ => {}
        }
    }
    Ok(form)
}

/// POST /api/posts/publish - multipart form with an optional `image` part.
///
/// The image is uploaded first; if the post cannot be created afterwards the
/// image is released again.
pub async fn publish_post(
    state: web::Data<AppState>,
    caller: Caller,
    req: HttpRequest,
    payload: Multipart,
) -> AppResult<HttpResponse> {
    let limit = req.app_data::<UploadLimit>().copied().unwrap_or_default().0;
    let form = read_publish_form(payload, limit).await?;
    let status = match form.status.as_deref().map(str::trim) {
        None | Some("") => PostStatus::Active,
        Some(raw) => parse_status(raw)?,
    };

    let post = state
        .content
        .publish(
            NewPost {
                slug: form.slug,
                title: form.title,
                content: form.content,
                featured_image: None,
                status,
                user_id: caller.user_id,
            },
            form.image,
        )
        .await?;

    Ok(HttpResponse::Created().json(post_response(&state, post)))
}

/// GET /api/posts/{slug}
pub async fn get_post(state: web::Data<AppState>, slug: web::Path<String>) -> AppResult<HttpResponse> {
    let post = state
        .content
        .get_post(&slug)
        .await
        .ok_or_else(|| AppError::NotFound(format!("post '{slug}' not found")))?;
    Ok(HttpResponse::Ok().json(post_response(&state, post)))
}

/// PATCH /api/posts/{slug} - owner only
pub async fn update_post(
    state: web::Data<AppState>,
    caller: Caller,
    slug: web::Path<String>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let patch = PostPatch {
        title: req.title,
        content: req.content,
        featured_image: req
            .featured_image
            .map(|image| image.filter(|id| !id.is_empty())),
        status: req.status.as_deref().map(parse_status).transpose()?,
    };

    let post = state
        .content
        .update_post(&slug, &caller.user_id, patch)
        .await?;
    Ok(HttpResponse::Ok().json(post_response(&state, post)))
}

/// DELETE /api/posts/{slug} - owner only; releases the featured image too.
pub async fn delete_post(
    state: web::Data<AppState>,
    caller: Caller,
    slug: web::Path<String>,
) -> AppResult<HttpResponse> {
    let outcome = state.content.delete_post(&slug, &caller.user_id).await?;
    let (attachment, object_id) = match outcome.attachment {
        AttachmentCleanup::NoAttachment => ("none", None),
        AttachmentCleanup::Released(id) => ("released", Some(id)),
        AttachmentCleanup::Orphaned(id) => ("orphaned", Some(id)),
    };

    Ok(HttpResponse::Ok().json(ApiResponse::ok(DeletePostResponse {
        slug: outcome.slug,
        attachment: attachment.to_string(),
        object_id,
    })))
}
