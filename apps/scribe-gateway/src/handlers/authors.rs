use actix_web::{HttpResponse, web};

use scribe_shared::dto::AuthorResponse;

use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/authors/{user_id}
pub async fn get_author(
    state: web::Data<AppState>,
    user_id: web::Path<String>,
) -> AppResult<HttpResponse> {
    let user_id = user_id.into_inner();
    let profile = state.authors.try_resolve(&user_id).await?;
    Ok(HttpResponse::Ok().json(AuthorResponse {
        user_id,
        name: profile.name,
        email: profile.email,
    }))
}
