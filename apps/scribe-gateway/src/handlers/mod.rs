//! HTTP handlers and route configuration.

mod authors;
mod comments;
mod files;
mod health;
mod posts;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/health", web::get().to(health::health_check))
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/refresh", web::post().to(posts::refresh_posts))
                    .route("/publish", web::post().to(posts::publish_post))
                    .route("/{slug}", web::get().to(posts::get_post))
                    .route("/{slug}", web::patch().to(posts::update_post))
                    .route("/{slug}", web::delete().to(posts::delete_post))
                    .route("/{slug}/comments", web::get().to(comments::list_comments))
                    .route("/{slug}/comments", web::post().to(comments::create_comment)),
            )
            .route("/authors/{user_id}", web::get().to(authors::get_author))
            .service(
                web::scope("/files")
                    .route("", web::post().to(files::upload_file))
                    .route("/{id}/urls", web::get().to(files::file_urls)),
            ),
    );
}
