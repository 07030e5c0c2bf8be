/// HTTP handlers for post-service endpoints
///
/// This module contains handlers for:
/// - Posts: publish (multipart), read, delete, share, author-list reconcile
/// - Feed: the visibility-scoped feed
/// - Reactions: toggle/update/create a reaction
/// - Comments: add, list, delete
/// - Saves: toggle saved state, list saved posts
///
/// Every handler takes the caller from the `UserId` extractor, which only the
/// JWT middleware populates.
pub mod comments;
pub mod feed;
pub mod posts;
pub mod reactions;
pub mod saves;

pub use comments::{add_comment, delete_comment, list_comments};
pub use feed::get_feed;
pub use posts::{create_post, delete_post, get_post, reconcile_posts, share_post, UploadLimit};
pub use reactions::react;
pub use saves::{get_saved, toggle_save};

use actix_web::web;

/// Authenticated routes, mounted under `/api/v1` behind `JwtAuthMiddleware`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/feed").route(web::get().to(get_feed)))
        .service(web::resource("/saved").route(web::get().to(get_saved)))
        .service(
            web::scope("/posts")
                .service(web::resource("").route(web::post().to(create_post)))
                .service(
                    web::resource("/{post_id}")
                        .route(web::get().to(get_post))
                        .route(web::delete().to(delete_post)),
                )
                .route("/{post_id}/reactions", web::post().to(react))
                .service(
                    web::resource("/{post_id}/comments")
                        .route(web::post().to(add_comment))
                        .route(web::get().to(list_comments)),
                )
                .route("/{post_id}/save", web::post().to(toggle_save))
                .route("/{post_id}/share", web::post().to(share_post)),
        )
        .route("/comments/{comment_id}", web::delete().to(delete_comment))
        .route("/users/me/posts/reconcile", web::post().to(reconcile_posts));
}

/// JSON body errors rendered through `AppError` like every other failure.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| crate::error::AppError::Validation(err.to_string()).into())
}
