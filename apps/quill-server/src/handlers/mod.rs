//! HTTP handlers and route configuration.

mod auth;
mod comments;
mod health;
mod media;
mod posts;
mod taxonomy;
mod views;

#[cfg(test)]
mod tests;

use actix_web::web;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me))
                    .route("/me", web::delete().to(auth::delete_me)),
            ),
    )
    .service(
        web::scope("/posts")
            .route("", web::get().to(posts::list))
            // Registered before `/{id}` so "new" is never read as an id
            .route("/new", web::get().to(posts::new_form))
            .route("/new", web::post().to(posts::create))
            .route("/category/{slug}", web::get().to(posts::list_by_category))
            .route("/tag/{slug}", web::get().to(posts::list_by_tag))
            .route("/{id}", web::get().to(posts::detail))
            .route("/{id}/edit", web::get().to(posts::edit_form))
            .route("/{id}/edit", web::post().to(posts::update))
            .route("/{id}/delete", web::post().to(posts::delete))
            .route("/{id}/comments", web::get().to(comments::back_to_post))
            .route("/{id}/comments", web::post().to(comments::create)),
    )
    .service(
        web::scope("/comments")
            .route("/{id}/edit", web::get().to(comments::edit_form))
            .route("/{id}/edit", web::post().to(comments::update))
            .route("/{id}/delete", web::post().to(comments::delete)),
    )
    .route("/categories", web::get().to(taxonomy::list_categories))
    .route("/categories", web::post().to(taxonomy::create_category))
    .route(
        "/categories/{slug}/delete",
        web::post().to(taxonomy::delete_category),
    )
    .route("/tags", web::get().to(taxonomy::list_tags))
    .route("/tags", web::post().to(taxonomy::create_tag))
    .route("/media/{kind}", web::post().to(media::upload))
    .route("/media/{path:.*}", web::get().to(media::serve));
}
