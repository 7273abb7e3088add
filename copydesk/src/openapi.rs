//! OpenAPI documentation for the management API, served as a Scalar page at
//! `/docs`.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

/// Bearer JWT security scheme, obtained from `POST /auth/login`.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "JWT session token. Obtain one from `POST /auth/login` and include it \
                             in the `Authorization` header:\n\n```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers((url = "/api/v1")),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::users::me,
        api::handlers::users::list_users,
        api::handlers::users::update_user,
        api::handlers::users::add_role,
        api::handlers::users::remove_role,
        api::handlers::articles::create_article,
        api::handlers::articles::list_articles,
        api::handlers::articles::get_article,
        api::handlers::articles::update_article,
        api::handlers::articles::publish_article,
        api::handlers::articles::unpublish_article,
        api::handlers::articles::approve_article,
        api::handlers::articles::reject_article,
        api::handlers::articles::add_author,
        api::handlers::articles::remove_author,
        api::handlers::articles::add_editor,
        api::handlers::articles::remove_editor,
        api::handlers::commentaries::create_commentary,
        api::handlers::commentaries::get_commentary,
        api::handlers::commentaries::approve_commentary,
        api::handlers::commentaries::reject_commentary,
    ),
    components(schemas(
        api::models::auth::RegisterRequest,
        api::models::auth::LoginRequest,
        api::models::auth::TokenResponse,
        api::models::users::Role,
        api::models::users::UserUpdate,
        api::models::users::UserResponse,
        api::models::users::ProfileResponse,
        api::models::articles::ArticleState,
        api::models::articles::ArticleCreate,
        api::models::articles::ArticleUpdate,
        api::models::articles::ArticleReject,
        api::models::articles::ArticleResponse,
        api::models::articles::ArticleListFilter,
        api::models::commentaries::CommentaryState,
        api::models::commentaries::CommentaryCreate,
        api::models::commentaries::CommentaryResponse,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "authentication", description = "Registration and login"),
        (name = "users", description = "User profiles and role administration"),
        (name = "articles", description = "Article authoring, publishing, and moderation"),
        (name = "commentaries", description = "Commentaries on approved articles"),
    )
)]
pub struct ApiDoc;
