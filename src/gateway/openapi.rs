//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::gateway::handlers::{HealthResponse, ItemView, StoreView, TagLinkResponse, TagView};
use crate::gateway::types::MessageResponse;
use crate::models::{Item, Store, Tag};
use crate::user_auth::TokenPair;
use crate::user_auth::handlers::{AccessTokenResponse, Credentials, UserView};

/// JWT bearer security scheme
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let bearer = HttpBuilder::new()
                .scheme(HttpAuthScheme::Bearer)
                .bearer_format("JWT")
                .description(Some(
                    "Access token from /login or /refresh. Use the refresh token only on /refresh.",
                ))
                .build();
            components.add_security_scheme("bearer_auth", SecurityScheme::Http(bearer));
        }
    }
}

/// Main API Documentation struct
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Store Tag API",
        version = "1.0.0",
        description = "Stores, items and tags behind JWT authentication with token revocation.",
        license(
            name = "MIT"
        )
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health_check,
        // Auth
        crate::user_auth::handlers::register,
        crate::user_auth::handlers::login,
        crate::user_auth::handlers::logout,
        crate::user_auth::handlers::refresh,
        crate::user_auth::handlers::get_user,
        crate::user_auth::handlers::delete_user,
        // Stores
        crate::gateway::handlers::list_stores,
        crate::gateway::handlers::create_store,
        crate::gateway::handlers::get_store,
        crate::gateway::handlers::delete_store,
        // Items
        crate::gateway::handlers::list_items,
        crate::gateway::handlers::create_item,
        crate::gateway::handlers::get_item,
        crate::gateway::handlers::put_item,
        crate::gateway::handlers::delete_item,
        // Tags
        crate::gateway::handlers::list_store_tags,
        crate::gateway::handlers::create_tag,
        crate::gateway::handlers::get_tag,
        crate::gateway::handlers::delete_tag,
        crate::gateway::handlers::link_tag,
        crate::gateway::handlers::unlink_tag,
    ),
    components(
        schemas(
            HealthResponse,
            MessageResponse,
            Credentials,
            UserView,
            TokenPair,
            AccessTokenResponse,
            Store,
            Item,
            Tag,
            StoreView,
            ItemView,
            TagView,
            TagLinkResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration, login and token lifecycle"),
        (name = "Stores", description = "Stores with their items and tags (auth required)"),
        (name = "Items", description = "Items (auth required)"),
        (name = "Tags", description = "Tags and item links (auth required)"),
        (name = "System", description = "Health checks and system info")
    )
)]
pub struct ApiDoc;
