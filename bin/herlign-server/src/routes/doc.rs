use crate::routes::{admin, auth, chat, cron, health, public};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "herlign-server",
        description = "Herlign community site API",
        version = "0.1.0",
    ),
    modifiers(&BearerAuth)
)]
pub struct ApiDoc;

/// Registers the `bearer` scheme referenced by admin endpoints.
struct BearerAuth;

impl utoipa::Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(chat::ChatApi::openapi());
    root.merge(auth::AuthApi::openapi());
    root.merge(cron::CronApi::openapi());
    root.merge(public::api_docs());
    root.merge(admin::api_docs());
    root
}
