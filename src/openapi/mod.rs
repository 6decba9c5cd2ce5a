use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Storage Service API",
        version = "1.0.0",
        description = r#"
# Storage Service API

Customers create boxes, staff pick them up, sort-pack them and move them
through storage. Each box belongs to exactly one user; items belong to a box.

## Authentication

Every `/api/v1` endpoint requires a bearer JWT:

```
Authorization: Bearer <your-jwt-token>
```

Tokens whose `account_type` claim is `employee` may act on any box and may set
the `stored` and `returned` statuses.

## Errors

```json
{
  "error": "Not Found",
  "message": "box not found or not accessible",
  "code": "not_found",
  "request_id": "req-abc123xyz",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

A box or item that exists but belongs to someone else is reported exactly like
one that does not exist.
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    paths(
        crate::handlers::boxes::create_box,
        crate::handlers::boxes::list_boxes,
        crate::handlers::boxes::get_box,
        crate::handlers::boxes::update_box_status,
        crate::handlers::boxes::delete_box,
        crate::handlers::items::add_item,
        crate::handlers::items::list_items,
        crate::handlers::items::update_box_item,
        crate::handlers::items::get_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,
    ),
    components(
        schemas(
            crate::handlers::boxes::CreateBoxRequest,
            crate::handlers::boxes::UpdateStatusRequest,
            crate::handlers::boxes::BoxView,
            crate::handlers::boxes::BoxListResponse,
            crate::handlers::boxes::BoxResponse,
            crate::handlers::items::AddItemRequest,
            crate::handlers::items::UpdateItemRequest,
            crate::handlers::items::ItemView,
            crate::handlers::items::ItemListResponse,
            crate::handlers::common::CreatedResponse,
            crate::handlers::common::MessageResponse,
            crate::entities::PackingMode,
            crate::entities::BoxStatus,
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "boxes", description = "Box lifecycle"),
        (name = "items", description = "Items inside sort-packed boxes")
    )
)]
pub struct ApiDocV1;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_document_lists_routes_and_auth() {
        let openapi = ApiDocV1::openapi();
        let json = serde_json::to_string_pretty(&openapi).unwrap();
        assert!(json.contains("Storage Service API"));
        assert!(json.contains("/api/v1/boxes/{id}/status"));
        assert!(json.contains("/api/v1/items/{id}"));
        assert!(json.contains("bearer_auth"));
    }
}
