use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Farmers API",
        version = "0.1.0",
        description = r#"
# Farmers API

Register farmers and keep their contact details current.

## Error Handling

Every failure uses the same envelope. Validation failures (422) also list the messages for
each offending field:

```json
{
  "success": false,
  "message": "The phone has already been taken.",
  "errors": { "phone": ["The phone has already been taken."] }
}
```
        "#
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "farmers", description = "Farmer registry endpoints")
    ),
    paths(
        crate::handlers::farmers::list_farmers,
        crate::handlers::farmers::create_farmer,
        crate::handlers::farmers::show_farmer,
        crate::handlers::farmers::update_farmer,
        crate::handlers::farmers::delete_farmer,
    ),
    components(
        schemas(
            crate::dto::farmer::FarmerResponse,
            crate::dto::farmer::CreateFarmerRequest,
            crate::dto::farmer::UpdateFarmerRequest,
            crate::MessageResponse,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDocV1;

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDocV1::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
