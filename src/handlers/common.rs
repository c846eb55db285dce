use crate::errors::ServiceError;
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// JSON request body that must be an object.
///
/// Like [`axum::Json`], but rejections are rendered through [`ServiceError`] so clients
/// always receive the standard error envelope.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<Value>::from_request(req, state)
            .await
            .map_err(map_json_rejection)?;

        if !value.is_object() {
            return Err(ServiceError::BadRequest(
                "The request body must be a JSON object.".to_string(),
            ));
        }

        serde_json::from_value(value)
            .map(JsonBody)
            .map_err(|e| ServiceError::BadRequest(format!("Invalid request body: {}", e)))
    }
}

fn map_json_rejection(rejection: JsonRejection) -> ServiceError {
    let message = rejection.body_text();
    match rejection.status() {
        StatusCode::UNSUPPORTED_MEDIA_TYPE => ServiceError::UnsupportedMediaType(message),
        StatusCode::PAYLOAD_TOO_LARGE => ServiceError::PayloadTooLarge(message),
        _ => ServiceError::BadRequest(message),
    }
}
