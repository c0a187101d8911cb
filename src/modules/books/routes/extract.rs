//! Request body extraction into a [`FieldMap`].

use std::collections::BTreeMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use bookshelf_http::error::AppError;
use serde_json::{Map, Value};

use crate::modules::books::validation::FieldMap;

enum BodyKind {
    Json,
    Form,
    Missing,
    Other(String),
}

fn body_kind(req: &Request) -> BodyKind {
    match req.headers().get(CONTENT_TYPE).map(|v| v.to_str()) {
        None => BodyKind::Missing,
        Some(Ok(ct)) if ct.starts_with("application/json") => BodyKind::Json,
        Some(Ok(ct)) if ct.starts_with("application/x-www-form-urlencoded") => BodyKind::Form,
        Some(Ok(ct)) => BodyKind::Other(ct.to_string()),
        Some(Err(_)) => BodyKind::Other("<invalid>".to_string()),
    }
}

/// Flatten a JSON object; scalars become their string form.
fn from_json(object: Map<String, Value>) -> Result<FieldMap, AppError> {
    let mut fields = FieldMap::new();
    for (key, value) in object {
        let text = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::Array(_) | Value::Object(_) => {
                return Err(AppError::bad_request(format!(
                    "field '{key}' must be a scalar value"
                )))
            }
        };
        fields.insert(key, text);
    }
    Ok(fields)
}

impl<S> FromRequest<S> for FieldMap
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(&req) {
            BodyKind::Json => {
                let Json(object) = Json::<Map<String, Value>>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                from_json(object)
            }
            BodyKind::Form => {
                let Form(map) = Form::<BTreeMap<String, String>>::from_request(req, state)
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                Ok(FieldMap::from(map))
            }
            // An empty body without a content type is an empty field set
            BodyKind::Missing => {
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| AppError::bad_request(e.body_text()))?;
                if bytes.is_empty() {
                    Ok(FieldMap::new())
                } else {
                    Err(AppError::bad_request("missing content type"))
                }
            }
            BodyKind::Other(content_type) => Err(AppError::bad_request(format!(
                "unsupported content type '{content_type}'"
            ))),
        }
    }
}
