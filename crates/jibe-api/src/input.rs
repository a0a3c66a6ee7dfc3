use axum::{
    Form,
    body::Bytes,
    extract::{FromRequest, Query, Request},
    http::{Uri, header},
};
use serde_json::Value;

use jibe_types::api::InputMap;

use crate::error::ApiError;

/// The one canonical input map a handler sees.
///
/// A JSON body is read regardless of its declared content type. Form
/// bodies are decoded as strings. When the body is missing or decodes to
/// an empty object, the query string is used instead.
#[derive(Debug, Default)]
pub struct RequestInput(pub InputMap);

impl<S> FromRequest<S> for RequestInput
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let uri = req.uri().clone();

        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        let body = if is_form {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            pairs_to_map(pairs)
        } else {
            let bytes = Bytes::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            parse_json_body(&bytes)?
        };

        if !body.is_empty() {
            return Ok(Self(body));
        }
        Ok(Self(parse_query(&uri)?))
    }
}

fn parse_json_body(bytes: &[u8]) -> Result<InputMap, ApiError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(InputMap::new());
    }

    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ApiError::BadRequest("Request body must be a JSON object".into())),
        Err(e) => Err(ApiError::BadRequest(format!("Malformed JSON body: {}", e))),
    }
}

fn parse_query(uri: &Uri) -> Result<InputMap, ApiError> {
    if uri.query().is_none() {
        return Ok(InputMap::new());
    }
    let Query(pairs) = Query::<Vec<(String, String)>>::try_from_uri(uri)
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
    Ok(pairs_to_map(pairs))
}

/// Later duplicates win.
fn pairs_to_map(pairs: Vec<(String, String)>) -> InputMap {
    pairs
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect()
}
