use axum::Form;
use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Request};
use axum::http::header::CONTENT_TYPE;
use serde_json::{Map, Value};
use thiserror::Error;

/// Raw field values of a write request, before validation.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Fields(Map<String, Value>);

impl Fields {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }
}

impl From<Map<String, Value>> for Fields {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, String)> for Fields {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(name, value)| (name, Value::String(value)))
                .collect(),
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PayloadError {
    #[error("Unsupported media type \"{0}\" in request.")]
    UnsupportedMediaType(String),
    #[error("{0}")]
    Malformed(String),
}

/// Decodes the request body according to its declared content type.
///
/// Bodies without a content type decode to no fields at all, so every
/// required field is then reported missing.
pub async fn decode(request: Request) -> Result<Fields, PayloadError> {
    let Some(content_type) = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
    else {
        return Ok(Fields::default());
    };

    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "application/json" => decode_json(request).await,
        "multipart/form-data" => decode_multipart(request).await,
        "application/x-www-form-urlencoded" => decode_form(request).await,
        _ => Err(PayloadError::UnsupportedMediaType(content_type)),
    }
}

async fn decode_json(request: Request) -> Result<Fields, PayloadError> {
    let body = Bytes::from_request(request, &())
        .await
        .map_err(|err| PayloadError::Malformed(err.body_text()))?;
    if body.is_empty() {
        return Ok(Fields::default());
    }

    let value: Value = serde_json::from_slice(&body)
        .map_err(|err| PayloadError::Malformed(format!("JSON parse error - {err}")))?;

    match value {
        Value::Object(map) => Ok(map.into()),
        other => Err(PayloadError::Malformed(format!(
            "Invalid data. Expected a dictionary, but got {}.",
            json_type_name(&other)
        ))),
    }
}

async fn decode_multipart(request: Request) -> Result<Fields, PayloadError> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|err| PayloadError::Malformed(err.body_text()))?;

    let mut fields = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| PayloadError::Malformed(err.body_text()))?
    {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|err| PayloadError::Malformed(err.body_text()))?;
        fields.push((name, value));
    }

    Ok(fields.into_iter().collect())
}

async fn decode_form(request: Request) -> Result<Fields, PayloadError> {
    let Form(pairs) = Form::<Vec<(String, String)>>::from_request(request, &())
        .await
        .map_err(|err| PayloadError::Malformed(err.body_text()))?;

    Ok(pairs.into_iter().collect())
}

pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(number) if number.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}
