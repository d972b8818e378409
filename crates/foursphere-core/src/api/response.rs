//! Wire shapes for the `venues/explore` response.
//!
//! `RawResponse` is what the client hands to the parser: the decoded JSON
//! document, untouched. The `Api*` structs below mirror the nested layout the
//! parser walks. Every field is optional so that a missing value surfaces as a
//! named `ParseError::MissingField` instead of an opaque serde message.

use serde::Deserialize;
use serde_json::Value;

use super::FetchError;

/// Success code reported in `meta.code`.
pub const SUCCESS_CODE: &str = "200";

/// A decoded venue search document.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    body: Value,
}

impl RawResponse {
    pub fn from_value(body: Value) -> Self {
        Self { body }
    }

    /// Decode a response body, rejecting anything that is not a JSON object.
    pub fn from_json_str(text: &str) -> Result<Self, FetchError> {
        let body: Value = serde_json::from_str(text)
            .map_err(|e| FetchError::Malformed(format!("body is not JSON: {}", e)))?;
        if !body.is_object() {
            return Err(FetchError::Malformed(
                "top-level value is not an object".to_string(),
            ));
        }
        Ok(Self { body })
    }

    pub fn as_value(&self) -> &Value {
        &self.body
    }

    /// The `meta.code` value as text, whether it was sent as a string or a number.
    pub fn meta_code(&self) -> Option<String> {
        match self.body.get("meta")?.get("code")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn error_detail(&self) -> Option<&str> {
        self.body.get("meta")?.get("errorDetail")?.as_str()
    }

    pub fn is_success(&self) -> bool {
        self.meta_code().as_deref() == Some(SUCCESS_CODE)
    }
}

// ============================================================================
// Response Shapes
// ============================================================================

/// A scalar the API sometimes sends as a string and sometimes as a number.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Text(String),
    Number(serde_json::Number),
    Flag(bool),
}

impl Scalar {
    pub(crate) fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Number(n) => n.as_f64(),
            Scalar::Flag(_) => None,
        }
    }

    pub(crate) fn as_i64(&self) -> Option<i64> {
        match self {
            Scalar::Text(s) => s.trim().parse().ok(),
            Scalar::Number(n) => n.as_i64(),
            Scalar::Flag(_) => None,
        }
    }

    pub(crate) fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Flag(b) => Some(*b),
            Scalar::Text(s) => match s.trim() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            Scalar::Number(_) => None,
        }
    }

    pub(crate) fn to_text(&self) -> String {
        match self {
            Scalar::Text(s) => s.clone(),
            Scalar::Number(n) => n.to_string(),
            Scalar::Flag(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope {
    pub meta: Option<ApiMeta>,
    pub response: Option<ApiExplore>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiMeta {
    pub code: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiExplore {
    pub groups: Option<Vec<ApiGroup>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiGroup {
    pub items: Option<Vec<ApiItem>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiItem {
    pub venue: Option<ApiVenue>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiVenue {
    pub id: Option<String>,
    pub name: Option<String>,
    pub location: Option<ApiLocation>,
    pub categories: Option<Vec<ApiCategory>>,
    pub photos: Option<ApiPhotos>,
    pub hours: Option<ApiHours>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiLocation {
    pub lat: Option<Scalar>,
    pub lng: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCategory {
    #[serde(rename = "shortName")]
    pub short_name: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPhotos {
    pub count: Option<Scalar>,
    pub groups: Option<Vec<ApiPhotoGroup>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPhotoGroup {
    pub items: Option<Vec<ApiPhoto>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiPhoto {
    pub prefix: Option<String>,
    pub suffix: Option<String>,
    pub width: Option<Scalar>,
    pub height: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiHours {
    #[serde(rename = "isOpen")]
    pub is_open: Option<Scalar>,
}
