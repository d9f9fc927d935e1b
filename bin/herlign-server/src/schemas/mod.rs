//! Request and response bodies.
//!
//! Row types from [`crate::entities::dao`] are returned as-is for content
//! endpoints; this module adds the envelopes and the validated inputs.

pub mod auth;
pub mod chat;
pub mod dashboard;
pub mod event;
pub mod link;
pub mod media;
pub mod podcast;
pub mod resource;
pub mod testimonial;

use std::collections::BTreeMap;

use herlign_core::Pagination;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;
use validator::{ValidateUrl, ValidationError};

/// `{ message, data }` wrapper used by single-item endpoints.
#[derive(Debug, Serialize, ToSchema)]
pub struct DataResponse<T> {
    pub message: String,
    pub data: T,
}

impl<T> DataResponse<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self { message: message.into(), data }
    }
}

/// Paginated list envelope.
#[derive(Debug, Serialize, ToSchema)]
pub struct ListResponse<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Vec<T>,
    pub pagination: Pagination,
    /// Filters that were applied, echoed back for the client.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub filters: BTreeMap<String, String>,
}

impl<T> ListResponse<T> {
    pub fn new(data: Vec<T>, pagination: Pagination) -> Self {
        Self {
            message: None,
            data,
            pagination,
            filters: BTreeMap::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_filter(mut self, key: &str, value: Option<impl ToString>) -> Self {
        if let Some(value) = value {
            self.filters.insert(key.to_owned(), value.to_string());
        }
        self
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in partial updates.
pub fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

/// URL check for nullable patch fields; `null` always passes.
pub(crate) fn nullable_url(value: &Option<Option<String>>, code: &'static str) -> Result<(), ValidationError> {
    match value {
        Some(Some(url)) if !url.validate_url() => Err(invalid(code, "must be a valid URL")),
        _ => Ok(()),
    }
}

pub(crate) fn invalid(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

/// Every tag at most 50 characters and not blank.
pub(crate) fn valid_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.iter().any(|t| t.trim().is_empty() || t.chars().count() > 50) {
        return Err(invalid("tags", "tags must be 1-50 characters each"));
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        image_url: Option<Option<String>>,
    }

    #[test]
    fn double_option_tells_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"image_url":null}"#).unwrap();
        let set: Patch = serde_json::from_str(r#"{"image_url":"https://x.test/a.png"}"#).unwrap();
        assert_eq!(absent.image_url, None);
        assert_eq!(null.image_url, Some(None));
        assert_eq!(set.image_url, Some(Some("https://x.test/a.png".into())));
    }

    #[test]
    fn nullable_url_rules() {
        assert!(nullable_url(&None, "image_url").is_ok());
        assert!(nullable_url(&Some(None), "image_url").is_ok());
        assert!(nullable_url(&Some(Some("https://herlign.com/a.png".into())), "image_url").is_ok());
        assert!(nullable_url(&Some(Some("not a url".into())), "image_url").is_err());
    }

    #[test]
    fn list_envelope_skips_empty_filters() {
        let params = herlign_core::PageParams::default();
        let body = ListResponse::<u8>::new(vec![], params.paginate(0));
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("filters").is_none());
        assert!(json.get("message").is_none());

        let body = body.with_filter("status", Some("published")).with_filter("type", None::<&str>);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["filters"]["status"], "published");
        assert!(json["filters"].get("type").is_none());
    }
}
