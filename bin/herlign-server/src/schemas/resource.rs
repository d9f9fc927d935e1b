use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::dao::ResourceFormat;
use crate::schemas::valid_tags;

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateResourceRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 10, max = 5000))]
    pub description: String,
    #[validate(url)]
    pub external_link: String,
    pub format: ResourceFormat,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[serde(default)]
    #[validate(custom(function = "valid_tags"))]
    pub tags: Vec<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub is_paid: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateResourceRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 5000))]
    pub description: Option<String>,
    #[validate(url)]
    pub external_link: Option<String>,
    pub format: Option<ResourceFormat>,
    #[validate(length(min = 1, max = 100))]
    pub category: Option<String>,
    #[validate(custom(function = "valid_tags"))]
    pub tags: Option<Vec<String>>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub is_paid: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct ResourceQuery {
    pub format: Option<ResourceFormat>,
    #[validate(length(max = 100))]
    pub category: Option<String>,
    /// Comma-separated; matches resources sharing at least one tag.
    pub tags: Option<String>,
    #[validate(length(max = 200))]
    pub search: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn tags_are_bounded() {
        let mut body = json!({
            "title": "Resume Template",
            "description": "A clean one-page resume template.",
            "external_link": "https://herlign.com/resume",
            "format": "template",
            "category": "careers",
            "tags": ["resume", "jobs"]
        });
        let req: CreateResourceRequest = serde_json::from_value(body.clone()).unwrap();
        assert!(req.validate().is_ok());

        body["tags"] = json!(["x".repeat(51)]);
        let req: CreateResourceRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }
}
