use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::schemas::{double_option, invalid, nullable_url};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
pub struct CreateTestimonialRequest {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i64>,
    #[validate(url)]
    pub avatar_url: Option<String>,
    #[validate(length(min = 10, max = 2000))]
    pub review: String,
    #[validate(length(min = 1, max = 255))]
    pub reviewer_name: String,
    #[validate(length(max = 255))]
    pub reviewer_title: Option<String>,
    #[serde(default)]
    pub is_approved: bool,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_update_testimonial"))]
pub struct UpdateTestimonialRequest {
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>, nullable)]
    pub rating: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub avatar_url: Option<Option<String>>,
    #[validate(length(min = 10, max = 2000))]
    pub review: Option<String>,
    #[validate(length(min = 1, max = 255))]
    pub reviewer_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub reviewer_title: Option<Option<String>>,
    pub is_approved: Option<bool>,
}

fn validate_update_testimonial(req: &UpdateTestimonialRequest) -> Result<(), ValidationError> {
    nullable_url(&req.avatar_url, "avatar_url")?;
    if let Some(Some(r)) = req.rating {
        if !(1..=5).contains(&r) {
            return Err(invalid("rating", "rating must be between 1 and 5"));
        }
    }
    if let Some(Some(title)) = &req.reviewer_title {
        if title.chars().count() > 255 {
            return Err(invalid("reviewer_title", "reviewer_title must be at most 255 characters"));
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct TestimonialQuery {
    #[validate(range(min = 1, max = 5))]
    pub rating: Option<i64>,
    /// Ignored on the public listing, which only shows approved entries.
    pub is_approved: Option<bool>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}
