use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::entities::dao::Media;

/// Media row plus the derived `is_used` flag.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MediaResponse {
    #[serde(flatten)]
    pub media: Media,
    pub is_used: bool,
}

impl Media {
    pub fn to_response(self) -> MediaResponse {
        MediaResponse {
            is_used: self.is_used(),
            media: self,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct MediaQuery {
    pub is_used: Option<bool>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

/// Multipart form accepted by the upload endpoint (documentation only).
#[derive(Debug, ToSchema)]
#[allow(dead_code)]
pub struct MediaUploadForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    pub alt_text: Option<String>,
}
