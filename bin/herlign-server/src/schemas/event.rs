use chrono::{DateTime, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::entities::dao::{EventMode, EventStatus, EventType};
use crate::schemas::{double_option, invalid, nullable_url};

#[derive(Debug, Clone, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_create_event"))]
pub struct CreateEventRequest {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub mode: EventMode,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[validate(length(min = 10, max = 5000))]
    pub description: String,
    #[validate(url)]
    pub external_link: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    #[validate(range(min = 1))]
    pub max_attendees: Option<i64>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub price: f64,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    pub status: EventStatus,
    #[serde(default)]
    pub featured: bool,
}

fn validate_create_event(req: &CreateEventRequest) -> Result<(), ValidationError> {
    check_date_order(req.start_date, req.end_date)
}

pub(crate) fn check_date_order(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ValidationError> {
    if end < start {
        return Err(invalid("end_date", "End date must be after or equal to start date"));
    }
    Ok(())
}

/// Partial update. Absent fields are left alone; `null` clears a nullable column.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, Validate)]
#[validate(schema(function = "validate_update_event"))]
pub struct UpdateEventRequest {
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub mode: Option<EventMode>,
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    #[validate(length(min = 10, max = 5000))]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub external_link: Option<Option<String>>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<i64>, nullable)]
    pub max_attendees: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    #[schema(value_type = Option<String>, nullable)]
    pub image_url: Option<Option<String>>,
    #[validate(range(min = 0.0))]
    pub price: Option<f64>,
    pub is_paid: Option<bool>,
    pub status: Option<EventStatus>,
    pub featured: Option<bool>,
}

fn validate_update_event(req: &UpdateEventRequest) -> Result<(), ValidationError> {
    nullable_url(&req.external_link, "external_link")?;
    nullable_url(&req.image_url, "image_url")?;
    if let Some(Some(n)) = req.max_attendees {
        if n < 1 {
            return Err(invalid("max_attendees", "max_attendees must be positive"));
        }
    }
    if let (Some(start), Some(end)) = (req.start_date, req.end_date) {
        check_date_order(start, end)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct AdminEventQuery {
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub mode: Option<EventMode>,
    pub status: Option<EventStatus>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PublicEventQuery {
    #[serde(rename = "type")]
    pub event_type: Option<EventType>,
    pub mode: Option<EventMode>,
    /// Case-insensitive match on title or description.
    #[validate(length(max = 200))]
    pub search: Option<String>,
    /// Earliest `start_date`, RFC 3339.
    pub date_from: Option<DateTime<Utc>>,
    /// Latest `start_date`, RFC 3339.
    pub date_to: Option<DateTime<Utc>>,
    pub featured: Option<bool>,
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<u32>,
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    fn create_body() -> serde_json::Value {
        json!({
            "type": "workshop",
            "mode": "online",
            "title": "Negotiation Lab",
            "description": "Practice salary negotiation with peers.",
            "start_date": "2030-05-01T17:00:00Z",
            "end_date": "2030-05-01T19:00:00Z"
        })
    }

    #[test]
    fn create_defaults() {
        let req: CreateEventRequest = serde_json::from_value(create_body()).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.status, EventStatus::Draft);
        assert_eq!(req.price, 0.0);
        assert!(!req.featured);
    }

    #[test]
    fn create_rejects_end_before_start() {
        let mut body = create_body();
        body["end_date"] = json!("2030-04-30T19:00:00Z");
        let req: CreateEventRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn create_rejects_short_description_and_bad_url() {
        let mut body = create_body();
        body["description"] = json!("too short");
        let req: CreateEventRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());

        let mut body = create_body();
        body["image_url"] = json!("not-a-url");
        let req: CreateEventRequest = serde_json::from_value(body).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn unknown_type_fails_to_parse() {
        let mut body = create_body();
        body["type"] = json!("webinar");
        assert!(serde_json::from_value::<CreateEventRequest>(body).is_err());
    }

    #[test]
    fn update_checks_nullable_fields() {
        let req: UpdateEventRequest = serde_json::from_value(json!({ "image_url": null })).unwrap();
        assert!(req.validate().is_ok());
        assert_eq!(req.image_url, Some(None));

        let req: UpdateEventRequest = serde_json::from_value(json!({ "max_attendees": 0 })).unwrap();
        assert!(req.validate().is_err());
    }
}
