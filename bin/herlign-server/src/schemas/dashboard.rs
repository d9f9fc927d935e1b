use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Tally {
    pub total: i64,
    pub active: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    pub events: Tally,
    pub resources: Tally,
    pub testimonials: Tally,
    pub links: Tally,
    pub media: Tally,
    pub chats: Tally,
}
