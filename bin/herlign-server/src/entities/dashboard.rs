use std::future::Future;

use chrono::{DateTime, Utc};

use crate::entities::{db_time, Store};
use crate::schemas::dashboard::{DashboardStats, Tally};

pub trait DashboardStore: Send + Sync + 'static {
    /// Totals per content table; chats count as active when their last
    /// message is after `active_since`.
    fn dashboard_stats(&self, active_since: DateTime<Utc>) -> impl Future<Output = Result<DashboardStats, sqlx::Error>> + Send;
}

impl DashboardStore for Store {
    async fn dashboard_stats(&self, active_since: DateTime<Utc>) -> Result<DashboardStats, sqlx::Error> {
        let row: (i64, i64, i64, i64, i64, i64, i64, i64, i64, i64) = sqlx::query_as(
            "SELECT \
               (SELECT COUNT(*) FROM events), \
               (SELECT COUNT(*) FROM events WHERE status = 'published'), \
               (SELECT COUNT(*) FROM resources), \
               (SELECT COUNT(*) FROM testimonials), \
               (SELECT COUNT(*) FROM testimonials WHERE is_approved = 1), \
               (SELECT COUNT(*) FROM links), \
               (SELECT COUNT(*) FROM media), \
               (SELECT COUNT(*) FROM media WHERE use_count > 0), \
               (SELECT COUNT(*) FROM chat_sessions), \
               (SELECT COUNT(*) FROM chat_sessions WHERE last_message_at >= ?1)",
        )
        .bind(db_time(active_since))
        .fetch_one(&self.pool)
        .await?;

        let (events, published, resources, testimonials, approved, links, media, used, chats, active_chats) = row;
        Ok(DashboardStats {
            events: Tally { total: events, active: published },
            // Resources and links are public as soon as they exist.
            resources: Tally { total: resources, active: resources },
            testimonials: Tally { total: testimonials, active: approved },
            links: Tally { total: links, active: links },
            media: Tally { total: media, active: used },
            chats: Tally { total: chats, active: active_chats },
        })
    }
}
