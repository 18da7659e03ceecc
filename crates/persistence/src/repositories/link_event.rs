//! Link event repository.

use domain::models::dashboard::DateBounds;
use domain::models::link_event::LinkEventType;
use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::{
    LinkEventEntity, LinkEventTotalsEntity, LinkEventTypeDb, LinkEventViewEntity,
    LinkTypeCountEntity,
};
use crate::metrics::QueryTimer;

const LINK_EVENT_COLUMNS: &str = "e.id, e.affiliate_id, e.link_type, e.link_url, e.event_type, \
     e.ip_address, e.user_agent, e.referer, e.metadata, e.created_at";

/// Event row to insert.
#[derive(Debug, Clone)]
pub struct NewLinkEvent {
    pub affiliate_id: Option<Uuid>,
    pub link_type: String,
    pub link_url: String,
    pub event_type: LinkEventType,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub metadata: serde_json::Value,
}

/// Filters over `link_events`; date bounds are half-open on `created_at`.
#[derive(Debug, Clone, Default)]
pub struct LinkEventFilter {
    pub affiliate_id: Option<Uuid>,
    pub link_type: Option<String>,
    pub event_type: Option<LinkEventType>,
    pub bounds: DateBounds,
}

#[derive(Clone)]
pub struct LinkEventRepository {
    pool: PgPool,
}

impl LinkEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, event: &NewLinkEvent) -> Result<LinkEventEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_link_event");
        let result = sqlx::query_as::<_, LinkEventEntity>(&format!(
            r#"
            INSERT INTO link_events AS e (affiliate_id, link_type, link_url, event_type,
                                          ip_address, user_agent, referer, metadata)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {LINK_EVENT_COLUMNS}
            "#
        ))
        .bind(event.affiliate_id)
        .bind(&event.link_type)
        .bind(&event.link_url)
        .bind(LinkEventTypeDb::from(event.event_type))
        .bind(&event.ip_address)
        .bind(&event.user_agent)
        .bind(&event.referer)
        .bind(&event.metadata)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Newest first, at most `limit` rows.
    pub async fn list(
        &self,
        filter: &LinkEventFilter,
        limit: i64,
    ) -> Result<Vec<LinkEventViewEntity>, sqlx::Error> {
        let timer = QueryTimer::new("list_link_events");
        let result = sqlx::query_as::<_, LinkEventViewEntity>(&format!(
            r#"
            SELECT {LINK_EVENT_COLUMNS}, a.name AS affiliate_name
            FROM link_events e
            LEFT JOIN affiliates a ON a.id = e.affiliate_id
            WHERE ($1::uuid IS NULL OR e.affiliate_id = $1)
              AND ($2::text IS NULL OR e.link_type = $2)
              AND ($3::link_event_type IS NULL OR e.event_type = $3)
              AND ($4::timestamptz IS NULL OR e.created_at >= $4)
              AND ($5::timestamptz IS NULL OR e.created_at < $5)
            ORDER BY e.created_at DESC, e.id
            LIMIT $6
            "#
        ))
        .bind(filter.affiliate_id)
        .bind(filter.link_type.as_deref())
        .bind(filter.event_type.map(LinkEventTypeDb::from))
        .bind(filter.bounds.from)
        .bind(filter.bounds.until)
        .bind(limit)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Counts per event type. `filter.event_type` is ignored.
    pub async fn totals(
        &self,
        filter: &LinkEventFilter,
    ) -> Result<LinkEventTotalsEntity, sqlx::Error> {
        let timer = QueryTimer::new("link_event_totals");
        let result = sqlx::query_as::<_, LinkEventTotalsEntity>(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE e.event_type = 'CLICK') AS total_clicks,
                COUNT(*) FILTER (WHERE e.event_type = 'VIEW') AS total_views,
                COUNT(*) FILTER (WHERE e.event_type = 'CONVERSION') AS total_conversions
            FROM link_events e
            WHERE ($1::uuid IS NULL OR e.affiliate_id = $1)
              AND ($2::text IS NULL OR e.link_type = $2)
              AND ($3::timestamptz IS NULL OR e.created_at >= $3)
              AND ($4::timestamptz IS NULL OR e.created_at < $4)
            "#,
        )
        .bind(filter.affiliate_id)
        .bind(filter.link_type.as_deref())
        .bind(filter.bounds.from)
        .bind(filter.bounds.until)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }

    /// Click counts grouped by link type, busiest first.
    pub async fn clicks_by_type(
        &self,
        filter: &LinkEventFilter,
    ) -> Result<Vec<LinkTypeCountEntity>, sqlx::Error> {
        let timer = QueryTimer::new("link_event_clicks_by_type");
        let result = sqlx::query_as::<_, LinkTypeCountEntity>(
            r#"
            SELECT e.link_type, COUNT(*) AS count
            FROM link_events e
            WHERE e.event_type = 'CLICK'
              AND ($1::uuid IS NULL OR e.affiliate_id = $1)
              AND ($2::text IS NULL OR e.link_type = $2)
              AND ($3::timestamptz IS NULL OR e.created_at >= $3)
              AND ($4::timestamptz IS NULL OR e.created_at < $4)
            GROUP BY e.link_type
            ORDER BY count DESC, e.link_type
            "#,
        )
        .bind(filter.affiliate_id)
        .bind(filter.link_type.as_deref())
        .bind(filter.bounds.from)
        .bind(filter.bounds.until)
        .fetch_all(&self.pool)
        .await;
        timer.record();
        result
    }
}
