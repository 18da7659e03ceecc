//! Link event entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::link_event::{
    LinkEvent, LinkEventAffiliate, LinkEventStats, LinkEventType, LinkEventView, LinkTypeCount,
};
use sqlx::FromRow;
use uuid::Uuid;

/// Database enum for link_event_type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "link_event_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkEventTypeDb {
    Click,
    View,
    Conversion,
}

impl From<LinkEventTypeDb> for LinkEventType {
    fn from(db: LinkEventTypeDb) -> Self {
        match db {
            LinkEventTypeDb::Click => LinkEventType::Click,
            LinkEventTypeDb::View => LinkEventType::View,
            LinkEventTypeDb::Conversion => LinkEventType::Conversion,
        }
    }
}

impl From<LinkEventType> for LinkEventTypeDb {
    fn from(kind: LinkEventType) -> Self {
        match kind {
            LinkEventType::Click => LinkEventTypeDb::Click,
            LinkEventType::View => LinkEventTypeDb::View,
            LinkEventType::Conversion => LinkEventTypeDb::Conversion,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LinkEventEntity {
    pub id: Uuid,
    pub affiliate_id: Option<Uuid>,
    pub link_type: String,
    pub link_url: String,
    pub event_type: LinkEventTypeDb,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl From<LinkEventEntity> for LinkEvent {
    fn from(entity: LinkEventEntity) -> Self {
        Self {
            id: entity.id,
            affiliate_id: entity.affiliate_id,
            link_type: entity.link_type,
            link_url: entity.link_url,
            event_type: entity.event_type.into(),
            ip_address: entity.ip_address,
            user_agent: entity.user_agent,
            referer: entity.referer,
            metadata: entity.metadata,
            created_at: entity.created_at,
        }
    }
}

/// Event joined with the affiliate name; the name is null once the
/// affiliate is gone.
#[derive(Debug, Clone, FromRow)]
pub struct LinkEventViewEntity {
    #[sqlx(flatten)]
    pub event: LinkEventEntity,
    pub affiliate_name: Option<String>,
}

impl From<LinkEventViewEntity> for LinkEventView {
    fn from(entity: LinkEventViewEntity) -> Self {
        let affiliate = entity
            .event
            .affiliate_id
            .zip(entity.affiliate_name)
            .map(|(id, name)| LinkEventAffiliate { id, name });
        Self {
            event: entity.event.into(),
            affiliate,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct LinkEventTotalsEntity {
    pub total_clicks: i64,
    pub total_views: i64,
    pub total_conversions: i64,
}

#[derive(Debug, Clone, FromRow)]
pub struct LinkTypeCountEntity {
    pub link_type: String,
    pub count: i64,
}

impl LinkEventTotalsEntity {
    pub fn with_clicks_by_type(self, clicks: Vec<LinkTypeCountEntity>) -> LinkEventStats {
        LinkEventStats {
            total_clicks: self.total_clicks,
            total_views: self.total_views,
            total_conversions: self.total_conversions,
            clicks_by_type: clicks
                .into_iter()
                .map(|c| LinkTypeCount {
                    link_type: c.link_type,
                    count: c.count,
                })
                .collect(),
        }
    }
}
