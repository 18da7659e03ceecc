//! Link click tracking.
//!
//! Landing pages post events without a session. Admins read them back as
//! a filtered listing or as per-type counts.

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    routing::{get, post},
    Json, Router,
};
use domain::models::link_event::{
    LinkEventQuery, LinkEventStats, LinkEventView, TrackLinkEventRequest, TrackLinkEventResponse,
    LINK_EVENTS_LIMIT,
};
use persistence::repositories::{LinkEventFilter, LinkEventRepository, NewLinkEvent};
use tracing::debug;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::AdminUser;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/link-event", post(track_link_event))
        .route("/link-events", get(list_link_events))
        .route("/link-events/stats", get(link_event_stats))
}

fn header_value(headers: &HeaderMap, name: impl header::AsHeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// First hop of `X-Forwarded-For`, else `X-Real-IP`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty() && ip.len() <= 64)
        .map(str::to_string);
    forwarded.or_else(|| header_value(headers, "x-real-ip"))
}

fn filter(query: &LinkEventQuery) -> Result<LinkEventFilter, ApiError> {
    query.validate()?;
    Ok(LinkEventFilter {
        affiliate_id: query.affiliate_id,
        link_type: query.link_type.clone().filter(|t| !t.is_empty()),
        event_type: query.event_type,
        bounds: query.bounds().map_err(ApiError::Validation)?,
    })
}

/// POST /api/tracking/link-event
pub async fn track_link_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<TrackLinkEventRequest>,
) -> Result<Json<TrackLinkEventResponse>, ApiError> {
    request.validate()?;

    let event = NewLinkEvent {
        affiliate_id: request.affiliate_id,
        link_type: request.link_type.trim().to_string(),
        link_url: request.link_url.trim().to_string(),
        event_type: request.event_type,
        ip_address: client_ip(&headers),
        user_agent: header_value(&headers, header::USER_AGENT),
        referer: header_value(&headers, header::REFERER),
        metadata: request
            .metadata
            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
    };
    let created = LinkEventRepository::new(state.pool.clone())
        .create(&event)
        .await
        .map_err(|e| match ApiError::from(e) {
            ApiError::NotFound(_) => ApiError::NotFound("Affiliate not found".to_string()),
            other => other,
        })?;

    debug!(event_id = %created.id, link_type = %created.link_type, "Link event recorded");
    Ok(Json(TrackLinkEventResponse {
        success: true,
        event_id: created.id,
    }))
}

/// GET /api/tracking/link-events
pub async fn list_link_events(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<LinkEventQuery>,
) -> Result<Json<Vec<LinkEventView>>, ApiError> {
    let filter = filter(&query)?;
    let rows = LinkEventRepository::new(state.pool.clone())
        .list(&filter, LINK_EVENTS_LIMIT)
        .await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// GET /api/tracking/link-events/stats
pub async fn link_event_stats(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    Query(query): Query<LinkEventQuery>,
) -> Result<Json<LinkEventStats>, ApiError> {
    let filter = LinkEventFilter {
        event_type: None,
        ..filter(&query)?
    };
    let repo = LinkEventRepository::new(state.pool.clone());
    let totals = repo.totals(&filter).await?;
    let clicks = repo.clicks_by_type(&filter).await?;
    Ok(Json(totals.with_clicks_by_type(clicks)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.9"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.9"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_filter_rejects_bad_dates() {
        let query = LinkEventQuery {
            start_date: Some("2024-13-01".into()),
            ..Default::default()
        };
        assert!(filter(&query).is_err());

        let query = LinkEventQuery {
            start_date: Some("2024-05-10".into()),
            end_date: Some("2024-05-01".into()),
            ..Default::default()
        };
        assert!(matches!(filter(&query), Err(ApiError::Validation(_))));
    }

    #[test]
    fn test_blank_link_type_is_no_filter() {
        let query = LinkEventQuery {
            link_type: Some(String::new()),
            ..Default::default()
        };
        assert!(filter(&query).unwrap().link_type.is_none());
    }
}
