use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::cache::SnapshotCache;
use crate::crawl::source::slug;
use crate::crawl::SourceCatalog;
use crate::error::CacheNotReady;
use crate::models::{CompetitionBlock, MatchRecord, Snapshot, SnapshotKind};

/// Body returned for a `link` lookup that matches nothing.
pub const MATCH_NOT_ACTIVE: &str = "match is no longer active";

#[derive(Clone)]
pub struct AppState {
    pub cache: SnapshotCache,
    /// Configured sources; a region listed here exists even while its
    /// competitions are missing from the snapshot
    pub catalog: Arc<SourceCatalog>,
}

/// Build the Axum router for the read side.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/matches", get(full_handler))
        .route("/matches/today", get(today_handler))
        .route("/matches/:region/:competition", get(competition_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    NotReady(#[from] CacheNotReady),
    #[error("region {0} not found")]
    RegionNotFound(String),
    #[error("competition {0} not found")]
    CompetitionNotFound(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NotReady(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "error": "Matches data not available yet",
                    "message": "Cache is being initialized, please try again shortly",
                })),
            )
                .into_response(),
            ApiError::RegionNotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "code": "REGION_NOT_FOUND", "error": "Region not found." })),
            )
                .into_response(),
            ApiError::CompetitionNotFound(_) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "code": "COMPETITION_NOT_FOUND", "error": "Competition not found" })),
            )
                .into_response(),
        }
    }
}

/// Filters shared by every endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct MatchQuery {
    /// `MM-DD-YYYY`, compared with the date part of `dateTime`
    pub date: Option<String>,
    #[serde(default)]
    pub finished: bool,
    #[serde(default)]
    pub live: bool,
    /// Return only the record with this match link
    pub link: Option<String>,
}

impl MatchQuery {
    fn keeps(&self, record: &MatchRecord) -> bool {
        if let Some(date) = &self.date {
            let on_date = record
                .state
                .date_time()
                .and_then(|dt| dt.split_whitespace().next())
                .is_some_and(|day| day == date.as_str());
            if !on_date {
                return false;
            }
        }
        if self.finished || self.live {
            return (self.finished && record.state.is_finished())
                || (self.live && record.state.is_live());
        }
        true
    }

    fn filter_block(&self, block: &CompetitionBlock) -> CompetitionBlock {
        CompetitionBlock {
            region: block.region.clone(),
            competition: block.competition.clone(),
            matches: block
                .matches
                .iter()
                .filter(|m| self.keeps(m))
                .cloned()
                .collect(),
        }
    }

    /// Answer for a `link` query, or `None` when no link was asked for.
    fn link_lookup<'a>(
        &self,
        mut blocks: impl Iterator<Item = &'a CompetitionBlock>,
    ) -> Option<Response> {
        let link = self.link.as_deref()?;
        let found = blocks.find_map(|b| b.matches.iter().find(|m| m.match_link == link));
        Some(match found {
            Some(record) => Json(record.clone()).into_response(),
            None => Json(MATCH_NOT_ACTIVE).into_response(),
        })
    }
}

/// GET /matches
async fn full_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchQuery>,
) -> Result<Response, ApiError> {
    listing(&state, SnapshotKind::Full, &query).await
}

/// GET /matches/today
async fn today_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<MatchQuery>,
) -> Result<Response, ApiError> {
    listing(&state, SnapshotKind::Today, &query).await
}

async fn listing(
    state: &AppState,
    kind: SnapshotKind,
    query: &MatchQuery,
) -> Result<Response, ApiError> {
    let snapshot = state.cache.read(kind).await?;
    if let Some(response) = query.link_lookup(snapshot.blocks.iter()) {
        return Ok(response);
    }

    let filtered = Snapshot {
        kind: snapshot.kind,
        built_at: snapshot.built_at,
        blocks: snapshot
            .blocks
            .iter()
            .map(|b| query.filter_block(b))
            .filter(|b| !b.is_empty())
            .collect(),
    };
    Ok(Json(filtered).into_response())
}

/// GET /matches/:region/:competition
async fn competition_handler(
    State(state): State<Arc<AppState>>,
    Path((region, competition)): Path<(String, String)>,
    Query(query): Query<MatchQuery>,
) -> Result<Response, ApiError> {
    let snapshot = state.cache.read(SnapshotKind::Full).await?;

    let Some(block) = snapshot.blocks.iter().find(|b| {
        name_matches(&b.region, &region) && name_matches(&b.competition, &competition)
    }) else {
        let known_region = snapshot.blocks.iter().any(|b| name_matches(&b.region, &region))
            || state.catalog.fixture_regions().any(|r| name_matches(r, &region));
        return Err(if known_region {
            ApiError::CompetitionNotFound(competition)
        } else {
            ApiError::RegionNotFound(region)
        });
    };

    if let Some(response) = query.link_lookup(std::iter::once(block)) {
        return Ok(response);
    }
    Ok(Json(query.filter_block(block)).into_response())
}

/// Case-insensitive match on the display name or its slug.
fn name_matches(name: &str, requested: &str) -> bool {
    name.eq_ignore_ascii_case(requested) || slug(name) == requested.to_lowercase()
}
