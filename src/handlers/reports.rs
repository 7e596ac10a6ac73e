use axum::extract::{rejection::QueryRejection, Query, State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::app::AppState;
use crate::gate::RequestContext;
use crate::handlers::workouts::scoped_client;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::tonnage::{bucket_starts, query_window, tonnage_report, Bucket, TonnageBucket};

#[derive(Debug, Deserialize)]
pub struct TonnageQuery {
    pub from: NaiveDate,
    pub to: NaiveDate,
    #[serde(default)]
    pub bucket: Bucket,
    pub client_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct TonnageReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub bucket: Bucket,
    pub client_id: Option<Uuid>,
    pub total: f64,
    pub buckets: Vec<TonnageBucket>,
}

/// GET /api/reports/tonnage?from=YYYY-MM-DD&to=YYYY-MM-DD&bucket=week
pub async fn tonnage(
    State(state): State<AppState>,
    ctx: RequestContext,
    query: Result<Query<TonnageQuery>, QueryRejection>,
) -> ApiResult<TonnageReport> {
    let Query(query) = query?;
    let organization_id = ctx.require_organization()?;
    let client_id = scoped_client(&ctx, query.client_id)?;

    // Reject bad ranges before touching the database
    bucket_starts(query.from, query.to, query.bucket)?;

    let (start, end) = query_window(query.from, query.to)?;
    let sets = state
        .set_logs
        .sets_between(organization_id, client_id, start, end)
        .await?;

    let buckets = tonnage_report(&sets, query.from, query.to, query.bucket)?;
    let total = buckets.iter().map(|bucket| bucket.tonnage).sum();

    Ok(ApiResponse::success(TonnageReport {
        from: query.from,
        to: query.to,
        bucket: query.bucket,
        client_id,
        total,
        buckets,
    }))
}
