//! # REST API for Spending Analytics

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use shared::{AnalyticsQuery, AnalyticsResponse, AnalyticsScope};
use tracing::info;

use crate::backend::domain::aggregation::{category_totals, daily_totals, month_filter, total_spent};
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_analytics))
}

/// Category breakdown and daily trend, for this month or all time
async fn get_analytics(
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> impl IntoResponse {
    info!("GET /api/analytics - query: {:?}", query);
    let scope = query.scope.unwrap_or_default();
    let snapshot = state.synchronizer.snapshot();

    let expenses = match scope {
        AnalyticsScope::Month => month_filter(&snapshot.expenses, state.today()),
        AnalyticsScope::All => snapshot.expenses,
    };

    Json(AnalyticsResponse {
        scope,
        category_totals: category_totals(&expenses),
        daily_totals: daily_totals(&expenses, state.daily_window_days),
        total: total_spent(&expenses),
    })
}
