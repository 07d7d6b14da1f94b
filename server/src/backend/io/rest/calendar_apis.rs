use axum::{
    extract::{Query, State},
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use shared::{CalendarMonthRequest, DayDetailRequest};
use tracing::{error, info};

use crate::backend::domain::BudgetError;
use crate::backend::AppState;

/// Create a router for calendar related APIs
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/month", get(get_calendar_month))
        .route("/day", get(get_day_detail))
}

/// Get the month grid with each day's expenses
async fn get_calendar_month(
    State(state): State<AppState>,
    Query(query): Query<CalendarMonthRequest>,
) -> impl IntoResponse {
    info!("GET /api/calendar/month - query: {:?}", query);
    let snapshot = state.synchronizer.snapshot();

    match state
        .calendar_service
        .generate_calendar_month(query.month, query.year, &snapshot.expenses, state.today())
    {
        Ok(calendar) => Json(calendar).into_response(),
        Err(e) => {
            error!("Invalid calendar request: {}", e);
            BudgetError::from(e).into_response()
        }
    }
}

/// Get the expenses of one selected day
async fn get_day_detail(
    State(state): State<AppState>,
    Query(query): Query<DayDetailRequest>,
) -> impl IntoResponse {
    info!("GET /api/calendar/day - query: {:?}", query);
    let snapshot = state.synchronizer.snapshot();
    Json(state.calendar_service.day_detail(query.date, &snapshot.expenses))
}
