//! # REST API for the Monthly Savings Goal

use axum::{
    extract::State,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use shared::{BudgetMonth, GoalStatusResponse, UpdateGoalRequest, UpdateGoalResponse};
use tracing::{error, info};

use crate::backend::domain::aggregation::{goal_nudge, goal_progress, month_filter, total_spent};
use crate::backend::domain::models::{active_goal, goal_for_current_month};
use crate::backend::domain::BudgetError;
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_goal_status).put(update_goal))
}

/// Current month's goal with spending, progress and nudge
async fn get_goal_status(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/goal");
    let today = state.today();
    let snapshot = state.synchronizer.snapshot();

    let spent = total_spent(&month_filter(&snapshot.expenses, today));
    let goal = active_goal(snapshot.goal.as_ref(), today).cloned();
    let progress = goal_progress(goal.as_ref(), spent, today);
    let nudge = goal_nudge(progress.as_ref());

    Json(GoalStatusResponse {
        month: BudgetMonth::from_date(today),
        goal,
        total_spent_this_month: spent,
        progress,
        nudge,
    })
}

async fn update_goal(
    State(state): State<AppState>,
    Json(request): Json<UpdateGoalRequest>,
) -> impl IntoResponse {
    info!("PUT /api/goal - request: {:?}", request);
    state.inactivity.record_activity();

    let goal = match goal_for_current_month(request.amount, state.today()) {
        Ok(goal) => goal,
        Err(e) => return BudgetError::from(e).into_response(),
    };

    match state.synchronizer.update_goal(goal).await {
        Ok(goal) => Json(UpdateGoalResponse {
            success_message: format!("Savings goal for {} set to {}", goal.month, goal.amount),
            goal,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to update savings goal: {}", e);
            e.into_response()
        }
    }
}
