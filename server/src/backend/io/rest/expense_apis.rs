//! # REST API for Expenses

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{delete, get, post},
    Router,
};
use shared::{
    CreateExpenseResponse, DeleteExpenseResponse, ExpenseListQuery, ExpenseListResponse, NewExpense,
};
use tracing::{error, info};

use super::session_apis::session_response;
use crate::backend::domain::aggregation::{apply_list_query, total_spent};
use crate::backend::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_expenses).post(add_expense))
        .route("/refetch", post(refetch))
        .route("/:id", delete(delete_expense))
}

/// Expense history after category and recency filters and the chosen sort
async fn list_expenses(
    State(state): State<AppState>,
    Query(query): Query<ExpenseListQuery>,
) -> impl IntoResponse {
    info!("GET /api/expenses - query: {:?}", query);
    let snapshot = state.synchronizer.snapshot();
    let expenses = apply_list_query(&snapshot.expenses, &query, state.today());

    Json(ExpenseListResponse {
        total: total_spent(&expenses),
        loading: snapshot.loading(),
        expenses,
    })
}

async fn add_expense(
    State(state): State<AppState>,
    Json(request): Json<NewExpense>,
) -> impl IntoResponse {
    info!("POST /api/expenses - request: {:?}", request);
    state.inactivity.record_activity();

    match state.synchronizer.add_expense(request).await {
        Ok(expense) => {
            let response = CreateExpenseResponse {
                success_message: format!("Added {} expense of {}", expense.category, expense.amount),
                expense,
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => {
            error!("Failed to add expense: {}", e);
            e.into_response()
        }
    }
}

async fn delete_expense(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    info!("DELETE /api/expenses/{}", id);
    state.inactivity.record_activity();

    match state.synchronizer.delete_expense(&id).await {
        Ok(()) => Json(DeleteExpenseResponse {
            success_message: "Expense deleted".to_string(),
            deleted_id: id,
        })
        .into_response(),
        Err(e) => {
            error!("Failed to delete expense {}: {}", id, e);
            e.into_response()
        }
    }
}

async fn refetch(State(state): State<AppState>) -> impl IntoResponse {
    info!("POST /api/expenses/refetch");
    state.inactivity.record_activity();

    match state.synchronizer.refetch().await {
        Ok(()) => Json(session_response(&state.synchronizer.snapshot())).into_response(),
        Err(e) => {
            error!("Refetch failed: {}", e);
            e.into_response()
        }
    }
}
