//! # REST API Interface Layer
//!
//! Each submodule exposes a `router()` nested under `/api` by
//! [`create_router`](crate::backend::create_router). Handlers log their
//! method and path, do no business logic of their own, and turn
//! [`BudgetError`](crate::backend::domain::BudgetError) into a status code
//! plus `{ "error": ... }` body.

pub mod analytics_apis;
pub mod calendar_apis;
pub mod errors;
pub mod expense_apis;
pub mod goal_apis;
pub mod session_apis;
