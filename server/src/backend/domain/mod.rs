//! # Domain Module
//!
//! Contains the business logic of the budget tracker.
//!
//! Everything here is independent of the HTTP layer and of the concrete
//! store. Expenses and goals are validated, aggregated and kept in sync
//! with whichever [`ExpenseStore`](crate::backend::storage::ExpenseStore)
//! the backend was configured with.
//!
//! ## Module Organization
//!
//! - **models**: Record validation and parsing of raw store values
//! - **aggregation**: Totals, category breakdowns, daily series, goal progress
//! - **calendar**: Month grid and day detail views
//! - **synchronizer**: Per-session state and the commands that change it
//! - **inactivity**: Sign-out after a period without activity
//! - **clock**: Which calendar "today" belongs to
//!
//! ## Business Rules
//!
//! - Expense amounts are strictly positive
//! - Categories come from a fixed set
//! - Aggregations are pure functions of the current expense list
//! - At most one savings goal is active, and only for the current month

pub mod aggregation;
pub mod calendar;
pub mod clock;
pub mod errors;
pub mod inactivity;
pub mod models;
pub mod synchronizer;

pub use calendar::CalendarService;
pub use clock::CalendarTimezone;
pub use errors::BudgetError;
pub use inactivity::InactivityMonitor;
pub use models::ExpenseValidationError;
pub use synchronizer::{ExpenseSynchronizer, SyncSnapshot};
