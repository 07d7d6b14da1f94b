//! # Local Snapshot Storage
//!
//! File-based store used in local-only mode. Each user gets a directory
//! under the configured data directory holding two well-known files:
//!
//! ```text
//! data_dir/
//! └── {user_id}/
//!     ├── expenses.csv        id,amount,category,description,date
//!     └── savings_goal.yaml   amount + month of the current goal
//! ```
//!
//! ## Features
//!
//! - Whole-file rewrites through a temp file and rename
//! - Writes serialized per store instance
//! - UUID v4 ids for new expenses
//! - Rows that fail validation are skipped with a warning when listing,
//!   but written back untouched on every rewrite

pub mod connection;
pub mod expense_repository;
pub mod goal_repository;
pub mod store;

pub use connection::LocalConnection;
pub use expense_repository::ExpenseRepository;
pub use goal_repository::GoalRepository;
pub use store::LocalSnapshotStore;
