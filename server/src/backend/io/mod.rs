//! # IO Module
//!
//! Interface layer between HTTP clients and the domain logic. Translates
//! requests into synchronizer commands and domain values into the JSON
//! shapes defined in the `shared` crate.
//!
//! ## Supported Operations
//!
//! - **/api/session**: Sign in, sign out, activity pings
//! - **/api/expenses**: Filtered list, add, delete, refetch
//! - **/api/goal**: Current month goal status and updates
//! - **/api/analytics**: Category breakdown and daily trend
//! - **/api/calendar**: Month grid and day detail

pub mod rest;
