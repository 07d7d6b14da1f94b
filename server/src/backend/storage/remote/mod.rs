//! # Remote Storage
//!
//! Adapter for a hosted PostgREST-style backend (as exposed by Supabase).
//! Rows live in two tables, `expenses` and `savings_goals`, filtered by
//! `user_id`. [`records`] owns the wire shapes, [`client`] the HTTP calls.

pub mod client;
pub mod records;

pub use client::RestStore;
