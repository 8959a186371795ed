//! # Storage Module
//!
//! Persistence for the health journal: a SQLite database reached through
//! sqlx, with one repository per entity behind the traits in [`traits`].

pub mod connection;
pub mod repositories;
pub mod traits;

pub use connection::DbConnection;
pub use traits::*;
