//! # IO Module
//!
//! Adapters at the edges of the backend: the REST API consumed by the
//! frontend and devices, and the outbound push delivery transport.

pub mod push;
pub mod rest;
