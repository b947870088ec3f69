//! API Route Handlers

pub mod listings;
pub mod predict;
