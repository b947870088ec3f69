//! Property listing endpoints

use crate::error::ApiError;
use crate::AppState;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use storage::{DistrictSummary, ListingQuery, PropertyListing};

/// Listings query response
#[derive(Debug, Serialize)]
pub struct ListingsResponse {
    pub count: usize,
    pub listings: Vec<PropertyListing>,
}

/// Get listings matching the query string filters
pub async fn get_listings(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListingQuery>, QueryRejection>,
) -> Result<Json<ListingsResponse>, ApiError> {
    let Query(query) = query?;
    let listings = state.listings.query(&query)?;

    Ok(Json(ListingsResponse {
        count: listings.len(),
        listings,
    }))
}

/// Per-district summary response
#[derive(Debug, Serialize)]
pub struct DistrictsResponse {
    pub districts: Vec<DistrictSummary>,
}

/// Get listing counts and prices per district
pub async fn get_district_summaries(State(state): State<Arc<AppState>>) -> Json<DistrictsResponse> {
    Json(DistrictsResponse {
        districts: state.listings.district_summaries(),
    })
}
