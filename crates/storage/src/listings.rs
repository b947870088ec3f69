//! Property Listings Repository

use crate::{open_csv, StorageError};
use feature_engine::District;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info, warn};

/// Default number of listings returned by a query
pub const DEFAULT_LIMIT: usize = 500;

/// Hard cap on listings returned by a query
pub const MAX_LIMIT: usize = 5000;

/// A property on the market
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyListing {
    /// Asking price in euros
    pub price: f64,
    /// Price per square meter
    pub unit_price: f64,
    pub constructed_area: f64,
    pub room_number: u32,
    pub bath_number: u32,
    pub construction_year: Option<i32>,
    #[serde(serialize_with = "serialize_district")]
    pub district: District,
    pub latitude: f64,
    pub longitude: f64,
}

fn serialize_district<S>(district: &District, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(district.canonical_name())
}

/// Listing row as it appears in the dataset
#[derive(Debug, Deserialize)]
struct ListingRow {
    #[serde(rename = "PRICE")]
    price: f64,
    #[serde(rename = "UNITPRICE")]
    unit_price: f64,
    #[serde(rename = "CONSTRUCTEDAREA")]
    constructed_area: f64,
    #[serde(rename = "ROOMNUMBER")]
    room_number: u32,
    #[serde(rename = "BATHNUMBER")]
    bath_number: u32,
    #[serde(rename = "CADCONSTRUCTIONYEAR", default)]
    construction_year: Option<i32>,
    #[serde(rename = "DISTRICT")]
    district: String,
    #[serde(rename = "LATITUDE")]
    latitude: f64,
    #[serde(rename = "LONGITUDE")]
    longitude: f64,
}

/// Listing filters; every criterion is optional
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ListingQuery {
    /// District name, free text
    pub district: Option<String>,
    /// Exact number of rooms
    pub room_number: Option<u32>,
    /// Exact number of bathrooms
    pub bathroom_number: Option<u32>,
    pub price_min: Option<f64>,
    pub price_max: Option<f64>,
    pub constructed_area_min: Option<f64>,
    pub constructed_area_max: Option<f64>,
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

impl Default for ListingQuery {
    fn default() -> Self {
        Self {
            district: None,
            room_number: None,
            bathroom_number: None,
            price_min: None,
            price_max: None,
            constructed_area_min: None,
            constructed_area_max: None,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl ListingQuery {
    fn matches(&self, listing: &PropertyListing) -> bool {
        self.room_number.map_or(true, |n| listing.room_number == n)
            && self.bathroom_number.map_or(true, |n| listing.bath_number == n)
            && self.price_min.map_or(true, |min| listing.price >= min)
            && self.price_max.map_or(true, |max| listing.price <= max)
            && self
                .constructed_area_min
                .map_or(true, |min| listing.constructed_area >= min)
            && self
                .constructed_area_max
                .map_or(true, |max| listing.constructed_area <= max)
    }
}

/// Listing count and prices of one district
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistrictSummary {
    #[serde(serialize_with = "serialize_district")]
    pub district: District,
    pub listings: usize,
    pub mean_price: f64,
    pub median_price: f64,
}

/// Read-only listing store
#[derive(Debug, Clone, Default)]
pub struct ListingRepository {
    listings: Vec<PropertyListing>,
}

impl ListingRepository {
    /// Build a repository from listings already in memory
    pub fn from_listings(listings: Vec<PropertyListing>) -> Self {
        Self { listings }
    }

    /// Load listings from a CSV file.
    ///
    /// Rows whose district is not a Madrid district are skipped.
    pub fn from_csv(path: &Path) -> Result<Self, StorageError> {
        let mut reader = open_csv(path)?;
        let mut listings = Vec::new();
        let mut skipped = 0usize;

        for row in reader.deserialize::<ListingRow>() {
            let row = row.map_err(|source| StorageError::Csv {
                path: path.to_path_buf(),
                source,
            })?;

            let district = match District::resolve(&row.district) {
                Ok(district) => district,
                Err(e) => {
                    warn!("Skipping listing: {}", e);
                    skipped += 1;
                    continue;
                }
            };

            listings.push(PropertyListing {
                price: row.price,
                unit_price: row.unit_price,
                constructed_area: row.constructed_area,
                room_number: row.room_number,
                bath_number: row.bath_number,
                construction_year: row.construction_year,
                district,
                latitude: row.latitude,
                longitude: row.longitude,
            });
        }

        info!(
            "Loaded {} listings from {} ({} skipped)",
            listings.len(),
            path.display(),
            skipped
        );
        Ok(Self::from_listings(listings))
    }

    /// Listings matching a query, in file order, capped at the query limit
    pub fn query(&self, query: &ListingQuery) -> Result<Vec<PropertyListing>, StorageError> {
        let district = query
            .district
            .as_deref()
            .map(|name| {
                District::resolve(name).map_err(|_| StorageError::NotFound(name.to_string()))
            })
            .transpose()?;
        let limit = query.limit.min(MAX_LIMIT);

        let filtered: Vec<_> = self
            .listings
            .iter()
            .filter(|l| district.map_or(true, |d| l.district == d))
            .filter(|l| query.matches(l))
            .take(limit)
            .cloned()
            .collect();

        debug!("Listing query matched {} rows", filtered.len());
        Ok(filtered)
    }

    /// Per-district listing counts and prices, in district order.
    ///
    /// Districts without listings are omitted.
    pub fn district_summaries(&self) -> Vec<DistrictSummary> {
        let mut prices: BTreeMap<District, Vec<f64>> = BTreeMap::new();
        for listing in &self.listings {
            prices.entry(listing.district).or_default().push(listing.price);
        }

        prices
            .into_iter()
            .map(|(district, mut prices)| {
                prices.sort_by(|a, b| a.total_cmp(b));
                let n = prices.len();
                let mean_price = prices.iter().sum::<f64>() / n as f64;
                let median_price = if n % 2 == 0 {
                    (prices[n / 2 - 1] + prices[n / 2]) / 2.0
                } else {
                    prices[n / 2]
                };
                DistrictSummary {
                    district,
                    listings: n,
                    mean_price,
                    median_price,
                }
            })
            .collect()
    }

    /// Total listing count
    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}
