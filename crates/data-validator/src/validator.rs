//! Property Validator for Range Checking

use crate::error::ValidationError;
use feature_engine::PropertyFeatures;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Constructed area valid range (m²)
    pub area_range: (f64, f64),
    /// Valid range for each of the three distance fields
    pub distance_range: (f64, f64),
    /// Room count valid range
    pub room_range: (u32, u32),
    /// Bathroom count valid range
    pub bathroom_range: (u32, u32),
    /// Cleaned floor number valid range
    pub floor_range: (i32, i32),
    /// Range for the `constructed_year` field
    pub constructed_year_range: (i32, i32),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            area_range: (1.0, 100_000.0),
            distance_range: (0.0, 100_000.0),
            room_range: (0, 50),
            bathroom_range: (0, 50),
            floor_range: (-10, 200),
            constructed_year_range: (0, 3000),
        }
    }
}

/// Result of validation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether all values are valid
    pub valid: bool,
    /// List of validation errors
    pub errors: Vec<ValidationError>,
    /// Number of fields validated
    pub fields_checked: usize,
}

impl ValidationResult {
    /// Create a valid result
    pub fn valid(fields_checked: usize) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            fields_checked,
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<ValidationError>, fields_checked: usize) -> Self {
        Self {
            valid: false,
            errors,
            fields_checked,
        }
    }

    /// All error messages joined into one line
    pub fn message(&self) -> String {
        self.errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Validator for incoming property descriptions
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against an inclusive range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::NotFinite { field });
        }
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate constructed area
    pub fn validate_area(&self, area: f64) -> Result<(), ValidationError> {
        self.validate_range("constructed_area", area, self.config.area_range)
    }

    /// Validate one of the distance fields
    pub fn validate_distance(
        &self,
        field: &'static str,
        distance: f64,
    ) -> Result<(), ValidationError> {
        self.validate_range(field, distance, self.config.distance_range)
    }

    /// Validate an integer count or level against an integer range
    fn validate_int<T: Into<f64> + Copy>(
        &self,
        field: &'static str,
        value: T,
        range: (T, T),
    ) -> Result<(), ValidationError> {
        self.validate_range(field, value.into(), (range.0.into(), range.1.into()))
    }

    /// Validate a free-text field
    fn validate_text(&self, field: &'static str, value: &str) -> Result<(), ValidationError> {
        if value.trim().is_empty() {
            Err(ValidationError::Empty(field))
        } else {
            Ok(())
        }
    }

    /// Validate every field of a property, collecting all violations
    pub fn validate(&self, features: &PropertyFeatures) -> ValidationResult {
        let checks = [
            self.validate_area(features.constructed_area),
            self.validate_distance("distance_to_city_center", features.distance_to_city_center),
            self.validate_distance("distance_to_city_metro", features.distance_to_city_metro),
            self.validate_distance(
                "distance_to_city_castellana",
                features.distance_to_city_castellana,
            ),
            self.validate_int("number_of_rooms", features.number_of_rooms, self.config.room_range),
            self.validate_int(
                "number_of_bathrooms",
                features.number_of_bathrooms,
                self.config.bathroom_range,
            ),
            self.validate_int("floorclean", features.floorclean, self.config.floor_range),
            self.validate_int(
                "constructed_year",
                features.constructed_year,
                self.config.constructed_year_range,
            ),
            self.validate_text("location", &features.location),
            self.validate_text("district", &features.district),
        ];

        let fields_checked = checks.len();
        let errors: Vec<ValidationError> = checks.into_iter().filter_map(Result::err).collect();

        if errors.is_empty() {
            ValidationResult::valid(fields_checked)
        } else {
            debug!("Property rejected with {} validation errors", errors.len());
            ValidationResult::invalid(errors, fields_checked)
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
