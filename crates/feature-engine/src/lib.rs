//! Feature Engineering Engine
//!
//! Turns a property description into the fixed 43-column row the price
//! model was trained on: text canonicalization, location and district
//! one-hot encoding, and standard scaling of the continuous columns.

mod canonical;
mod district;
mod error;
mod features;
mod location;
mod scaler;

pub use canonical::canonicalize;
pub use district::{canonical_column, District, DISTRICT_COLUMNS, DISTRICT_COUNT, DISTRICT_PREFIX};
pub use error::{ArtifactError, EncodingError};
pub use features::{
    deserialize_flag, BinaryFeatures, ContinuousColumn, ContinuousFeatures, FeatureEncoder,
    FeatureVector, LabelledSample, PropertyFeatures, CONTINUOUS_DIMENSION, FEATURE_DIMENSION,
    NUMERIC_DIMENSION,
};
pub use location::{LocationGroup, LocationGroupMap, LOCATION_COLUMNS, LOCATION_GROUP_COUNT};
pub use scaler::{ScaledFeatures, ScalerArtifact, StandardScaler};
