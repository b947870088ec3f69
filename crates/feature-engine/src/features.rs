//! Feature Vector Assembly

use crate::district::{District, DISTRICT_COUNT};
use crate::error::EncodingError;
use crate::location::{LocationGroup, LocationGroupMap, LOCATION_GROUP_COUNT};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

/// Number of direct numeric and boolean columns
pub const NUMERIC_DIMENSION: usize = 12;

/// Number of continuous columns handled by the scaler
pub const CONTINUOUS_DIMENSION: usize = 8;

/// Total width of the model input row
pub const FEATURE_DIMENSION: usize = NUMERIC_DIMENSION + LOCATION_GROUP_COUNT + DISTRICT_COUNT;

/// Property description received from a client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyFeatures {
    /// Total constructed area in square meters
    pub constructed_area: f64,
    #[serde(deserialize_with = "deserialize_flag", serialize_with = "serialize_flag")]
    pub has_terrace: bool,
    #[serde(deserialize_with = "deserialize_flag", serialize_with = "serialize_flag")]
    pub is_parkingspace_included: bool,
    pub number_of_rooms: u32,
    pub number_of_bathrooms: u32,
    #[serde(deserialize_with = "deserialize_flag", serialize_with = "serialize_flag")]
    pub has_swimming_pool: bool,
    #[serde(deserialize_with = "deserialize_flag", serialize_with = "serialize_flag")]
    pub is_top_floor: bool,
    pub distance_to_city_center: f64,
    pub distance_to_city_metro: f64,
    pub distance_to_city_castellana: f64,
    /// Fed to the model's `CADMAXBUILDINGFLOOR` column
    pub constructed_year: i32,
    /// Cleaned floor number
    pub floorclean: i32,
    /// Neighbourhood name, free text
    pub location: String,
    /// District name, free text
    pub district: String,
}

/// A property with its observed price, used for offline evaluation
#[derive(Debug, Clone, PartialEq)]
pub struct LabelledSample {
    pub features: PropertyFeatures,
    /// Observed price in euros
    pub price: f64,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Bool(bool),
    Int(i64),
}

/// Accept `true`/`false` as well as the `0`/`1` encoding clients send
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match RawFlag::deserialize(deserializer)? {
        RawFlag::Bool(value) => Ok(value),
        RawFlag::Int(0) => Ok(false),
        RawFlag::Int(1) => Ok(true),
        RawFlag::Int(other) => Err(D::Error::custom(format!(
            "flag must be 0 or 1, got {}",
            other
        ))),
    }
}

fn serialize_flag<S>(value: &bool, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_u8(u8::from(*value))
}

/// Continuous column, in the order the scaler was fitted on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContinuousColumn {
    ConstructedArea,
    MaxBuildingFloor,
    DistanceToCityCenter,
    DistanceToMetro,
    DistanceToCastellana,
    RoomNumber,
    BathNumber,
    FloorClean,
}

impl ContinuousColumn {
    /// All continuous columns in scaler order
    pub const ALL: [ContinuousColumn; CONTINUOUS_DIMENSION] = [
        ContinuousColumn::ConstructedArea,
        ContinuousColumn::MaxBuildingFloor,
        ContinuousColumn::DistanceToCityCenter,
        ContinuousColumn::DistanceToMetro,
        ContinuousColumn::DistanceToCastellana,
        ContinuousColumn::RoomNumber,
        ContinuousColumn::BathNumber,
        ContinuousColumn::FloorClean,
    ];

    /// Position in scaler order
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Column name as seen by the scaler and the model
    pub fn name(&self) -> &'static str {
        match self {
            ContinuousColumn::ConstructedArea => "CONSTRUCTEDAREA",
            ContinuousColumn::MaxBuildingFloor => "CADMAXBUILDINGFLOOR",
            ContinuousColumn::DistanceToCityCenter => "DISTANCE_TO_CITY_CENTER",
            ContinuousColumn::DistanceToMetro => "DISTANCE_TO_METRO",
            ContinuousColumn::DistanceToCastellana => "DISTANCE_TO_CASTELLANA",
            ContinuousColumn::RoomNumber => "ROOMNUMBER",
            ContinuousColumn::BathNumber => "BATHNUMBER",
            ContinuousColumn::FloorClean => "FLOORCLEAN",
        }
    }
}

/// The eight continuous values of a feature vector
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ContinuousFeatures {
    pub constructed_area: f64,
    pub max_building_floor: f64,
    pub distance_to_city_center: f64,
    pub distance_to_metro: f64,
    pub distance_to_castellana: f64,
    pub room_number: f64,
    pub bath_number: f64,
    pub floor_clean: f64,
}

impl ContinuousFeatures {
    /// Values in scaler order
    pub fn to_array(&self) -> [f64; CONTINUOUS_DIMENSION] {
        [
            self.constructed_area,
            self.max_building_floor,
            self.distance_to_city_center,
            self.distance_to_metro,
            self.distance_to_castellana,
            self.room_number,
            self.bath_number,
            self.floor_clean,
        ]
    }

    /// Rebuild from values in scaler order
    pub fn from_array(values: [f64; CONTINUOUS_DIMENSION]) -> Self {
        let [
            constructed_area,
            max_building_floor,
            distance_to_city_center,
            distance_to_metro,
            distance_to_castellana,
            room_number,
            bath_number,
            floor_clean,
        ] = values;
        Self {
            constructed_area,
            max_building_floor,
            distance_to_city_center,
            distance_to_metro,
            distance_to_castellana,
            room_number,
            bath_number,
            floor_clean,
        }
    }
}

/// Boolean columns, never scaled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct BinaryFeatures {
    pub has_terrace: bool,
    pub is_parking_included: bool,
    pub has_swimming_pool: bool,
    pub is_top_floor: bool,
}

/// Encoded property, ready for scaling and inference.
///
/// The one-hot location and district blocks are stored as the selected
/// category, so a vector with zero or two active indicators cannot be built.
/// [`FeatureVector::to_row`] expands it into the model's column order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureVector {
    pub continuous: ContinuousFeatures,
    pub binary: BinaryFeatures,
    pub location_group: LocationGroup,
    pub district: District,
}

impl FeatureVector {
    /// Column names of [`FeatureVector::to_row`], in model order
    pub const COLUMNS: [&'static str; FEATURE_DIMENSION] = [
        "CONSTRUCTEDAREA",
        "HASTERRACE",
        "ISPARKINGSPACEINCLUDEDINPRICE",
        "ROOMNUMBER",
        "BATHNUMBER",
        "HASSWIMMINGPOOL",
        "ISINTOPFLOOR",
        "DISTANCE_TO_CITY_CENTER",
        "DISTANCE_TO_METRO",
        "DISTANCE_TO_CASTELLANA",
        "CADMAXBUILDINGFLOOR",
        "FLOORCLEAN",
        "LOCATIONNAME_0",
        "LOCATIONNAME_1",
        "LOCATIONNAME_2",
        "LOCATIONNAME_3",
        "LOCATIONNAME_4",
        "LOCATIONNAME_5",
        "LOCATIONNAME_6",
        "LOCATIONNAME_7",
        "LOCATIONNAME_8",
        "LOCATIONNAME_9",
        "DISTRICTS_ARGANZUELA",
        "DISTRICTS_BARAJAS",
        "DISTRICTS_CARABANCHEL",
        "DISTRICTS_CENTRO",
        "DISTRICTS_CHAMARTIN",
        "DISTRICTS_CHAMBERI",
        "DISTRICTS_CIUDAD LINEAL",
        "DISTRICTS_FUENCARRAL-EL PARDO",
        "DISTRICTS_HORTALEZA",
        "DISTRICTS_LATINA",
        "DISTRICTS_MONCLOA-ARAVACA",
        "DISTRICTS_MORATALAZ",
        "DISTRICTS_PUENTE DE VALLECAS",
        "DISTRICTS_RETIRO",
        "DISTRICTS_SALAMANCA",
        "DISTRICTS_SAN BLAS-CANILLEJAS",
        "DISTRICTS_TETUAN",
        "DISTRICTS_USERA",
        "DISTRICTS_VICALVARO",
        "DISTRICTS_VILLA DE VALLECAS",
        "DISTRICTS_VILLAVERDE",
    ];

    /// Offset of the first location indicator in the row
    pub const LOCATION_OFFSET: usize = NUMERIC_DIMENSION;

    /// Offset of the first district indicator in the row
    pub const DISTRICT_OFFSET: usize = NUMERIC_DIMENSION + LOCATION_GROUP_COUNT;

    /// Expand into the model's input row
    pub fn to_row(&self) -> [f64; FEATURE_DIMENSION] {
        let c = &self.continuous;
        let b = &self.binary;
        let mut row = [0.0; FEATURE_DIMENSION];

        row[0] = c.constructed_area;
        row[1] = flag(b.has_terrace);
        row[2] = flag(b.is_parking_included);
        row[3] = c.room_number;
        row[4] = c.bath_number;
        row[5] = flag(b.has_swimming_pool);
        row[6] = flag(b.is_top_floor);
        row[7] = c.distance_to_city_center;
        row[8] = c.distance_to_metro;
        row[9] = c.distance_to_castellana;
        row[10] = c.max_building_floor;
        row[11] = c.floor_clean;
        row[Self::LOCATION_OFFSET + self.location_group.index()] = 1.0;
        row[Self::DISTRICT_OFFSET + self.district.index()] = 1.0;

        row
    }
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Encodes property descriptions against a fixed location group map
#[derive(Debug, Clone)]
pub struct FeatureEncoder {
    locations: LocationGroupMap,
}

impl FeatureEncoder {
    /// Create a new encoder
    pub fn new(locations: LocationGroupMap) -> Self {
        Self { locations }
    }

    /// Location group map backing this encoder
    pub fn locations(&self) -> &LocationGroupMap {
        &self.locations
    }

    /// Encode a property into an unscaled feature vector.
    ///
    /// The location is resolved before the district, so a request with both
    /// wrong reports the location.
    pub fn encode(&self, features: &PropertyFeatures) -> Result<FeatureVector, EncodingError> {
        let location_group = self.locations.resolve(&features.location)?;
        let district = District::resolve(&features.district)?;

        debug!(
            "Encoded property: location group {}, district {}",
            location_group, district
        );

        Ok(FeatureVector {
            continuous: ContinuousFeatures {
                constructed_area: features.constructed_area,
                max_building_floor: f64::from(features.constructed_year),
                distance_to_city_center: features.distance_to_city_center,
                distance_to_metro: features.distance_to_city_metro,
                distance_to_castellana: features.distance_to_city_castellana,
                room_number: f64::from(features.number_of_rooms),
                bath_number: f64::from(features.number_of_bathrooms),
                floor_clean: f64::from(features.floorclean),
            },
            binary: BinaryFeatures {
                has_terrace: features.has_terrace,
                is_parking_included: features.is_parkingspace_included,
                has_swimming_pool: features.has_swimming_pool,
                is_top_floor: features.is_top_floor,
            },
            location_group,
            district,
        })
    }
}
