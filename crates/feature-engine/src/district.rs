//! Madrid District Set

use crate::canonical::canonicalize;
use crate::error::EncodingError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix of the one-hot district columns
pub const DISTRICT_PREFIX: &str = "DISTRICTS_";

/// Number of districts (and district indicator columns)
pub const DISTRICT_COUNT: usize = 21;

/// The 21 administrative districts of Madrid.
///
/// Declaration order is the column order of the trained model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum District {
    Arganzuela,
    Barajas,
    Carabanchel,
    Centro,
    Chamartin,
    Chamberi,
    CiudadLineal,
    FuencarralElPardo,
    Hortaleza,
    Latina,
    MoncloaAravaca,
    Moratalaz,
    PuenteDeVallecas,
    Retiro,
    Salamanca,
    SanBlasCanillejas,
    Tetuan,
    Usera,
    Vicalvaro,
    VillaDeVallecas,
    Villaverde,
}

impl District {
    /// All districts in column order
    pub const ALL: [District; DISTRICT_COUNT] = [
        District::Arganzuela,
        District::Barajas,
        District::Carabanchel,
        District::Centro,
        District::Chamartin,
        District::Chamberi,
        District::CiudadLineal,
        District::FuencarralElPardo,
        District::Hortaleza,
        District::Latina,
        District::MoncloaAravaca,
        District::Moratalaz,
        District::PuenteDeVallecas,
        District::Retiro,
        District::Salamanca,
        District::SanBlasCanillejas,
        District::Tetuan,
        District::Usera,
        District::Vicalvaro,
        District::VillaDeVallecas,
        District::Villaverde,
    ];

    /// Canonical (accent-stripped, uppercase) district name
    pub fn canonical_name(&self) -> &'static str {
        match self {
            District::Arganzuela => "ARGANZUELA",
            District::Barajas => "BARAJAS",
            District::Carabanchel => "CARABANCHEL",
            District::Centro => "CENTRO",
            District::Chamartin => "CHAMARTIN",
            District::Chamberi => "CHAMBERI",
            District::CiudadLineal => "CIUDAD LINEAL",
            District::FuencarralElPardo => "FUENCARRAL-EL PARDO",
            District::Hortaleza => "HORTALEZA",
            District::Latina => "LATINA",
            District::MoncloaAravaca => "MONCLOA-ARAVACA",
            District::Moratalaz => "MORATALAZ",
            District::PuenteDeVallecas => "PUENTE DE VALLECAS",
            District::Retiro => "RETIRO",
            District::Salamanca => "SALAMANCA",
            District::SanBlasCanillejas => "SAN BLAS-CANILLEJAS",
            District::Tetuan => "TETUAN",
            District::Usera => "USERA",
            District::Vicalvaro => "VICALVARO",
            District::VillaDeVallecas => "VILLA DE VALLECAS",
            District::Villaverde => "VILLAVERDE",
        }
    }

    /// Name of the one-hot column for this district
    pub fn column_name(&self) -> &'static str {
        DISTRICT_COLUMNS[self.index()]
    }

    /// Position of this district among the district indicator columns
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Resolve a district from a canonical column string (`DISTRICTS_RETIRO`)
    pub fn from_column(column: &str) -> Option<District> {
        DISTRICT_COLUMNS
            .iter()
            .position(|c| *c == column)
            .map(|idx| District::ALL[idx])
    }

    /// Resolve a district from free text.
    ///
    /// On failure the error carries the prefixed canonical string that was
    /// looked up, e.g. `DISTRICTS_ATLANTIS`.
    pub fn resolve(name: &str) -> Result<District, EncodingError> {
        let column = canonical_column(name);
        District::from_column(&column).ok_or(EncodingError::UnknownDistrict(column))
    }
}

impl fmt::Display for District {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// Canonical column string for a free-text district name
pub fn canonical_column(name: &str) -> String {
    format!("{}{}", DISTRICT_PREFIX, canonicalize(name))
}

/// District indicator column names in model order
pub const DISTRICT_COLUMNS: [&str; DISTRICT_COUNT] = [
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
