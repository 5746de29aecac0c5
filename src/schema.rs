//! Column names of the property-sales snapshot.
//!
//! Names are the post-normalization forms: the loader trims surrounding
//! whitespace from snapshot headers before matching, so these constants are
//! the only spellings the rest of the crate ever sees.

pub const LOCALITY: &str = "Property locality";
pub const PRIMARY_PURPOSE: &str = "Primary purpose";
pub const CONTRACT_DATE: &str = "Contract date";
pub const CONTRACT_YEAR: &str = "Contract year";
pub const CONTRACT_MONTH: &str = "Contract month";
pub const PURCHASE_PRICE: &str = "Purchase price";
pub const AREA: &str = "Area";
pub const POST_CODE: &str = "Property post code";

/// Columns that must be present in a snapshot for loading to succeed.
/// `Contract year` / `Contract month` are not listed: they are taken from
/// the snapshot when present and derived from the contract date otherwise.
pub const REQUIRED: &[&str] = &[
    LOCALITY,
    PRIMARY_PURPOSE,
    CONTRACT_DATE,
    PURCHASE_PRICE,
    AREA,
    POST_CODE,
];
