//! Country identifiers and the read-only reference dataset.
//!
//! - `keys`: id normalization and initial-letter helpers shared by the
//!   topology loader, the reference loader and the game
//! - `reference`: typed, validated per-country records (population, capital,
//!   leader, flag)

pub mod keys;
pub mod reference;

pub use keys::{initial_of, normalize_country_id, normalize_json_id, parse_initial};
pub use reference::{
    format_population, sanitize_image_url, thumbnail_url, Capital, CountryReferenceRecord, Leader,
    LeaderRole, ReferenceData,
};
