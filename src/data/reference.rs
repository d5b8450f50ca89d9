//! Country reference records: population, capital, leader and flag.
//!
//! The dataset is a JSON object keyed by country id. Every field of a record
//! is optional; records are validated once here so the render pipeline only
//! ever sees typed values with `None` for anything missing or unusable.

use super::keys::normalize_country_id;
use crate::geo::MapDataError;
use geo_types::Coord;
use serde_json::{Map, Value};
use std::collections::HashMap;
use url::Url;

/// Hosts leader images may be loaded from.
pub const ALLOWED_IMAGE_HOSTS: [&str; 2] = ["commons.wikimedia.org", "upload.wikimedia.org"];

/// Role of a country's listed leader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderRole {
    HeadOfGovernment,
    HeadOfState,
    Other(String),
}

impl LeaderRole {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "" => None,
            "head_of_government" => Some(Self::HeadOfGovernment),
            "head_of_state" => Some(Self::HeadOfState),
            other => Some(Self::Other(other.to_string())),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::HeadOfGovernment => "Head of government",
            Self::HeadOfState => "Head of state",
            Self::Other(role) => role,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Leader {
    pub name: String,
    pub role: Option<LeaderRole>,
    /// Validated image URL (see [`sanitize_image_url`])
    pub image_url: Option<Url>,
    /// Where the leader entry came from, e.g. "wikidata"
    pub source: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Capital {
    pub name: String,
    /// Capital location as (lon, lat)
    pub location: Option<Coord<f64>>,
}

/// Validated reference data for one country.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryReferenceRecord {
    /// Latest population, only present when positive
    pub population: Option<u64>,
    /// Year the population figure refers to
    pub year: Option<String>,
    pub flag: Option<String>,
    pub native_name: Option<String>,
    pub capital: Option<Capital>,
    pub leader: Option<Leader>,
}

impl CountryReferenceRecord {
    /// Builds a record field by field. A field with the wrong JSON type is
    /// dropped on its own; the rest of the record still loads.
    fn from_object(id: &str, obj: &Map<String, Value>) -> Self {
        let fields = Fields { id, obj };

        let capital = fields.string("capital").map(|name| Capital {
            name,
            location: match (fields.number("capitalLng"), fields.number("capitalLat")) {
                (Some(lon), Some(lat)) => Some(Coord { x: lon, y: lat }),
                _ => None,
            },
        });

        let leader = fields.string("leaderName").map(|name| Leader {
            name,
            role: fields
                .string("leaderRole")
                .as_deref()
                .and_then(LeaderRole::parse),
            image_url: fields
                .string("leaderImageUrl")
                .as_deref()
                .and_then(sanitize_image_url),
            source: fields.string("leaderSource"),
        });

        Self {
            population: fields
                .number("population")
                .filter(|p| *p >= 1.0)
                .map(|p| p as u64),
            year: match obj.get("year") {
                Some(Value::Number(n)) => Some(n.to_string()),
                _ => fields.string("year"),
            },
            flag: fields.string("flagEmoji"),
            native_name: fields.string("nativeName"),
            capital,
            leader,
        }
    }

    /// Population formatted for display with its year, or "N/A".
    pub fn population_text(&self) -> String {
        match (self.population, &self.year) {
            (Some(_), Some(year)) => format!("{} ({})", format_population(self.population), year),
            _ => format_population(self.population),
        }
    }

    /// Leader name with role, e.g. "Jane Doe (Head of state)".
    pub fn leader_text(&self) -> Option<String> {
        self.leader.as_ref().map(|leader| match &leader.role {
            Some(role) => format!("{} ({})", leader.name, role.label()),
            None => leader.name.clone(),
        })
    }
}

/// Typed access to the fields of one raw record.
struct Fields<'a> {
    id: &'a str,
    obj: &'a Map<String, Value>,
}

impl Fields<'_> {
    /// Trimmed non-empty string; `null` and missing fields are `None`.
    fn string(&self, key: &str) -> Option<String> {
        match self.obj.get(key)? {
            Value::Null => None,
            Value::String(s) => non_empty(Some(s.clone())),
            other => {
                self.reject(key, other);
                None
            }
        }
    }

    /// Finite number; `null` and missing fields are `None`.
    fn number(&self, key: &str) -> Option<f64> {
        match self.obj.get(key)? {
            Value::Null => None,
            Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
            other => {
                self.reject(key, other);
                None
            }
        }
    }

    fn reject(&self, key: &str, value: &Value) {
        log::debug!(
            "Ignoring reference field {:?} of country {}: unexpected value {}",
            key,
            self.id,
            value
        );
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Reference records keyed by normalized country id.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    records: HashMap<String, CountryReferenceRecord>,
}

impl ReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses and validates the reference dataset.
    pub fn from_json_str(json: &str) -> Result<Self, MapDataError> {
        let raw: Map<String, Value> =
            serde_json::from_str(json).map_err(|e| MapDataError::Reference(e.to_string()))?;

        let mut records = HashMap::with_capacity(raw.len());
        for (id, value) in &raw {
            let Value::Object(obj) = value else {
                log::debug!("Skipping reference record {}: not an object", id);
                continue;
            };
            records.insert(
                normalize_country_id(id),
                CountryReferenceRecord::from_object(id, obj),
            );
        }

        log::info!("Loaded {} country reference records", records.len());
        Ok(Self { records })
    }

    pub fn insert(&mut self, id: &str, record: CountryReferenceRecord) {
        self.records.insert(normalize_country_id(id), record);
    }

    pub fn get(&self, id: &str) -> Option<&CountryReferenceRecord> {
        self.records.get(&normalize_country_id(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Validates an external image URL.
///
/// `http` is upgraded to `https`; anything that is not `https` on an allowed
/// host is rejected.
pub fn sanitize_image_url(raw: &str) -> Option<Url> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let normalized = match trimmed.strip_prefix("http://") {
        Some(rest) => format!("https://{}", rest),
        None => trimmed.to_string(),
    };

    let url = match Url::parse(&normalized) {
        Ok(url) => url,
        Err(e) => {
            log::debug!("Rejected image URL {:?}: {}", raw, e);
            return None;
        }
    };

    let host_allowed = url
        .host_str()
        .map(|host| {
            ALLOWED_IMAGE_HOSTS
                .iter()
                .any(|allowed| host.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false);

    if url.scheme() != "https" || !host_allowed {
        log::debug!("Rejected image URL {:?}: host not allowed", raw);
        return None;
    }

    Some(url)
}

/// Returns `url` with its `width` query parameter set to `width`.
pub fn thumbnail_url(url: &Url, width: u32) -> Url {
    let mut out = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(k, _)| k != "width")
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    out.query_pairs_mut()
        .clear()
        .extend_pairs(pairs)
        .append_pair("width", &width.to_string());
    out
}

/// Formats a population with thousands separators, or "N/A".
pub fn format_population(population: Option<u64>) -> String {
    let Some(population) = population else {
        return "N/A".to_string();
    };

    let digits = population.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
