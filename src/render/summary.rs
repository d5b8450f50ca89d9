//! Side-panel summary of highlighted countries.

use eframe::egui::Color32;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEntry {
    pub id: String,
    pub name: String,
    /// Name prefixed with the flag glyph when known
    pub display_text: String,
    pub color: Color32,
    /// Population with its year, or "N/A"
    pub population: String,
    pub native_name: Option<String>,
    pub leader: Option<String>,
    pub leader_source: Option<String>,
    pub capital: Option<String>,
    /// Found in the current round
    pub found: bool,
}

/// Sorts entries alphabetically by name (case-insensitive), then by id.
pub fn sort_summary(entries: &mut [SummaryEntry]) {
    entries.sort_by(compare_entries);
}

fn compare_entries(a: &SummaryEntry, b: &SummaryEntry) -> Ordering {
    a.name
        .to_lowercase()
        .cmp(&b.name.to_lowercase())
        .then_with(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn entry(id: &str, name: &str) -> SummaryEntry {
        SummaryEntry {
            id: id.to_string(),
            name: name.to_string(),
            display_text: name.to_string(),
            color: Color32::RED,
            population: "N/A".to_string(),
            native_name: None,
            leader: None,
            leader_source: None,
            capital: None,
            found: false,
        }
    }

    #[test]
    fn test_sorted_case_insensitively() {
        let mut entries = vec![
            entry("3", "chad"),
            entry("1", "Cuba"),
            entry("2", "Canada"),
            entry("0", "Chad"),
        ];
        sort_summary(&mut entries);
        let ids: Vec<&str> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "0", "3", "1"]);
    }
}
