//! Initial-letter highlight state.
//!
//! Colors are handed out in insertion order from a fixed palette: the n-th
//! letter added (counting since the last clear) gets `palette[n % len]`.
//! Removing and re-adding a letter therefore gives it the next slot, not its
//! old color.

use crate::data::parse_initial;
use eframe::egui::Color32;
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
pub struct HighlightState {
    palette: Vec<Color32>,
    /// Active letters and their colors
    initial_colors: BTreeMap<char, Color32>,
    /// Number of colors handed out since the last clear
    color_cursor: usize,
    /// Most recently added letter, if still active
    active_initial: Option<char>,
}

impl HighlightState {
    /// Creates an empty state; an empty palette falls back to the default.
    pub fn new(palette: Vec<Color32>) -> Self {
        let palette = if palette.is_empty() {
            crate::config::parse_palette(&[])
        } else {
            palette
        };
        Self {
            palette,
            initial_colors: BTreeMap::new(),
            color_cursor: 0,
            active_initial: None,
        }
    }

    /// Highlights a letter with the next palette color.
    ///
    /// Anything but a single lowercase letter, or a letter that is already
    /// highlighted, is ignored.
    pub fn add_initial(&mut self, input: &str) -> bool {
        let Some(letter) = parse_initial(input) else {
            return false;
        };
        if self.initial_colors.contains_key(&letter) {
            return false;
        }
        let color = self.palette[self.color_cursor % self.palette.len()];
        self.color_cursor += 1;
        self.initial_colors.insert(letter, color);
        self.active_initial = Some(letter);
        true
    }

    pub fn remove_initial(&mut self, input: &str) -> bool {
        let Some(letter) = parse_initial(input) else {
            return false;
        };
        if self.initial_colors.remove(&letter).is_none() {
            return false;
        }
        if self.active_initial == Some(letter) {
            self.active_initial = None;
        }
        true
    }

    pub fn toggle_initial(&mut self, input: &str) -> bool {
        match parse_initial(input) {
            Some(letter) if self.initial_colors.contains_key(&letter) => self.remove_initial(input),
            Some(_) => self.add_initial(input),
            None => false,
        }
    }

    pub fn clear_highlights(&mut self) -> bool {
        if self.initial_colors.is_empty() {
            return false;
        }
        self.initial_colors.clear();
        self.color_cursor = 0;
        self.active_initial = None;
        true
    }

    pub fn color_for(&self, initial: char) -> Option<Color32> {
        self.initial_colors.get(&initial).copied()
    }

    /// Highlight color of a country name, by its initial.
    pub fn color_for_name(&self, name: &str) -> Option<Color32> {
        crate::data::initial_of(name).and_then(|c| self.color_for(c))
    }

    pub fn is_active(&self, initial: char) -> bool {
        self.initial_colors.contains_key(&initial)
    }

    pub fn is_empty(&self) -> bool {
        self.initial_colors.is_empty()
    }

    /// Active letters with their colors, alphabetically.
    pub fn initials(&self) -> impl Iterator<Item = (char, Color32)> + '_ {
        self.initial_colors.iter().map(|(c, color)| (*c, *color))
    }

    pub fn color_cursor(&self) -> usize {
        self.color_cursor
    }

    pub fn active_initial(&self) -> Option<char> {
        self.active_initial
    }
}
