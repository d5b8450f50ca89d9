//! World Outline Map: a world map engine with initial-letter highlighting,
//! pan/zoom, a timed country-finding game and best-score persistence.

pub mod app;
pub mod config;
pub mod data;
pub mod geo;
pub mod render;
pub mod state;
pub mod storage;
pub mod ui;
