#![warn(clippy::all)]

//! World Outline Map - an interactive world map.
//!
//! Countries can be highlighted by initial letter, the map pans and zooms,
//! and a timed round asks the player to find every country starting with a
//! random letter.

use world_outline_map::app::{MapApp, MapData};

#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_TOPOLOGY_PATH: &str = "data/countries-110m.json";
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_REFERENCE_PATH: &str = "data/country-population.json";
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_CONFIG_PATH: &str = "data/map-config.json";
#[cfg(not(target_arch = "wasm32"))]
const DEFAULT_SCORE_PATH: &str = "best-score.json";

// Native entry point
#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    use std::path::Path;
    use world_outline_map::config::MapConfig;
    use world_outline_map::storage::FileScoreStore;

    env_logger::init();

    // Positional: topology, reference, config, best-score file
    let args: Vec<String> = std::env::args().skip(1).collect();
    let arg = |i: usize, default: &'static str| -> String {
        args.get(i).cloned().unwrap_or_else(|| default.to_string())
    };
    let topology_path = arg(0, DEFAULT_TOPOLOGY_PATH);
    let reference_path = arg(1, DEFAULT_REFERENCE_PATH);
    let config_path = arg(2, DEFAULT_CONFIG_PATH);
    let score_path = arg(3, DEFAULT_SCORE_PATH);

    let data = std::fs::read_to_string(&topology_path)
        .map_err(|e| format!("Failed to read {}: {}", topology_path, e))
        .and_then(|topology| {
            let reference = match std::fs::read_to_string(&reference_path) {
                Ok(reference) => Some(reference),
                Err(e) => {
                    log::warn!("Failed to read {}: {}", reference_path, e);
                    None
                }
            };
            MapData::from_sources(&topology, reference.as_deref(), None)
                .map_err(|e| e.to_string())
        })
        .map(|mut data| {
            data.config = MapConfig::load_or_default(Path::new(&config_path));
            data
        });

    let native_options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "World Outline Map",
        native_options,
        Box::new(move |cc| {
            Ok(Box::new(MapApp::new(
                cc,
                data,
                Box::new(FileScoreStore::new(score_path)),
            )))
        }),
    )
}

// WASM entry point - main is not called on wasm32
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(target_arch = "wasm32")]
const TOPOLOGY_URL: &str = "data/countries-110m.json";
#[cfg(target_arch = "wasm32")]
const REFERENCE_URL: &str = "data/country-population.json";
#[cfg(target_arch = "wasm32")]
const CONFIG_URL: &str = "data/map-config.json";

/// Fetches a text document relative to the page.
#[cfg(target_arch = "wasm32")]
async fn fetch_text(url: &str) -> Result<String, String> {
    use eframe::wasm_bindgen::JsCast as _;
    use wasm_bindgen_futures::JsFuture;

    let window = web_sys::window().ok_or("No window")?;
    let response = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| format!("Failed to fetch {}: {:?}", url, e))?
        .dyn_into::<web_sys::Response>()
        .map_err(|_| format!("Unexpected fetch result for {}", url))?;

    if !response.ok() {
        return Err(format!("Failed to fetch {}: HTTP {}", url, response.status()));
    }

    let text = response
        .text()
        .map_err(|e| format!("Failed to read {}: {:?}", url, e))?;
    JsFuture::from(text)
        .await
        .map_err(|e| format!("Failed to read {}: {:?}", url, e))?
        .as_string()
        .ok_or_else(|| format!("{} did not return text", url))
}

/// Entry point for the WASM application.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen::prelude::wasm_bindgen(start)]
pub async fn start() {
    use eframe::wasm_bindgen::JsCast as _;
    use world_outline_map::storage::LocalScoreStore;

    // Redirect `log` messages to `console.log`:
    eframe::WebLogger::init(log::LevelFilter::Debug).ok();

    let web_options = eframe::WebOptions::default();

    wasm_bindgen_futures::spawn_local(async {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            log::error!("No document to mount the app in");
            return;
        };

        let Some(canvas) = document
            .get_element_by_id("app_canvas")
            .and_then(|e| e.dyn_into::<web_sys::HtmlCanvasElement>().ok())
        else {
            log::error!("app_canvas is missing or is not a canvas");
            return;
        };

        let reference = fetch_text(REFERENCE_URL)
            .await
            .map_err(|e| log::warn!("{}", e))
            .ok();
        let config = fetch_text(CONFIG_URL)
            .await
            .map_err(|e| log::info!("{}; using default config", e))
            .ok();
        let data = match fetch_text(TOPOLOGY_URL).await {
            Ok(topology) => {
                MapData::from_sources(&topology, reference.as_deref(), config.as_deref())
                    .map_err(|e| e.to_string())
            }
            Err(e) => Err(e),
        };

        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| {
                    Ok(Box::new(MapApp::new(
                        cc,
                        data,
                        Box::new(LocalScoreStore::new()),
                    )))
                }),
            )
            .await;

        // Remove the loading text once the app has loaded:
        if let Some(loading_text) = document.get_element_by_id("loading_text") {
            match start_result {
                Ok(_) => {
                    loading_text.remove();
                }
                Err(e) => {
                    loading_text.set_inner_html(
                        "<p>The map has crashed. See the developer console for details.</p>",
                    );
                    log::error!("Failed to start eframe: {e:?}");
                }
            }
        }
    });
}
