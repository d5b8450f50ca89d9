//! Interaction state.
//!
//! Everything a map instance mutates in response to input lives in one
//! [`MapSession`], owned by the app and passed by reference to the UI and
//! the render pipeline. Each map instance owns its own session.

mod game;
mod gesture;
mod highlight;
mod view;

pub use game::{CountdownTimer, Game, GameRound, GuessOutcome, RoundStatus};
pub use gesture::DragGesture;
pub use highlight::HighlightState;
pub use view::{PanZoomController, ViewTransform};

use crate::config::{parse_palette, MapConfig};
use crate::geo::{CountryGeometry, CountryShape};
use crate::storage::{BestScore, ScoreStore};
use eframe::egui::Vec2;
use rand::Rng;
use web_time::Instant;

/// Mutable state of one map instance.
pub struct MapSession {
    /// Zoom and pan
    pub view: PanZoomController,

    /// Highlighted initials and their colors
    pub highlight: HighlightState,

    /// Current game round and countdown
    pub game: Game,

    /// Best score, persisted through its store
    pub best_score: BestScore,

    /// Pointer drag tracking for the canvas
    pub drag: DragGesture,
}

impl MapSession {
    pub fn new(config: &MapConfig, viewport: Vec2, store: Box<dyn ScoreStore>) -> Self {
        Self {
            view: PanZoomController::new(&config.zoom, viewport),
            highlight: HighlightState::new(parse_palette(&config.style.palette)),
            game: Game::new(config.game.clone()),
            best_score: BestScore::load(store),
            drag: DragGesture::new(&config.zoom),
        }
    }

    /// Clears highlights and starts a round over the visible countries.
    pub fn start_round<R: Rng + ?Sized>(
        &mut self,
        geometry: &CountryGeometry,
        now: Instant,
        rng: &mut R,
    ) -> bool {
        self.highlight.clear_highlights();
        let countries = geometry
            .countries
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()));
        self.game.start_round(countries, now, rng)
    }

    /// Applies a guess and records any new best score.
    pub fn guess(&mut self, id: &str, name: &str) -> GuessOutcome {
        let outcome = self.game.process_guess(id, name);
        if outcome.changes_score() {
            self.best_score.observe(self.game.round().score);
        }
        outcome
    }

    /// Click on a country: a guess while a round runs, otherwise toggles
    /// the country's initial.
    pub fn click_country(&mut self, country: &CountryShape) -> bool {
        if self.game.round().is_running() {
            return self.guess(&country.id, &country.name) != GuessOutcome::Ignored;
        }
        match country.initial {
            Some(initial) => self.highlight.toggle_initial(&initial.to_string()),
            None => false,
        }
    }

    /// Advances the countdown.
    pub fn poll_timer(&mut self, now: Instant) -> bool {
        self.game.poll_timer(now)
    }

    pub fn reset_round(&mut self) -> bool {
        self.game.reset_round()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::topology::tests::TWO_SQUARES;
    use crate::geo::Topology;
    use crate::storage::MemoryScoreStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn geometry() -> CountryGeometry {
        let mut config = MapConfig::default();
        config.exclusions.include_fallback_territories = false;
        let topology = Topology::from_json_str(TWO_SQUARES).unwrap();
        CountryGeometry::build(&topology, 200.0, 100.0, &config).unwrap()
    }

    fn session(store: MemoryScoreStore) -> MapSession {
        MapSession::new(
            &MapConfig::default(),
            Vec2::new(200.0, 100.0),
            Box::new(store),
        )
    }

    #[test]
    fn test_click_toggles_highlight_when_idle() {
        let geometry = geometry();
        let mut s = session(MemoryScoreStore::new());
        let alpha = geometry.country("004").unwrap();
        assert!(s.click_country(alpha));
        assert!(s.highlight.is_active('a'));
        assert!(s.click_country(alpha));
        assert!(!s.highlight.is_active('a'));
    }

    #[test]
    fn test_start_round_clears_highlights() {
        let geometry = geometry();
        let mut s = session(MemoryScoreStore::new());
        s.highlight.add_initial("b");
        let mut rng = StdRng::seed_from_u64(3);
        assert!(s.start_round(&geometry, Instant::now(), &mut rng));
        assert!(s.highlight.is_empty());
        assert!(s.game.round().is_running());
    }

    #[test]
    fn test_guess_updates_best_score() {
        let geometry = geometry();
        let store = MemoryScoreStore::with_value(5);
        let mut s = session(store.clone());
        let mut rng = StdRng::seed_from_u64(3);
        s.start_round(&geometry, Instant::now(), &mut rng);

        let letter = s.game.round().target_letter.unwrap();
        let target = geometry
            .countries
            .iter()
            .find(|c| c.initial == Some(letter))
            .unwrap();
        let other = geometry
            .countries
            .iter()
            .find(|c| c.initial != Some(letter))
            .unwrap();

        // Wrong guesses never raise the best score.
        assert!(s.click_country(other));
        assert_eq!(s.best_score.value(), 5);

        assert!(s.click_country(target));
        assert_eq!(s.game.round().status, RoundStatus::Won);
        assert!(s.best_score.value() > 5);
        assert_eq!(store.stored(), Some(s.best_score.value()));
    }
}
