//! Timed "find the country" game.
//!
//! A round targets the initial letter with the most countries on the map and
//! asks the player to click a number of them before the countdown runs out.
//! `Idle -> Running -> {Won, Lost}`; only [`Game::reset_round`] goes back
//! to `Idle`.

use crate::config::GameConfig;
use crate::data::initial_of;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::{BTreeMap, BTreeSet};
use web_time::{Duration, Instant};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum RoundStatus {
    #[default]
    Idle,
    Running,
    Won,
    Lost,
}

impl RoundStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RoundStatus::Idle => "Idle",
            RoundStatus::Running => "Running",
            RoundStatus::Won => "Won",
            RoundStatus::Lost => "Lost",
        }
    }
}

/// What a guess did to the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// No round running
    Ignored,
    /// Country is not a target; streak reset, penalty applied
    Wrong,
    AlreadyFound,
    Correct,
    /// Correct, and the last one required
    Won,
}

impl GuessOutcome {
    /// True if the guess may have changed the score.
    pub fn changes_score(&self) -> bool {
        matches!(self, Self::Wrong | Self::Correct | Self::Won)
    }
}

/// State of the current round.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameRound {
    pub status: RoundStatus,
    pub target_letter: Option<char>,
    pub required_count: usize,
    /// Every country starting with the target letter
    pub target_ids: BTreeSet<String>,
    /// Targets found so far; always a subset of `target_ids`
    pub found_ids: BTreeSet<String>,
    pub score: u32,
    pub streak: u32,
    pub best_streak: u32,
    /// Seconds left on the countdown
    pub time_remaining: u32,
    pub message: String,
}

impl GameRound {
    pub fn found_count(&self) -> usize {
        self.found_ids.len()
    }

    pub fn is_running(&self) -> bool {
        self.status == RoundStatus::Running
    }

    pub fn is_found(&self, id: &str) -> bool {
        self.found_ids.contains(id)
    }
}

/// Cancellable one-second countdown.
///
/// The timer is polled rather than callback-driven: [`CountdownTimer::due_ticks`]
/// reports how many ticks elapsed since the last poll. A stopped timer never
/// reports ticks.
#[derive(Debug, Clone)]
pub struct CountdownTimer {
    interval: Duration,
    next_due: Option<Instant>,
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl CountdownTimer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: None,
        }
    }

    pub fn start(&mut self, now: Instant) {
        self.next_due = Some(now + self.interval);
    }

    pub fn stop(&mut self) {
        self.next_due = None;
    }

    pub fn is_running(&self) -> bool {
        self.next_due.is_some()
    }

    /// Time until the next tick, if running.
    pub fn until_next(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|due| due.saturating_duration_since(now))
    }

    /// Number of ticks due at `now`; consumes them.
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        let Some(mut due) = self.next_due else {
            return 0;
        };
        let mut ticks = 0;
        while due <= now {
            ticks += 1;
            due += self.interval;
        }
        self.next_due = Some(due);
        ticks
    }
}

/// The game: configuration, current round and its countdown.
#[derive(Debug, Clone, Default)]
pub struct Game {
    config: GameConfig,
    round: GameRound,
    timer: CountdownTimer,
}

impl Game {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            round: GameRound::default(),
            timer: CountdownTimer::default(),
        }
    }

    pub fn round(&self) -> &GameRound {
        &self.round
    }

    pub fn timer(&self) -> &CountdownTimer {
        &self.timer
    }

    /// Starts a round over `countries` (id, name pairs).
    ///
    /// Returns false, leaving the game idle, if no country has a usable
    /// initial.
    pub fn start_round<'a, R: Rng + ?Sized>(
        &mut self,
        countries: impl IntoIterator<Item = (&'a str, &'a str)>,
        now: Instant,
        rng: &mut R,
    ) -> bool {
        let mut buckets: BTreeMap<char, BTreeSet<String>> = BTreeMap::new();
        for (id, name) in countries {
            if id.is_empty() {
                continue;
            }
            if let Some(initial) = initial_of(name) {
                buckets.entry(initial).or_default().insert(id.to_string());
            }
        }

        let largest = buckets.values().map(|b| b.len()).max().unwrap_or(0);
        let tied: Vec<char> = buckets
            .iter()
            .filter(|(_, ids)| ids.len() == largest)
            .map(|(letter, _)| *letter)
            .collect();

        let Some(&letter) = tied.choose(rng) else {
            self.timer.stop();
            self.round = GameRound {
                message: "No countries to play with".to_string(),
                ..GameRound::default()
            };
            return false;
        };

        let target_ids = buckets.remove(&letter).unwrap_or_default();
        let required_count = self.config.max_targets.max(1).min(target_ids.len());

        self.round = GameRound {
            status: RoundStatus::Running,
            target_letter: Some(letter),
            required_count,
            target_ids,
            found_ids: BTreeSet::new(),
            score: 0,
            streak: 0,
            best_streak: 0,
            time_remaining: self.config.round_seconds,
            message: format!(
                "Find {} countries starting with '{}'",
                required_count,
                letter.to_ascii_uppercase()
            ),
        };
        self.timer.start(now);

        log::info!(
            "Round started: letter '{}', {} of {} targets, {}s",
            letter,
            required_count,
            self.round.target_ids.len(),
            self.config.round_seconds
        );
        true
    }

    /// One countdown step. Expiry while running loses the round.
    pub fn tick(&mut self) -> bool {
        if !self.round.is_running() {
            self.timer.stop();
            return false;
        }

        self.round.time_remaining = self.round.time_remaining.saturating_sub(1);
        if self.round.time_remaining == 0 {
            self.timer.stop();
            self.round.status = RoundStatus::Lost;
            self.round.streak = 0;
            self.round.message = format!(
                "Time's up! Found {} of {}",
                self.round.found_count(),
                self.round.required_count
            );
            log::info!("Round lost with score {}", self.round.score);
        }
        true
    }

    /// Applies any countdown ticks due at `now`.
    pub fn poll_timer(&mut self, now: Instant) -> bool {
        let mut changed = false;
        for _ in 0..self.timer.due_ticks(now) {
            if !self.tick() {
                break;
            }
            changed = true;
        }
        changed
    }

    /// Scores a guess. Only processed while a round is running.
    pub fn process_guess(&mut self, id: &str, name: &str) -> GuessOutcome {
        if !self.round.is_running() {
            return GuessOutcome::Ignored;
        }
        let round = &mut self.round;

        if !round.target_ids.contains(id) {
            round.streak = 0;
            round.score = round.score.saturating_sub(self.config.wrong_penalty);
            round.message = format!("{} is not a target (-{})", name, self.config.wrong_penalty);
            return GuessOutcome::Wrong;
        }

        if round.found_ids.contains(id) {
            round.message = format!("{} already found", name);
            return GuessOutcome::AlreadyFound;
        }

        round.found_ids.insert(id.to_string());
        round.streak = round.streak.saturating_add(1);
        round.best_streak = round.best_streak.max(round.streak);
        let points = self
            .config
            .correct_score
            .saturating_add((round.streak - 1).saturating_mul(self.config.streak_bonus));
        round.score = round.score.saturating_add(points);

        if round.found_count() >= round.required_count {
            let bonus = round
                .time_remaining
                .saturating_mul(self.config.time_bonus_per_second);
            round.score = round.score.saturating_add(bonus);
            round.status = RoundStatus::Won;
            round.message = format!("All found! +{} time bonus", bonus);
            self.timer.stop();
            log::info!("Round won with score {}", round.score);
            return GuessOutcome::Won;
        }

        round.message = format!(
            "{} (+{}) {}/{}",
            name,
            points,
            round.found_count(),
            round.required_count
        );
        GuessOutcome::Correct
    }

    /// Stops the countdown and returns to idle; false if already idle.
    pub fn reset_round(&mut self) -> bool {
        let was_running = self.timer.is_running();
        self.timer.stop();
        if !was_running && self.round == GameRound::default() {
            return false;
        }
        self.round = GameRound::default();
        true
    }
}
