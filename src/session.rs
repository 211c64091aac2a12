//! In-memory browsing state and the transitions user actions drive.
//!
//! [`SessionState`] is an immutable snapshot: every transition returns a new
//! state and the batch is shared behind an `Arc`, so snapshots are cheap to
//! hand to a renderer. [`RecipeSession`] owns the current snapshot together
//! with the recipe source and picks random row windows for new loads.

use std::sync::Arc;

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::client::RecipeSource;
use crate::config::BrowserConfig;
use crate::error::{ErrorKind, FetchError};
use crate::model::{RecipeBatch, RecipeRecord};
use crate::nutrition::{NutritionCalculator, NutritionLine};
use crate::steps::{extract_steps, CookStep};

/// Lifecycle phase of the session
#[derive(Debug, Clone, Default, PartialEq)]
pub enum SessionPhase {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(LoadFailure),
}

/// Why the last load failed, kept for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailure {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&FetchError> for LoadFailure {
    fn from(err: &FetchError) -> Self {
        LoadFailure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Previous,
    Next,
}

/// What a call to [`RecipeSession::load_new_batch`] did
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Loaded,
    Failed(LoadFailure),
    /// A load was already in flight
    Rejected,
}

/// Result of asking for the selected recipe's nutrition lines
#[derive(Debug, PartialEq)]
pub enum NutritionLookup<'a> {
    /// Lines were computed by this call
    Computed(&'a [NutritionLine]),
    /// Lines were already computed for the selected recipe
    Cached(&'a [NutritionLine]),
    /// No recipe is selected
    NoRecipe,
}

/// Snapshot of the browsing state.
///
/// When the batch is non-empty `selected_index < batch.len()`; when steps
/// are non-empty `1 <= current_step <= steps.len()`.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    phase: SessionPhase,
    batch: Arc<RecipeBatch>,
    selected_index: usize,
    current_step: usize,
    steps: Arc<Vec<CookStep>>,
    nutrition_cache_key: Option<String>,
    nutrition: Option<Arc<[NutritionLine; 5]>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            batch: Arc::default(),
            selected_index: 0,
            current_step: 1,
            steps: Arc::default(),
            nutrition_cache_key: None,
            nutrition: None,
        }
    }
}

impl SessionState {
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    /// True while a fetch is in flight.
    ///
    /// The loading indicator also stays on for the minimum display time after
    /// the fetch resolves. That part lives in [`crate::ViewController`], see
    /// [`crate::ViewController::is_loading`].
    pub fn is_loading(&self) -> bool {
        self.phase == SessionPhase::Loading
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn failure(&self) -> Option<&LoadFailure> {
        match &self.phase {
            SessionPhase::Failed(failure) => Some(failure),
            _ => None,
        }
    }

    pub fn batch(&self) -> &RecipeBatch {
        &self.batch
    }

    pub fn selected_index(&self) -> usize {
        self.selected_index
    }

    pub fn selected_recipe(&self) -> Option<&RecipeRecord> {
        self.batch.get(self.selected_index)
    }

    pub fn steps(&self) -> &[CookStep] {
        &self.steps
    }

    pub fn total_steps(&self) -> usize {
        self.steps.len()
    }

    /// 1-based position in the carousel
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    pub fn current_cook_step(&self) -> Option<&CookStep> {
        self.current_step
            .checked_sub(1)
            .and_then(|i| self.steps.get(i))
    }

    pub fn nutrition_cache_key(&self) -> Option<&str> {
        self.nutrition_cache_key.as_deref()
    }

    pub fn nutrition(&self) -> Option<&[NutritionLine]> {
        self.nutrition.as_deref().map(|lines| lines.as_slice())
    }

    /// Enter `Loading`, keeping whatever was on screen until the load resolves
    pub fn loading(&self) -> SessionState {
        SessionState {
            phase: SessionPhase::Loading,
            ..self.clone()
        }
    }

    /// A fresh batch arrived: the featured recipe is selected at step 1
    pub fn loaded(&self, batch: RecipeBatch) -> SessionState {
        let steps = batch.featured().map(extract_steps).unwrap_or_default();
        SessionState {
            phase: SessionPhase::Ready,
            batch: Arc::new(batch),
            selected_index: 0,
            current_step: 1,
            steps: Arc::new(steps),
            nutrition_cache_key: None,
            nutrition: None,
        }
    }

    /// The load failed: the previous batch is dropped with it
    pub fn failed(&self, failure: LoadFailure) -> SessionState {
        SessionState {
            phase: SessionPhase::Failed(failure),
            ..SessionState::default()
        }
    }

    /// Select another batch entry. `None` when not ready or `index` is out of range.
    pub fn with_selection(&self, index: usize) -> Option<SessionState> {
        if !self.is_ready() {
            return None;
        }
        let record = self.batch.get(index)?;
        Some(SessionState {
            selected_index: index,
            current_step: 1,
            steps: Arc::new(extract_steps(record)),
            nutrition_cache_key: None,
            nutrition: None,
            ..self.clone()
        })
    }

    /// Move one step, wrapping at both ends. `None` when there are no steps.
    pub fn with_step_advanced(&self, direction: StepDirection) -> Option<SessionState> {
        let total = self.total_steps();
        if !self.is_ready() || total == 0 {
            return None;
        }
        let current_step = match direction {
            StepDirection::Next if self.current_step >= total => 1,
            StepDirection::Next => self.current_step + 1,
            StepDirection::Previous if self.current_step <= 1 => total,
            StepDirection::Previous => self.current_step - 1,
        };
        Some(SessionState {
            current_step,
            ..self.clone()
        })
    }

    /// Jump to step `n`. `None` unless `1 <= n <= total_steps`.
    pub fn with_step(&self, n: usize) -> Option<SessionState> {
        if !self.is_ready() || n == 0 || n > self.total_steps() {
            return None;
        }
        Some(SessionState {
            current_step: n,
            ..self.clone()
        })
    }

    fn with_nutrition(&self, key: String, lines: [NutritionLine; 5]) -> SessionState {
        SessionState {
            nutrition_cache_key: Some(key),
            nutrition: Some(Arc::new(lines)),
            ..self.clone()
        }
    }
}

/// Owns the browsing state and the source it loads from
pub struct RecipeSession<S> {
    source: S,
    state: SessionState,
    page_size: u32,
    max_row: u32,
    rng: StdRng,
}

impl<S: RecipeSource> RecipeSession<S> {
    pub fn new(source: S, config: &BrowserConfig) -> Self {
        Self::with_rng(source, config, StdRng::from_os_rng())
    }

    /// Deterministic window selection
    pub fn with_seed(source: S, config: &BrowserConfig, seed: u64) -> Self {
        Self::with_rng(source, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(source: S, config: &BrowserConfig, rng: StdRng) -> Self {
        Self {
            source,
            state: SessionState::default(),
            page_size: config.page_size.max(1),
            max_row: config.max_row,
            rng,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Upper bound of the random window start
    pub fn max_row(&self) -> u32 {
        self.max_row
    }

    /// Uniform start row in `[1, max_row - page_size]`
    fn pick_window_start(&mut self) -> u32 {
        let upper = self.max_row.saturating_sub(self.page_size).max(1);
        self.rng.random_range(1..=upper)
    }

    /// Fetch a new random batch and select its featured recipe.
    ///
    /// Failures never escape: they move the session to `Failed`.
    pub async fn load_new_batch(&mut self) -> LoadOutcome {
        if self.state.is_loading() {
            warn!("Ignoring load request while another load is in flight");
            return LoadOutcome::Rejected;
        }

        self.state = self.state.loading();
        let start = self.pick_window_start();
        debug!("Loading {} recipes starting at row {}", self.page_size, start);

        match self.source.fetch_batch(start, self.page_size).await {
            Ok(batch) => {
                if let Some(total) = batch.total_count() {
                    if total >= self.page_size && total < self.max_row {
                        info!("Provider declares {} rows, narrowing window", total);
                        self.max_row = total;
                    }
                }
                info!("Loaded batch of {} recipes", batch.len());
                self.state = self.state.loaded(batch);
                LoadOutcome::Loaded
            }
            Err(err) => {
                warn!("Failed to load recipes: {}", err);
                let failure = LoadFailure::from(&err);
                self.state = self.state.failed(failure.clone());
                LoadOutcome::Failed(failure)
            }
        }
    }

    /// Select batch entry `index`; out-of-range requests are ignored.
    /// Returns whether the state changed.
    pub fn select_recipe(&mut self, index: usize) -> bool {
        self.apply(|state| state.with_selection(index))
    }

    /// Returns whether the state changed
    pub fn advance_step(&mut self, direction: StepDirection) -> bool {
        self.apply(|state| state.with_step_advanced(direction))
    }

    /// Returns whether the state changed
    pub fn set_step(&mut self, n: usize) -> bool {
        self.apply(|state| state.with_step(n))
    }

    /// Nutrition lines for the selected recipe, computed at most once per recipe
    pub fn nutrition_lines(&mut self, calculator: &dyn NutritionCalculator) -> NutritionLookup<'_> {
        let Some(record) = self.state.selected_recipe().filter(|_| self.state.is_ready()) else {
            return NutritionLookup::NoRecipe;
        };

        if self.state.nutrition.is_some()
            && self.state.nutrition_cache_key() == Some(record.identity())
        {
            return NutritionLookup::Cached(self.state.nutrition().unwrap_or_default());
        }

        let key = record.identity().to_string();
        let lines = calculator.compute_nutrition_lines(record);
        debug!("Computed nutrition for '{}'", key);
        self.state = self.state.with_nutrition(key, lines);
        NutritionLookup::Computed(self.state.nutrition().unwrap_or_default())
    }

    fn apply(&mut self, transition: impl FnOnce(&SessionState) -> Option<SessionState>) -> bool {
        match transition(&self.state) {
            Some(next) => {
                self.state = next;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;

    struct StubSource {
        batch: RecipeBatch,
        windows: Mutex<Vec<(u32, u32)>>,
    }

    #[async_trait]
    impl RecipeSource for StubSource {
        async fn fetch_batch(&self, start: u32, count: u32) -> Result<RecipeBatch, FetchError> {
            self.windows.lock().unwrap().push((start, count));
            Ok(self.batch.clone())
        }
    }

    struct FailingSource;

    #[async_trait]
    impl RecipeSource for FailingSource {
        async fn fetch_batch(&self, _start: u32, _count: u32) -> Result<RecipeBatch, FetchError> {
            Err(FetchError::Api {
                code: "ERROR-300".to_string(),
                message: "필수 값이 누락되어 있습니다.".to_string(),
            })
        }
    }

    fn recipe(name: &str, steps: usize) -> RecipeRecord {
        let mut value = json!({ "RCP_NM": name });
        for i in 1..=steps {
            value[format!("MANUAL{:02}", i)] = json!(format!("{}. {} step {}", i, name, i));
        }
        serde_json::from_value(value).unwrap()
    }

    fn ready_session(steps_per_recipe: &[usize]) -> RecipeSession<StubSource> {
        let records = steps_per_recipe
            .iter()
            .enumerate()
            .map(|(i, steps)| recipe(&format!("recipe {}", i), *steps))
            .collect();
        let source = StubSource {
            batch: RecipeBatch::new(records),
            windows: Mutex::new(Vec::new()),
        };
        let mut session = RecipeSession::with_seed(source, &BrowserConfig::default(), 7);
        block_on(session.load_new_batch());
        session
    }

    fn block_on<F: std::future::Future>(future: F) -> F::Output {
        tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(future)
    }

    #[test]
    fn test_starts_idle() {
        let state = SessionState::default();
        assert_eq!(state.phase(), &SessionPhase::Idle);
        assert!(state.selected_recipe().is_none());
        assert!(state.steps().is_empty());
    }

    #[tokio::test]
    async fn test_load_selects_featured_recipe() {
        let source = StubSource {
            batch: RecipeBatch::new(vec![recipe("first", 3), recipe("second", 2)]),
            windows: Mutex::new(Vec::new()),
        };
        let mut session = RecipeSession::with_seed(source, &BrowserConfig::default(), 1);

        assert_eq!(session.load_new_batch().await, LoadOutcome::Loaded);
        let state = session.state();
        assert!(state.is_ready());
        assert_eq!(state.selected_index(), 0);
        assert_eq!(state.current_step(), 1);
        assert_eq!(state.total_steps(), 3);
        assert_eq!(state.steps()[0].text, "first step 1");
        assert!(state.nutrition_cache_key().is_none());
    }

    #[tokio::test]
    async fn test_window_start_stays_in_range() {
        let source = StubSource {
            batch: RecipeBatch::new(vec![recipe("only", 1)]),
            windows: Mutex::new(Vec::new()),
        };
        let config = BrowserConfig {
            max_row: 30,
            page_size: 10,
            ..Default::default()
        };
        let mut session = RecipeSession::with_seed(source, &config, 42);
        for _ in 0..50 {
            session.load_new_batch().await;
        }

        let windows = session.source().windows.lock().unwrap();
        assert_eq!(windows.len(), 50);
        for (start, count) in windows.iter() {
            assert_eq!(*count, 10);
            assert!((1..=20).contains(start), "start {} out of range", start);
        }
    }

    #[tokio::test]
    async fn test_declared_total_narrows_window() {
        let source = StubSource {
            batch: RecipeBatch::new(vec![recipe("only", 1)]).with_total_count(Some(500)),
            windows: Mutex::new(Vec::new()),
        };
        let mut session = RecipeSession::with_seed(source, &BrowserConfig::default(), 3);
        session.load_new_batch().await;
        assert_eq!(session.max_row(), 500);
    }

    #[tokio::test]
    async fn test_failure_moves_to_failed() {
        let mut session = RecipeSession::with_seed(FailingSource, &BrowserConfig::default(), 1);

        let outcome = session.load_new_batch().await;
        let failure = session.state().failure().cloned().unwrap();
        assert_eq!(outcome, LoadOutcome::Failed(failure.clone()));
        assert_eq!(failure.kind, ErrorKind::Api);
        assert!(failure.message.contains("필수 값이 누락되어 있습니다."));
        assert!(session.state().batch().is_empty());
        assert!(!session.select_recipe(0));
    }

    #[test]
    fn test_next_wraps_to_first() {
        let mut session = ready_session(&[3]);
        assert!(session.set_step(3));
        assert!(session.advance_step(StepDirection::Next));
        assert_eq!(session.state().current_step(), 1);
    }

    #[test]
    fn test_previous_wraps_to_last() {
        let mut session = ready_session(&[4]);
        assert!(session.advance_step(StepDirection::Previous));
        assert_eq!(session.state().current_step(), 4);
        assert!(session.advance_step(StepDirection::Previous));
        assert_eq!(session.state().current_step(), 3);
    }

    #[test]
    fn test_single_step_wraps_onto_itself() {
        let mut session = ready_session(&[1]);
        assert!(session.advance_step(StepDirection::Next));
        assert_eq!(session.state().current_step(), 1);
        assert!(session.advance_step(StepDirection::Previous));
        assert_eq!(session.state().current_step(), 1);
    }

    #[test]
    fn test_advance_without_steps_is_noop() {
        let mut session = ready_session(&[0]);
        let before = session.state().clone();
        assert!(!session.advance_step(StepDirection::Next));
        assert!(!session.advance_step(StepDirection::Previous));
        assert_eq!(session.state(), &before);
        assert!(session.state().current_cook_step().is_none());
    }

    #[test]
    fn test_set_step_out_of_range_is_ignored() {
        let mut session = ready_session(&[3]);
        assert!(session.set_step(2));
        assert!(!session.set_step(0));
        assert!(!session.set_step(4));
        assert_eq!(session.state().current_step(), 2);
        assert_eq!(
            session.state().current_cook_step().map(|s| s.text.as_str()),
            Some("recipe 0 step 2")
        );
    }

    #[test]
    fn test_select_recipe_resets_step_and_recomputes() {
        let mut session = ready_session(&[3, 5]);
        session.set_step(3);
        assert!(session.select_recipe(1));

        let state = session.state();
        assert_eq!(state.selected_index(), 1);
        assert_eq!(state.current_step(), 1);
        assert_eq!(state.total_steps(), 5);
        assert_eq!(state.steps()[0].text, "recipe 1 step 1");
    }

    #[test]
    fn test_select_recipe_out_of_range_is_ignored() {
        let mut session = ready_session(&[2, 2]);
        session.set_step(2);
        let before = session.state().clone();
        assert!(!session.select_recipe(2));
        assert!(!session.select_recipe(usize::MAX));
        assert_eq!(session.state(), &before);
    }

    #[test]
    fn test_snapshots_are_unaffected_by_later_transitions() {
        let mut session = ready_session(&[3]);
        let snapshot = session.state().clone();
        session.advance_step(StepDirection::Next);
        assert_eq!(snapshot.current_step(), 1);
        assert_eq!(session.state().current_step(), 2);
    }

    #[test]
    fn test_nutrition_cached_per_recipe() {
        use crate::nutrition::DailyValueCalculator;

        let mut session = ready_session(&[1, 1]);
        assert!(matches!(
            session.nutrition_lines(&DailyValueCalculator),
            NutritionLookup::Computed(lines) if lines.len() == 5
        ));
        assert!(matches!(
            session.nutrition_lines(&DailyValueCalculator),
            NutritionLookup::Cached(_)
        ));
        assert_eq!(session.state().nutrition_cache_key(), Some("recipe 0"));

        session.select_recipe(1);
        assert!(session.state().nutrition_cache_key().is_none());
        assert!(matches!(
            session.nutrition_lines(&DailyValueCalculator),
            NutritionLookup::Computed(_)
        ));
        assert_eq!(session.state().nutrition_cache_key(), Some("recipe 1"));
    }

    #[test]
    fn test_nutrition_without_recipe() {
        use crate::nutrition::DailyValueCalculator;

        let mut session = RecipeSession::with_seed(FailingSource, &BrowserConfig::default(), 1);
        assert_eq!(
            session.nutrition_lines(&DailyValueCalculator),
            NutritionLookup::NoRecipe
        );
    }
}
