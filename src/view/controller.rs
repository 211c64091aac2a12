use std::pin::pin;
use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::time::{sleep, Instant};

use crate::client::RecipeSource;
use crate::nutrition::{DailyValueCalculator, NutritionCalculator};
use crate::session::{LoadOutcome, NutritionLookup, RecipeSession, StepDirection};
use crate::view::{main_image_url, Control, MenuCard, RecipeSummary, RecipeView, Tab};

/// Connects user controls to a [`RecipeSession`] and keeps a [`RecipeView`] in sync
pub struct ViewController<S, V> {
    session: RecipeSession<S>,
    view: V,
    calculator: Box<dyn NutritionCalculator>,
    min_loading: Duration,
    refresh_enabled: bool,
    active_tab: Tab,
}

impl<S: RecipeSource, V: RecipeView> ViewController<S, V> {
    pub fn new(session: RecipeSession<S>, view: V, min_loading: Duration) -> Self {
        Self {
            session,
            view,
            calculator: Box::new(DailyValueCalculator),
            min_loading,
            refresh_enabled: true,
            active_tab: Tab::Info,
        }
    }

    /// Replace the nutrition calculator
    pub fn with_calculator(mut self, calculator: Box<dyn NutritionCalculator>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn session(&self) -> &RecipeSession<S> {
        &self.session
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut V {
        &mut self.view
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn is_refresh_enabled(&self) -> bool {
        self.refresh_enabled
    }

    /// True from the start of a refresh until its minimum loading time has passed
    pub fn is_loading(&self) -> bool {
        !self.refresh_enabled
    }

    /// Controls that currently map to an operation
    pub fn controls(&self) -> Vec<Control> {
        let state = self.session.state();
        let mut controls = vec![Control::Tab(Tab::Info), Control::Tab(Tab::Nutrition)];
        if self.refresh_enabled {
            controls.push(Control::Refresh);
        }
        if state.is_ready() && state.total_steps() > 0 {
            controls.push(Control::PreviousStep);
            controls.push(Control::NextStep);
            controls.extend((1..=state.total_steps()).map(Control::StepSelector));
        }
        if state.is_ready() {
            controls.extend(
                (0..state.batch().len())
                    .filter(|&i| i != state.selected_index())
                    .map(Control::MenuCard),
            );
        }
        controls
    }

    /// Route a control to its operation. Returns whether anything changed.
    pub async fn dispatch(&mut self, control: Control) -> bool {
        debug!("Dispatching {:?}", control);
        match control {
            Control::Refresh => self.refresh().await,
            Control::Tab(tab) => self.activate_tab(tab),
            Control::PreviousStep => self.advance_step(StepDirection::Previous),
            Control::NextStep => self.advance_step(StepDirection::Next),
            Control::StepSelector(n) => self.select_step(n),
            Control::MenuCard(position) => self.select_menu(position),
        }
    }

    /// Dispatch controls from `inputs` until every sender is dropped.
    ///
    /// A refresh holds the controller for its whole guard, and controls
    /// arriving during it are rejected instead of queued.
    pub async fn run(&mut self, inputs: &mut mpsc::Receiver<Control>) {
        while let Some(control) = inputs.recv().await {
            let changed = match control {
                Control::Refresh => self.refresh_rejecting(inputs).await,
                other => self.dispatch(other).await,
            };
            if !changed {
                debug!("{:?} had no effect", control);
            }
        }
    }

    /// [`refresh`](Self::refresh) while draining `inputs`; everything received
    /// before the guard ends is discarded
    pub async fn refresh_rejecting(&mut self, inputs: &mut mpsc::Receiver<Control>) -> bool {
        let mut refresh = pin!(self.refresh());
        loop {
            tokio::select! {
                changed = refresh.as_mut() => return changed,
                Some(control) = inputs.recv() => {
                    info!("Rejected {:?} while loading", control);
                }
            }
        }
    }

    /// Load a new batch behind the loading guard.
    ///
    /// The loading indicator stays on and the refresh control stays disabled
    /// for at least `min_loading`, whether the load succeeds or fails.
    pub async fn refresh(&mut self) -> bool {
        if !self.refresh_enabled {
            debug!("Refresh ignored while loading");
            return false;
        }

        self.refresh_enabled = false;
        self.view.set_refresh_enabled(false);
        self.view.set_loading(true);
        let started = Instant::now();

        let outcome = self.session.load_new_batch().await;
        match &outcome {
            LoadOutcome::Loaded => {
                self.render_selection();
                self.render_menu();
            }
            LoadOutcome::Failed(failure) => {
                self.view
                    .render_carousel_error(&format!("데이터 로드 실패: {}", failure.message));
                self.view.render_menu_unavailable();
            }
            LoadOutcome::Rejected => {}
        }

        if let Some(remaining) = self.min_loading.checked_sub(started.elapsed()) {
            sleep(remaining).await;
        }

        self.view.set_loading(false);
        self.view.set_refresh_enabled(true);
        self.refresh_enabled = true;
        info!("Refresh finished after {:?}", started.elapsed());

        outcome != LoadOutcome::Rejected
    }

    /// Switch panels and redraw the one shown. Nutrition is computed the
    /// first time it is shown per recipe; later activations reuse the lines.
    pub fn activate_tab(&mut self, tab: Tab) -> bool {
        self.active_tab = tab;
        self.view.activate_tab(tab);

        match tab {
            Tab::Info => {
                if let Some(record) = self.session.state().selected_recipe() {
                    self.view.render_summary(&RecipeSummary::from_record(record));
                }
            }
            Tab::Nutrition => self.render_nutrition(),
        }
        true
    }

    pub fn advance_step(&mut self, direction: StepDirection) -> bool {
        let changed = self.session.advance_step(direction);
        if changed {
            self.render_current_step();
        }
        changed
    }

    pub fn select_step(&mut self, n: usize) -> bool {
        let changed = self.session.set_step(n);
        if changed {
            self.render_current_step();
        }
        changed
    }

    pub fn select_menu(&mut self, position: usize) -> bool {
        if !self.session.select_recipe(position) {
            debug!("Ignoring selection of batch position {}", position);
            return false;
        }
        self.render_selection();
        self.render_menu();
        true
    }

    fn render_nutrition(&mut self) {
        let image_url = self
            .session
            .state()
            .selected_recipe()
            .map(|record| main_image_url(record).to_string());

        match self.session.nutrition_lines(self.calculator.as_ref()) {
            NutritionLookup::Computed(lines) | NutritionLookup::Cached(lines) => {
                self.view
                    .render_nutrition(lines, image_url.as_deref().unwrap_or_default());
            }
            NutritionLookup::NoRecipe => debug!("No recipe selected for nutrition"),
        }
    }

    fn render_current_step(&mut self) {
        let state = self.session.state();
        if let Some(step) = state.current_cook_step() {
            self.view.render_step(step, state.total_steps());
        }
    }

    /// Summary, carousel and nutrition reset for the selected recipe, info tab forced
    fn render_selection(&mut self) {
        let state = self.session.state();
        let Some(record) = state.selected_recipe() else {
            return;
        };

        self.view.render_summary(&RecipeSummary::from_record(record));
        if state.steps().is_empty() {
            self.view.render_no_steps();
        } else {
            self.view.render_carousel(state.steps(), state.current_step());
        }
        self.view.reset_nutrition();
        self.active_tab = Tab::Info;
        self.view.activate_tab(Tab::Info);
    }

    fn render_menu(&mut self) {
        let state = self.session.state();
        let cards: Vec<MenuCard> = state
            .batch()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != state.selected_index())
            .map(|(i, record)| MenuCard::from_record(i, record))
            .collect();

        if cards.is_empty() {
            self.view.render_menu_unavailable();
        } else {
            self.view.render_menu(&cards);
        }
    }
}
