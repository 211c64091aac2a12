mod controller;
mod terminal;

pub use controller::ViewController;
pub use terminal::{parse_control, TerminalView, HELP};

use crate::model::RecipeRecord;
use crate::nutrition::NutritionLine;
use crate::steps::CookStep;

/// Placeholder for a recipe without a main image
pub const MAIN_IMAGE_PLACEHOLDER: &str = "main_dish_placeholder.jpg";
/// Placeholder for a menu card without an image
pub const CARD_IMAGE_PLACEHOLDER: &str = "placeholder.jpg";

const NO_TITLE: &str = "제목 없음";
const NO_INFO: &str = "정보 없음";

/// Panels of the recipe detail area
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Info,
    Nutrition,
}

/// Every input the page exposes, identified by what it targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Control {
    Tab(Tab),
    Refresh,
    PreviousStep,
    NextStep,
    /// Carousel selector for a 1-based step
    StepSelector(usize),
    /// Menu card for a batch position
    MenuCard(usize),
}

/// Summary panel contents with display fallbacks applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeSummary {
    pub title: String,
    pub method: String,
    pub weight: String,
    pub ingredients: String,
    pub image_url: String,
    pub image_alt: String,
    pub category: Option<String>,
    pub hash_tag: Option<String>,
    pub sodium_tip: Option<String>,
}

impl RecipeSummary {
    pub fn from_record(record: &RecipeRecord) -> Self {
        let title = non_blank(record.name()).unwrap_or(NO_TITLE).to_string();
        RecipeSummary {
            image_alt: format!("{} 완성 사진", title),
            method: non_blank(record.cooking_method()).unwrap_or(NO_INFO).to_string(),
            weight: non_blank(record.weight()).unwrap_or(NO_INFO).to_string(),
            ingredients: non_blank(record.ingredients()).unwrap_or(NO_INFO).to_string(),
            image_url: main_image_url(record).to_string(),
            category: non_blank(record.category()).map(str::to_string),
            hash_tag: non_blank(record.hash_tag()).map(str::to_string),
            sodium_tip: non_blank(record.sodium_tip()).map(str::to_string),
            title,
        }
    }
}

/// A selectable entry in the "other menus" list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCard {
    /// Position of the recipe in the batch
    pub position: usize,
    pub name: String,
    pub image_url: String,
}

impl MenuCard {
    pub fn from_record(position: usize, record: &RecipeRecord) -> Self {
        MenuCard {
            position,
            name: record.identity().to_string(),
            image_url: non_blank(record.main_image())
                .unwrap_or(CARD_IMAGE_PLACEHOLDER)
                .to_string(),
        }
    }
}

/// Rendering surface driven by [`ViewController`]
pub trait RecipeView {
    fn set_loading(&mut self, active: bool);

    fn set_refresh_enabled(&mut self, enabled: bool);

    fn render_summary(&mut self, summary: &RecipeSummary);

    /// Rebuild the carousel for a new step sequence with `current` active
    fn render_carousel(&mut self, steps: &[CookStep], current: usize);

    /// Update only the active image, selector highlight and step text
    fn render_step(&mut self, step: &CookStep, total: usize);

    fn render_no_steps(&mut self);

    /// Show a load failure in place of the carousel
    fn render_carousel_error(&mut self, message: &str);

    fn render_menu(&mut self, cards: &[MenuCard]);

    fn render_menu_unavailable(&mut self);

    fn activate_tab(&mut self, tab: Tab);

    /// Fill the nutrition panel, shown beside the recipe's main dish image
    fn render_nutrition(&mut self, lines: &[NutritionLine], image_url: &str);

    /// Drop nutrition content rendered for a previous recipe
    fn reset_nutrition(&mut self);
}

/// Main dish image of a recipe, or [`MAIN_IMAGE_PLACEHOLDER`]
pub fn main_image_url(record: &RecipeRecord) -> &str {
    non_blank(record.main_image()).unwrap_or(MAIN_IMAGE_PLACEHOLDER)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
