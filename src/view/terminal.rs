use std::fmt;
use std::io::{self, Stdout, Write};

use log::warn;

use crate::nutrition::NutritionLine;
use crate::steps::CookStep;
use crate::view::{Control, MenuCard, RecipeSummary, RecipeView, Tab};

/// Terminal commands, one per line
pub const HELP: &str = "commands: n(ext) | p(rev) | s <step> | m <position> | t info | t nutrition | r(efresh) | q(uit)";

/// Parse one input line into a control
pub fn parse_control(line: &str) -> Option<Control> {
    let mut parts = line.split_whitespace();
    let command = parts.next()?;
    let arg = parts.next();

    match (command, arg) {
        ("n" | "next", None) => Some(Control::NextStep),
        ("p" | "prev", None) => Some(Control::PreviousStep),
        ("r" | "refresh", None) => Some(Control::Refresh),
        ("s" | "step", Some(n)) => n.parse().ok().map(Control::StepSelector),
        ("m" | "menu", Some(i)) => i.parse().ok().map(Control::MenuCard),
        ("t" | "tab", Some("info")) => Some(Control::Tab(Tab::Info)),
        ("t" | "tab", Some("nutrition")) => Some(Control::Tab(Tab::Nutrition)),
        _ => None,
    }
}

/// Plain-text renderer writing every view update as lines
pub struct TerminalView<W> {
    out: W,
}

impl TerminalView<Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalView<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn get_ref(&self) -> &W {
        &self.out
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = self.out.write_fmt(args).and_then(|_| self.out.write_all(b"\n")) {
            warn!("Failed to write to terminal: {}", e);
        }
    }

    fn selectors(&mut self, current: usize, total: usize) {
        let dots: String = (1..=total)
            .map(|n| if n == current { '●' } else { '○' })
            .collect();
        self.line(format_args!("  ◀ {} ▶", dots));
    }
}

/// Terminal columns taken by `text`. Hangul jamo and syllables are double width.
fn display_width(text: &str) -> usize {
    text.chars()
        .map(|c| match c {
            '\u{1100}'..='\u{115F}' | '\u{3130}'..='\u{318F}' | '\u{AC00}'..='\u{D7A3}' => 2,
            _ => 1,
        })
        .sum()
}

/// Right-align `text` in `width` terminal columns
fn pad_left(text: &str, width: usize) -> String {
    let pad = width.saturating_sub(display_width(text));
    format!("{}{}", " ".repeat(pad), text)
}

impl<W: Write> RecipeView for TerminalView<W> {
    fn set_loading(&mut self, active: bool) {
        if active {
            self.line(format_args!("[loading recipes...]"));
        } else {
            self.line(format_args!("[ready]"));
        }
    }

    fn set_refresh_enabled(&mut self, enabled: bool) {
        if !enabled {
            self.line(format_args!("(refresh disabled)"));
        }
    }

    fn render_summary(&mut self, summary: &RecipeSummary) {
        self.line(format_args!("=== {} ===", summary.title));
        if let Some(category) = &summary.category {
            self.line(format_args!("분류: {}", category));
        }
        self.line(format_args!("조리방법: {}", summary.method));
        self.line(format_args!("중량: {}", summary.weight));
        self.line(format_args!("재료: {}", summary.ingredients));
        self.line(format_args!("사진: {}", summary.image_url));
        if let Some(tags) = &summary.hash_tag {
            self.line(format_args!("#{}", tags));
        }
        if let Some(tip) = &summary.sodium_tip {
            self.line(format_args!("저감 팁: {}", tip));
        }
    }

    fn render_carousel(&mut self, steps: &[CookStep], current: usize) {
        self.line(format_args!("--- 조리 과정 ({}단계) ---", steps.len()));
        if let Some(step) = current.checked_sub(1).and_then(|i| steps.get(i)) {
            self.render_step(step, steps.len());
        }
    }

    fn render_step(&mut self, step: &CookStep, total: usize) {
        self.line(format_args!("  [{}]", step.image_url));
        self.selectors(step.index, total);
        self.line(format_args!("  {}. {}", step.index, step.text));
    }

    fn render_no_steps(&mut self) {
        self.line(format_args!("조리 과정 데이터를 찾을 수 없습니다."));
    }

    fn render_carousel_error(&mut self, message: &str) {
        self.line(format_args!("{}", message));
    }

    fn render_menu(&mut self, cards: &[MenuCard]) {
        self.line(format_args!("--- 이런 메뉴는 어때요? ---"));
        for card in cards {
            self.line(format_args!("  m {}: {}", card.position, card.name));
        }
    }

    fn render_menu_unavailable(&mut self) {
        self.line(format_args!("다른 메뉴 목록을 불러올 수 없습니다."));
    }

    fn activate_tab(&mut self, tab: Tab) {
        let name = match tab {
            Tab::Info => "정보",
            Tab::Nutrition => "영양성분",
        };
        self.line(format_args!("[탭: {}]", name));
    }

    fn render_nutrition(&mut self, lines: &[NutritionLine], image_url: &str) {
        self.line(format_args!("  [{}]", image_url));
        // Labels go last since their widths differ
        for line in lines {
            self.line(format_args!(
                "  {} {:>6} %  {}",
                pad_left(&line.display_value(), 12),
                line.percent.to_string(),
                line.label
            ));
        }
    }

    fn reset_nutrition(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output(view: TerminalView<Vec<u8>>) -> String {
        String::from_utf8(view.into_inner()).unwrap()
    }

    #[test]
    fn test_render_step_highlights_selector() {
        let mut view = TerminalView::new(Vec::new());
        let step = CookStep {
            index: 2,
            text: "팬에 볶는다.".to_string(),
            image_url: "placeholder.jpg".to_string(),
        };
        view.render_step(&step, 3);

        let text = output(view);
        assert!(text.contains("○●○"));
        assert!(text.contains("2. 팬에 볶는다."));
        assert!(text.contains("[placeholder.jpg]"));
    }

    #[test]
    fn test_parse_control() {
        assert_eq!(parse_control("n"), Some(Control::NextStep));
        assert_eq!(parse_control(" prev "), Some(Control::PreviousStep));
        assert_eq!(parse_control("s 3"), Some(Control::StepSelector(3)));
        assert_eq!(parse_control("m 4"), Some(Control::MenuCard(4)));
        assert_eq!(parse_control("t nutrition"), Some(Control::Tab(Tab::Nutrition)));
        assert_eq!(parse_control("r"), Some(Control::Refresh));
        assert_eq!(parse_control("s"), None);
        assert_eq!(parse_control("s x"), None);
        assert_eq!(parse_control("t recipes"), None);
        assert_eq!(parse_control(""), None);
    }

    #[test]
    fn test_render_nutrition_aligns_columns() {
        use crate::nutrition::NutritionCalculator;

        let record: crate::model::RecipeRecord = serde_json::from_value(serde_json::json!({
            "RCP_NM": "고구마죽",
            "INFO_ENG": "500",
            "INFO_NA": "120"
        }))
        .unwrap();
        let lines = crate::nutrition::DailyValueCalculator.compute_nutrition_lines(&record);
        let mut view = TerminalView::new(Vec::new());
        view.render_nutrition(&lines, "main.png");

        let text = output(view);
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows[0], "  [main.png]");
        assert_eq!(rows.len(), 6);
        let percent_columns: Vec<usize> = rows[1..]
            .iter()
            .map(|r| display_width(&r[..r.find(" %").unwrap()]))
            .collect();
        assert!(percent_columns.iter().all(|&c| c == percent_columns[0]));
        assert!(rows[1].ends_with("열량"));
        assert!(rows[1].contains("25.0 %"));
        assert!(rows[2].contains("정보 없음"));
        assert!(rows[2].ends_with("탄수화물"));
    }

    #[test]
    fn test_display_width_counts_hangul_double() {
        assert_eq!(display_width("500 Kcal"), 8);
        assert_eq!(display_width("정보 없음"), 9);
        assert_eq!(pad_left("정보 없음", 12), "   정보 없음");
        assert_eq!(pad_left("a very long value", 4), "a very long value");
    }

    #[test]
    fn test_render_menu_lists_positions() {
        let mut view = TerminalView::new(Vec::new());
        view.render_menu(&[
            MenuCard {
                position: 1,
                name: "두부조림".to_string(),
                image_url: "placeholder.jpg".to_string(),
            },
            MenuCard {
                position: 4,
                name: "계란말이".to_string(),
                image_url: "placeholder.jpg".to_string(),
            },
        ]);

        let text = output(view);
        assert!(text.contains("m 1: 두부조림"));
        assert!(text.contains("m 4: 계란말이"));
    }
}
