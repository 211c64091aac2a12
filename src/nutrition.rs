//! Percent-of-daily-value breakdown for the five nutrients a recipe row reports.
//!
//! Daily standards are the 2020 Korean MFDS reference values and are fixed;
//! nothing in a record can change them.

use std::fmt;

use crate::model::RecipeRecord;

/// Nutrients in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Nutrient {
    Energy,
    Carbohydrate,
    Protein,
    Fat,
    Sodium,
}

impl Nutrient {
    pub const ALL: [Nutrient; 5] = [
        Nutrient::Energy,
        Nutrient::Carbohydrate,
        Nutrient::Protein,
        Nutrient::Fat,
        Nutrient::Sodium,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Nutrient::Energy => "열량",
            Nutrient::Carbohydrate => "탄수화물",
            Nutrient::Protein => "단백질",
            Nutrient::Fat => "지방",
            Nutrient::Sodium => "나트륨",
        }
    }

    pub fn standard(&self) -> DailyStandard {
        match self {
            Nutrient::Energy => DailyStandard {
                value: 2000.0,
                unit: "Kcal",
            },
            Nutrient::Carbohydrate => DailyStandard {
                value: 324.0,
                unit: "g",
            },
            Nutrient::Protein => DailyStandard {
                value: 55.0,
                unit: "g",
            },
            Nutrient::Fat => DailyStandard {
                value: 54.0,
                unit: "g",
            },
            Nutrient::Sodium => DailyStandard {
                value: 2000.0,
                unit: "mg",
            },
        }
    }

    /// Raw field value on the record, `None` when the row omits it
    pub fn raw<'a>(&self, record: &'a RecipeRecord) -> Option<&'a str> {
        match self {
            Nutrient::Energy => record.energy(),
            Nutrient::Carbohydrate => record.carbohydrate(),
            Nutrient::Protein => record.protein(),
            Nutrient::Fat => record.fat(),
            Nutrient::Sodium => record.sodium(),
        }
    }
}

/// Reference daily quantity of a nutrient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyStandard {
    pub value: f64,
    pub unit: &'static str,
}

/// Percent of the daily standard, rounded to one decimal
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DailyPercent {
    Percent(f64),
    NotAvailable,
}

impl fmt::Display for DailyPercent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DailyPercent::Percent(p) => write!(f, "{:.1}", p),
            DailyPercent::NotAvailable => f.write_str("N/A"),
        }
    }
}

/// One row of the nutrition panel
#[derive(Debug, Clone, PartialEq)]
pub struct NutritionLine {
    pub nutrient: Nutrient,
    pub label: &'static str,
    /// Parsed amount; `None` when the field is absent or not numeric
    pub value: Option<f64>,
    pub unit: &'static str,
    pub percent: DailyPercent,
}

impl NutritionLine {
    /// Amount with unit, or "정보 없음" when there is nothing to show
    pub fn display_value(&self) -> String {
        match self.value {
            Some(v) => format!("{} {}", v, self.unit),
            None => "정보 없음".to_string(),
        }
    }
}

/// Computes the nutrition panel for a recipe
pub trait NutritionCalculator: Send + Sync {
    fn compute_nutrition_lines(&self, record: &RecipeRecord) -> [NutritionLine; 5];
}

/// Calculator using the fixed daily standards
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyValueCalculator;

impl NutritionCalculator for DailyValueCalculator {
    fn compute_nutrition_lines(&self, record: &RecipeRecord) -> [NutritionLine; 5] {
        Nutrient::ALL.map(|nutrient| nutrition_line(nutrient, nutrient.raw(record)))
    }
}

fn nutrition_line(nutrient: Nutrient, raw: Option<&str>) -> NutritionLine {
    let standard = nutrient.standard();
    let value = raw.and_then(|raw| {
        if raw.trim().is_empty() {
            Some(0.0)
        } else {
            parse_leading_decimal(raw)
        }
    });

    NutritionLine {
        nutrient,
        label: nutrient.label(),
        value,
        unit: standard.unit,
        percent: value
            .map(|v| daily_percent(v, standard))
            .unwrap_or(DailyPercent::NotAvailable),
    }
}

/// `round1(value / standard * 100)`, or `NotAvailable` when undefined
pub fn daily_percent(value: f64, standard: DailyStandard) -> DailyPercent {
    if standard.value > 0.0 && value.is_finite() {
        DailyPercent::Percent((value / standard.value * 1000.0).round() / 10.0)
    } else {
        DailyPercent::NotAvailable
    }
}

/// Parse the longest leading `[+-]?digits[.digits]` prefix, so "12.5g" reads as 12.5
pub fn parse_leading_decimal(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }
    let int_digits = bytes[end..].iter().take_while(|b| b.is_ascii_digit()).count();
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = bytes[end + 1..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if frac_digits > 0 || int_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }
    s[..end].parse().ok()
}
