use crate::model::{RecipeRecord, MAX_STEPS};

/// Image shown for a step whose row carries no image reference
pub const STEP_IMAGE_PLACEHOLDER: &str = "placeholder.jpg";

/// One entry of the cooking-process carousel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookStep {
    /// 1-based position within the extracted sequence
    pub index: usize,
    /// Instruction text without its leading ordinal
    pub text: String,
    pub image_url: String,
}

/// Derive the ordered cooking steps of a recipe.
///
/// Scans instruction positions 1 through 20 in order and keeps those whose
/// text is non-blank. Step indices are renumbered from 1, so a record with
/// instructions only at positions 3, 7 and 15 yields steps 1, 2 and 3.
/// An empty result is a valid "no steps" outcome.
pub fn extract_steps(record: &RecipeRecord) -> Vec<CookStep> {
    (1..=MAX_STEPS)
        .filter_map(|position| {
            let text = record.instruction(position)?.trim();
            if text.is_empty() {
                return None;
            }
            let image_url = record
                .instruction_image(position)
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .unwrap_or(STEP_IMAGE_PLACEHOLDER);
            Some((strip_ordinal(text).to_string(), image_url.to_string()))
        })
        .enumerate()
        .map(|(i, (text, image_url))| CookStep {
            index: i + 1,
            text,
            image_url,
        })
        .collect()
}

/// Remove a leading `N.` marker and the whitespace after it.
///
/// Text without the marker is returned unchanged, including text that
/// starts with digits not followed by a period ("2인분").
pub fn strip_ordinal(text: &str) -> &str {
    let digits = text.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return text;
    }
    match text[digits..].strip_prefix('.') {
        Some(rest) => rest.trim_start(),
        None => text,
    }
}
