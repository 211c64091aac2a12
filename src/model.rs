use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;

/// Highest numbered instruction/image field pair a recipe row can carry
pub const MAX_STEPS: usize = 20;

/// Instruction text and image field names, indexed by step position - 1
const MANUAL_FIELDS: [(&str, &str); MAX_STEPS] = [
    ("MANUAL01", "MANUAL_IMG01"),
    ("MANUAL02", "MANUAL_IMG02"),
    ("MANUAL03", "MANUAL_IMG03"),
    ("MANUAL04", "MANUAL_IMG04"),
    ("MANUAL05", "MANUAL_IMG05"),
    ("MANUAL06", "MANUAL_IMG06"),
    ("MANUAL07", "MANUAL_IMG07"),
    ("MANUAL08", "MANUAL_IMG08"),
    ("MANUAL09", "MANUAL_IMG09"),
    ("MANUAL10", "MANUAL_IMG10"),
    ("MANUAL11", "MANUAL_IMG11"),
    ("MANUAL12", "MANUAL_IMG12"),
    ("MANUAL13", "MANUAL_IMG13"),
    ("MANUAL14", "MANUAL_IMG14"),
    ("MANUAL15", "MANUAL_IMG15"),
    ("MANUAL16", "MANUAL_IMG16"),
    ("MANUAL17", "MANUAL_IMG17"),
    ("MANUAL18", "MANUAL_IMG18"),
    ("MANUAL19", "MANUAL_IMG19"),
    ("MANUAL20", "MANUAL_IMG20"),
];

/// One recipe row as served by the API.
///
/// Every field is optional because the provider omits or blanks fields
/// freely. Records are immutable once deserialized.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "RecipeRow")]
pub struct RecipeRecord {
    seq: Option<String>,
    name: Option<String>,
    cooking_method: Option<String>,
    category: Option<String>,
    weight: Option<String>,
    ingredients: Option<String>,
    main_image: Option<String>,
    hash_tag: Option<String>,
    sodium_tip: Option<String>,
    energy: Option<String>,
    carbohydrate: Option<String>,
    protein: Option<String>,
    fat: Option<String>,
    sodium: Option<String>,
    instructions: [Option<String>; MAX_STEPS],
    instruction_images: [Option<String>; MAX_STEPS],
}

impl RecipeRecord {
    /// Identity used to key per-recipe caches; empty when the row has no name
    pub fn identity(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    pub fn seq(&self) -> Option<&str> {
        self.seq.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn cooking_method(&self) -> Option<&str> {
        self.cooking_method.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn weight(&self) -> Option<&str> {
        self.weight.as_deref()
    }

    pub fn ingredients(&self) -> Option<&str> {
        self.ingredients.as_deref()
    }

    pub fn main_image(&self) -> Option<&str> {
        self.main_image.as_deref()
    }

    pub fn hash_tag(&self) -> Option<&str> {
        self.hash_tag.as_deref()
    }

    pub fn sodium_tip(&self) -> Option<&str> {
        self.sodium_tip.as_deref()
    }

    pub fn energy(&self) -> Option<&str> {
        self.energy.as_deref()
    }

    pub fn carbohydrate(&self) -> Option<&str> {
        self.carbohydrate.as_deref()
    }

    pub fn protein(&self) -> Option<&str> {
        self.protein.as_deref()
    }

    pub fn fat(&self) -> Option<&str> {
        self.fat.as_deref()
    }

    pub fn sodium(&self) -> Option<&str> {
        self.sodium.as_deref()
    }

    /// Instruction text for a 1-based step position
    pub fn instruction(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.instructions.get(i))
            .and_then(|text| text.as_deref())
    }

    /// Instruction image for a 1-based step position
    pub fn instruction_image(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|i| self.instruction_images.get(i))
            .and_then(|url| url.as_deref())
    }
}

/// Wire shape of a recipe row. Numbered instruction fields land in `rest`
/// and are moved into fixed slots by [`RecipeRecord::from`].
#[derive(Deserialize)]
struct RecipeRow {
    #[serde(rename = "RCP_SEQ", default, deserialize_with = "lenient_string")]
    seq: Option<String>,
    #[serde(rename = "RCP_NM", default, deserialize_with = "lenient_string")]
    name: Option<String>,
    #[serde(rename = "RCP_WAY2", default, deserialize_with = "lenient_string")]
    cooking_method: Option<String>,
    #[serde(rename = "RCP_PAT2", default, deserialize_with = "lenient_string")]
    category: Option<String>,
    #[serde(rename = "INFO_WGT", default, deserialize_with = "lenient_string")]
    weight: Option<String>,
    #[serde(rename = "RCP_PARTS_DTLS", default, deserialize_with = "lenient_string")]
    ingredients: Option<String>,
    #[serde(rename = "ATT_FILE_NO_MAIN", default, deserialize_with = "lenient_string")]
    main_image: Option<String>,
    #[serde(rename = "HASH_TAG", default, deserialize_with = "lenient_string")]
    hash_tag: Option<String>,
    #[serde(rename = "RCP_NA_TIP", default, deserialize_with = "lenient_string")]
    sodium_tip: Option<String>,
    #[serde(rename = "INFO_ENG", default, deserialize_with = "lenient_string")]
    energy: Option<String>,
    #[serde(rename = "INFO_CAR", default, deserialize_with = "lenient_string")]
    carbohydrate: Option<String>,
    #[serde(rename = "INFO_PRO", default, deserialize_with = "lenient_string")]
    protein: Option<String>,
    #[serde(rename = "INFO_FAT", default, deserialize_with = "lenient_string")]
    fat: Option<String>,
    #[serde(rename = "INFO_NA", default, deserialize_with = "lenient_string")]
    sodium: Option<String>,
    #[serde(flatten)]
    rest: HashMap<String, Value>,
}

impl From<RecipeRow> for RecipeRecord {
    fn from(mut row: RecipeRow) -> Self {
        let mut instructions: [Option<String>; MAX_STEPS] = Default::default();
        let mut instruction_images: [Option<String>; MAX_STEPS] = Default::default();

        for (i, (text_field, image_field)) in MANUAL_FIELDS.iter().enumerate() {
            instructions[i] = row.rest.remove(*text_field).and_then(value_to_string);
            instruction_images[i] = row.rest.remove(*image_field).and_then(value_to_string);
        }

        RecipeRecord {
            seq: row.seq,
            name: row.name,
            cooking_method: row.cooking_method,
            category: row.category,
            weight: row.weight,
            ingredients: row.ingredients,
            main_image: row.main_image,
            hash_tag: row.hash_tag,
            sodium_tip: row.sodium_tip,
            energy: row.energy,
            carbohydrate: row.carbohydrate,
            protein: row.protein,
            fat: row.fat,
            sodium: row.sodium,
            instructions,
            instruction_images,
        }
    }
}

/// Accept strings and numbers, treat null as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(value_to_string))
}

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The recipes returned by one fetch, in response order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeBatch {
    records: Vec<RecipeRecord>,
    total_count: Option<u32>,
}

impl RecipeBatch {
    pub fn new(records: Vec<RecipeRecord>) -> Self {
        Self {
            records,
            total_count: None,
        }
    }

    /// Attach the row count the provider declared for the whole dataset
    pub fn with_total_count(mut self, total_count: Option<u32>) -> Self {
        self.total_count = total_count;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecipeRecord> {
        self.records.get(index)
    }

    /// The recipe shown by default after a load
    pub fn featured(&self) -> Option<&RecipeRecord> {
        self.records.first()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RecipeRecord> {
        self.records.iter()
    }

    pub fn total_count(&self) -> Option<u32> {
        self.total_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_fields_map_to_record() {
        let record: RecipeRecord = serde_json::from_value(json!({
            "RCP_SEQ": "28",
            "RCP_NM": "새우 두부 계란찜",
            "RCP_WAY2": "찌기",
            "RCP_PAT2": "반찬",
            "INFO_WGT": "",
            "RCP_PARTS_DTLS": "새우두부계란찜\n연두부 75g(3/4모), 칵테일새우 20g(5마리)",
            "ATT_FILE_NO_MAIN": "http://www.foodsafetykorea.go.kr/uploadimg/cook/10_00028_2.png",
            "INFO_ENG": "220",
            "INFO_NA": 99,
            "MANUAL01": "1. 손질된 새우를 끓는 물에 데쳐 건진다.",
            "MANUAL_IMG01": "http://www.foodsafetykorea.go.kr/uploadimg/cook/20_00028_1.png",
            "MANUAL02": "",
            "MANUAL_IMG02": ""
        }))
        .unwrap();

        assert_eq!(record.seq(), Some("28"));
        assert_eq!(record.name(), Some("새우 두부 계란찜"));
        assert_eq!(record.identity(), "새우 두부 계란찜");
        assert_eq!(record.cooking_method(), Some("찌기"));
        assert_eq!(record.category(), Some("반찬"));
        assert_eq!(record.weight(), Some(""));
        assert_eq!(record.energy(), Some("220"));
        assert_eq!(record.sodium(), Some("99"));
        assert_eq!(record.protein(), None);
        assert_eq!(
            record.instruction(1),
            Some("1. 손질된 새우를 끓는 물에 데쳐 건진다.")
        );
        assert_eq!(record.instruction(2), Some(""));
        assert_eq!(record.instruction(3), None);
    }

    #[test]
    fn test_instruction_positions_out_of_range() {
        let record: RecipeRecord =
            serde_json::from_value(json!({ "MANUAL20": "마지막", "MANUAL_IMG20": "last.png" }))
                .unwrap();
        assert_eq!(record.instruction(20), Some("마지막"));
        assert_eq!(record.instruction_image(20), Some("last.png"));
        assert_eq!(record.instruction(0), None);
        assert_eq!(record.instruction(21), None);
    }

    #[test]
    fn test_null_fields_are_absent() {
        let record: RecipeRecord =
            serde_json::from_value(json!({ "RCP_NM": null, "MANUAL01": null })).unwrap();
        assert_eq!(record.name(), None);
        assert_eq!(record.identity(), "");
        assert_eq!(record.instruction(1), None);
    }

    #[test]
    fn test_batch_keeps_response_order() {
        let batch = RecipeBatch::new(vec![
            serde_json::from_value(json!({ "RCP_NM": "first" })).unwrap(),
            serde_json::from_value(json!({ "RCP_NM": "second" })).unwrap(),
        ])
        .with_total_count(Some(1968));

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.featured().and_then(|r| r.name()), Some("first"));
        assert_eq!(batch.get(1).and_then(|r| r.name()), Some("second"));
        assert!(batch.get(2).is_none());
        assert_eq!(batch.total_count(), Some(1968));
    }
}
