use std::borrow::Cow;
use std::collections::BTreeMap;

use serde_json::Value;

/// Column names of the recipe dataset.
pub mod fields {
    pub const NAME: &str = "Recette";
    pub const INGREDIENTS: &str = "Ingrédients";
    pub const COOKING_TIME: &str = "Temps_de_cuisson";
    pub const DIFFICULTY: &str = "Niveau_de_difficulté";
    pub const MEAL_TYPE: &str = "Type_de_repas";
    pub const DIET: &str = "Régime";
    pub const COUNTRY: &str = "Pays";
    pub const TOTAL_TIME: &str = "Temps_total";
    pub const SPICES: &str = "Épices/Saveurs";

    /// Every field the context template references.
    pub const REQUIRED: [&str; 9] = [
        NAME,
        INGREDIENTS,
        COOKING_TIME,
        DIFFICULTY,
        MEAL_TYPE,
        DIET,
        COUNTRY,
        TOTAL_TIME,
        SPICES,
    ];
}

/// One row of the dataset. Immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    position: usize,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new<K, V>(position: usize, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Record {
            position,
            fields: fields
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Zero-based row number in the loaded dataset.
    pub fn position(&self) -> usize {
        self.position
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Textual value of a field. Null and blank strings count as absent.
    pub fn text(&self, field: &str) -> Option<Cow<'_, str>> {
        match self.get(field)? {
            Value::Null => None,
            Value::String(s) if s.trim().is_empty() => None,
            Value::String(s) => Some(Cow::Borrowed(s.as_str())),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    pub fn name(&self) -> Cow<'_, str> {
        self.text(fields::NAME)
            .unwrap_or(Cow::Borrowed("<sans nom>"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<Record>,
}

impl RecordStore {
    /// Builds a store from raw rows, numbering them in order.
    pub fn from_rows(rows: impl IntoIterator<Item = BTreeMap<String, Value>>) -> Self {
        let records = rows
            .into_iter()
            .enumerate()
            .map(|(position, fields)| Record::new(position, fields))
            .collect();
        RecordStore { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keeps only the records whose `field` equals `value`. Positions are preserved.
    pub fn filter(&self, field: &str, value: &str) -> RecordStore {
        let records = self
            .iter()
            .filter(|record| record.text(field).as_deref() == Some(value))
            .cloned()
            .collect();
        RecordStore { records }
    }

    /// Sorted distinct values of a categorical field.
    pub fn distinct(&self, field: &str) -> Vec<String> {
        let mut values: Vec<String> = self
            .iter()
            .filter_map(|record| record.text(field).map(Cow::into_owned))
            .collect();
        values.sort();
        values.dedup();
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, country: &str, meal: &str) -> BTreeMap<String, Value> {
        BTreeMap::from([
            (fields::NAME.to_string(), Value::from(name)),
            (fields::COUNTRY.to_string(), Value::from(country)),
            (fields::MEAL_TYPE.to_string(), Value::from(meal)),
        ])
    }

    fn store() -> RecordStore {
        RecordStore::from_rows(vec![
            row("Ndolé", "Cameroun", "Plat principal"),
            row("Thiéboudienne", "Sénégal", "Plat principal"),
            row("Eru", "Cameroun", "Plat principal"),
            row("Pastels", "Sénégal", "Entrée"),
        ])
    }

    #[test]
    fn test_filter_keeps_matching_records_in_order() {
        let cameroon = store().filter(fields::COUNTRY, "Cameroun");
        let names: Vec<_> = cameroon.iter().map(|r| r.name().into_owned()).collect();
        assert_eq!(names, vec!["Ndolé", "Eru"]);
        assert_eq!(cameroon.records()[1].position(), 2);
    }

    #[test]
    fn test_filters_compose() {
        let starters = store()
            .filter(fields::COUNTRY, "Sénégal")
            .filter(fields::MEAL_TYPE, "Entrée");
        assert_eq!(starters.len(), 1);
        assert_eq!(starters.records()[0].name(), "Pastels");

        assert!(store().filter(fields::COUNTRY, "Mali").is_empty());
    }

    #[test]
    fn test_distinct_is_sorted_and_deduplicated() {
        assert_eq!(store().distinct(fields::COUNTRY), vec!["Cameroun", "Sénégal"]);
        assert_eq!(
            store().distinct(fields::MEAL_TYPE),
            vec!["Entrée", "Plat principal"]
        );
    }

    #[test]
    fn test_text_renders_primitives_and_treats_null_as_absent() {
        let record = Record::new(
            0,
            [
                ("Temps_total", Value::from(45)),
                ("Régime", Value::Null),
                ("Recette", Value::from("Mafé")),
            ],
        );
        assert_eq!(record.text("Temps_total").as_deref(), Some("45"));
        assert_eq!(record.text("Régime"), None);
        assert_eq!(record.text("Pays"), None);
        assert_eq!(record.name(), "Mafé");
    }

    #[test]
    fn test_text_treats_blank_strings_as_absent() {
        let record = Record::new(0, [("Recette", ""), ("Pays", "  \t"), ("Régime", " Vegan ")]);
        assert_eq!(record.text("Pays"), None);
        assert_eq!(record.name(), "<sans nom>");
        assert_eq!(record.text("Régime").as_deref(), Some(" Vegan "));
    }
}
