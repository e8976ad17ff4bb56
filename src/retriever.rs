use tracing::{debug, info};

use crate::index::{Boosts, TextIndex};
use crate::record::{Record, RecordStore};

/// Searchable view over a (possibly filtered) set of recipes.
pub struct Retriever {
    store: RecordStore,
    index: TextIndex,
}

impl Retriever {
    /// Indexes `store` over the given text fields. Built once per filtered view.
    pub fn build(store: RecordStore, text_fields: &[&str]) -> Self {
        let index = TextIndex::fit(store.records(), text_fields);
        info!(
            "Indexed {} recipes over {} text fields",
            index.len(),
            text_fields.len()
        );
        Retriever { store, index }
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Boosted fields this retriever does not index, sorted. Their weights have no effect.
    pub fn unindexed_fields<'b>(&self, boosts: &'b Boosts) -> Vec<&'b str> {
        let mut unknown: Vec<&str> = boosts
            .keys()
            .map(String::as_str)
            .filter(|field| !self.index.has_field(field))
            .collect();
        unknown.sort_unstable();
        unknown
    }

    pub fn search(&self, query: &str, num_results: usize) -> Vec<&Record> {
        self.search_boosted(query, num_results, &Boosts::default())
    }

    /// At most `num_results` records, most relevant first. Records with no
    /// overlap with the query are never returned.
    pub fn search_boosted(&self, query: &str, num_results: usize, boosts: &Boosts) -> Vec<&Record> {
        let records = self.store.records();
        let results: Vec<&Record> = self
            .index
            .top_k(query, num_results, boosts)
            .into_iter()
            .map(|(i, _)| &records[i])
            .collect();

        debug!("Retrieved {} of {} recipes", results.len(), records.len());
        results
    }
}
