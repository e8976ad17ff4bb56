use lazy_static::lazy_static;
use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use crate::record::Record;

/// Per-field weight multipliers. Fields not listed weigh 1.0.
pub type Boosts = FxHashMap<String, f32>;

type SparseVector = FxHashMap<String, f32>;

/// TF-IDF vectors for one declared text field.
#[derive(Debug)]
struct FieldVectors {
    idf: FxHashMap<String, f32>,
    documents: Vec<SparseVector>,
}

/// Bag-of-words relevance index over a fixed set of text fields.
///
/// Each field is scored independently with cosine similarity between the
/// query and document TF-IDF vectors; field scores are weighted by their
/// boost and summed.
#[derive(Debug)]
pub struct TextIndex {
    fields: Vec<(String, FieldVectors)>,
    len: usize,
}

impl TextIndex {
    pub fn fit(records: &[Record], text_fields: &[&str]) -> Self {
        let fields = text_fields
            .iter()
            .map(|&field| {
                let documents: Vec<Vec<String>> = records
                    .iter()
                    .map(|record| record.text(field).map(|t| tokenize(&t)).unwrap_or_default())
                    .collect();
                (field.to_string(), FieldVectors::fit(&documents))
            })
            .collect();

        TextIndex {
            fields,
            len: records.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.fields.iter().any(|(name, _)| name == field)
    }

    /// Relevance score of every indexed document, in document order.
    pub fn scores(&self, query: &str, boosts: &Boosts) -> Vec<f32> {
        let mut scores = vec![0.0; self.len];
        let tokens = tokenize(query);
        if tokens.is_empty() {
            return scores;
        }

        for (name, field) in &self.fields {
            let boost = boosts.get(name).copied().unwrap_or(1.0);
            if boost == 0.0 {
                continue;
            }

            let query_vector = field.vectorize(&tokens);
            if query_vector.is_empty() {
                continue;
            }

            for (score, document) in scores.iter_mut().zip(&field.documents) {
                *score += boost * cosine_similarity(&query_vector, document);
            }
        }

        scores
    }

    /// Indices of the `k` best documents with a positive score, best first.
    /// Equal scores keep document order.
    pub fn top_k(&self, query: &str, k: usize, boosts: &Boosts) -> Vec<(usize, f32)> {
        let mut ranked: Vec<(usize, f32)> = self
            .scores(query, boosts)
            .into_iter()
            .enumerate()
            .filter(|(_, score)| *score > 0.0)
            .collect();

        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked.truncate(k);
        ranked
    }
}

impl FieldVectors {
    fn fit(documents: &[Vec<String>]) -> Self {
        let doc_count = documents.len() as f32;

        let mut doc_freq: FxHashMap<&str, usize> = FxHashMap::default();
        for tokens in documents {
            let unique: FxHashSet<&str> = tokens.iter().map(String::as_str).collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        let idf: FxHashMap<String, f32> = doc_freq
            .into_iter()
            .map(|(term, df)| {
                let idf = (1.0 + doc_count / (1.0 + df as f32)).ln();
                (term.to_string(), idf)
            })
            .collect();

        let mut field = FieldVectors {
            idf,
            documents: Vec::new(),
        };
        let vectors = documents.iter().map(|tokens| field.vectorize(tokens)).collect();
        field.documents = vectors;
        field
    }

    /// L2-normalised TF-IDF vector; terms outside the field vocabulary are ignored.
    fn vectorize(&self, tokens: &[String]) -> SparseVector {
        let mut term_freq: SparseVector = FxHashMap::default();
        for token in tokens {
            *term_freq.entry(token.clone()).or_insert(0.0) += 1.0;
        }

        let tokens_count = tokens.len() as f32;
        let mut vector: SparseVector = term_freq
            .into_iter()
            .filter_map(|(term, tf)| {
                let idf = *self.idf.get(&term)?;
                Some((term, tf / tokens_count * idf))
            })
            .collect();

        let norm = vector.values().map(|w| w * w).sum::<f32>().sqrt();
        if norm == 0.0 {
            return SparseVector::default();
        }
        for weight in vector.values_mut() {
            *weight /= norm;
        }
        vector
    }
}

fn cosine_similarity(query: &SparseVector, document: &SparseVector) -> f32 {
    // both sides are unit vectors
    query
        .iter()
        .filter_map(|(term, weight)| document.get(term).map(|d| weight * d))
        .sum()
}

lazy_static! {
    static ref STOP_WORDS: FxHashSet<&'static str> = {
        let words = [
            // french, accents folded
            "au", "aux", "avec", "ce", "ces", "cette", "dans", "de", "des", "du", "elle", "en",
            "et", "eux", "il", "ils", "je", "la", "le", "les", "leur", "lui", "ma", "mais", "me",
            "meme", "mes", "moi", "mon", "ne", "nos", "notre", "nous", "on", "ou", "par", "pas",
            "pour", "qu", "que", "quel", "quelle", "quels", "quelles", "qui", "sa", "se", "ses",
            "son", "sur", "ta", "te", "tes", "toi", "ton", "tu", "un", "une", "vos", "votre",
            "vous", "est", "sont", "ai", "as", "avons", "avez", "ont", "suis", "etre", "avoir",
            "puis", "peux", "faire", "comment",
            // english
            "an", "and", "are", "as", "at", "be", "by", "for", "from", "has", "he", "in", "is",
            "it", "its", "of", "on", "that", "the", "to", "was", "were", "will", "with",
        ];
        words.into_iter().collect()
    };
    static ref NON_WORD: Regex = Regex::new(r"[^\w\s]").expect("static regex");
}

/// Lower-cased, accent-folded word tokens of at least two characters, stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    let folded: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase();
    let text = NON_WORD.replace_all(&folded, " ");

    text.split_whitespace()
        .filter(|token| token.chars().count() >= 2)
        .filter(|&token| !STOP_WORDS.contains(token))
        .map(str::to_string)
        .collect()
}
