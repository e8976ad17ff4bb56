use std::fmt;

use tracing::{debug, info};

use crate::error::RagError;
use crate::index::Boosts;
use crate::llm::Generator;
use crate::prompt::{assemble, render_context};
use crate::record::Record;
use crate::retriever::Retriever;

pub const NO_MATCH_ANSWER: &str = "Aucune recette pertinente n'a été trouvée pour votre requête.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Model output, grounded on at least one retrieved recipe.
    Generated(String),
    /// Retrieval came back empty; the model was not consulted.
    NoMatch,
}

impl Answer {
    pub fn text(&self) -> &str {
        match self {
            Answer::Generated(text) => text,
            Answer::NoMatch => NO_MATCH_ANSWER,
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

/// An answer together with the recipes it was grounded on.
#[derive(Debug)]
pub struct Response<'r> {
    pub answer: Answer,
    pub sources: Vec<&'r Record>,
}

/// Retrieval-augmented answering: search, render, assemble, generate.
pub struct Rag<G> {
    generator: G,
    boosts: Boosts,
}

impl<G: Generator> Rag<G> {
    pub fn new(generator: G) -> Self {
        Rag {
            generator,
            boosts: Boosts::default(),
        }
    }

    pub fn with_boosts(mut self, boosts: Boosts) -> Self {
        self.boosts = boosts;
        self
    }

    pub fn answer<'r>(
        &self,
        query: &str,
        retriever: &'r Retriever,
        num_results: usize,
    ) -> Result<Response<'r>, RagError> {
        let sources = retriever.search_boosted(query, num_results, &self.boosts);
        if sources.is_empty() {
            info!("No recipe matched the query; skipping generation");
            return Ok(Response {
                answer: Answer::NoMatch,
                sources,
            });
        }

        let context = render_context(&sources)?;
        let prompt = assemble(query, &context);
        debug!(
            "Prompt built from {} recipes ({} chars)",
            sources.len(),
            prompt.chars().count()
        );

        let text = self.generator.generate(&prompt)?;
        Ok(Response {
            answer: Answer::Generated(text),
            sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GenerationError;
    use crate::prompt::tests::recipe;
    use crate::record::{RecordStore, fields};
    use serde_json::Value;
    use std::cell::RefCell;
    use std::collections::BTreeMap;
    use std::time::Duration;

    /// Echoes the prompt back and remembers every call.
    #[derive(Default)]
    struct EchoGenerator {
        prompts: RefCell<Vec<String>>,
    }

    impl Generator for EchoGenerator {
        fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.borrow_mut().push(prompt.to_string());
            Ok(prompt.to_string())
        }
    }

    struct DownGenerator;

    impl Generator for DownGenerator {
        fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
            Err(GenerationError::Timeout(Duration::from_secs(1)))
        }
    }

    fn store(records: Vec<Record>) -> RecordStore {
        RecordStore::from_rows(records.into_iter().map(|record| {
            fields::REQUIRED
                .iter()
                .filter_map(|&name| Some((name.to_string(), record.get(name)?.clone())))
                .collect::<BTreeMap<String, Value>>()
        }))
    }

    fn african_recipes() -> RecordStore {
        store(vec![
            recipe(0, "Ndolé", "Cameroun", "manioc, feuilles de manioc, arachides"),
            recipe(1, "Thiéboudienne", "Sénégal", "riz, poisson, légumes"),
            recipe(2, "Yassa", "Sénégal", "poulet, oignons, citron, moutarde"),
            recipe(3, "Attiéké", "Côte d'Ivoire", "manioc fermenté, poisson"),
        ])
    }

    #[test]
    fn test_ndole_scenario() {
        let retriever = Retriever::build(
            store(vec![recipe(0, "Ndolé", "Cameroun", "manioc, feuilles de manioc, arachides")]),
            &fields::REQUIRED,
        );
        let generator = EchoGenerator::default();
        let rag = Rag::new(&generator);

        let query = "Je n'ai que du manioc et des feuilles de manioc, quelle recette camerounaise puis-je faire ?";
        let response = rag.answer(query, &retriever, 3).unwrap();

        assert!(matches!(response.answer, Answer::Generated(_)));
        assert!(response.answer.text().contains("Ndolé"));
        assert_eq!(response.sources.len(), 1);

        let prompts = generator.prompts.borrow();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains(query));
        assert!(prompts[0].contains("Nom de la recette : Ndolé"));
        assert!(prompts[0].contains("Épices et saveurs principales : Piment, ail"));
    }

    #[test]
    fn test_no_match_short_circuits() {
        let senegal = african_recipes().filter(fields::COUNTRY, "Sénégal");
        let retriever = Retriever::build(senegal, &fields::REQUIRED);
        let generator = EchoGenerator::default();
        let rag = Rag::new(&generator);

        let response = rag
            .answer("Une recette avec du manioc ?", &retriever, 3)
            .unwrap();

        assert_eq!(response.answer, Answer::NoMatch);
        assert_eq!(response.answer.text(), NO_MATCH_ANSWER);
        assert_eq!(
            response.answer.to_string(),
            "Aucune recette pertinente n'a été trouvée pour votre requête."
        );
        assert!(response.sources.is_empty());
        assert!(generator.prompts.borrow().is_empty());
    }

    #[test]
    fn test_empty_query_never_reaches_generator() {
        let retriever = Retriever::build(african_recipes(), &fields::REQUIRED);
        let generator = EchoGenerator::default();

        let response = Rag::new(&generator).answer("", &retriever, 3).unwrap();
        assert_eq!(response.answer, Answer::NoMatch);
        assert!(generator.prompts.borrow().is_empty());
    }

    #[test]
    fn test_context_follows_retrieval_order() {
        let retriever = Retriever::build(african_recipes(), &fields::REQUIRED);
        let generator = EchoGenerator::default();
        let response = Rag::new(&generator)
            .answer("poisson manioc", &retriever, 5)
            .unwrap();

        let text = response.answer.text();
        let positions: Vec<usize> = response
            .sources
            .iter()
            .map(|record| {
                let heading = format!("Nom de la recette : {}", record.name());
                text.find(&heading).unwrap()
            })
            .collect();
        assert!(positions.len() >= 2);
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_boosts_are_applied() {
        let retriever = Retriever::build(african_recipes(), &fields::REQUIRED);
        let mut boosts = Boosts::default();
        boosts.insert(fields::COUNTRY.to_string(), 10.0);

        let response = Rag::new(EchoGenerator::default())
            .with_boosts(boosts)
            .answer("manioc cameroun", &retriever, 1)
            .unwrap();
        assert_eq!(response.sources[0].name(), "Ndolé");
    }

    #[test]
    fn test_missing_field_propagates() {
        let row = BTreeMap::from([
            (fields::NAME.to_string(), Value::from("Foufou")),
            (fields::INGREDIENTS.to_string(), Value::from("manioc, plantain")),
        ]);
        let incomplete = RecordStore::from_rows(vec![row]);
        let retriever = Retriever::build(incomplete, &fields::REQUIRED);
        let generator = EchoGenerator::default();

        let err = Rag::new(&generator)
            .answer("manioc", &retriever, 3)
            .unwrap_err();
        match err {
            RagError::MissingField(missing) => {
                assert_eq!(missing.recipe, "Foufou");
                assert_eq!(missing.field, fields::COOKING_TIME);
            }
            other => panic!("expected a missing field, got {other:?}"),
        }
        assert!(generator.prompts.borrow().is_empty());
    }

    #[test]
    fn test_generation_error_propagates() {
        let retriever = Retriever::build(african_recipes(), &fields::REQUIRED);
        let err = Rag::new(DownGenerator)
            .answer("manioc", &retriever, 3)
            .unwrap_err();
        assert!(matches!(
            err,
            RagError::Generation(GenerationError::Timeout(_))
        ));
    }
}
