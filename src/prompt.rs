use std::borrow::Cow;

use crate::error::MissingFieldError;
use crate::record::{Record, fields};

const INSTRUCTIONS: &str = "\
Contexte :
Tu es un assistant culinaire expert, spécialisé dans la cuisine africaine et internationale.
Tu disposes d'un vaste dataset de recettes comprenant les informations suivantes pour chaque plat : nom, ingrédients, temps de cuisson, niveau de difficulté, type de repas, régime alimentaire, pays ou région d'origine, temps total de préparation, et épices ou saveurs principales.

Instructions :
- Utilise uniquement les informations fournies dans le CONTEXTE pour répondre à la QUESTION.
- Fournis une réponse claire, structurée et pratique.
- Ajoute des conseils ou un guide étape par étape pour aider l'utilisateur à accomplir sa tâche culinaire.";

/// Renders retrieved recipes into the grounding context, one block per
/// record separated by a blank line, in retrieval order.
pub fn render_context(results: &[&Record]) -> Result<String, MissingFieldError> {
    let blocks = results
        .iter()
        .map(|record| render_record(record))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(blocks.join("\n\n"))
}

pub fn render_record(record: &Record) -> Result<String, MissingFieldError> {
    Ok(format!(
        "Nom de la recette : {}\n\
         Ingrédients : {}\n\
         Temps de cuisson : {}\n\
         Niveau de difficulté : {}\n\
         Type de repas : {}\n\
         Régime alimentaire : {}\n\
         Pays ou région d'origine : {}\n\
         Temps total de préparation : {}\n\
         Épices et saveurs principales : {}",
        required(record, fields::NAME)?,
        required(record, fields::INGREDIENTS)?,
        required(record, fields::COOKING_TIME)?,
        required(record, fields::DIFFICULTY)?,
        required(record, fields::MEAL_TYPE)?,
        required(record, fields::DIET)?,
        required(record, fields::COUNTRY)?,
        required(record, fields::TOTAL_TIME)?,
        required(record, fields::SPICES)?,
    ))
}

fn required<'r>(record: &'r Record, field: &'static str) -> Result<Cow<'r, str>, MissingFieldError> {
    record.text(field).ok_or_else(|| MissingFieldError {
        record: record.position(),
        recipe: record.name().into_owned(),
        field,
    })
}

/// Final prompt: fixed instructions, then the question, then the context.
pub fn assemble(query: &str, context: &str) -> String {
    format!("{INSTRUCTIONS}\n\nQUESTION :\n{query}\n\nCONTEXTE :\n{context}")
}
