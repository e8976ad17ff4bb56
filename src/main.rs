use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use recipe_rag::config::Settings;
use recipe_rag::index::Boosts;
use recipe_rag::llm::OllamaGenerator;
use recipe_rag::rag::{Rag, Response};
use recipe_rag::record::{RecordStore, fields};
use recipe_rag::retriever::Retriever;
use recipe_rag::utils;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Filter value meaning "no filter".
const ALL: &str = "Tous";

#[derive(Parser, Debug)]
#[command(name = "recipe-rag")]
#[command(about = "Assistant culinaire africain - answers cooking questions from a recipe dataset", long_about = None)]
struct Cli {
    /// Recipe dataset (.csv or .json)
    #[arg(long, global = true)]
    data: Option<PathBuf>,

    /// Ollama model identifier
    #[arg(long, global = true)]
    model: Option<String>,

    /// Ollama server URL
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Generation timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct ViewArgs {
    /// Only consider recipes from this country
    #[arg(long)]
    country: Option<String>,

    /// Only consider recipes of this meal type
    #[arg(long)]
    meal_type: Option<String>,

    /// Number of recipes handed to the model
    #[arg(short = 'n', long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(1..=5))]
    num_results: u8,

    /// Field weight, e.g. --boost Ingrédients=3 (repeatable)
    #[arg(long = "boost", value_name = "FIELD=WEIGHT", value_parser = utils::parse_boost)]
    boosts: Vec<(String, f32)>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answer a single question
    Ask {
        query: String,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Ask questions interactively (Ctrl+D to exit)
    Chat {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// List the countries and meal types available as filters
    Filters,
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env()?;
    if let Some(data) = cli.data {
        settings.data_path = data;
    }
    if let Some(model) = cli.model {
        settings.llm.model = model;
    }
    if let Some(url) = cli.ollama_url {
        settings.llm.base_url = url;
    }
    if let Some(secs) = cli.timeout {
        settings.llm.timeout = std::time::Duration::from_secs(secs);
    }
    settings.validate()?;

    let store = utils::load_records(&settings.data_path)
        .with_context(|| format!("loading recipes from {:?}", settings.data_path))?;

    match cli.command {
        Commands::Filters => {
            list_filters(&store);
            Ok(())
        }
        Commands::Ask { query, view } => {
            let retriever = build_view(store, &view);
            let rag = pipeline(&settings, &view, &retriever)?;
            print!("\nThinking...");
            io::stdout().flush()?;
            match rag.answer(&query, &retriever, view.num_results.into()) {
                Ok(response) => {
                    print_response(&response);
                    Ok(())
                }
                Err(e) => {
                    // wipe the indicator before the error reaches stderr
                    print!("\r{:12}\r", "");
                    io::stdout().flush()?;
                    Err(e.into())
                }
            }
        }
        Commands::Chat { view } => {
            let retriever = build_view(store, &view);
            let rag = pipeline(&settings, &view, &retriever)?;
            chat(&rag, &retriever, view.num_results.into())
        }
    }
}

fn selected(filter: Option<&str>) -> Option<&str> {
    filter.filter(|value| *value != ALL)
}

/// Narrows the store by the requested filters and indexes what is left.
fn build_view(mut store: RecordStore, view: &ViewArgs) -> Retriever {
    if let Some(country) = selected(view.country.as_deref()) {
        store = store.filter(fields::COUNTRY, country);
    }
    if let Some(meal_type) = selected(view.meal_type.as_deref()) {
        store = store.filter(fields::MEAL_TYPE, meal_type);
    }

    let retriever = Retriever::build(store, &fields::REQUIRED);
    match selected(view.country.as_deref()) {
        Some(country) => info!("Indexing done for {}: {} recipes", country, retriever.len()),
        None => info!("Indexing done for all countries: {} recipes", retriever.len()),
    }
    if retriever.is_empty() {
        warn!("No recipe matches the selected filters; every question will fall back");
    }
    retriever
}

/// Connects to Ollama once; the client is reused for every question.
fn pipeline(
    settings: &Settings,
    view: &ViewArgs,
    retriever: &Retriever,
) -> Result<Rag<OllamaGenerator>> {
    let generator = OllamaGenerator::new(settings.llm.clone())?;
    match generator.check_model() {
        Ok(true) => info!("Using model {} at {}", generator.model(), settings.llm.base_url),
        Ok(false) => warn!(
            "Model {} is not pulled on {}; generation will fail",
            generator.model(),
            settings.llm.base_url
        ),
        Err(e) => warn!("Cannot check Ollama server: {}", e),
    }

    let boosts: Boosts = view.boosts.iter().cloned().collect();
    for field in retriever.unindexed_fields(&boosts) {
        warn!("Boost on {:?} ignored: not an indexed field", field);
    }
    Ok(Rag::new(generator).with_boosts(boosts))
}

fn chat(rag: &Rag<OllamaGenerator>, retriever: &Retriever, num_results: usize) -> Result<()> {
    println!("Posez votre question (Ctrl+D pour quitter)");

    loop {
        let mut query = String::new();
        print!("> ");
        io::stdout().flush()?;

        if io::stdin().read_line(&mut query)? == 0 {
            break; // EOF (Ctrl+D)
        }

        let query = query.trim();
        if query.is_empty() {
            continue;
        }

        print!("\nThinking...");
        io::stdout().flush()?;
        match rag.answer(query, retriever, num_results) {
            Ok(response) => print_response(&response),
            Err(e) => eprintln!("\rError: {}\n", e),
        }
    }

    Ok(())
}

fn print_response(response: &Response<'_>) {
    println!("\r{}\n", response.answer);

    if response.sources.is_empty() {
        return;
    }
    println!("Recettes correspondantes :");
    for record in &response.sources {
        println!(
            "- {} ({}, {})",
            record.name(),
            record.text(fields::COUNTRY).unwrap_or_default(),
            record.text(fields::TOTAL_TIME).unwrap_or_default()
        );
    }
    println!();
}

fn list_filters(store: &RecordStore) {
    println!("Pays :");
    for country in store.distinct(fields::COUNTRY) {
        println!("  {}", country);
    }
    println!("Types de repas :");
    for meal_type in store.distinct(fields::MEAL_TYPE) {
        println!("  {}", meal_type);
    }
}
