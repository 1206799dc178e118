use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use roadside_agents::LocationResolver;
use roadside_core::{selection_envelope, ResolutionResult, DEFAULT_LOCALITY};
use roadside_gateways::{
    ClassifierConfig, DistanceGateway, GoogleDistanceMatrix, GooglePlacesLookup, MapsConfig,
    OpenAiClassifier,
};
use roadside_observability::{init_tracing, AppMetrics};
use serde_json::Value;

type Resolver = LocationResolver<OpenAiClassifier, GooglePlacesLookup>;

#[derive(Debug, Parser)]
#[command(name = "roadside")]
#[command(about = "Roadside assistance location tools")]
struct Cli {
    #[command(flatten)]
    upstream: UpstreamArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct UpstreamArgs {
    #[arg(long, env = "ROADSIDE_OPENAI_API_KEY", hide_env_values = true)]
    openai_api_key: Option<String>,

    #[arg(long, env = "ROADSIDE_OPENAI_MODEL", default_value = ClassifierConfig::DEFAULT_MODEL)]
    openai_model: String,

    #[arg(long, env = "ROADSIDE_OPENAI_BASE_URL", default_value = ClassifierConfig::DEFAULT_BASE_URL)]
    openai_base_url: String,

    #[arg(long, env = "ROADSIDE_GOOGLE_MAPS_API_KEY", hide_env_values = true)]
    maps_api_key: Option<String>,

    #[arg(long, env = "ROADSIDE_GOOGLE_MAPS_BASE_URL", default_value = MapsConfig::DEFAULT_BASE_URL)]
    maps_base_url: String,

    #[arg(long, env = "ROADSIDE_DEFAULT_LOCALITY", default_value = DEFAULT_LOCALITY)]
    locality: String,

    #[arg(long, env = "ROADSIDE_CLASSIFIER_TIMEOUT_SECONDS", default_value_t = 20)]
    classifier_timeout: u64,

    #[arg(long, env = "ROADSIDE_LOOKUP_TIMEOUT_SECONDS", default_value_t = 10)]
    lookup_timeout: u64,
}

impl UpstreamArgs {
    fn maps_config(&self) -> MapsConfig {
        MapsConfig {
            api_key: self.maps_api_key.clone(),
            base_url: self.maps_base_url.clone(),
            timeout: Duration::from_secs(self.lookup_timeout),
        }
    }

    fn build_resolver(&self) -> Result<Resolver> {
        let classifier = OpenAiClassifier::new(ClassifierConfig {
            api_key: self.openai_api_key.clone(),
            model: self.openai_model.clone(),
            base_url: self.openai_base_url.clone(),
            default_locality: self.locality.clone(),
            timeout: Duration::from_secs(self.classifier_timeout),
        })?;
        let places = GooglePlacesLookup::new(self.maps_config())?;

        Ok(LocationResolver::new(
            Arc::new(classifier),
            Arc::new(places),
            AppMetrics::shared(),
            self.locality.clone(),
        ))
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve a free-text location description.
    Resolve { text: String },
    /// Resolve a place picked from an earlier candidate list.
    Select { place: String },
    /// Describe a location, pick from candidates, repeat.
    Chat,
    /// Road distance between two places.
    Distance {
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("roadside_cli");
    let cli = Cli::parse();

    match cli.command {
        Command::Resolve { text } => {
            let resolver = cli.upstream.build_resolver()?;
            let result = resolver.resolve(Some(&Value::String(text))).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Select { place } => {
            let resolver = cli.upstream.build_resolver()?;
            let result = resolver.resolve(Some(&selection_envelope(&place))).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Chat => {
            let resolver = cli.upstream.build_resolver()?;
            run_chat(&resolver).await?;
        }
        Command::Distance { from, to } => {
            let matrix = GoogleDistanceMatrix::new(cli.upstream.maps_config())?;
            let estimate = matrix.distance(&from, &to).await?;
            println!("{}", serde_json::to_string_pretty(&estimate)?);
        }
    }

    Ok(())
}

async fn run_chat(resolver: &Resolver) -> Result<()> {
    println!("Describe where the vehicle is. type 'exit' to quit.");

    loop {
        let Some(line) = prompt("> ")? else {
            break;
        };
        if line.is_empty() {
            continue;
        }

        let mut result = resolver.resolve(Some(&Value::String(line))).await?;

        if let ResolutionResult::Options(candidates) = &result {
            if candidates.is_empty() {
                println!("\nNo nearby places to choose from. Try describing it differently.\n");
                continue;
            }
            println!("\nWhich of these is closest?");
            for (index, name) in candidates.as_slice().iter().enumerate() {
                println!("  {}. {name}", index + 1);
            }

            let Some(picked) = pick_candidate(candidates.as_slice())? else {
                break;
            };

            result = resolver.resolve(Some(&selection_envelope(&picked))).await?;
        }

        match &result {
            ResolutionResult::FullAddress(_) => {
                let address = result.clean_query_text().unwrap_or("(no address text)");
                println!("\nSearch address: {address}\n");
            }
            ResolutionResult::NoResults => {
                println!("\nNo matching places found. Try a nearby landmark.\n");
            }
            other => {
                println!("\n{}\n", serde_json::to_string_pretty(other)?);
            }
        }
    }

    Ok(())
}

/// Asks until the answer names a listed candidate.
fn pick_candidate(candidates: &[String]) -> Result<Option<String>> {
    loop {
        let Some(choice) = prompt("pick a number: ")? else {
            return Ok(None);
        };
        match parse_pick(&choice, candidates) {
            Some(name) => return Ok(Some(name.to_string())),
            None => println!("Enter a number between 1 and {}.", candidates.len()),
        }
    }
}

fn parse_pick<'a>(choice: &str, candidates: &'a [String]) -> Option<&'a str> {
    choice
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| candidates.get(index))
        .map(String::as_str)
}

/// Returns `None` on end of input or an exit command.
fn prompt(label: &str) -> Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }

    let line = line.trim();
    if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
        return Ok(None);
    }
    Ok(Some(line.to_string()))
}
