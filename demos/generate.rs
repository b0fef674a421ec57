//! Generate text, a streamed answer and a JSON object through one backend.
//!
//! The backend is picked from the first argument or `GENERATION_PROVIDER`
//! (`openai`, `anthropic` or `gemini`), and its API key is read from the
//! provider's conventional variable:
//!
//! ```bash
//! export ANTHROPIC_API_KEY=your_api_key_here
//! RUST_LOG=platformed_generation=debug cargo run --example generate -- anthropic
//! ```

use futures_util::StreamExt;
use platformed_generation::{Error, GenerationClient, GenerationRequest, Provider};
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let provider: Provider = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("GENERATION_PROVIDER").ok())
        .unwrap_or_else(|| "openai".to_string())
        .parse()?;

    let client = GenerationClient::from_env()?;
    println!("Using {provider} ({})", provider.default_model());

    println!("\n=== Text ===");
    let request = GenerationRequest::from_env(provider, "Name three uses for a paperclip.")?
        .with_system("You answer in one short sentence.");
    let text = client.generate_text(&request).await?;
    println!("{text}");

    println!("\n=== Stream ===");
    let request = GenerationRequest::from_env(provider, "Write a haiku about a robot learning to paint.")?
        .with_temperature(0.7);
    let mut stream = client.stream_text(&request).await?;
    while let Some(chunk) = stream.next().await {
        print!("{}", chunk?);
        std::io::stdout().flush().ok();
    }
    println!();

    println!("\n=== JSON ===");
    let request = GenerationRequest::from_env(
        provider,
        "Senior Rust Engineer at Acme, remote, posted 2024-05-01. \
         Return an object with keys company, title and remote.",
    )?
    .with_system("You extract structured fields from job postings.");
    let value = client.generate_json(&request).await?;
    println!("{}", serde_json::to_string_pretty(&value)?);

    Ok(())
}
