use anyhow::{Result, anyhow};
use clap::Parser;
use quoteposter::cli::ServiceOptions;
use quoteposter::config::{build_pipeline, setup_logging};
use quoteposter::pipeline::{QuoteMode, pick_topic};
use serde_json::json;

/// Generate a single quote poster without starting the web server.
///
/// Minimal UX:
///   generate_poster procrastination
#[derive(Parser, Debug)]
#[command(name = "generate_poster")]
#[command(about = "Generate one quote poster and print the result as JSON")]
struct Args {
    /// Poster topic, a random example topic when omitted
    topic: Option<String>,

    /// Generate a fresh quote steered by the reference corpus instead of the topic
    #[arg(long)]
    inspired: bool,

    /// Enable debug logging
    #[arg(long, env = "QUOTEPOSTER_DEBUG")]
    debug: bool,

    #[command(flatten)]
    service: ServiceOptions,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _ = setup_logging(args.debug);

    let pipeline = build_pipeline(&args.service).await?;
    let topic = pick_topic(args.topic.as_deref());
    let mode = if args.inspired {
        QuoteMode::Inspired
    } else {
        QuoteMode::Topic
    };

    match pipeline.run(&topic, mode).await {
        Ok(poster) => {
            println!("{}", serde_json::to_string_pretty(&poster)?);
            Ok(())
        }
        Err(failure) => {
            let body = match &failure.quote {
                Some(quote) => json!({"error": failure.error.to_string(), "quote": quote}),
                None => json!({"error": failure.error.to_string()}),
            };
            println!("{}", serde_json::to_string_pretty(&body)?);
            Err(anyhow!("poster generation failed for topic {topic}"))
        }
    }
}
