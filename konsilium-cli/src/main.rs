//! Operator tool for the guideline index: ingest the configured documents,
//! inspect stats, clear domains and run trial searches.

use tracing::{error, info, warn};

use konsilium_core::Settings;
use konsilium_knowledge::KnowledgeEngine;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };

    let settings = Settings::load()?;
    let engine = KnowledgeEngine::open(settings.knowledge.clone()).await?;

    match command.as_str() {
        "ingest" => run_ingest(&settings, &engine, args.iter().any(|a| a == "--keep")).await?,
        "stats" => run_stats(&engine).await?,
        "clear" => run_clear(&engine, &args[1..]).await?,
        "search" => run_search(&settings, &engine, &args[1..]).await?,
        other => {
            eprintln!("Unknown command: {other}\n");
            print_usage();
        }
    }

    Ok(())
}

fn print_usage() {
    println!(
        "konsilium-cli - guideline index management\n\
         \n\
         Usage:\n\
         \x20 konsilium-cli ingest [--keep]      Ingest configured guidelines (clears each\n\
         \x20                                    domain first unless --keep is given)\n\
         \x20 konsilium-cli stats                Show index statistics\n\
         \x20 konsilium-cli clear <domain>       Delete one domain's segments\n\
         \x20 konsilium-cli clear --all          Delete the entire index\n\
         \x20 konsilium-cli search <domain> <query...>  Trial search against one domain"
    );
}

/// Build the index from the `[[guidelines]]` manifest. Each domain is
/// cleared before re-ingestion by default so repeated setup runs with
/// changed chunk parameters cannot accumulate stale overlapping segments.
async fn run_ingest(
    settings: &Settings,
    engine: &KnowledgeEngine,
    keep: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if settings.guidelines.is_empty() {
        warn!("No guidelines configured; add [[guidelines]] entries to the config file");
        return Ok(());
    }

    for guideline in &settings.guidelines {
        info!("Processing: {}", guideline.name);

        if !keep {
            let cleared = engine.clear_domain(&guideline.domain).await?;
            if cleared > 0 {
                info!(
                    "Cleared {} stale segments from domain '{}'",
                    cleared, guideline.domain
                );
            }
        }

        match engine
            .ingest_guideline(&guideline.path, &guideline.domain)
            .await
        {
            Ok(report) => {
                println!(
                    "✓ {} - {} segments indexed under '{}'",
                    guideline.name, report.segments_created, report.domain
                );
            }
            Err(e) => {
                // Partial ingestion stands; continue with the next source.
                error!("Failed to process {}: {e}", guideline.name);
                println!("✗ {} - {e}", guideline.name);
            }
        }
    }

    run_stats(engine).await
}

async fn run_stats(engine: &KnowledgeEngine) -> Result<(), Box<dyn std::error::Error>> {
    let stats = engine.stats().await?;
    println!("\n=== Guideline Index Statistics ===");
    println!("Total segments: {}", stats.total_segments);
    for (domain, count) in &stats.per_domain {
        println!("  {domain}: {count}");
    }
    Ok(())
}

async fn run_clear(
    engine: &KnowledgeEngine,
    args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    match args.first().map(String::as_str) {
        Some("--all") => {
            let removed = engine.clear_all().await?;
            println!("Cleared the entire index ({removed} segments)");
        }
        Some(domain) => {
            let removed = engine.clear_domain(domain).await?;
            println!("Cleared {removed} segments from domain '{domain}'");
        }
        None => {
            eprintln!("clear requires a domain name, or --all to wipe the whole index");
        }
    }
    Ok(())
}

async fn run_search(
    settings: &Settings,
    engine: &KnowledgeEngine,
    args: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let Some((domain, query_words)) = args.split_first() else {
        eprintln!("search requires a domain and a query");
        return Ok(());
    };
    let query = query_words.join(" ");
    if query.is_empty() {
        eprintln!("search requires a query after the domain");
        return Ok(());
    }

    let hits = engine
        .search(&query, Some(domain.as_str()), settings.knowledge.n_results)
        .await?;
    if hits.is_empty() {
        println!("No results for '{query}' in domain '{domain}'");
        return Ok(());
    }

    for (i, hit) in hits.iter().enumerate() {
        let preview: String = hit.segment.content.chars().take(120).collect();
        println!(
            "{}. [{:.4}] {} p.{} ({})\n   {preview}...",
            i + 1,
            hit.distance,
            hit.segment.source,
            hit.segment.page,
            hit.segment.id
        );
    }
    Ok(())
}
