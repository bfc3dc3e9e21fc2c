//! movieroute HTTP server binary

use movieroute::{
    HttpTextGen, MockRetrievalBackend, MockStatisticsBackend, MockTextGenerator, Orchestrator,
    RetrievalBackend, RetrievalClient, Settings, SharedOrchestrator, StatisticsBackend,
    StatisticsClient, TextGenerator,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true)
        .init();

    println!("movieroute question router");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();

    let settings = Settings::from_env()?;

    // Check for --use-real flag
    let use_real = std::env::args().any(|arg| arg == "--use-real");

    let orchestrator = if use_real {
        build_real(&settings).await?
    } else {
        println!("✓ Mode: MOCK backends");
        println!("   (use --use-real to call the retrieval, statistics and LLM services)");
        build_mock(&settings)
    };

    println!("✓ Orchestrator initialized");
    println!("✓ Starting HTTP server on port {}...", settings.port);
    println!();

    movieroute::server::run_server(orchestrator, settings.port).await?;

    Ok(())
}

async fn build_real(settings: &Settings) -> anyhow::Result<SharedOrchestrator> {
    println!("✓ Mode: REAL services");
    println!("✓ Retrieval service: {}", settings.retrieval_url);
    println!("✓ Statistics service: {}", settings.statistics_url);
    println!("✓ Text generation: {} ({})", settings.llm.base_url, settings.llm.model);

    if settings.llm.api_key.is_none() {
        eprintln!("⚠️  OPENAI_API_KEY is not set; requests to the text generation service may be rejected");
    }

    let retrieval = RetrievalClient::new(
        settings.retrieval_url.clone(),
        settings.retrieval_top_k,
        settings.downstream_timeout,
    )?;

    // Retrieval is optional at startup; failures degrade per request
    match retrieval.health_check().await {
        Ok(true) => println!("✓ Retrieval service is healthy"),
        Ok(false) => eprintln!("⚠️  Retrieval service health check returned non-success"),
        Err(e) => eprintln!("⚠️  Failed to reach retrieval service: {}", e),
    }

    let statistics = StatisticsClient::new(settings.statistics_url.clone(), settings.downstream_timeout)?;
    let generator = HttpTextGen::new(settings.llm.clone(), settings.downstream_timeout)?;

    let retrieval: Arc<dyn RetrievalBackend> = Arc::new(retrieval);
    let statistics: Arc<dyn StatisticsBackend> = Arc::new(statistics);
    let generator: Arc<dyn TextGenerator> = Arc::new(generator);

    Ok(Orchestrator::new(
        retrieval,
        statistics,
        generator,
        settings.orchestrator.clone(),
    ))
}

/// Offline wiring with canned answers and a keyword router
fn build_mock(settings: &Settings) -> SharedOrchestrator {
    let generator = MockTextGenerator::from_fn(|prompt| {
        if prompt.starts_with("Given a user question and two different sources") {
            return Ok("Mock integrated answer: Academy Dinosaur is the most rented title \
                and follows a feminist dentist who must outrace a monkey."
                .to_string());
        }
        let lower = prompt.to_lowercase();
        let question = lower.split(">>>").next().unwrap_or("");
        let stats = ["rent", "count", "popular", "rating"].iter().any(|w| question.contains(w));
        let content = ["plot", "theme", "character", "similar"].iter().any(|w| question.contains(w));
        let label = match (stats, content) {
            (true, true) => "BOTH",
            (true, false) => "STATISTICS",
            _ => "RETRIEVAL",
        };
        Ok(label.to_string())
    });

    Orchestrator::new(
        Arc::new(MockRetrievalBackend::answering(
            "Academy Dinosaur: an epic drama of a feminist and a mad scientist who must battle a teacher.",
        )),
        Arc::new(MockStatisticsBackend::answering(
            "SELECT f.title, COUNT(r.rental_id) FROM film f JOIN inventory i USING (film_id) \
             JOIN rental r USING (inventory_id) GROUP BY f.title ORDER BY 2 DESC LIMIT 5",
            "Bucket Brotherhood (34), Rocketeer Mother (33), Forward Temple (32)",
        )),
        Arc::new(generator),
        settings.orchestrator.clone(),
    )
}
