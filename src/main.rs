use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bookify::import::{ImportOptions, import_books};
use bookify::infrastructure::AppState;
use bookify::{config, db, seed, server};

/// Value following `flag` on the command line
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|pos| args.get(pos + 1))
        .cloned()
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bookify=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load configuration
    dotenvy::dotenv().ok();

    let args: Vec<String> = std::env::args().collect();
    let config = match flag_value(&args, "--profile") {
        Some(profile) => config::Config::for_profile(profile),
        None => config::Config::from_env(),
    };

    // Initialize database
    let db = db::init_db(&config.database_url)
        .await
        .expect("Failed to initialize database");

    if let Err(e) = tokio::fs::create_dir_all(&config.storage_dir).await {
        tracing::error!("Failed to create storage dir {:?}: {}", config.storage_dir, e);
    }

    let state = AppState::new(db.clone(), config);

    // Check for seed flag
    if args.iter().any(|a| a == "--seed") || std::env::var("SEED_DEMO").is_ok() {
        tracing::info!("Seeding demo data...");
        if let Err(e) = seed::seed_demo_data(&db, state.book_repo.as_ref()).await {
            tracing::error!("Failed to seed data: {}", e);
        } else {
            tracing::info!("Demo data seeded successfully.");
        }
    }

    // One-shot bulk import, then exit
    if args.iter().any(|a| a == "--import-google") {
        let defaults = ImportOptions::default();
        let options = ImportOptions {
            count: flag_value(&args, "--count")
                .and_then(|c| c.parse().ok())
                .unwrap_or(defaults.count),
            query: flag_value(&args, "--query"),
            ..defaults
        };

        match import_books(state.book_repo.as_ref(), state.metadata.as_ref(), &options).await {
            Ok(report) => tracing::info!(
                "Books imported: {}, skipped: {}, processed: {}",
                report.imported,
                report.skipped,
                report.processed()
            ),
            Err(e) => tracing::error!("Import failed: {}", e),
        }
        return;
    }

    server::serve(state).await.expect("Failed to start server");
}
