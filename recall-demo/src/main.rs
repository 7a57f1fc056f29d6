use recall::key::MappedArgs;
use recall::transient::CacheManager;
use recall::{context, persistent, transient};
use shared::Capacity;
use shared::config::CacheSettings;
use std::sync::Arc;
use std::time::{Duration, Instant};
use storage_backends::from_settings;
use tracing::{Level, info};

fn fibonacci(n: u64) -> u64 {
    match n {
        0 => 0,
        1 => 1,
        _ => fibonacci(n - 1) + fibonacci(n - 2),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt().with_max_level(Level::DEBUG).init();

    info!("Starting recall demo");

    // Load environment variables
    match dotenvy::dotenv() {
        Ok(_) => info!("Loaded environment variables from .env file"),
        Err(_) => info!("No .env file found, using system environment variables"),
    }

    // ============================================
    // STEP 1: Transient caching within this run
    // ============================================
    let manager = Arc::new(CacheManager::new());
    manager.set_limit("fib", Capacity::bounded(8)?);

    let fib = transient::Memoized::new(
        "fib",
        Arc::clone(&manager),
        |n: &u64| MappedArgs::new().arg(*n),
        |n: &u64| fibonacci(*n),
    );

    for attempt in 1..=3 {
        let started = Instant::now();
        let value = fib.call(&34);
        info!(
            "fib(34) = {} in {:?} (attempt {})",
            value,
            started.elapsed(),
            attempt
        );
    }

    // ============================================
    // STEP 2: Persistent caching across runs
    // ============================================
    let settings = CacheSettings::from_env()?;
    let backend = from_settings(&settings)?;
    info!("Using the '{}' persistent backend", backend.label());

    let slow_add = persistent::Memoized::new(
        "slow_add",
        |args: &(i64, i64)| MappedArgs::new().arg(args.0).arg(args.1),
        |args: &(i64, i64)| {
            let (a, b) = *args;
            async move {
                tokio::time::sleep(Duration::from_millis(400)).await;
                a + b
            }
        },
    );

    context::caching_into(backend, async {
        for attempt in 1..=2 {
            let started = Instant::now();
            let total = slow_add.call(&(40, 2)).await?;
            info!(
                "slow_add(40, 2) = {} in {:?} (attempt {})",
                total,
                started.elapsed(),
                attempt
            );
        }
        Ok::<(), shared::Error>(())
    })
    .await?;

    info!("Run the demo again to see the persistent cache carry across runs");
    Ok(())
}
