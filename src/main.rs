//! Memo Cache - demo executable
//!
//! Memoizes Collatz stopping times for the numbers given on the command
//! line, reusing results persisted by earlier runs.
//!
//! ```text
//! MEMO_CACHE_PATH=collatz.bin.gz memo_cache 27 97 871
//! ```

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use memo_cache::{CacheConfig, Memoized, SyncDirection};

/// Number of Collatz steps needed to reach 1, or `None` if the sequence
/// leaves the `u64` range.
fn collatz_steps(n: &u64) -> Option<u32> {
    let mut n = *n;
    let mut steps = 0;
    while n > 1 {
        n = if n % 2 == 0 {
            n / 2
        } else {
            n.checked_mul(3)?.checked_add(1)?
        };
        steps += 1;
    }
    Some(steps)
}

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Wrap the computation and load earlier results from disk
/// 4. Answer each argument, then persist the memory table
fn main() -> Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "memo_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let numbers = std::env::args()
        .skip(1)
        .map(|arg| {
            arg.parse::<u64>()
                .with_context(|| format!("not a non-negative integer: {arg:?}"))
        })
        .collect::<Result<Vec<_>>>()?;

    let config = CacheConfig::from_env();
    let mut collatz = Memoized::named("collatz_steps", collatz_steps, config)
        .context("failed to open memo cache")?;

    let report = collatz.sync(SyncDirection::Disk)?;
    info!(loaded = report.loaded, "warm start from disk");

    for n in &numbers {
        let steps = collatz
            .call(n)?
            .with_context(|| format!("Collatz sequence of {n} overflows u64"))?;
        println!("{n}\t{steps}");
    }

    let saved = collatz.persist().context("failed to persist results")?;
    info!(saved, "{}", collatz);
    println!("{}", serde_json::to_string_pretty(&collatz.stats())?);
    Ok(())
}
