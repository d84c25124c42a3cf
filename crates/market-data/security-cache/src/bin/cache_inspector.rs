//! Cache Inspector - Hydrate a native-id cache from a WAL registry and query it

use anyhow::Result;
use clap::{Parser, Subcommand};
use security_cache::{ExtensionKeyDeriver, NativeIdStorage, SecurityCacheConfig, SecurityStorage};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use storage::WalSecurityRegistry;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default extension key holding the exchange token
const DEFAULT_TOKEN_KEY: &str = "zerodha.instrument_token";

#[derive(Parser)]
#[command(name = "cache-inspector")]
#[command(about = "Inspect the native-id security cache built from a WAL registry")]
struct Cli {
    /// Configuration file (TOML/YAML/JSON)
    #[arg(long)]
    config: Option<String>,

    /// WAL directory, overrides the configured one
    #[arg(long)]
    wal_dir: Option<PathBuf>,

    /// Extension key carrying the native id
    #[arg(long, default_value = DEFAULT_TOKEN_KEY)]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show registry and cache sizes
    Summary,

    /// Resolve one security by native id
    Get {
        /// Native id (exchange token)
        native_id: u64,
    },

    /// List every security id in the registry
    Ids,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("security_cache=info,storage=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => SecurityCacheConfig::from_file(path)?,
        None => SecurityCacheConfig::default(),
    };
    if let Some(dir) = cli.wal_dir {
        config.registry.wal_dir = dir;
    }

    let registry = Arc::new(WalSecurityRegistry::open(
        &config.registry.wal_dir,
        config.registry.segment_size_mb,
    )?);

    let start = Instant::now();
    let cache = NativeIdStorage::builder(ExtensionKeyDeriver::<u64>::new(cli.key.clone()))
        .registry(registry.clone())
        .config(config.clone())
        .build()?;
    let hydration = start.elapsed();
    info!(wal_dir = %config.registry.wal_dir.display(), "Cache ready");

    match cli.command {
        Commands::Summary => show_summary(&registry, &cache, &cli.key, hydration)?,
        Commands::Get { native_id } => show_security(&cache, native_id),
        Commands::Ids => list_ids(&cache)?,
    }

    Ok(())
}

fn show_summary(
    registry: &WalSecurityRegistry,
    cache: &NativeIdStorage<ExtensionKeyDeriver<u64>>,
    key: &str,
    hydration: std::time::Duration,
) -> Result<()> {
    let stats = registry.stats()?;
    let snapshot = cache.stats();

    println!("Security Cache Summary");
    println!("======================\n");
    println!("Registry:");
    println!("  Securities:  {}", registry.len());
    println!("  Segments:    {}", stats.segment_count);
    println!("  WAL records: {}", stats.total_entries);
    println!("  WAL size:    {} KB", stats.total_size / 1024);
    println!();
    println!("Cache (key: {key}):");
    println!("  Cached:      {}", cache.count());
    println!("  Duplicates:  {}", snapshot.duplicates);
    println!("  No id:       {}", snapshot.skipped);
    println!("  Hydration:   {hydration:?}");

    Ok(())
}

fn show_security(cache: &NativeIdStorage<ExtensionKeyDeriver<u64>>, native_id: u64) {
    let Some(security) = cache.get(&native_id) else {
        println!("No security cached under {native_id}");
        return;
    };

    println!("{native_id} -> {}", security.id);
    println!("  Code:   {}", security.code);
    println!("  Board:  {}", security.board);
    if !security.name.is_empty() {
        println!("  Name:   {}", security.name);
    }
    if let Some(security_type) = &security.security_type {
        println!("  Type:   {security_type:?}");
    }
    if let Some(expiry) = &security.expiry {
        println!("  Expiry: {expiry}");
    }
    if let Some(strike) = &security.strike {
        println!("  Strike: {strike}");
    }
    if let Some(info) = &security.extension_info {
        for (key, value) in info.iter() {
            println!("  {key} = {value}");
        }
    }
}

fn list_ids(cache: &NativeIdStorage<ExtensionKeyDeriver<u64>>) -> Result<()> {
    let ids = cache.security_ids()?;
    for id in &ids {
        println!("{id}");
    }
    println!("\n{} securities", ids.len());
    Ok(())
}
