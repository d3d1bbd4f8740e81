//! Cache command implementation

use crate::cache::{Cache, EntryKind};
use crate::cli::{CacheArgs, CacheSubcommand};
use crate::config::Config;
use crate::error::Result;

pub fn run(config: &Config, args: CacheArgs) -> Result<()> {
    let cache = Cache::new(&config.cache_dir);

    match args.command {
        Some(CacheSubcommand::List) => list_cached(&cache),
        Some(CacheSubcommand::Clear(clear_args)) => match clear_args.only {
            Some(version) => clean_version(&cache, &version),
            None => clean_all(&cache),
        },
        // Default: show only cache statistics
        None => show_cache_stats(&cache),
    }
}

fn print_stats(cache: &Cache) -> Result<usize> {
    let stats = cache.stats()?;

    println!("Cache Statistics:");
    println!("  Location: {}", cache.root().display());
    println!("  Gadget versions: {}", stats.versions);
    println!("  Files: {}", stats.files);
    println!("  Size: {}", stats.formatted_size());

    Ok(stats.files)
}

fn show_cache_stats(cache: &Cache) -> Result<()> {
    if print_stats(cache)? == 0 {
        println!("\nCache is empty.");
    } else {
        println!("\nRun 'gadgetize cache list' to list cached files.");
        println!("Run 'gadgetize cache clear' to remove everything from cache.");
        println!("Run 'gadgetize cache clear --only <version>' to remove one gadget version.");
    }

    Ok(())
}

fn list_cached(cache: &Cache) -> Result<()> {
    print_stats(cache)?;
    println!();

    let entries = cache.entries()?;
    if entries.is_empty() {
        println!("No cached files.");
        return Ok(());
    }

    println!("Cached files ({}):", entries.len());
    for entry in &entries {
        let label = match (entry.kind, &entry.version) {
            (EntryKind::Gadget, Some(version)) => format!("gadget {version}"),
            (EntryKind::Gadget, None) => "gadget".to_string(),
            (EntryKind::Signer, _) => "signer".to_string(),
        };
        println!("  {} ({}, {})", entry.name, label, entry.formatted_size());
    }

    Ok(())
}

fn clean_all(cache: &Cache) -> Result<()> {
    cache.clear(None)?;
    println!("Cache cleared successfully.");
    Ok(())
}

fn clean_version(cache: &Cache, version: &str) -> Result<()> {
    cache.clear(Some(version))?;
    println!("Removed cached gadgets: {version}");
    Ok(())
}
