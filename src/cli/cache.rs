use clap::{Parser, Subcommand};

/// Arguments for cache command
#[derive(Parser, Debug)]
#[command(after_help = "EXAMPLES:\n  \
                  Show cache statistics:\n    gadgetize cache\n\n\
                  List cached files:\n    gadgetize cache list\n\n\
                  Clear all cached files:\n    gadgetize cache clear\n\n\
                  Remove the gadgets of one version:\n    gadgetize cache clear --only 16.1.4")]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: Option<CacheSubcommand>,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List cached gadgets and signer
    List,

    /// Clear cached files
    Clear(ClearCacheArgs),
}

/// Arguments for cache clear command
#[derive(Parser, Debug)]
pub struct ClearCacheArgs {
    /// Remove only the gadgets of one version (e.g., 16.1.4)
    #[arg(long, value_name = "VERSION")]
    pub only: Option<String>,
}
