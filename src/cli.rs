//! CLI argument parsing using clap

use clap::{Parser, Subcommand};
use diskmemo::CacheConfig;
use std::path::PathBuf;

/// Inspect and maintain diskmemo cache directories
#[derive(Parser, Debug)]
#[command(name = "diskmemo")]
#[command(version)]
#[command(about = "Inspect and maintain memoized function caches", long_about = None)]
pub struct Cli {
    /// Cache directory (default: rs_fn_cache under the system temp dir)
    #[arg(short = 'd', long = "cache-dir", value_name = "DIR", global = true)]
    pub cache_dir: Option<PathBuf>,

    /// Log cache activity to stderr
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the resolved cache directory
    Path,

    /// List stored results
    List {
        /// Only list results of this function
        #[arg(short = 'f', long = "function", value_name = "NAME")]
        function: Option<String>,

        /// Output as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Show entry counts and sizes per function
    Stats {
        /// Output as JSON
        #[arg(long = "json")]
        json: bool,
    },

    /// Delete stored results
    Clear {
        /// Only delete results of this function
        #[arg(short = 'f', long = "function", value_name = "NAME")]
        function: Option<String>,
    },

    /// Print the cache key for a set of arguments
    ///
    /// Positional arguments are given as JSON the way serde would encode
    /// them: a tuple `(1, 2)` is `[1,2]`.
    Key {
        /// Positional arguments as JSON
        #[arg(value_name = "ARGS_JSON")]
        args: String,

        /// Named arguments as a JSON object
        #[arg(short = 'k', long = "kwargs", value_name = "JSON")]
        kwargs: Option<String>,
    },

    /// Pretty-print one stored result (exits 1 when nothing is cached)
    Show {
        /// Function name
        #[arg(value_name = "FUNCTION")]
        function: String,

        /// Cache key (64 hex characters)
        #[arg(value_name = "KEY")]
        key: String,
    },
}

impl Cli {
    /// Cache configuration selected by the flags
    pub fn config(&self) -> CacheConfig {
        CacheConfig::from(self.cache_dir.clone())
    }
}
