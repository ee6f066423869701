use clap::{Parser, Subcommand};
use std::path::PathBuf;

use flixrecom::Category;

#[derive(Parser)]
#[command(name = "flixrecom")]
#[command(author, version, about = "Browse upcoming and recent movies and series from TMDB")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the rotating banner and log each published title
    Banner {
        /// Stop after this many published banners
        #[arg(long, default_value = "3")]
        cycles: usize,
    },

    /// Load the discovery grid for a category
    Grid {
        /// movie, tv, anime or documentary
        category: Category,

        /// Extra genre id to filter by
        #[arg(long)]
        genre: Option<u64>,

        /// Release or first-air year
        #[arg(long)]
        year: Option<i32>,
    },

    /// Search titles; understands phrases like "movies with <actor>"
    Search {
        #[arg(required = true)]
        query: Vec<String>,
    },

    /// List genres available for a category
    Genres { category: Category },
}
