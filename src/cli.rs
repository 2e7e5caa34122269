//! Command-line interface definitions for News Harvest.
//!
//! This module defines the CLI arguments and subcommands using the `clap`
//! crate. The config path can also come from the environment.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line arguments for the News Harvest application.
///
/// # Examples
///
/// ```sh
/// # Scrape two sites into ./data
/// news_harvest scrape eluniversal elpais -o ./data
///
/// # Clean a scraped file, then load the result
/// news_harvest clean ./data/eluniversal_2025_05_06_articles.csv
/// news_harvest load ./data/clean_eluniversal_2025_05_06_articles.csv
///
/// # Everything in one pass
/// news_harvest --config sites.yaml run eluniversal -o ./data
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the YAML file listing news sites
    #[arg(short, long, env = "NEWS_HARVEST_CONFIG", default_value = "config.yaml")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape the given sites and write one raw dataset file per site
    Scrape {
        /// Site identifiers from the config file
        #[arg(required = true)]
        sites: Vec<String>,

        /// Directory for the dataset files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },

    /// Clean a raw dataset file into a `clean_` prefixed file next to it
    Clean {
        /// Path to the raw dataset file
        file: PathBuf,
    },

    /// Load a cleaned dataset file into the article store
    Load {
        /// Path to the cleaned dataset file
        file: PathBuf,

        /// Path to the JSON article store
        #[arg(short, long, default_value = "articles.json")]
        store: PathBuf,
    },

    /// Scrape, clean and load the given sites in one pass
    Run {
        /// Site identifiers from the config file
        #[arg(required = true)]
        sites: Vec<String>,

        /// Directory for the dataset files
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Path to the JSON article store
        #[arg(short, long, default_value = "articles.json")]
        store: PathBuf,
    },
}
