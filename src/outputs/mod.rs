//! Output files for scraped and cleaned articles.
//!
//! # Submodules
//!
//! - [`dataset`]: raw and cleaned CSV dataset files
//! - [`json`]: the JSON article store that cleaned records are loaded into
//!
//! # Output Structure
//!
//! ```text
//! out_dir/
//! ├── eluniversal_2025_05_06_articles.csv
//! ├── clean_eluniversal_2025_05_06_articles.csv
//! └── articles.json
//! ```

pub mod dataset;
pub mod json;
