//! docrelate - precomputed "related content" links for a markdown site.
//!
//! docrelate embeds every markdown document under a source directory with
//! a sentence-embedding model, ranks each document's nearest neighbours by
//! cosine similarity, and writes the result as a JSON table keyed by
//! document path, ready for a static site generator to read.
//!
//! # Quick start
//!
//! ```no_run
//! use docrelate::{ModelManager, RelateConfig, pipeline};
//!
//! let config = RelateConfig::default();
//! let mut model = ModelManager::with_model_id(config.model.clone());
//!
//! let summary = pipeline::run(&config, &mut model).unwrap();
//! println!(
//!     "{} documents -> {}",
//!     summary.documents,
//!     summary.output_path.display()
//! );
//! ```

pub mod collector;
pub mod config;
pub mod embedding;
pub mod error;
pub mod frontmatter;
pub mod index;
pub mod model_manager;
pub mod pipeline;
pub mod resolver;
pub mod similarity;
pub mod walker;

pub use collector::{Corpus, Document};
pub use config::RelateConfig;
pub use embedding::Embedder;
pub use error::{Error, Result};
pub use index::{RelatedIndex, RelatedRecord};
pub use model_manager::ModelManager;
