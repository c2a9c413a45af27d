use std::path::PathBuf;

use crate::{
    collector::{self, Corpus},
    config::RelateConfig,
    embedding::{self, Embedder},
    error::Result,
    index::{self, RelatedIndex, RelatedRecord},
    resolver::{self, LinkTarget},
    similarity,
};

/// Outcome of a full build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub documents: usize,
    pub entries: usize,
    pub output_path: PathBuf,
}

/// Embed every document in the corpus, rank neighbours, and assemble the
/// related index.
///
/// Each document is embedded from its full raw text, front matter
/// included.
pub fn build_index<E: Embedder + ?Sized>(
    corpus: &Corpus,
    embedder: &mut E,
    config: &RelateConfig,
) -> Result<RelatedIndex> {
    let embeddings = embedding::embed_all(embedder, &corpus.texts())?;
    let ranked = similarity::rank(&embeddings, config.top_k);

    let links: Vec<LinkTarget> = corpus
        .documents()
        .iter()
        .map(|doc| resolver::resolve_document(doc, &config.url_prefix))
        .collect();

    let mut index = RelatedIndex::new();
    for (document, neighbors) in corpus.documents().iter().zip(ranked) {
        let records = neighbors
            .iter()
            .map(|n| RelatedRecord::new(links[n.index].clone(), n.score))
            .collect();
        index.insert(&config.url_prefix, &document.identifier, records);
    }

    Ok(index)
}

/// Collect, embed, rank, and write the related index described by
/// `config`.
///
/// The number of documents found is reported on stderr before embedding
/// starts.
pub fn run<E: Embedder + ?Sized>(
    config: &RelateConfig,
    embedder: &mut E,
) -> Result<RunSummary> {
    let corpus = collector::collect(&config.source_dir)?;
    eprintln!("Found {} markdown files.", corpus.len());

    let related = build_index(&corpus, embedder, config)?;
    index::write(&related, &config.output_path)?;

    let summary = RunSummary {
        documents: corpus.len(),
        entries: related.len(),
        output_path: config.output_path.clone(),
    };
    tracing::info!(
        documents = summary.documents,
        entries = summary.entries,
        output = %summary.output_path.display(),
        "related index written"
    );
    Ok(summary)
}
