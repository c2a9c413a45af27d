use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use crate::{
    error::Result,
    frontmatter::{self, FrontMatterStatus, Metadata},
    walker::{self, DiscoveredFile},
};

/// A markdown document loaded for one run.
#[derive(Debug, Clone)]
pub struct Document {
    /// Relative path under the source root, `/`-separated.
    pub identifier: String,
    /// Full path the document was read from.
    pub full_path: PathBuf,
    /// Complete file content, front matter included.
    pub raw: String,
    pub metadata: Metadata,
    pub front_matter: FrontMatterStatus,
    body_start: usize,
}

impl Document {
    /// Build a document from its identifier and raw text, parsing the
    /// front matter once.
    pub fn new(identifier: String, full_path: PathBuf, raw: String) -> Self {
        let parsed = frontmatter::parse(&raw);
        let body_start = raw.len() - parsed.body.len();
        let metadata = parsed.metadata;
        let front_matter = parsed.status;

        Self {
            identifier,
            full_path,
            raw,
            metadata,
            front_matter,
            body_start,
        }
    }

    /// Text after the front-matter block, or the whole text without one.
    pub fn body(&self) -> &str {
        &self.raw[self.body_start..]
    }

    pub fn title(&self) -> Option<String> {
        self.metadata.title()
    }

    pub fn slug(&self) -> Option<String> {
        self.metadata.slug()
    }

    pub fn date(&self) -> Option<String> {
        self.metadata.date()
    }
}

/// Every document found under a source root, in enumeration order.
///
/// Index `i` refers to the same document in every view the corpus
/// exposes; the ranker relies on that alignment.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
}

impl Corpus {
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Document> {
        self.documents.get(index)
    }

    /// Raw texts, front matter included, as handed to the embedder.
    pub fn texts(&self) -> Vec<String> {
        self.documents.iter().map(|d| d.raw.clone()).collect()
    }

    pub fn identifiers(&self) -> Vec<&str> {
        self.documents
            .iter()
            .map(|d| d.identifier.as_str())
            .collect()
    }

    pub fn full_paths(&self) -> Vec<&Path> {
        self.documents.iter().map(|d| d.full_path.as_path()).collect()
    }

    /// Declared slugs keyed by full path.
    pub fn slugs(&self) -> HashMap<&Path, String> {
        self.documents
            .iter()
            .filter_map(|d| Some((d.full_path.as_path(), d.slug()?)))
            .collect()
    }

    /// Declared dates keyed by full path.
    pub fn dates(&self) -> HashMap<&Path, String> {
        self.documents
            .iter()
            .filter_map(|d| Some((d.full_path.as_path(), d.date()?)))
            .collect()
    }
}

/// Load every markdown document under `root`.
///
/// A missing or unreadable root fails the whole collection. Files that
/// cannot be read as UTF-8 text are skipped, and documents whose front
/// matter does not parse are kept with empty metadata.
pub fn collect(root: &Path) -> Result<Corpus> {
    let files = walker::discover_files(root)?;
    tracing::debug!(
        root = %root.display(),
        files = files.len(),
        "discovered markdown files"
    );

    let documents = files.iter().filter_map(load_document).collect();
    Ok(Corpus::new(documents))
}

fn load_document(file: &DiscoveredFile) -> Option<Document> {
    let raw = match std::fs::read_to_string(&file.full_path) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!(
                path = %file.full_path.display(),
                error = %e,
                "skipping unreadable document"
            );
            return None;
        }
    };

    let document =
        Document::new(file.identifier(), file.full_path.clone(), raw);
    if let FrontMatterStatus::Malformed(reason) = &document.front_matter {
        tracing::warn!(
            document = %document.identifier,
            %reason,
            "ignoring malformed front matter"
        );
    }
    Some(document)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_body_follows_front_matter() {
        let doc = Document::new(
            "a.md".to_string(),
            PathBuf::from("/src/a.md"),
            "---\ntitle: A\n---\nBody".to_string(),
        );
        assert_eq!(doc.body(), "Body");
        assert_eq!(doc.title().as_deref(), Some("A"));
        assert_eq!(doc.front_matter, FrontMatterStatus::Parsed);
    }

    #[test]
    fn collects_documents_with_metadata() {
        let tmp = tempfile::tempdir().unwrap();
        let tech = tmp.path().join("tech");
        std::fs::create_dir(&tech).unwrap();
        std::fs::write(
            tech.join("post.md"),
            "---\nslug: my-slug\ndate: 2023-05-01\n---\nRust post",
        )
        .unwrap();
        std::fs::write(tmp.path().join("plain.md"), "No metadata here").unwrap();

        let corpus = collect(tmp.path()).unwrap();
        assert_eq!(corpus.identifiers(), vec!["plain.md", "tech/post.md"]);

        let post_path = tech.join("post.md");
        let slugs = corpus.slugs();
        assert_eq!(slugs.len(), 1);
        assert_eq!(slugs[post_path.as_path()], "my-slug");
        assert_eq!(corpus.dates()[post_path.as_path()], "2023-05-01");
    }

    #[test]
    fn views_share_enumeration_order() {
        let tmp = tempfile::tempdir().unwrap();
        for name in ["c.md", "a.md", "b.md"] {
            std::fs::write(tmp.path().join(name), name).unwrap();
        }

        let corpus = collect(tmp.path()).unwrap();
        let texts = corpus.texts();
        let paths = corpus.full_paths();
        for (i, id) in corpus.identifiers().iter().enumerate() {
            assert_eq!(texts[i], *id);
            assert!(paths[i].ends_with(id));
        }
    }

    #[test]
    fn malformed_front_matter_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let raw = "---\ntitle: unbalanced\nno closing marker";
        std::fs::write(tmp.path().join("broken.md"), raw).unwrap();
        std::fs::write(tmp.path().join("bad.md"), "---\ntitle: [oops\n---\nbody")
            .unwrap();

        let corpus = collect(tmp.path()).unwrap();
        assert_eq!(corpus.len(), 2);

        let broken = corpus.get(1).unwrap();
        assert_eq!(broken.identifier, "broken.md");
        assert!(broken.metadata.is_empty());
        assert_eq!(broken.body(), raw);
        assert_eq!(broken.raw, raw);

        let bad = corpus.get(0).unwrap();
        assert!(matches!(bad.front_matter, FrontMatterStatus::Malformed(_)));
        assert_eq!(bad.body(), "body");
        assert!(corpus.slugs().is_empty());
    }

    #[test]
    fn skips_non_utf8_files() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("binary.md"), [0xff, 0xfe, 0x00])
            .unwrap();
        std::fs::write(tmp.path().join("text.md"), "ok").unwrap();

        let corpus = collect(tmp.path()).unwrap();
        assert_eq!(corpus.identifiers(), vec!["text.md"]);
    }

    #[test]
    fn missing_root_fails() {
        let tmp = tempfile::tempdir().unwrap();
        assert!(collect(&tmp.path().join("missing")).is_err());
    }
}
