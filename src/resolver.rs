use crate::{collector::Document, walker::DOCUMENT_EXTENSION};

/// Default prefix for index keys and related-document URLs.
pub const DEFAULT_URL_PREFIX: &str = "/articles/";

/// Display fields of a related document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTarget {
    pub title: String,
    pub url: String,
    pub date: String,
}

/// Resolve display fields for a document from its identifier and any
/// declared metadata.
///
/// The title falls back to the identifier. A declared slug replaces the
/// file name in the URL but keeps the document's directory; without one
/// the URL is the identifier minus its `.md` extension.
pub fn resolve(
    identifier: &str,
    slug: Option<&str>,
    date: Option<&str>,
    title: Option<&str>,
    url_prefix: &str,
) -> LinkTarget {
    let title = title
        .filter(|t| !t.is_empty())
        .unwrap_or(identifier)
        .to_string();

    let url = match slug.filter(|s| !s.is_empty()) {
        Some(slug) => format!("{url_prefix}{}{slug}/", subdir(identifier)),
        None => {
            let stem = identifier
                .strip_suffix(DOCUMENT_EXTENSION)
                .unwrap_or(identifier);
            format!("{url_prefix}{stem}/")
        }
    };

    LinkTarget {
        title,
        url,
        date: date.unwrap_or_default().to_string(),
    }
}

/// Resolve display fields for a collected document.
pub fn resolve_document(document: &Document, url_prefix: &str) -> LinkTarget {
    resolve(
        &document.identifier,
        document.slug().as_deref(),
        document.date().as_deref(),
        document.title().as_deref(),
        url_prefix,
    )
}

/// Directory part of an identifier with a trailing `/`, or empty at the
/// root.
fn subdir(identifier: &str) -> &str {
    match identifier.rfind('/') {
        Some(i) => &identifier[..=i],
        None => "",
    }
}
