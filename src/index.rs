use std::{collections::BTreeMap, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{Error, Result},
    resolver::LinkTarget,
};

/// Default location of the persisted related-document table.
pub const DEFAULT_OUTPUT_PATH: &str = "./data/related/index.json";

/// One related document as stored in the index.
///
/// Field order is the serialized order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatedRecord {
    pub title: String,
    pub url: String,
    pub date: String,
    pub score: f32,
}

impl RelatedRecord {
    pub fn new(link: LinkTarget, score: f32) -> Self {
        Self {
            title: link.title,
            url: link.url,
            date: link.date,
            score,
        }
    }
}

/// Related documents keyed by `url_prefix + identifier`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelatedIndex {
    entries: BTreeMap<String, Vec<RelatedRecord>>,
}

impl RelatedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Key under which a document's related list is stored.
    pub fn key(url_prefix: &str, identifier: &str) -> String {
        format!("{url_prefix}{identifier}")
    }

    /// Store the related list for a document, replacing any previous one.
    pub fn insert(
        &mut self,
        url_prefix: &str,
        identifier: &str,
        records: Vec<RelatedRecord>,
    ) {
        self.entries
            .insert(Self::key(url_prefix, identifier), records);
    }

    pub fn get(&self, key: &str) -> Option<&[RelatedRecord]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    /// Look up a document by identifier, with or without the prefix.
    pub fn lookup(
        &self,
        url_prefix: &str,
        document: &str,
    ) -> Option<&[RelatedRecord]> {
        self.get(document)
            .or_else(|| self.get(&Self::key(url_prefix, document)))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Persist the index as pretty-printed JSON, replacing any existing file.
///
/// Missing parent directories are created.
pub fn write(index: &RelatedIndex, output_path: &Path) -> Result<()> {
    let output_err = |source| Error::Output {
        path: output_path.to_path_buf(),
        source,
    };

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(output_err)?;
    }

    let json = serde_json::to_string_pretty(index)?;
    std::fs::write(output_path, json).map_err(output_err)?;

    tracing::debug!(
        path = %output_path.display(),
        entries = index.len(),
        "wrote related index"
    );
    Ok(())
}

/// Load an index previously written by [`write`].
pub fn read(path: &Path) -> Result<RelatedIndex> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
