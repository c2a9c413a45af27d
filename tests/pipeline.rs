use std::{collections::HashMap, path::Path};

use docrelate::{
    Embedder,
    Error,
    RelateConfig,
    embedding::Embedding,
    index,
    pipeline,
};

/// Embeds documents by looking up a marker word in their text.
struct Lookup {
    vectors: HashMap<&'static str, Embedding>,
    seen: Vec<String>,
}

impl Lookup {
    fn new(vectors: &[(&'static str, Embedding)]) -> Self {
        Self {
            vectors: vectors.iter().cloned().collect(),
            seen: Vec::new(),
        }
    }
}

impl Embedder for Lookup {
    fn encode(&mut self, texts: &[String]) -> docrelate::Result<Vec<Embedding>> {
        self.seen.extend(texts.iter().cloned());
        Ok(texts
            .iter()
            .map(|text| {
                self.vectors
                    .iter()
                    .find(|(marker, _)| text.contains(*marker))
                    .map(|(_, v)| v.clone())
                    .unwrap_or_else(|| vec![0.0, 0.0, 0.0])
            })
            .collect())
    }
}

/// Unit vectors with sim(a,b)=0.9, sim(a,c)=0.5, sim(b,c)=0.1.
fn scenario_vectors() -> [(&'static str, Embedding); 3] {
    let (ab, ac, bc) = (0.9_f32, 0.5_f32, 0.1_f32);
    let b1 = (1.0 - ab * ab).sqrt();
    let c1 = (bc - ab * ac) / b1;
    let c2 = (1.0 - ac * ac - c1 * c1).sqrt();
    [
        ("ALPHA", vec![1.0, 0.0, 0.0]),
        ("BRAVO", vec![ab, b1, 0.0]),
        ("CHARLIE", vec![ac, c1, c2]),
    ]
}

fn config_for(root: &Path) -> RelateConfig {
    RelateConfig {
        source_dir: root.join("content").join("articles"),
        output_path: root.join("data").join("related").join("index.json"),
        ..Default::default()
    }
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join("content").join("articles").join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

#[test]
fn three_document_scenario() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    write(tmp.path(), "a.md", "---\ntitle: Alpha\n---\nALPHA body");
    write(
        tmp.path(),
        "tech/b.md",
        "---\ntitle: Bravo\nslug: bravo-post\ndate: 2024-02-03\n---\nBRAVO",
    );
    write(tmp.path(), "tech/c.md", "CHARLIE has no front matter");

    let config = config_for(tmp.path());
    let mut embedder = Lookup::new(&scenario_vectors());
    let summary = pipeline::run(&config, &mut embedder)?;
    assert_eq!(summary.documents, 3);
    assert_eq!(summary.entries, 3);

    let related = index::read(&config.output_path)?;

    let a = related.get("/articles/a.md").unwrap();
    assert_eq!(a.len(), 2);
    assert_eq!(a[0].title, "Bravo");
    assert_eq!(a[0].url, "/articles/tech/bravo-post/");
    assert_eq!(a[0].date, "2024-02-03");
    assert!((a[0].score - 0.9).abs() < 1e-5);
    assert_eq!(a[1].title, "tech/c.md");
    assert_eq!(a[1].url, "/articles/tech/c/");
    assert_eq!(a[1].date, "");
    assert!((a[1].score - 0.5).abs() < 1e-5);

    let b = related.get("/articles/tech/b.md").unwrap();
    let titles: Vec<_> = b.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "tech/c.md"]);
    assert!((b[0].score - 0.9).abs() < 1e-5);
    assert!((b[1].score - 0.1).abs() < 1e-5);

    let c = related.get("/articles/tech/c.md").unwrap();
    let urls: Vec<_> = c.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec!["/articles/a/", "/articles/tech/bravo-post/"]);
    assert!((c[0].score - 0.5).abs() < 1e-5);
    assert!((c[1].score - 0.1).abs() < 1e-5);

    Ok(())
}

#[test]
fn one_entry_per_document_keyed_by_prefix(
) -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let names = ["one.md", "two.md", "nested/three.md", "nested/deep/four.md"];
    for (i, name) in names.iter().enumerate() {
        write(tmp.path(), name, &format!("document {i}"));
    }

    let config = RelateConfig {
        url_prefix: "/posts/".to_string(),
        top_k: 2,
        ..config_for(tmp.path())
    };
    let mut embedder = Lookup::new(&[]);
    pipeline::run(&config, &mut embedder)?;

    let related = index::read(&config.output_path)?;
    assert_eq!(related.len(), names.len());
    for name in names {
        let records = related.get(&format!("/posts/{name}")).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.url.starts_with("/posts/")));
    }

    Ok(())
}

#[test]
fn malformed_front_matter_still_ranked() -> Result<(), Box<dyn std::error::Error>>
{
    let tmp = tempfile::tempdir()?;
    let broken = "---\ntitle: Never closed\nALPHA text";
    write(tmp.path(), "broken.md", broken);
    write(tmp.path(), "bad-yaml.md", "---\ntitle: [oops\n---\nBRAVO");
    write(tmp.path(), "fine.md", "CHARLIE");

    let config = config_for(tmp.path());
    let mut embedder = Lookup::new(&scenario_vectors());
    pipeline::run(&config, &mut embedder)?;

    // The embedder sees the full raw text, front matter included.
    assert!(embedder.seen.iter().any(|t| t == broken));

    let related = index::read(&config.output_path)?;
    assert_eq!(related.len(), 3);

    let fine = related.get("/articles/fine.md").unwrap();
    let titles: Vec<_> = fine.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["broken.md", "bad-yaml.md"]);

    Ok(())
}

#[test]
fn output_overwrites_previous_run() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    write(tmp.path(), "a.md", "ALPHA");
    write(tmp.path(), "b.md", "BRAVO");

    let config = config_for(tmp.path());
    std::fs::create_dir_all(config.output_path.parent().unwrap())?;
    std::fs::write(&config.output_path, r#"{"/articles/old.md": []}"#)?;

    pipeline::run(&config, &mut Lookup::new(&scenario_vectors()))?;

    let related = index::read(&config.output_path)?;
    assert!(related.get("/articles/old.md").is_none());
    assert_eq!(related.len(), 2);

    Ok(())
}

#[test]
fn empty_source_writes_empty_index() -> Result<(), Box<dyn std::error::Error>> {
    let tmp = tempfile::tempdir()?;
    let config = config_for(tmp.path());
    std::fs::create_dir_all(&config.source_dir)?;

    let summary = pipeline::run(&config, &mut Lookup::new(&[]))?;
    assert_eq!(summary.documents, 0);
    assert_eq!(std::fs::read_to_string(&config.output_path)?, "{}");

    Ok(())
}

#[test]
fn missing_source_dir_writes_nothing() {
    let tmp = tempfile::tempdir().unwrap();
    let config = config_for(tmp.path());

    let err = pipeline::run(&config, &mut Lookup::new(&[])).unwrap_err();
    assert!(matches!(err, Error::SourceDir { .. }));
    assert!(!config.output_path.exists());
}
