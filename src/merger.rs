//! Combine a day's page PDFs into one document

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::errors::{ArchiveError, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Sources whose pages are in the output, in order
    pub appended: Vec<PathBuf>,
    /// Sources that could not be read as PDFs, left on disk
    pub rejected: Vec<PathBuf>,
    /// Appended sources removed after the write
    pub deleted: usize,
    pub delete_failures: usize,
}

/// Merge `inputs` in order into `output`, then delete the sources that made it in
pub fn merge(inputs: &[PathBuf], output: &Path) -> Result<MergeReport> {
    let mut report = MergeReport::default();
    let mut documents = Vec::new();

    for path in inputs {
        match load_pages(path) {
            Ok(doc) => {
                documents.push(doc);
                report.appended.push(path.clone());
            }
            Err(e) => {
                warn!("Cannot merge {}: {}", path.display(), e);
                report.rejected.push(path.clone());
            }
        }
    }

    if documents.is_empty() {
        return Err(ArchiveError::NothingToMerge(inputs.len()));
    }

    let mut combined = combine(documents, output)?;
    write_atomically(&mut combined, output)?;
    info!(
        "Merged {} files into {}",
        report.appended.len(),
        output.display()
    );

    let (deleted, delete_failures) = remove_sources(&report.appended);
    report.deleted = deleted;
    report.delete_failures = delete_failures;

    Ok(report)
}

/// Delete merged sources, returning `(deleted, failures)`. Failures are logged only.
fn remove_sources(paths: &[PathBuf]) -> (usize, usize) {
    let mut deleted = 0;
    let mut failures = 0;
    for path in paths {
        match fs::remove_file(path) {
            Ok(()) => {
                deleted += 1;
                info!("Deleted source file {}", path.display());
            }
            Err(e) => {
                failures += 1;
                warn!("Failed to delete {}: {}", path.display(), e);
            }
        }
    }
    (deleted, failures)
}

fn load_pages(path: &Path) -> Result<Document> {
    let doc = Document::load(path).map_err(|source| ArchiveError::Pdf {
        path: path.to_path_buf(),
        source,
    })?;
    if doc.get_pages().is_empty() {
        return Err(ArchiveError::NoPages(path.to_path_buf()));
    }
    Ok(doc)
}

/// Attributes a page may inherit from its `/Pages` ancestors
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guards the `Parent` walk against cyclic page trees
const MAX_TREE_DEPTH: usize = 64;

/// Splice the pages of `documents` under one catalog, keeping document order
/// and each document's own page order. Source `/Pages` nodes are dropped, so
/// every page carries its inherited attributes itself.
fn combine(documents: Vec<Document>, output: &Path) -> Result<Document> {
    let pdf_error = |source| ArchiveError::Pdf {
        path: output.to_path_buf(),
        source,
    };
    let mut max_id = 1;
    let mut pages: Vec<(ObjectId, Dictionary)> = Vec::new();
    let mut objects = BTreeMap::new();
    let mut merged = Document::with_version("1.5");

    for mut doc in documents {
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for (_, page_id) in doc.get_pages() {
            pages.push((page_id, flatten_page(&doc, page_id).map_err(pdf_error)?));
        }
        objects.extend(doc.objects);
    }

    let mut catalog: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in objects {
        let kind = type_of(&object).to_vec();
        match kind.as_slice() {
            b"Catalog" => {
                if catalog.is_none() {
                    catalog = Some((object_id, object.as_dict().map_err(pdf_error)?.clone()));
                }
            }
            b"Pages" | b"Page" | b"Outlines" | b"Outline" => {}
            _ => {
                merged.objects.insert(object_id, object);
            }
        }
    }

    let Some((catalog_id, mut catalog)) = catalog else {
        return Err(ArchiveError::NoPages(output.to_path_buf()));
    };

    let pages_id = (max_id, 0);
    let kids: Vec<Object> = pages.iter().map(|(id, _)| Object::Reference(*id)).collect();
    let count = pages.len() as u32;

    for (page_id, mut page) in pages {
        page.set("Parent", pages_id);
        merged.objects.insert(page_id, Object::Dictionary(page));
    }

    merged.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    catalog.set("Pages", pages_id);
    catalog.remove(b"Outlines");
    merged.objects.insert(catalog_id, Object::Dictionary(catalog));

    merged.trailer.set("Root", catalog_id);
    merged.max_id = max_id;
    merged.renumber_objects();
    merged.adjust_zero_pages();
    merged.compress();

    Ok(merged)
}

/// The page dictionary with every inheritable attribute it lacks copied down
/// from the nearest ancestor that defines it
fn flatten_page(doc: &Document, page_id: ObjectId) -> lopdf::Result<Dictionary> {
    let mut page = doc.get_object(page_id)?.as_dict()?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();

    for _ in 0..MAX_TREE_DEPTH {
        let Some(parent_id) = parent else {
            break;
        };
        let node = doc.get_object(parent_id)?.as_dict()?;
        for key in INHERITABLE {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key, value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }

    Ok(page)
}

fn type_of(object: &Object) -> &[u8] {
    object
        .as_dict()
        .ok()
        .and_then(|dictionary| dictionary.get(b"Type").ok())
        .and_then(|name| name.as_name().ok())
        .unwrap_or(b"")
}

fn write_atomically(doc: &mut Document, output: &Path) -> Result<()> {
    let mut temp = output.as_os_str().to_owned();
    temp.push(".tmp");
    let temp = PathBuf::from(temp);

    if let Err(source) = doc.save(&temp) {
        let _ = fs::remove_file(&temp);
        return Err(ArchiveError::Io(source));
    }
    fs::rename(&temp, output)?;
    Ok(())
}
