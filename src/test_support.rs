//! Shared fixtures for unit tests

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::errors::{ArchiveError, Result};
use crate::transport::Transport;

pub enum Reply {
    Text(String),
    Bytes(Vec<u8>),
    Status(u16),
}

/// In-memory transport that records every URL requested
#[derive(Default)]
pub struct FakeTransport {
    replies: HashMap<String, Reply>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, url: &str, body: &str) -> Self {
        self.replies.insert(url.to_string(), Reply::Text(body.to_string()));
        self
    }

    pub fn bytes(mut self, url: &str, body: Vec<u8>) -> Self {
        self.replies.insert(url.to_string(), Reply::Bytes(body));
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.replies.insert(url.to_string(), Reply::Status(status));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn reply(&self, url: &str) -> Result<&Reply> {
        self.requests.lock().unwrap().push(url.to_string());
        match self.replies.get(url) {
            Some(Reply::Status(status)) => Err(ArchiveError::Status {
                url: url.to_string(),
                status: *status,
            }),
            Some(reply) => Ok(reply),
            None => Err(ArchiveError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_text(&self, url: &str) -> Result<String> {
        match self.reply(url)? {
            Reply::Text(body) => Ok(body.clone()),
            Reply::Bytes(body) => Ok(String::from_utf8_lossy(body).to_string()),
            Reply::Status(_) => unreachable!(),
        }
    }

    async fn download(&self, url: &str, sink: &mut (dyn AsyncWrite + Unpin + Send)) -> Result<u64> {
        let body = match self.reply(url)? {
            Reply::Text(body) => body.as_bytes().to_vec(),
            Reply::Bytes(body) => body.clone(),
            Reply::Status(_) => unreachable!(),
        };
        sink.write_all(&body).await?;
        Ok(body.len() as u64)
    }
}

/// A PDF whose pages carry `/Label` entries so merge order can be checked
pub fn pdf_bytes(labels: &[&str]) -> Vec<u8> {
    pdf_bytes_sized(labels, 595, 842)
}

/// Like [`pdf_bytes`], with the page size set on the `/Pages` node for pages
/// to inherit
pub fn pdf_bytes_sized(labels: &[&str], width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for label in labels {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*label)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Label" => Object::string_literal(*label),
        });
        kids.push(page_id.into());
    }

    let pages = dictionary! {
        "Type" => "Pages",
        "Count" => kids.len() as u32,
        "Kids" => kids,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Page labels of a PDF on disk, in page order
pub fn page_labels(path: &Path) -> Vec<String> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_object(*id).unwrap().as_dict().unwrap();
            let label = page.get(b"Label").unwrap().as_str().unwrap();
            String::from_utf8_lossy(label).to_string()
        })
        .collect()
}

/// Effective MediaBox of each page, looked up through its `Parent` chain
pub fn page_media_boxes(path: &Path) -> Vec<Vec<i64>> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let mut node = doc.get_object(*id).unwrap().as_dict().unwrap();
            loop {
                if let Ok(media_box) = node.get(b"MediaBox") {
                    return media_box
                        .as_array()
                        .unwrap()
                        .iter()
                        .map(|value| value.as_i64().unwrap())
                        .collect();
                }
                let parent = node.get(b"Parent").unwrap().as_reference().unwrap();
                node = doc.get_object(parent).unwrap().as_dict().unwrap();
            }
        })
        .collect()
}
