//! In-memory source and target doubles that record every call.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::{Error, Result};
use crate::model::{AttachmentDescriptor, RecordKind, StagedFile, TargetRecord};
use crate::source::SourceApi;
use crate::target::TargetApi;

/// Field name the fakes store external keys under.
pub const KEY_FIELD: &str = "Original Key";

/// Test case record carrying `external` under [`KEY_FIELD`].
pub fn test_case(key: &str, external: Option<&str>) -> TargetRecord {
    let record = TargetRecord::new(key, RecordKind::TestCase);
    match external {
        Some(ext) => {
            let mut fields = Map::new();
            fields.insert(KEY_FIELD.to_string(), Value::String(ext.to_string()));
            record.with_fields(fields)
        }
        None => record,
    }
}

#[derive(Default)]
pub struct FakeSource {
    attachments: HashMap<String, Vec<(AttachmentDescriptor, Vec<u8>)>>,
    failing_download: Option<String>,
    listed: Mutex<Vec<String>>,
    downloads: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attachment(mut self, key: &str, filename: &str, bytes: &[u8]) -> Self {
        let descriptor = AttachmentDescriptor {
            filename: filename.to_string(),
            content: format!("https://source.test/attachment/{key}/{filename}"),
            size: bytes.len() as u64,
        };
        self.attachments
            .entry(key.to_string())
            .or_default()
            .push((descriptor, bytes.to_vec()));
        self
    }

    /// Make downloads of `filename` fail.
    pub fn failing_download(mut self, filename: &str) -> Self {
        self.failing_download = Some(filename.to_string());
        self
    }

    /// Keys whose attachments were listed, in call order.
    pub fn listed(&self) -> Vec<String> {
        self.listed.lock().unwrap().clone()
    }

    /// `key/filename` of every download, in call order.
    pub fn downloads(&self) -> Vec<String> {
        self.downloads.lock().unwrap().clone()
    }
}

impl SourceApi for FakeSource {
    async fn validate(&self) -> Result<bool> {
        Ok(true)
    }

    async fn list_attachments(&self, key: &str) -> Result<Vec<AttachmentDescriptor>> {
        self.listed.lock().unwrap().push(key.to_string());
        Ok(self
            .attachments
            .get(key)
            .map(|v| v.iter().map(|(d, _)| d.clone()).collect())
            .unwrap_or_default())
    }

    async fn download(
        &self,
        key: &str,
        attachment: &AttachmentDescriptor,
        dest: &mut File,
    ) -> Result<u64> {
        self.downloads
            .lock()
            .unwrap()
            .push(format!("{key}/{}", attachment.filename));

        if self.failing_download.as_deref() == Some(attachment.filename.as_str()) {
            return Err(Error::RemoteQuery {
                operation: format!("download attachment '{}'", attachment.filename),
                key: key.to_string(),
                status: 500,
                body: String::new(),
            });
        }

        let bytes = self
            .attachments
            .get(key)
            .and_then(|v| v.iter().find(|(d, _)| d.filename == attachment.filename))
            .map(|(_, b)| b.clone())
            .unwrap_or_default();
        dest.write_all(&bytes).await?;
        Ok(bytes.len() as u64)
    }
}

#[derive(Default)]
pub struct FakeTarget {
    pages: Vec<Vec<TargetRecord>>,
    existing: HashMap<String, Vec<String>>,
    failing_search_at: Option<usize>,
    failing_upload: Option<String>,
    searches: Mutex<Vec<usize>>,
    existing_queries: Mutex<Vec<String>>,
    uploads: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeTarget {
    pub fn new(pages: Vec<Vec<TargetRecord>>) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    /// Pretend `filenames` are already attached to `record_key`.
    pub fn with_existing(mut self, record_key: &str, filenames: &[&str]) -> Self {
        self.existing.insert(
            record_key.to_string(),
            filenames.iter().map(|s| (*s).to_string()).collect(),
        );
        self
    }

    pub fn failing_search_at(mut self, page: usize) -> Self {
        self.failing_search_at = Some(page);
        self
    }

    pub fn failing_upload(mut self, record_key: &str) -> Self {
        self.failing_upload = Some(record_key.to_string());
        self
    }

    /// Page numbers searched, in call order.
    pub fn searches(&self) -> Vec<usize> {
        self.searches.lock().unwrap().clone()
    }

    /// Records whose existing attachments were queried.
    pub fn existing_queries(&self) -> Vec<String> {
        self.existing_queries.lock().unwrap().clone()
    }

    /// `(record, filenames)` per upload call.
    pub fn uploads(&self) -> Vec<(String, Vec<String>)> {
        self.uploads.lock().unwrap().clone()
    }
}

impl TargetApi for FakeTarget {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn validate(&self) -> Result<bool> {
        Ok(true)
    }

    async fn search(&self, page: usize, _page_size: usize) -> Result<Vec<TargetRecord>> {
        self.searches.lock().unwrap().push(page);
        if self.failing_search_at == Some(page) {
            return Err(Error::RemoteQuery {
                operation: format!("search (page {page})"),
                key: "QA".to_string(),
                status: 500,
                body: String::new(),
            });
        }
        Ok(self.pages.get(page).cloned().unwrap_or_default())
    }

    async fn list_existing_attachments(&self, record_key: &str) -> Result<Vec<String>> {
        self.existing_queries
            .lock()
            .unwrap()
            .push(record_key.to_string());
        Ok(self.existing.get(record_key).cloned().unwrap_or_default())
    }

    async fn upload(&self, record_key: &str, files: &[StagedFile]) -> Result<()> {
        let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
        self.uploads
            .lock()
            .unwrap()
            .push((record_key.to_string(), names.clone()));

        if self.failing_upload.as_deref() == Some(record_key) {
            return Err(Error::Upload {
                record: record_key.to_string(),
                file: names.join(", "),
                status: 500,
                body: String::new(),
            });
        }
        Ok(())
    }
}

/// Loopback HTTP/1.1 server answering canned `(status, body)` responses in
/// order, 500 once they run out. Every request is kept as text.
pub struct StubServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<String>>>,
}

type Responses = Arc<Mutex<VecDeque<(u16, String)>>>;

impl StubServer {
    pub async fn start(responses: &[(u16, &str)]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responses: Responses = Arc::new(Mutex::new(
            responses
                .iter()
                .map(|(status, body)| (*status, (*body).to_string()))
                .collect(),
        ));

        let seen = Arc::clone(&requests);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                tokio::spawn(serve(stream, Arc::clone(&seen), Arc::clone(&responses)));
            }
        });

        Self { base_url, requests }
    }

    /// Raw requests received so far: request line, headers and body.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

async fn fill(stream: &mut TcpStream, buf: &mut Vec<u8>) -> bool {
    let mut chunk = [0u8; 8192];
    match stream.read(&mut chunk).await {
        Ok(0) | Err(_) => false,
        Ok(n) => {
            buf.extend_from_slice(&chunk[..n]);
            true
        }
    }
}

async fn serve(mut stream: TcpStream, seen: Arc<Mutex<Vec<String>>>, responses: Responses) {
    let mut buf = Vec::new();
    loop {
        let head_end = loop {
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos + 4;
            }
            if !fill(&mut stream, &mut buf).await {
                return;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();
        let body_len = if head.contains("transfer-encoding: chunked") {
            loop {
                if let Some(pos) = find(&buf[head_end..], b"\r\n0\r\n\r\n") {
                    break pos + 7;
                }
                if !fill(&mut stream, &mut buf).await {
                    return;
                }
            }
        } else {
            let len = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < head_end + len {
                if !fill(&mut stream, &mut buf).await {
                    return;
                }
            }
            len
        };

        let request = String::from_utf8_lossy(&buf[..head_end + body_len]).into_owned();
        seen.lock().unwrap().push(request);
        buf.drain(..head_end + body_len);

        let (status, body) = responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((500, String::new()));
        let response = format!(
            "HTTP/1.1 {status} Stub\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
            body.len()
        );
        if stream.write_all(response.as_bytes()).await.is_err() {
            return;
        }
    }
}

/// Write `files` into `dir` and describe them as staged files.
pub fn staged_files(dir: &std::path::Path, files: &[(&str, &[u8])]) -> Vec<StagedFile> {
    files
        .iter()
        .map(|(name, bytes)| {
            let path = dir.join(name);
            std::fs::write(&path, bytes).unwrap();
            StagedFile {
                name: (*name).to_string(),
                path,
            }
        })
        .collect()
}
