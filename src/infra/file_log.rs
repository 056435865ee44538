use crate::error::SinkError;
use crate::publisher::{LogSink, PublishRequest};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::debug;

const CURRENT_LINK: &str = "current.ndjson";

/// One appended message as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub id: String,
    pub topic: String,
    pub submitted_at: DateTime<Utc>,
    pub appended_at: DateTime<Utc>,
    pub content_type: String,
    /// `utf8` when `payload` is the raw text, `hex` otherwise.
    pub encoding: String,
    pub payload: String,
}

/// Durable append-only log: one directory per topic, one NDJSON file per day.
/// Pattern: `<root>/<topic>/log_YYYY-MM-DD.ndjson` plus a `current.ndjson` symlink to today's file.
#[derive(Debug)]
pub struct FileLogSink {
    root: PathBuf,
    // topic -> file name the `current.ndjson` link was last pointed at
    active: HashMap<String, String>,
}

impl FileLogSink {
    pub fn open(root: &Path) -> Result<Self, SinkError> {
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
            active: HashMap::new(),
        })
    }

    /// Create the topic directory and repoint the link, only on first use or day rollover.
    async fn activate(&mut self, topic: &str, dir: &Path, file_name: &str) -> Result<(), SinkError> {
        if self.active.get(topic).map(String::as_str) == Some(file_name) {
            return Ok(());
        }
        tokio::fs::create_dir_all(dir).await?;
        ensure_symlink_to_current(&dir.join(CURRENT_LINK), Path::new(file_name)).await?;
        self.active.insert(topic.to_string(), file_name.to_string());
        Ok(())
    }

    pub fn topic_dir(&self, topic: &str) -> PathBuf {
        self.root.join(sanitize_topic(topic))
    }

    fn line_for(request: &PublishRequest) -> LogLine {
        let (encoding, payload) = match std::str::from_utf8(&request.payload.bytes) {
            Ok(text) => ("utf8", text.to_string()),
            Err(_) => ("hex", hex::encode(&request.payload.bytes)),
        };
        LogLine {
            id: request.id.to_string(),
            topic: request.topic.clone(),
            submitted_at: request.submitted_at,
            appended_at: Utc::now(),
            content_type: request.payload.content_type().to_string(),
            encoding: encoding.to_string(),
            payload,
        }
    }
}

#[async_trait]
impl LogSink for FileLogSink {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn append(&mut self, request: &PublishRequest) -> Result<(), SinkError> {
        let dir = self.topic_dir(&request.topic);
        let file_name = format!("log_{}.ndjson", Utc::now().format("%Y-%m-%d"));
        let target_path = dir.join(&file_name);
        self.activate(&request.topic, &dir, &file_name).await?;

        let mut line = serde_json::to_string(&Self::line_for(request))?;
        line.push('\n');

        let mut file = match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&target_path)
            .await
        {
            Ok(file) => file,
            Err(e) => {
                // Directory removed underneath us: set it up again on the next append.
                self.active.remove(&request.topic);
                return Err(e.into());
            }
        };
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(message_id = %request.id, path = %target_path.display(), "appended to file log");
        Ok(())
    }
}

/// Read every line of the active file for `topic`. Missing file means an empty log.
pub fn read_current(root: &Path, topic: &str) -> Result<Vec<LogLine>, SinkError> {
    let path = root.join(sanitize_topic(topic)).join(CURRENT_LINK);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    content
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).map_err(SinkError::from))
        .collect()
}

fn sanitize_topic(topic: &str) -> String {
    if topic.is_empty() || topic.chars().all(|c| c == '.') {
        return "_".repeat(topic.len().max(1));
    }
    topic
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(unix)]
async fn ensure_symlink_to_current(link_path: &Path, target_path: &Path) -> Result<(), SinkError> {
    // `target_path` is relative to the link's directory.
    match tokio::fs::read_link(link_path).await {
        Ok(current) if current == target_path => return Ok(()),
        Ok(_) => tokio::fs::remove_file(link_path).await?,
        Err(_) if tokio::fs::symlink_metadata(link_path).await.is_ok() => {
            tokio::fs::remove_file(link_path).await?
        }
        Err(_) => {}
    }
    tokio::fs::symlink(target_path, link_path).await?;
    Ok(())
}

#[cfg(not(unix))]
async fn ensure_symlink_to_current(link_path: &Path, target_path: &Path) -> Result<(), SinkError> {
    // No portable symlinks: keep a copy of today's file name instead.
    tokio::fs::write(link_path.with_extension("txt"), target_path.display().to_string()).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::User;
    use crate::transcode::{encode, EncodedPayload, Format};
    use tempfile::TempDir;

    #[tokio::test]
    async fn appends_json_payloads_as_text() {
        let tmp = TempDir::new().unwrap();
        let mut sink = FileLogSink::open(tmp.path()).unwrap();

        let first = PublishRequest::new(
            "people",
            encode(&User::new("Ada", "Lovelace"), Format::Json),
        );
        let second = PublishRequest::new(
            "people",
            encode(&User::new("Grace", "Hopper"), Format::Json),
        );
        sink.append(&first).await.unwrap();
        sink.append(&second).await.unwrap();

        let lines = read_current(tmp.path(), "people").unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].id, first.id.to_string());
        assert_eq!(lines[0].encoding, "utf8");
        assert_eq!(lines[0].content_type, "application/json");
        let user: User = serde_json::from_str(&lines[1].payload).unwrap();
        assert_eq!(user, User::new("Grace", "Hopper"));
    }

    #[tokio::test]
    async fn binary_payloads_are_hex_encoded() {
        let tmp = TempDir::new().unwrap();
        let mut sink = FileLogSink::open(tmp.path()).unwrap();
        let request = PublishRequest::new(
            "raw",
            EncodedPayload {
                format: Format::Protobuf,
                bytes: vec![0xff, 0x00, 0x10],
            },
        );
        sink.append(&request).await.unwrap();

        let lines = read_current(tmp.path(), "raw").unwrap();
        assert_eq!(lines[0].encoding, "hex");
        assert_eq!(lines[0].payload, "ff0010");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stale_link_is_repointed_once_per_topic() {
        let tmp = TempDir::new().unwrap();
        let mut sink = FileLogSink::open(tmp.path()).unwrap();

        // Yesterday's link left behind by a previous run.
        let dir = sink.topic_dir("people");
        fs::create_dir_all(&dir).unwrap();
        std::os::unix::fs::symlink("log_2000-01-01.ndjson", dir.join(CURRENT_LINK)).unwrap();

        let payload = encode(&User::new("Ada", "Lovelace"), Format::Json);
        for _ in 0..3 {
            sink.append(&PublishRequest::new("people", payload.clone()))
                .await
                .unwrap();
        }
        sink.append(&PublishRequest::new("other", payload)).await.unwrap();

        let today = format!("log_{}.ndjson", Utc::now().format("%Y-%m-%d"));
        assert_eq!(
            fs::read_link(dir.join(CURRENT_LINK)).unwrap(),
            PathBuf::from(&today)
        );
        assert_eq!(sink.active.len(), 2);
        assert_eq!(sink.active["people"], today);
        assert_eq!(read_current(tmp.path(), "people").unwrap().len(), 3);
    }

    #[tokio::test]
    async fn removed_topic_dir_is_recreated() {
        let tmp = TempDir::new().unwrap();
        let mut sink = FileLogSink::open(tmp.path()).unwrap();
        let payload = encode(&User::new("Ada", "Lovelace"), Format::Json);

        sink.append(&PublishRequest::new("people", payload.clone()))
            .await
            .unwrap();
        fs::remove_dir_all(sink.topic_dir("people")).unwrap();

        assert!(sink
            .append(&PublishRequest::new("people", payload.clone()))
            .await
            .is_err());
        sink.append(&PublishRequest::new("people", payload)).await.unwrap();
        assert_eq!(read_current(tmp.path(), "people").unwrap().len(), 1);
    }

    #[test]
    fn topics_cannot_escape_the_root() {
        assert_eq!(sanitize_topic("../etc/passwd"), ".._etc_passwd");
        assert_eq!(sanitize_topic(".."), "__");
        assert_eq!(sanitize_topic("relay-topic"), "relay-topic");
    }

    #[test]
    fn missing_topic_reads_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(read_current(tmp.path(), "nothing").unwrap().is_empty());
    }
}
