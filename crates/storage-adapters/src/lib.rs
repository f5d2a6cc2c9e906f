//! # storage-adapters
//! ocr-checkin/crates/storage-adapters/src/lib.rs
//! Flat-file implementation of `SubmissionStore`.
//! One record per line, `name,time,ip`, no header, no quoting.

use async_trait::async_trait;
use bytes::Bytes;
use domains::{StoreError, Submission, SubmissionSet, SubmissionStore, FIELD_DELIMITER};
use std::ffi::OsString;
use std::io::{ErrorKind, SeekFrom};
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::{debug, warn};

pub struct FileSubmissionStore {
    /// The log file (e.g., "./u.nickname")
    path: PathBuf,
}

impl FileSubmissionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Sibling file the rewrite goes through before being renamed into place.
    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Reads the whole log; `Ok(None)` when it does not exist yet.
    async fn read_log(&self) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parses one log line. Anything other than exactly three fields is malformed.
fn parse_line(line: &str) -> Option<Submission> {
    let mut fields = line.split(FIELD_DELIMITER);
    let (name, time, ip) = (fields.next()?, fields.next()?, fields.next()?);
    if fields.next().is_some() {
        return None;
    }
    Some(Submission::new(name, time, ip))
}

fn format_line(submission: &Submission) -> String {
    format!(
        "{}{d}{}{d}{}\n",
        submission.name,
        submission.time,
        submission.ip,
        d = FIELD_DELIMITER
    )
}

fn check_field(field: &'static str, value: &str) -> Result<(), StoreError> {
    if value.contains([FIELD_DELIMITER, '\n', '\r']) {
        return Err(StoreError::InvalidField {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

/// False when the log is non-empty and its last byte is not a newline, as
/// after a hand edit or an interrupted write.
async fn ends_with_newline(file: &mut fs::File) -> Result<bool, StoreError> {
    if file.metadata().await?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1)).await?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last).await?;
    Ok(last[0] == b'\n')
}

fn name_of(line: &str) -> &str {
    line.split(FIELD_DELIMITER).next().unwrap_or_default()
}

#[async_trait]
impl SubmissionStore for FileSubmissionStore {
    /// Malformed lines are skipped with a warning; the rest still load.
    async fn load_all(&self) -> Result<SubmissionSet, StoreError> {
        let Some(content) = self.read_log().await? else {
            return Ok(SubmissionSet::new());
        };

        let mut set = SubmissionSet::new();
        for (idx, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match parse_line(line) {
                Some(submission) => set.push(submission),
                None => warn!(
                    path = %self.path.display(),
                    line = idx + 1,
                    "skipping malformed submission record"
                ),
            }
        }
        Ok(set)
    }

    async fn append(&self, submission: &Submission) -> Result<(), StoreError> {
        check_field("name", &submission.name)?;
        check_field("time", &submission.time)?;
        check_field("ip", &submission.ip)?;

        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        let mut line = format_line(submission);
        if !ends_with_newline(&mut file).await? {
            line.insert(0, '\n');
        }
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        debug!(name = %submission.name, "appended submission");
        Ok(())
    }

    /// Rewrites the surviving lines verbatim, so malformed lines that were
    /// skipped on load are kept rather than silently destroyed.
    async fn delete_by_name(&self, name: &str) -> Result<(), StoreError> {
        let Some(content) = self.read_log().await? else {
            return Ok(());
        };

        let mut kept = String::with_capacity(content.len());
        let mut removed = 0usize;
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            if name_of(line) == name {
                removed += 1;
            } else {
                kept.push_str(line);
                kept.push('\n');
            }
        }

        let tmp = self.temp_path();
        fs::write(&tmp, kept.as_bytes()).await?;
        fs::rename(&tmp, &self.path).await?;

        debug!(name, removed, "rewrote submission log");
        Ok(())
    }

    async fn export_raw(&self) -> Result<Option<Bytes>, StoreError> {
        match fs::read(&self.path).await {
            Ok(raw) => Ok(Some(Bytes::from(raw))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
