//! Local tool extraction: download the object to a scratch file and read its
//! IPTC fields with a command-line tool.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::config::LocalExtractionConfig;
use crate::error::ExtractionError;
use crate::template::{parse_tool_output, IDENTIFY_FORMAT};
use crate::types::MetadataResult;

const TEMP_PREFIX: &str = "imgmeta-";
const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches an object's bytes into a local file.
#[async_trait]
pub trait ObjectDownloader: Send + Sync {
    async fn download(&self, uri: &str, dest: &Path) -> Result<(), ExtractionError>;
}

/// Runs a metadata reader against a local file and returns its stdout.
#[async_trait]
pub trait MetadataTool: Send + Sync {
    async fn read(&self, path: &Path, format: &str) -> Result<String, ExtractionError>;
}

/// Plain HTTP GET of the download URI.
#[derive(Debug, Clone)]
pub struct HttpDownloader {
    http: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(config: &LocalExtractionConfig) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(config.download_timeout())
            .build()
            .map_err(|e| ExtractionError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl ObjectDownloader for HttpDownloader {
    async fn download(&self, uri: &str, dest: &Path) -> Result<(), ExtractionError> {
        let response = self
            .http
            .get(uri)
            .send()
            .await
            .map_err(|e| ExtractionError::Download(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::Download(format!(
                "unexpected status {}",
                status.as_u16()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ExtractionError::Download(e.to_string()))?;
        tokio::fs::write(dest, &bytes).await?;
        debug!(bytes = bytes.len(), dest = %dest.display(), "object_downloaded");
        Ok(())
    }
}

/// ImageMagick `identify` (or a compatible program).
///
/// A run that outlives the timeout is killed and reported as a
/// `ToolExecution` error.
#[derive(Debug, Clone)]
pub struct IdentifyTool {
    program: String,
    timeout: Duration,
}

impl IdentifyTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            timeout: DEFAULT_TOOL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl MetadataTool for IdentifyTool {
    async fn read(&self, path: &Path, format: &str) -> Result<String, ExtractionError> {
        let mut command = Command::new(&self.program);
        command
            .arg("-format")
            .arg(format)
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        // Dropping the timed-out future kills the child.
        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| {
                ExtractionError::ToolExecution(format!(
                    "{} timed out after {:?}",
                    self.program, self.timeout
                ))
            })?
            .map_err(|e| ExtractionError::ToolExecution(format!("{}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractionError::ToolExecution(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Downloads an object and reads its metadata with the configured tool.
///
/// Holds no per-object state; one extractor serves concurrent invocations.
#[derive(Clone)]
pub struct LocalExtractor {
    downloader: Arc<dyn ObjectDownloader>,
    tool: Arc<dyn MetadataTool>,
    temp_dir: Option<PathBuf>,
}

impl LocalExtractor {
    pub fn new(
        downloader: Arc<dyn ObjectDownloader>,
        tool: Arc<dyn MetadataTool>,
        temp_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            downloader,
            tool,
            temp_dir,
        }
    }

    /// [`HttpDownloader`] plus [`IdentifyTool`] as configured.
    pub fn from_config(config: &LocalExtractionConfig) -> Result<Self, ExtractionError> {
        config.validate()?;
        Ok(Self::new(
            Arc::new(HttpDownloader::new(config)?),
            Arc::new(
                IdentifyTool::new(config.tool_program.clone())
                    .with_timeout(config.tool_timeout()),
            ),
            config.temp_dir.clone(),
        ))
    }

    /// Extract metadata for one object.
    ///
    /// The scratch copy is removed when this returns, on success and on
    /// every error.
    pub async fn extract(
        &self,
        object_path: &str,
        download_uri: Option<&str>,
    ) -> Result<MetadataResult, ExtractionError> {
        let result = self.extract_inner(object_path, download_uri).await;
        match &result {
            Ok(metadata) => info!(
                object_path = %object_path,
                keywords = metadata.keywords.len(),
                "local_extraction_succeeded"
            ),
            Err(err) => warn!(
                object_path = %object_path,
                error = %err,
                "local_extraction_failed"
            ),
        }
        result
    }

    async fn extract_inner(
        &self,
        object_path: &str,
        download_uri: Option<&str>,
    ) -> Result<MetadataResult, ExtractionError> {
        let uri = download_uri
            .filter(|u| !u.trim().is_empty())
            .ok_or(ExtractionError::MissingSource)?;

        let scratch = self.scratch_file(object_path)?;
        self.downloader.download(uri, scratch.path()).await?;
        let output = self.tool.read(scratch.path(), IDENTIFY_FORMAT).await?;
        parse_tool_output(&output)
    }

    fn scratch_file(&self, object_path: &str) -> Result<NamedTempFile, ExtractionError> {
        let suffix = format!("-{}", scratch_name(object_path));
        let mut builder = tempfile::Builder::new();
        builder.prefix(TEMP_PREFIX).suffix(&suffix);
        let file = match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir)?,
            None => builder.tempfile()?,
        };
        Ok(file)
    }
}

/// Base name of the object with anything outside `[A-Za-z0-9._-]` replaced.
fn scratch_name(object_path: &str) -> String {
    let base = object_path.rsplit('/').next().unwrap_or(object_path);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "object".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scratch_name_keeps_base_name() {
        assert_eq!(scratch_name("photos/2017/a.jpg"), "a.jpg");
        assert_eq!(scratch_name("my photo (1).png"), "my_photo__1_.png");
        assert_eq!(scratch_name("dir/"), "object");
    }

    #[test]
    fn scratch_files_are_unique_and_named_after_object() {
        let dir = tempfile::tempdir().unwrap();
        let extractor = LocalExtractor::new(
            Arc::new(NoDownload),
            Arc::new(NoTool),
            Some(dir.path().to_path_buf()),
        );
        let a = extractor.scratch_file("photos/a.jpg").unwrap();
        let b = extractor.scratch_file("photos/a.jpg").unwrap();
        assert_ne!(a.path(), b.path());

        let name = a.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(TEMP_PREFIX));
        assert!(name.ends_with("-a.jpg"));

        drop((a, b));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn missing_uri_fails_before_any_io() {
        let extractor = LocalExtractor::new(Arc::new(NoDownload), Arc::new(NoTool), None);
        let err = extractor.extract("a.jpg", None).await.unwrap_err();
        assert!(matches!(err, ExtractionError::MissingSource));
        let err = extractor.extract("a.jpg", Some(" ")).await.unwrap_err();
        assert!(matches!(err, ExtractionError::MissingSource));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn identify_tool_reports_nonzero_exit() {
        let tool = IdentifyTool::new("false");
        let err = tool
            .read(Path::new("/nonexistent"), IDENTIFY_FORMAT)
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractionError::ToolExecution(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn identify_tool_is_killed_after_timeout() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("slow-identify");
        std::fs::write(&script, "#!/bin/sh\nsleep 10\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let tool = IdentifyTool::new(script.to_string_lossy().into_owned())
            .with_timeout(Duration::from_millis(200));
        let started = std::time::Instant::now();
        let err = tool
            .read(Path::new("x.jpg"), IDENTIFY_FORMAT)
            .await
            .unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(matches!(err, ExtractionError::ToolExecution(ref m) if m.contains("timed out")));
    }

    #[tokio::test]
    async fn identify_tool_reports_missing_program() {
        let tool = IdentifyTool::new("imgmeta-no-such-program");
        let err = tool
            .read(Path::new("x.jpg"), IDENTIFY_FORMAT)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("imgmeta-no-such-program"));
    }

    struct NoDownload;

    #[async_trait]
    impl ObjectDownloader for NoDownload {
        async fn download(&self, _: &str, _: &Path) -> Result<(), ExtractionError> {
            panic!("download must not be called");
        }
    }

    struct NoTool;

    #[async_trait]
    impl MetadataTool for NoTool {
        async fn read(&self, _: &Path, _: &str) -> Result<String, ExtractionError> {
            panic!("tool must not be called");
        }
    }
}
