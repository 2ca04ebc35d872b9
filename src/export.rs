//! Report download and persistence.
//!
//! A report can be fetched as CSV, JSON, or an Excel workbook and either
//! returned in memory or written to disk.

use std::fmt;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use clap::ValueEnum;

use crate::client::{ApiRequest, PmsClient};
use crate::error::Result;
use crate::transport::{ResponseBody, ResponseKind};

const BYTE_ORDER_MARK: char = '\u{FEFF}';

/// File format of a downloaded report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Csv,
    Json,
    /// XLSX workbook.
    Excel,
}

impl ReportFormat {
    /// Value of the `file_type` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Excel => "excel",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
            Self::Excel => "xlsx",
        }
    }

    /// File name used when the server does not suggest one.
    pub fn default_file_name(&self) -> String {
        format!("output.{}", self.extension())
    }

    fn response_kind(&self) -> ResponseKind {
        match self {
            Self::Excel => ResponseKind::Bytes,
            Self::Csv | Self::Json => ResponseKind::Json,
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a downloaded report goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOptions {
    /// Write the report to `save_dir` (default `.`) as `file_name`
    /// (default: the server's suggestion, then `output.<ext>`).
    SaveAsFile {
        save_dir: Option<PathBuf>,
        file_name: Option<String>,
    },
    /// Return the report content.
    InMemory,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self::SaveAsFile {
            save_dir: None,
            file_name: None,
        }
    }
}

impl DownloadOptions {
    /// Save into `dir` under the derived file name.
    pub fn save_to(dir: impl Into<PathBuf>) -> Self {
        Self::SaveAsFile {
            save_dir: Some(dir.into()),
            file_name: None,
        }
    }
}

/// Serialized report content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportContent {
    /// CSV or JSON text.
    Text(String),
    /// Excel workbook bytes.
    Binary(Bytes),
}

impl ReportContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Text(text) => text.as_bytes(),
            Self::Binary(raw) => raw.as_ref(),
        }
    }
}

/// Result of [`export_report`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutput {
    Text(String),
    Binary(Bytes),
    /// Absolute path of the written file.
    File(PathBuf),
}

impl ReportOutput {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Self::Binary(raw) => Some(raw.as_ref()),
            _ => None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::File(path) => Some(path.as_path()),
            _ => None,
        }
    }
}

impl From<ReportContent> for ReportOutput {
    fn from(content: ReportContent) -> Self {
        match content {
            ReportContent::Text(text) => Self::Text(text),
            ReportContent::Binary(raw) => Self::Binary(raw),
        }
    }
}

/// Serialize a decoded report body for `format`.
///
/// CSV gets a UTF-8 byte-order mark so spreadsheet tools pick the right
/// encoding, JSON is pretty-printed with two-space indentation, and Excel
/// bytes pass through untouched.
///
/// # Errors
///
/// Returns an error if a JSON body cannot be re-serialized.
pub fn serialize_report(format: ReportFormat, body: ResponseBody) -> Result<ReportContent> {
    let content = match format {
        ReportFormat::Csv => {
            let text = match body {
                ResponseBody::Text(text) => text,
                ResponseBody::Json(serde_json::Value::String(text)) => text,
                ResponseBody::Json(value) => value.to_string(),
                ResponseBody::Bytes(raw) => String::from_utf8_lossy(&raw).into_owned(),
            };
            let mut out = String::with_capacity(text.len() + BYTE_ORDER_MARK.len_utf8());
            out.push(BYTE_ORDER_MARK);
            out.push_str(&text);
            ReportContent::Text(out)
        }
        ReportFormat::Json => {
            ReportContent::Text(serde_json::to_string_pretty(&body.into_json())?)
        }
        ReportFormat::Excel => match body {
            ResponseBody::Bytes(raw) => ReportContent::Binary(raw),
            ResponseBody::Text(text) => ReportContent::Binary(Bytes::from(text)),
            ResponseBody::Json(value) => ReportContent::Binary(Bytes::from(value.to_string())),
        },
    };
    Ok(content)
}

/// Extract the suggested file name from a `content-disposition` header.
///
/// Takes the text after `filename=`, drops trailing parameters and
/// surrounding quotes, and percent-decodes it.
pub fn file_name_from_disposition(header: &str) -> Option<String> {
    let raw = header.split("filename=").nth(1)?;
    let raw = raw.split(';').next().unwrap_or_default().trim().trim_matches('"');
    if raw.is_empty() {
        return None;
    }

    let decoded = urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_string());
    Some(decoded)
}

/// Final path component of a server-suggested name, so it cannot leave
/// the save directory.
fn last_component(name: &str) -> Option<String> {
    Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Download a report.
///
/// With [`DownloadOptions::InMemory`] the serialized content is returned
/// ([`ReportOutput::Text`] for CSV/JSON, [`ReportOutput::Binary`] for Excel).
/// With [`DownloadOptions::SaveAsFile`] the content is written to disk,
/// creating the directory if needed, and [`ReportOutput::File`] carries the
/// absolute path.
///
/// # Errors
///
/// Returns an error if authentication or the request fails, or if the file
/// cannot be written.
#[tracing::instrument(skip(client, options))]
pub async fn export_report(
    client: &PmsClient,
    platform_id: &str,
    report_id: &str,
    format: ReportFormat,
    options: DownloadOptions,
) -> Result<ReportOutput> {
    let request = ApiRequest::get(format!("export/{}", urlencoding::encode(report_id)))
        .query("pms_platformid", platform_id)
        .query("file_type", format.as_str())
        .response_kind(format.response_kind());
    let response = client.dispatch(request).await?;

    let suggested = response
        .header("content-disposition")
        .and_then(file_name_from_disposition)
        .and_then(|name| last_component(&name));
    let content = serialize_report(format, response.body)?;

    let (save_dir, file_name) = match options {
        DownloadOptions::InMemory => return Ok(content.into()),
        DownloadOptions::SaveAsFile {
            save_dir,
            file_name,
        } => (save_dir, file_name),
    };

    let file_name = file_name
        .or(suggested)
        .unwrap_or_else(|| format.default_file_name());
    let save_dir = save_dir.unwrap_or_else(|| PathBuf::from("."));

    let fs = client.file_system();
    if !fs.exists(&save_dir).await? {
        tracing::debug!(dir = %save_dir.display(), "creating report directory");
        fs.create_dir_all(&save_dir).await?;
    }

    let path = std::path::absolute(save_dir.join(&file_name))?;
    fs.write(&path, content.as_bytes()).await?;
    tracing::debug!(path = %path.display(), "report saved");

    Ok(ReportOutput::File(path))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;
    use crate::auth::test_support::*;
    use crate::fs::FileSystem;
    use crate::transport::TransportResponse;

    /// In-memory filesystem recording directories and files.
    #[derive(Default)]
    struct MemoryFs {
        dirs: Mutex<Vec<PathBuf>>,
        files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    }

    #[async_trait]
    impl FileSystem for MemoryFs {
        async fn exists(&self, path: &Path) -> io::Result<bool> {
            Ok(self.dirs.lock().unwrap().iter().any(|d| d == path))
        }

        async fn create_dir_all(&self, path: &Path) -> io::Result<()> {
            self.dirs.lock().unwrap().push(path.to_path_buf());
            Ok(())
        }

        async fn write(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
            self.files
                .lock()
                .unwrap()
                .insert(path.to_path_buf(), contents.to_vec());
            Ok(())
        }
    }

    fn client_with(transport: Arc<ScriptedTransport>, fs: Arc<MemoryFs>) -> PmsClient {
        PmsClient::builder("id", "secret")
            .api_url("https://api.example.com/api/v1/pms")
            .transport(transport)
            .file_system(fs)
            .clock(FixedClock::at(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()))
            .build()
            .unwrap()
    }

    #[test]
    fn test_csv_gets_byte_order_mark() {
        let content =
            serialize_report(ReportFormat::Csv, ResponseBody::Text("a,b\n1,2".into())).unwrap();
        match content {
            ReportContent::Text(text) => {
                assert!(text.starts_with('\u{FEFF}'));
                assert_eq!(&text[3..], "a,b\n1,2");
            }
            other => panic!("Expected text, got {other:?}"),
        }
    }

    #[test]
    fn test_json_pretty_printed_with_two_spaces() {
        let body = ResponseBody::Json(json!({ "b": 1, "a": [true] }));
        let content = serialize_report(ReportFormat::Json, body).unwrap();
        assert_eq!(
            content,
            ReportContent::Text("{\n  \"b\": 1,\n  \"a\": [\n    true\n  ]\n}".to_string())
        );
    }

    #[test]
    fn test_excel_bytes_untouched() {
        let raw = Bytes::from_static(&[0x50, 0x4b, 0x03, 0x04, 0xff]);
        let content =
            serialize_report(ReportFormat::Excel, ResponseBody::Bytes(raw.clone())).unwrap();
        assert_eq!(content, ReportContent::Binary(raw));
    }

    #[test]
    fn test_file_name_from_disposition() {
        assert_eq!(
            file_name_from_disposition("attachment; filename=report.csv"),
            Some("report.csv".to_string())
        );
        assert_eq!(
            file_name_from_disposition("attachment; filename=%E5%A0%B1%E8%A1%A8.xlsx"),
            Some("報表.xlsx".to_string())
        );
        assert_eq!(
            file_name_from_disposition("attachment; filename=\"quoted.json\"; size=10"),
            Some("quoted.json".to_string())
        );
        assert_eq!(file_name_from_disposition("inline"), None);
        assert_eq!(file_name_from_disposition("attachment; filename="), None);
    }

    #[test]
    fn test_default_file_names() {
        assert_eq!(ReportFormat::Csv.default_file_name(), "output.csv");
        assert_eq!(ReportFormat::Json.default_file_name(), "output.json");
        assert_eq!(ReportFormat::Excel.default_file_name(), "output.xlsx");
    }

    #[tokio::test]
    async fn test_export_in_memory_sends_file_type() {
        let transport = ScriptedTransport::new(vec![
            grant("T", "Bearer", 3600),
            json_reply(json!({ "rows": [] })),
        ]);
        let client = client_with(transport.clone(), Arc::new(MemoryFs::default()));

        let output = export_report(
            &client,
            "p1",
            "r1",
            ReportFormat::Json,
            DownloadOptions::InMemory,
        )
        .await
        .unwrap();
        assert_eq!(output.as_text(), Some("{\n  \"rows\": []\n}"));

        let requests = transport.requests.lock().unwrap();
        let sent = &requests[1];
        assert_eq!(sent.url.path(), "/api/v1/pms/export/r1");
        assert!(sent
            .query
            .contains(&("file_type".to_string(), "json".to_string())));
        assert!(sent
            .query
            .contains(&("pms_platformid".to_string(), "p1".to_string())));
        assert_eq!(sent.response_kind, ResponseKind::Json);
    }

    #[tokio::test]
    async fn test_export_excel_requests_bytes() {
        let raw = Bytes::from_static(b"PK\x03\x04");
        let transport = ScriptedTransport::new(vec![
            grant("T", "Bearer", 3600),
            Ok(TransportResponse::ok(ResponseBody::Bytes(raw.clone()))),
        ]);
        let client = client_with(transport.clone(), Arc::new(MemoryFs::default()));

        let output = export_report(
            &client,
            "p1",
            "r1",
            ReportFormat::Excel,
            DownloadOptions::InMemory,
        )
        .await
        .unwrap();
        assert_eq!(output.as_binary(), Some(&raw[..]));
        assert_eq!(
            transport.requests.lock().unwrap()[1].response_kind,
            ResponseKind::Bytes
        );
    }

    #[tokio::test]
    async fn test_export_saves_with_suggested_name() {
        let response = TransportResponse::ok(ResponseBody::Text("a,b".into()))
            .with_header("Content-Disposition", "attachment; filename=weekly%20report.csv");
        let transport = ScriptedTransport::new(vec![grant("T", "Bearer", 3600), Ok(response)]);
        let fs = Arc::new(MemoryFs::default());
        let client = client_with(transport, fs.clone());

        let output = export_report(
            &client,
            "p1",
            "r1",
            ReportFormat::Csv,
            DownloadOptions::save_to("out"),
        )
        .await
        .unwrap();

        let path = output.path().unwrap();
        assert!(path.is_absolute());
        assert!(path.ends_with("out/weekly report.csv"));
        assert_eq!(fs.dirs.lock().unwrap().as_slice(), &[PathBuf::from("out")]);

        let files = fs.files.lock().unwrap();
        assert_eq!(files.get(path).unwrap(), "\u{FEFF}a,b".as_bytes());
    }

    #[tokio::test]
    async fn test_export_supplied_name_wins_and_existing_dir_kept() {
        let response = TransportResponse::ok(ResponseBody::Json(json!([1])))
            .with_header("content-disposition", "attachment; filename=server.json");
        let transport = ScriptedTransport::new(vec![grant("T", "Bearer", 3600), Ok(response)]);
        let fs = Arc::new(MemoryFs::default());
        fs.dirs.lock().unwrap().push(PathBuf::from("reports"));
        let client = client_with(transport, fs.clone());

        let output = export_report(
            &client,
            "p1",
            "r1",
            ReportFormat::Json,
            DownloadOptions::SaveAsFile {
                save_dir: Some(PathBuf::from("reports")),
                file_name: Some("mine.json".to_string()),
            },
        )
        .await
        .unwrap();

        assert!(output.path().unwrap().ends_with("reports/mine.json"));
        // Directory already existed, so it was not created again
        assert_eq!(fs.dirs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_falls_back_to_output_name() {
        let transport = ScriptedTransport::new(vec![
            grant("T", "Bearer", 3600),
            Ok(TransportResponse::ok(ResponseBody::Bytes(Bytes::from_static(b"xl")))),
        ]);
        let fs = Arc::new(MemoryFs::default());
        let client = client_with(transport, fs.clone());

        let output = export_report(
            &client,
            "p1",
            "r1",
            ReportFormat::Excel,
            DownloadOptions::default(),
        )
        .await
        .unwrap();

        assert!(output.path().unwrap().ends_with("output.xlsx"));
        assert_eq!(fs.files.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_export_suggested_name_stays_in_save_dir() {
        let response = TransportResponse::ok(ResponseBody::Text("a,b".into()))
            .with_header("content-disposition", "attachment; filename=..%2F..%2Fescape.csv");
        let transport = ScriptedTransport::new(vec![grant("T", "Bearer", 3600), Ok(response)]);
        let fs = Arc::new(MemoryFs::default());
        let client = client_with(transport, fs.clone());

        let output = export_report(
            &client,
            "p1",
            "r1",
            ReportFormat::Csv,
            DownloadOptions::save_to("out"),
        )
        .await
        .unwrap();

        let expected = std::path::absolute(Path::new("out").join("escape.csv")).unwrap();
        assert_eq!(output.path(), Some(expected.as_path()));
    }

    #[test]
    fn test_last_component() {
        assert_eq!(last_component("report.csv"), Some("report.csv".to_string()));
        assert_eq!(last_component("../../x.csv"), Some("x.csv".to_string()));
        assert_eq!(last_component("/etc/passwd"), Some("passwd".to_string()));
        assert_eq!(last_component(".."), None);
        assert_eq!(last_component("a/.."), None);
    }
}
