use std::path::Path;
use uuid::Uuid;

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
const DEFAULT_DOWNLOAD_NAME: &str = "download";

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum FileType {
    Pdf,
    Doc,
    Excel,
}

impl FileType {
    /// Unknown file types are not an error: the download falls back to a generic content type.
    pub fn parse(file_type: &str) -> Option<FileType> {
        match file_type.trim().to_lowercase().as_str() {
            "pdf" => Some(FileType::Pdf),
            "doc" => Some(FileType::Doc),
            "excel" => Some(FileType::Excel),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            FileType::Pdf => "application/pdf",
            FileType::Doc => "application/msword",
            FileType::Excel => "application/vnd.ms-excel",
        }
    }
}

/// A downloadable file managed from the content backend.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Resource {
    pub id: Uuid,
    pub title: String,
    pub filename: Option<String>,
    pub cloudinary_url: Option<String>,
    pub mime_type: Option<String>,
    pub file_type: Option<FileType>,
    pub download_count: i64,
}

impl Resource {
    pub fn content_type(&self) -> String {
        match (non_empty(self.mime_type.as_deref()), self.file_type) {
            (Some(mime_type), _) => mime_type.to_string(),
            (None, Some(file_type)) => file_type.content_type().to_string(),
            (None, None) => DEFAULT_CONTENT_TYPE.to_string(),
        }
    }

    pub fn local_filename(&self) -> Option<&str> {
        non_empty(self.filename.as_deref())
    }

    pub fn remote_url(&self) -> Option<&str> {
        non_empty(self.cloudinary_url.as_deref())
    }

    /// Extension of the stored local file, without the leading dot.
    pub fn extension(&self) -> Option<&str> {
        self.local_filename()
            .and_then(|filename| Path::new(filename).extension())
            .and_then(|extension| extension.to_str())
            .filter(|extension| !extension.is_empty())
    }

    /// Builds the attachment filename offered to the browser. Only ASCII letters, digits,
    /// spaces, `-` and `_` survive from the requested name, and the stored extension is
    /// appended once.
    pub fn download_filename(&self, requested: &str) -> String {
        let extension = self.extension();
        let stem = match extension {
            Some(extension) => strip_extension(requested, extension),
            None => requested,
        };

        let sanitized: String = stem
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '-' | '_'))
            .collect();
        let sanitized = match sanitized.trim() {
            "" => DEFAULT_DOWNLOAD_NAME,
            trimmed => trimmed,
        };

        match extension {
            Some(extension) => format!("{}.{}", sanitized, extension),
            None => sanitized.to_string(),
        }
    }
}

fn strip_extension<'a>(filename: &'a str, extension: &str) -> &'a str {
    let suffix_len = extension.len() + 1;

    if filename.len() <= suffix_len || !filename.is_char_boundary(filename.len() - suffix_len) {
        return filename;
    }

    let (stem, suffix) = filename.split_at(filename.len() - suffix_len);
    if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension) {
        stem
    } else {
        filename
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.trim().is_empty())
}
