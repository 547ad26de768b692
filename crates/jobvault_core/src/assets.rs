//! Naming rules for image assets stored next to archived metadata.

use std::path::{Path, PathBuf};

use serde_json::Value;

pub const DEFAULT_EXTENSION: &str = "png";
pub const ALLOWED_EXTENSIONS: [&str; 4] = ["png", "jpg", "jpeg", "webp"];

/// What a record's `image_paths` field holds.
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePaths<'a> {
    /// Absent, null, or an empty list.
    None,
    /// Present but not a list.
    Invalid,
    Urls(&'a [Value]),
}

impl<'a> ImagePaths<'a> {
    pub fn from_field(field: Option<&'a Value>) -> Self {
        match field {
            None | Some(Value::Null) => ImagePaths::None,
            Some(Value::Array(items)) if items.is_empty() => ImagePaths::None,
            Some(Value::Array(items)) => ImagePaths::Urls(items),
            Some(Value::String(s)) if s.is_empty() => ImagePaths::None,
            Some(_) => ImagePaths::Invalid,
        }
    }
}

/// Why an image URL is not eligible for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlRejection {
    /// Not a string, or not an http(s) URL.
    Invalid,
    UnsupportedExtension(String),
}

/// Returns the URL and its lowercased extension when the image may be fetched.
pub fn eligible_image(entry: &Value) -> Result<(&str, String), UrlRejection> {
    let url = entry
        .as_str()
        .filter(|url| url.starts_with("http"))
        .ok_or(UrlRejection::Invalid)?;
    let extension = image_extension(url).ok_or(UrlRejection::Invalid)?;
    if !ALLOWED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(UrlRejection::UnsupportedExtension(extension));
    }
    Ok((url, extension))
}

/// Extension of the last path segment, ignoring query and fragment.
///
/// Falls back to `png` when the segment has none. Returns `None` only for text
/// that does not parse as a URL.
pub fn image_extension(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let extension = match segment.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < segment.len() => segment[idx + 1..].to_ascii_lowercase(),
        _ => DEFAULT_EXTENSION.to_string(),
    };
    Some(extension)
}

/// `<stem>.<ext>` for single-image records, `<stem>-<n>.<ext>` otherwise.
/// `index` is zero-based; the suffix is one-based.
pub fn image_filename(stem: &str, index: usize, total: usize, extension: &str) -> String {
    if total == 1 {
        format!("{stem}.{extension}")
    } else {
        format!("{stem}-{}.{extension}", index + 1)
    }
}

/// Target path for an image, placed beside its metadata file.
pub fn image_target(metadata_path: &Path, index: usize, total: usize, extension: &str) -> PathBuf {
    let stem = metadata_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let dir = metadata_path.parent().unwrap_or_else(|| Path::new(""));
    dir.join(image_filename(&stem, index, total, extension))
}
