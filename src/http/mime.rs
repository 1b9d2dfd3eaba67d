//! content-type inference from a file path's extension

/// fallback for unknown or missing extensions
pub const DEFAULT_CONTENT_TYPE: &str = "text/plain";

/// map a path to its mime type. total: every input yields a type.
///
/// the path is scanned from the end; hitting a `/` before any `.` means the
/// last segment has no extension.
pub fn content_type_for(path: &str) -> &'static str {
    let ext = match path.rfind(|c: char| c == '/' || c == '.') {
        Some(i) if path.as_bytes()[i] == b'.' => &path[i + 1..],
        _ => return DEFAULT_CONTENT_TYPE,
    };

    match ext {
        "html" => "text/html",
        "jpg" => "image/jpeg",
        "pdf" => "application/pdf",
        _ => DEFAULT_CONTENT_TYPE,
    }
}
