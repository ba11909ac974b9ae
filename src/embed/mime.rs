//! Extension-based MIME inference.
//!
//! Extension table only, no content sniffing. Unknown extensions fall back
//! to `application/octet-stream` and the caller reports a warning.

/// Fallback type for unknown extensions.
pub const GENERIC_BINARY: &str = "application/octet-stream";

/// Look up the MIME type for a file extension (case-insensitive).
pub fn mime_for_ext(ext: &str) -> Option<&'static str> {
    let mime = match ext.to_ascii_lowercase().as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "svg" => "image/svg+xml",
        "ico" => "image/x-icon",
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "json" => "application/json",
        "txt" => "text/plain",
        "xml" => "application/xml",
        "mp3" => "audio/mpeg",
        "ogg" => "audio/ogg",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "wasm" => "application/wasm",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime)
}
