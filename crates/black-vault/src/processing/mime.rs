//! Path-suffix based content classification used by the Ingester (§4.4 step 4).
//! Extraction itself (PDF text, OCR, audio transcription) is an external
//! collaborator the Ingester calls out to; this module only decides which
//! [`SourceType`] a path belongs to before handing it off.

use std::path::Path;

use crate::types::SourceType;

pub fn detect_source_type(path: &Path) -> Option<SourceType> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "txt" | "md" | "markdown" | "rst" | "org" => Some(SourceType::Text),
        "pdf" => Some(SourceType::Pdf),
        "png" | "jpg" | "jpeg" | "gif" | "webp" | "bmp" | "tiff" => Some(SourceType::Image),
        "mp3" | "wav" | "flac" | "m4a" | "ogg" => Some(SourceType::Audio),
        _ => None,
    }
}
