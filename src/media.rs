//! Media formats accepted by the transcription service.
//!
//! The service only transcribes a fixed set of container formats;
//! anything else gets a placeholder transcription and never produces a
//! highlight artifact. Checking the format client-side turns that into
//! an upfront error instead of a five-minute polling timeout.

use std::fmt;
use std::path::Path;

/// Container formats the service will transcribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFormat {
    Mp3,
    Mp4,
    Wav,
    Flac,
    Amr,
    Ogg,
    Webm,
    M4a,
    Mov,
    Avi,
    Wmv,
}

/// Every supported format, in the service's published order.
pub const SUPPORTED_FORMATS: [MediaFormat; 11] = [
    MediaFormat::Mp3,
    MediaFormat::Mp4,
    MediaFormat::Wav,
    MediaFormat::Flac,
    MediaFormat::Amr,
    MediaFormat::Ogg,
    MediaFormat::Webm,
    MediaFormat::M4a,
    MediaFormat::Mov,
    MediaFormat::Avi,
    MediaFormat::Wmv,
];

impl MediaFormat {
    /// Match a file extension, case-insensitively.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.to_ascii_lowercase();
        SUPPORTED_FORMATS
            .into_iter()
            .find(|format| format.extension() == ext)
    }

    /// Match a path by its extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Canonical lowercase extension.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
            Self::Wav => "wav",
            Self::Flac => "flac",
            Self::Amr => "amr",
            Self::Ogg => "ogg",
            Self::Webm => "webm",
            Self::M4a => "m4a",
            Self::Mov => "mov",
            Self::Avi => "avi",
            Self::Wmv => "wmv",
        }
    }

    /// MIME type sent with the upload ticket request.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Mp4 => "video/mp4",
            Self::Wav => "audio/wav",
            Self::Flac => "audio/x-flac",
            Self::Amr => "audio/amr",
            Self::Ogg => "audio/ogg",
            Self::Webm => "video/webm",
            Self::M4a => "audio/mp4",
            Self::Mov => "video/quicktime",
            Self::Avi => "video/x-msvideo",
            Self::Wmv => "video/x-ms-wmv",
        }
    }
}

impl fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Comma-separated extension list for error messages.
pub fn supported_extensions() -> String {
    SUPPORTED_FORMATS
        .iter()
        .map(|f| f.extension())
        .collect::<Vec<_>>()
        .join(", ")
}
