//! Direct-to-storage upload over a presigned URL.
//!
//! The file is streamed in chunks rather than buffered whole, so large
//! videos do not pin their size in memory. A progress callback fires
//! per chunk and can abort the transfer by returning `false`.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::io::AsyncReadExt;

/// Bytes read per body chunk
const UPLOAD_CHUNK_SIZE: usize = 1024 * 1024;

/// Errors from a presigned upload.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("failed to read upload file: {0}")]
    Io(#[from] std::io::Error),

    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage refused the PUT (expired ticket, signature mismatch)
    #[error("storage rejected upload with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("file is {size} bytes, exceeding the {limit} byte upload limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("upload cancelled")]
    Cancelled,
}

/// Snapshot of upload progress passed to the callback.
#[derive(Debug, Clone, Copy)]
pub struct UploadProgress {
    pub bytes_sent: u64,
    pub total_bytes: u64,
}

impl UploadProgress {
    pub fn percent(&self) -> f64 {
        if self.total_bytes == 0 {
            return 100.0;
        }
        (self.bytes_sent as f64 / self.total_bytes as f64) * 100.0
    }
}

/// Callback invoked after each chunk; return `false` to cancel.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) -> bool + Send + Sync>;

/// PUT `path` to `presigned_url`, returning the byte count sent.
///
/// The size limit is enforced before any bytes leave the machine.
/// Cancellation via the callback aborts the request mid-body and
/// surfaces as [`TransferError::Cancelled`].
pub async fn upload_file(
    client: &reqwest::Client,
    presigned_url: &str,
    path: &Path,
    content_type: &str,
    max_bytes: u64,
    progress: Option<ProgressCallback>,
) -> Result<u64, TransferError> {
    let total_bytes = tokio::fs::metadata(path).await?.len();
    if total_bytes > max_bytes {
        return Err(TransferError::TooLarge {
            size: total_bytes,
            limit: max_bytes,
        });
    }

    let file = tokio::fs::File::open(path).await?;
    let cancelled = Arc::new(AtomicBool::new(false));

    let stream_cancelled = cancelled.clone();
    let body_stream = futures::stream::try_unfold((file, 0u64), move |(mut file, sent)| {
        let cancelled = stream_cancelled.clone();
        let progress = progress.clone();
        async move {
            let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
            let read = file.read(&mut buf).await?;
            if read == 0 {
                return Ok(None);
            }
            buf.truncate(read);

            let sent = sent + read as u64;
            if let Some(callback) = &progress {
                let keep_going = callback(UploadProgress {
                    bytes_sent: sent,
                    total_bytes,
                });
                if !keep_going {
                    cancelled.store(true, Ordering::SeqCst);
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::Interrupted,
                        "upload cancelled",
                    ));
                }
            }

            Ok(Some((buf, (file, sent))))
        }
    });

    let response = client
        .put(presigned_url)
        .header(reqwest::header::CONTENT_TYPE, content_type)
        .header(reqwest::header::CONTENT_LENGTH, total_bytes)
        .body(reqwest::Body::wrap_stream(body_stream))
        .send()
        .await;

    let response = match response {
        Ok(response) => response,
        Err(err) => {
            // A cancelled body surfaces as a generic request error;
            // the flag tells the two apart.
            if cancelled.load(Ordering::SeqCst) {
                return Err(TransferError::Cancelled);
            }
            return Err(err.into());
        }
    };

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = match response.text().await {
            Ok(body) if !body.trim().is_empty() => body.trim().to_string(),
            _ => "no error detail".to_string(),
        };
        return Err(TransferError::Rejected { status, message });
    }

    Ok(total_bytes)
}
