use std::fmt;
use std::path::PathBuf;

/// Outcome of receiving the file part from the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Ok,
    /// The field was sent without a file (no file chosen in the browser)
    NoFile,
    /// The part stream ended with an error before the file was complete
    Partial,
    /// The part exceeded the configured size limit
    TooLarge,
    /// The part could not be spooled to temporary storage
    CantWrite,
}

impl UploadStatus {
    pub fn is_ok(self) -> bool {
        self == UploadStatus::Ok
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            UploadStatus::Ok => "ok",
            UploadStatus::NoFile => "no file was uploaded",
            UploadStatus::Partial => "the file was only partially uploaded",
            UploadStatus::TooLarge => "the file exceeds the maximum upload size",
            UploadStatus::CantWrite => "the file could not be written to temporary storage",
        };
        f.write_str(reason)
    }
}

/// Descriptor of the received primary image before it is moved into place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Spooled location of the received bytes
    pub temp_path: PathBuf,
    /// Filename as sent by the client
    pub original_name: String,
    pub size: u64,
    pub status: UploadStatus,
}

impl FileUpload {
    pub fn new(temp_path: impl Into<PathBuf>, original_name: impl Into<String>, size: u64) -> Self {
        Self {
            temp_path: temp_path.into(),
            original_name: original_name.into(),
            size,
            status: UploadStatus::Ok,
        }
    }

    /// A descriptor for a part that failed in transport.
    pub fn failed(original_name: impl Into<String>, status: UploadStatus) -> Self {
        Self {
            temp_path: PathBuf::new(),
            original_name: original_name.into(),
            size: 0,
            status,
        }
    }
}
