//! Media capture targets and captured payloads

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// What a capture session is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CaptureTarget {
    IdFront,
    IdBack,
    Selfie,
    QrScan,
}

/// Which camera a target needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    User,
    Environment,
}

impl CaptureTarget {
    pub fn facing_mode(self) -> FacingMode {
        match self {
            CaptureTarget::Selfie => FacingMode::User,
            _ => FacingMode::Environment,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CaptureTarget::IdFront => "id-front",
            CaptureTarget::IdBack => "id-back",
            CaptureTarget::Selfie => "selfie",
            CaptureTarget::QrScan => "qr-scan",
        }
    }
}

impl std::fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An image produced by the camera or the file picker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub target: CaptureTarget,
    pub mime: String,
    pub data: Vec<u8>,
}

impl CapturedImage {
    pub fn new(target: CaptureTarget, mime: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            target,
            mime: mime.into(),
            data,
        }
    }

    /// Camera stills are always JPEG
    pub fn jpeg(target: CaptureTarget, data: Vec<u8>) -> Self {
        Self::new(target, "image/jpeg", data)
    }

    /// `data:<mime>;base64,<payload>` form used by the review console
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.data))
    }
}
