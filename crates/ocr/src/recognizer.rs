use thiserror::Error;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("image could not be decoded: {0}")]
    InvalidImage(String),
    #[error("OCR engine error: {0}")]
    Engine(String),
    #[error("no OCR engine available — build with the `tesseract` feature")]
    Unavailable,
}

/// The upstream text-recognition collaborator.
///
/// Implementations take raw image bytes (PNG/JPEG) and return whatever text
/// the engine saw, newline-separated. Everything downstream treats that text
/// as opaque, noisy input.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError>;
}

impl OcrEngine for Box<dyn OcrEngine> {
    fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
        (**self).recognize(image)
    }
}

// ── Canned engine ─────────────────────────────────────────────────────────────

/// Returns a pre-set string for any input — lets the pipeline and the
/// extraction layer be tested without a system Tesseract install.
pub struct CannedEngine {
    text: String,
}

impl CannedEngine {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl OcrEngine for CannedEngine {
    fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
        Ok(self.text.clone())
    }
}

// ── Null engine ───────────────────────────────────────────────────────────────

/// Placeholder engine for builds without the `tesseract` feature. Always
/// fails with [`OcrError::Unavailable`] so the caller can surface a clear
/// "not configured" response instead of silently returning nothing.
pub struct NullEngine;

impl OcrEngine for NullEngine {
    fn recognize(&self, _image: &[u8]) -> Result<String, OcrError> {
        Err(OcrError::Unavailable)
    }
}

// ── Tesseract engine (optional) ───────────────────────────────────────────────

#[cfg(feature = "tesseract")]
pub mod tesseract {
    use super::{OcrEngine, OcrError};
    use leptess::LepTess;

    /// Tesseract-backed recognition via leptess. `data_path` points at the
    /// tessdata directory; `None` uses the system default.
    pub struct TesseractEngine {
        data_path: Option<String>,
        lang: String,
    }

    impl TesseractEngine {
        pub fn new(data_path: Option<String>, lang: &str) -> Self {
            Self { data_path, lang: lang.to_string() }
        }
    }

    impl OcrEngine for TesseractEngine {
        fn recognize(&self, image: &[u8]) -> Result<String, OcrError> {
            let mut lt = LepTess::new(self.data_path.as_deref(), &self.lang)
                .map_err(|e| OcrError::Engine(e.to_string()))?;
            lt.set_image_from_mem(image)
                .map_err(|e| OcrError::InvalidImage(e.to_string()))?;
            lt.get_utf8_text().map_err(|e| OcrError::Engine(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_engine_returns_preset_text() {
        let e = CannedEngine::new("TOTAL $5.50");
        assert_eq!(e.recognize(b"fake image").unwrap(), "TOTAL $5.50");
        assert_eq!(e.recognize(b"").unwrap(), "TOTAL $5.50");
    }

    #[test]
    fn null_engine_reports_unavailable() {
        assert!(matches!(NullEngine.recognize(b"img"), Err(OcrError::Unavailable)));
    }

    #[test]
    fn boxed_engine_delegates() {
        let boxed: Box<dyn OcrEngine> = Box::new(CannedEngine::new("hello"));
        assert_eq!(boxed.recognize(b"x").unwrap(), "hello");
    }
}
