//! Content type sniffing backed by one process-wide classifier.

use crate::error::ExifError;

/// Reported for content the classifier does not recognise.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

#[cfg(feature = "mime")]
mod classifier {
    use log::debug;
    use std::sync::OnceLock;

    static CLASSIFIER: OnceLock<infer::Infer> = OnceLock::new();

    pub fn get() -> &'static infer::Infer {
        CLASSIFIER.get_or_init(|| {
            debug!("Initialising MIME classifier");
            infer::Infer::new()
        })
    }
}

/// Eagerly sets up the classifier so the first request does not pay for
/// it. Calling it is optional and idempotent.
pub fn init() -> Result<(), ExifError> {
    #[cfg(feature = "mime")]
    {
        classifier::get();
        Ok(())
    }
    #[cfg(not(feature = "mime"))]
    {
        Err(ExifError::MimeUnavailable)
    }
}

/// MIME type of the buffer's content, `None` for an empty buffer.
///
/// # Errors
///
/// [`ExifError::MimeUnavailable`] when the crate was built without the
/// `mime` feature.
pub fn mime_type(buf: &[u8]) -> Result<Option<String>, ExifError> {
    #[cfg(feature = "mime")]
    {
        if buf.is_empty() {
            return Ok(None);
        }
        let mime = classifier::get()
            .get(buf)
            .map_or(UNKNOWN_MIME_TYPE, |kind| kind.mime_type());
        Ok(Some(mime.to_string()))
    }
    #[cfg(not(feature = "mime"))]
    {
        let _ = buf;
        Err(ExifError::MimeUnavailable)
    }
}

#[cfg(all(test, feature = "mime"))]
mod tests {
    use super::*;
    use crate::utils::test_helpers::{ascii, field, jpeg_with};
    use exif::Tag;

    #[test]
    fn test_jpeg_is_recognised() {
        init().unwrap();
        let buf = jpeg_with(&[field(Tag::Make, ascii("Canon"))], false);
        assert_eq!(mime_type(&buf).unwrap().as_deref(), Some("image/jpeg"));
    }

    #[test]
    fn test_png_signature() {
        let buf = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";
        assert_eq!(mime_type(buf).unwrap().as_deref(), Some("image/png"));
    }

    #[test]
    fn test_unknown_and_empty() {
        assert_eq!(
            mime_type(b"plain words").unwrap().as_deref(),
            Some(UNKNOWN_MIME_TYPE)
        );
        assert_eq!(mime_type(&[]).unwrap(), None);
    }
}
