use thiserror::Error;

/// Errors that abort a single metadata request.
///
/// These indicate a misconfigured deployment or a caller-side contract
/// violation rather than bad image data. Malformed metadata never ends up
/// here; see [`MetadataWarning`].
#[derive(Debug, Error)]
pub enum ExifError {
    #[error("MIME type detection is not available: the crate was built without the `mime` feature")]
    MimeUnavailable,

    #[error("Cannot convert text from UTF-8 to {encoding}: unmappable characters")]
    Encoding { encoding: &'static str },

    #[error("Deserialization error at path '{path}': {source}")]
    Deserialization {
        path: String,
        source: serde_json::Error,
    },
}

impl From<serde_path_to_error::Error<serde_json::Error>> for ExifError {
    fn from(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        ExifError::Deserialization {
            path: err.path().to_string(),
            source: err.into_inner(),
        }
    }
}

/// Recoverable problems with the metadata of one buffer.
///
/// Operations log these with `log::warn!` and hand a null result back to the
/// caller. Malformed GPS or comment fields are common in the wild and must
/// never abort the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MetadataWarning {
    #[error("Tag name is not correct: \"{name}\" is not a known EXIF tag")]
    UnknownTag { name: String },

    #[error("Invalid GPS date EXIF format (format: {format}, length: {len})")]
    InvalidGpsDate { format: &'static str, len: usize },

    #[error("Invalid GPS time EXIF format (format: {format}, components: {components})")]
    InvalidGpsTime {
        format: &'static str,
        components: usize,
    },

    #[error("Invalid GPS data or GPS time EXIF format: zero denominator")]
    ZeroGpsTimeDenominator,

    #[error("GPS date/time out of range: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second}")]
    GpsTimestampOutOfRange {
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: f64,
    },

    #[error("GPS {what} is not usable (format: {format})")]
    InvalidCoordinate {
        what: &'static str,
        format: &'static str,
    },

    #[error("Invalid user comment EXIF format: {format}, expected Undefined")]
    InvalidUserCommentFormat { format: &'static str },

    #[error("No EXIF user comment text data (length: {len}, minimal is {min})")]
    UserCommentTooShort { len: usize, min: usize },

    #[error("Invalid encoding for user comment EXIF data (marker: {marker:?})")]
    UnknownUserCommentEncoding { marker: [u8; 8] },

    #[error("Cannot decode {encoding} user comment: invalid byte sequence")]
    UserCommentConversion { encoding: &'static str },
}
