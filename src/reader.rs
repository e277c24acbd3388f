use crate::directory::TagDirectory;
use crate::error::{ExifError, MetadataWarning};
use crate::gps::{self, PointTags};
use crate::ifd::Ifd;
use crate::json;
use crate::mime;
use crate::render::render_bounded;
use crate::tags::tag_from_name;
use crate::user_comment::{self, encode_for};
use chrono::{DateTime, Utc};
use encoding_rs::{Encoding, UTF_8};
use exif::Tag;
use log::{debug, warn};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Version of the output formats produced by this crate.
pub const FORMAT_VERSION: i32 = 100000;

/// Default cap, in bytes, for a value returned by [`ExifReader::tag_value`].
pub const DEFAULT_TAG_VALUE_LIMIT: usize = 4095;

/// Default cap, in bytes, for each value inside [`ExifReader::tags_json`].
pub const DEFAULT_JSON_VALUE_LIMIT: usize = 2000;

pub fn format_version() -> i32 {
    FORMAT_VERSION
}

/// Version of the directory parser, when it reports one. The bundled
/// parser does not, so this is always `None`.
pub fn provider_version() -> Option<i32> {
    None
}

/// Entry point for every metadata request.
///
/// Each call decodes the buffer it is given, derives its result and drops
/// the decoded directories before returning. Nothing is cached between
/// calls, so one reader can be shared freely across threads.
///
/// Malformed metadata never fails a call: it is logged with `log::warn!`
/// and the call returns `None` (or `false`).
#[derive(Debug, Clone)]
pub struct ExifReader {
    target_encoding: &'static Encoding,
    tag_value_limit: usize,
    json_value_limit: usize,
    continue_on_error: bool,
}

impl Default for ExifReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ExifReader {
    /// A reader producing UTF-8 text with the default value limits.
    pub fn new() -> Self {
        Self {
            target_encoding: UTF_8,
            tag_value_limit: DEFAULT_TAG_VALUE_LIMIT,
            json_value_limit: DEFAULT_JSON_VALUE_LIMIT,
            continue_on_error: true,
        }
    }

    /// Encoding of the bytes returned by [`ExifReader::user_comment_encoded`].
    pub fn with_target_encoding(mut self, encoding: &'static Encoding) -> Self {
        self.target_encoding = encoding;
        self
    }

    pub fn with_tag_value_limit(mut self, limit: usize) -> Self {
        self.tag_value_limit = limit;
        self
    }

    pub fn with_json_value_limit(mut self, limit: usize) -> Self {
        self.json_value_limit = limit;
        self
    }

    /// Whether entries that fail to parse are skipped (the default) or make
    /// the whole buffer count as having no metadata.
    pub fn continue_on_error(mut self, continue_on_error: bool) -> Self {
        self.continue_on_error = continue_on_error;
        self
    }

    pub fn target_encoding(&self) -> &'static Encoding {
        self.target_encoding
    }

    fn decode(&self, buf: &[u8]) -> Option<TagDirectory> {
        TagDirectory::decode(buf, self.continue_on_error)
    }

    /// `true` when the buffer holds a decodable EXIF structure.
    pub fn has_metadata(&self, buf: &[u8]) -> bool {
        self.decode(buf).is_some()
    }

    /// Whether the named directory has at least one entry.
    ///
    /// `None` when `ifd_name` is not one of `0`, `1`, `EXIF`, `GPS`,
    /// `Interoperability`.
    pub fn has_directory(&self, buf: &[u8], ifd_name: &str) -> Option<bool> {
        if buf.is_empty() {
            return Some(false);
        }
        let Some(ifd) = Ifd::from_name(ifd_name) else {
            debug!("Unknown IFD name {:?}", ifd_name);
            return None;
        };
        let Some(dir) = self.decode(buf) else {
            return Some(false);
        };
        Some(!dir.entries(ifd).is_empty())
    }

    /// Rendered value of the first entry named `tag_name`, scanning every
    /// directory in order.
    pub fn tag_value(&self, buf: &[u8], tag_name: &str) -> Option<String> {
        if buf.is_empty() {
            return None;
        }
        let tag = recover(resolve_tag(tag_name))?;
        let dir = self.decode(buf)?;
        let (_, field) = dir.find(tag)?;
        Some(render_bounded(field, dir.little_endian(), self.tag_value_limit))
    }

    /// Rendered value of `tag_name` inside one named directory.
    pub fn entry(&self, buf: &[u8], ifd_name: &str, tag_name: &str) -> Option<String> {
        if buf.is_empty() {
            return None;
        }
        let Some(ifd) = Ifd::from_name(ifd_name) else {
            debug!("Unknown IFD name {:?}", ifd_name);
            return None;
        };
        let tag = recover(resolve_tag(tag_name))?;
        let dir = self.decode(buf)?;
        let field = dir.get(ifd, tag)?;
        Some(render_bounded(field, dir.little_endian(), self.tag_value_limit))
    }

    /// All entries as one JSON object of tag name to value string.
    pub fn tags_json(&self, buf: &[u8]) -> Option<String> {
        let dir = self.decode(buf)?;
        json::tags_json(&dir, self.json_value_limit)
    }

    /// Like [`ExifReader::tags_json`] but as a map, keeping only the first
    /// entry of each tag name.
    pub fn tag_map(&self, buf: &[u8]) -> Option<Map<String, Value>> {
        let dir = self.decode(buf)?;
        if dir.is_empty() {
            return None;
        }
        Some(json::tag_map(&dir, self.json_value_limit))
    }

    /// Deserializes the tag map into `T`.
    ///
    /// Every value is a string, so numeric fields of `T` need their own
    /// parsing (or `String` fields).
    ///
    /// # Errors
    ///
    /// [`ExifError::Deserialization`] naming the path that failed.
    pub fn read_tags<T: DeserializeOwned>(&self, buf: &[u8]) -> Result<Option<T>, ExifError> {
        let Some(map) = self.tag_map(buf) else {
            return Ok(None);
        };
        let value = serde_path_to_error::deserialize(Value::Object(map))?;
        Ok(Some(value))
    }

    /// Where the picture was taken, as `[SRID=4326;]Point(<lon> <lat>)`.
    pub fn point(&self, buf: &[u8]) -> Option<String> {
        self.point_of(buf, &gps::POSITION)
    }

    /// The recorded destination, formatted like [`ExifReader::point`].
    pub fn destination_point(&self, buf: &[u8]) -> Option<String> {
        self.point_of(buf, &gps::DESTINATION)
    }

    fn point_of(&self, buf: &[u8], tags: &PointTags) -> Option<String> {
        let dir = self.decode(buf)?;
        recover(gps::point(&dir, tags))
    }

    /// Date and time from the GPS date and time stamps, in UTC.
    pub fn gps_utc_timestamp(&self, buf: &[u8]) -> Option<DateTime<Utc>> {
        let dir = self.decode(buf)?;
        recover(gps::utc_timestamp(&dir))
    }

    /// The EXIF user comment as UTF-8 text.
    pub fn user_comment(&self, buf: &[u8]) -> Option<String> {
        let dir = self.decode(buf)?;
        recover(user_comment::user_comment(&dir))
    }

    /// The user comment encoded in the configured target encoding.
    ///
    /// # Errors
    ///
    /// [`ExifError::Encoding`] when the comment has characters the target
    /// encoding cannot represent.
    pub fn user_comment_encoded(&self, buf: &[u8]) -> Result<Option<Vec<u8>>, ExifError> {
        self.user_comment(buf)
            .map(|text| encode_for(&text, self.target_encoding))
            .transpose()
    }

    /// See [`mime::mime_type`].
    pub fn mime_type(&self, buf: &[u8]) -> Result<Option<String>, ExifError> {
        mime::mime_type(buf)
    }
}

fn resolve_tag(name: &str) -> Result<Option<Tag>, MetadataWarning> {
    tag_from_name(name)
        .map(Some)
        .ok_or_else(|| MetadataWarning::UnknownTag {
            name: name.to_string(),
        })
}

/// Logs a warning and turns it into a null result.
fn recover<T>(result: Result<Option<T>, MetadataWarning>) -> Option<T> {
    result.unwrap_or_else(|warning| {
        warn!("{}", warning);
        None
    })
}
