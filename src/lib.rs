//! # exif-query
//!
//! Reads EXIF metadata straight from an in-memory image buffer and derives
//! the values a query engine usually wants from it: single tag values, the
//! whole tag set as JSON, the GPS position as a WKT point, the GPS UTC
//! timestamp and the decoded user comment.
//!
//! Every call decodes the buffer it is given and keeps nothing afterwards.
//! Malformed metadata is never an error: it is logged through the `log`
//! facade and the call returns `None`.
//!
//! ## Basic Usage
//!
//! ```no_run
//! use exif_query::{ExifError, ExifReader};
//!
//! fn main() -> Result<(), ExifError> {
//!     let reader = ExifReader::new();
//!     let buf = std::fs::read("path/to/your/image.jpg").unwrap_or_default();
//!
//!     if reader.has_metadata(&buf) {
//!         // A single tag, found in whichever directory holds it first
//!         if let Some(model) = reader.tag_value(&buf, "Model") {
//!             println!("Model: {}", model);
//!         }
//!
//!         // Everything, as one JSON object
//!         if let Some(json) = reader.tags_json(&buf) {
//!             println!("{}", json);
//!         }
//!
//!         // SRID=4326;Point(37.61666666666667 55.75000000000000)
//!         println!("Point: {:?}", reader.point(&buf));
//!         println!("Taken at: {:?}", reader.gps_utc_timestamp(&buf));
//!         println!("Comment: {:?}", reader.user_comment(&buf));
//!     }
//!
//!     println!("MIME type: {:?}", reader.mime_type(&buf)?);
//!     Ok(())
//! }
//! ```
//!
//! Tags can also be deserialized into your own struct. Values are always
//! strings as rendered for display.
//!
//! ```no_run
//! use exif_query::{ExifError, ExifReader};
//! use serde::Deserialize;
//!
//! #[derive(Deserialize, Debug)]
//! struct Camera {
//!     #[serde(rename = "Make")]
//!     make: String,
//!     #[serde(rename = "Model")]
//!     model: Option<String>,
//! }
//!
//! fn main() -> Result<(), ExifError> {
//!     let buf = std::fs::read("path/to/your/image.jpg").unwrap_or_default();
//!     let camera: Option<Camera> = ExifReader::new().read_tags(&buf)?;
//!     println!("{:?}", camera);
//!     Ok(())
//! }
//! ```

mod error;
mod reader;

pub use error::{ExifError, MetadataWarning};
pub use reader::{
    format_version, provider_version, ExifReader, DEFAULT_JSON_VALUE_LIMIT,
    DEFAULT_TAG_VALUE_LIMIT, FORMAT_VERSION,
};

pub mod directory;
pub mod gps;
pub mod ifd;
pub mod json;
pub mod mime;
pub mod render;
pub mod tags;
pub mod user_comment;
pub use directory::{Format, TagDirectory};
pub use ifd::Ifd;

mod utils;
