use crate::ifd::{Ifd, IFD_COUNT};
use exif::{Context, Field, Reader, Tag, Value};
use log::debug;
use std::borrow::Cow;
use std::fmt;
use std::io::Cursor;

/// Identifier that precedes the TIFF structure in a JPEG APP1 segment.
/// Buffers starting with it are treated as a bare EXIF block.
pub const EXIF_HEADER: &[u8] = b"Exif\0\0";

/// Storage format of an entry, mirroring the TIFF field types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Byte,
    Ascii,
    Short,
    Long,
    Rational,
    SByte,
    Undefined,
    SShort,
    SLong,
    SRational,
    Float,
    Double,
    Unknown(u16),
}

impl Format {
    pub fn of(value: &Value) -> Format {
        match value {
            Value::Byte(_) => Format::Byte,
            Value::Ascii(_) => Format::Ascii,
            Value::Short(_) => Format::Short,
            Value::Long(_) => Format::Long,
            Value::Rational(_) => Format::Rational,
            Value::SByte(_) => Format::SByte,
            Value::Undefined(..) => Format::Undefined,
            Value::SShort(_) => Format::SShort,
            Value::SLong(_) => Format::SLong,
            Value::SRational(_) => Format::SRational,
            Value::Float(_) => Format::Float,
            Value::Double(_) => Format::Double,
            Value::Unknown(typ, ..) => Format::Unknown(*typ),
        }
    }

    /// Width in bytes of one component.
    pub fn size(self) -> usize {
        match self {
            Format::Byte | Format::Ascii | Format::SByte | Format::Undefined => 1,
            Format::Short | Format::SShort => 2,
            Format::Long | Format::SLong | Format::Float => 4,
            Format::Rational | Format::SRational | Format::Double => 8,
            Format::Unknown(_) => 0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Byte => "Byte",
            Format::Ascii => "Ascii",
            Format::Short => "Short",
            Format::Long => "Long",
            Format::Rational => "Rational",
            Format::SByte => "SByte",
            Format::Undefined => "Undefined",
            Format::SShort => "SShort",
            Format::SLong => "SLong",
            Format::SRational => "SRational",
            Format::Float => "Float",
            Format::Double => "Double",
            Format::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.name())
    }
}

/// Number of components stored in a value.
///
/// ASCII values count every byte, including the NUL terminating each string.
pub fn components(value: &Value) -> usize {
    match value {
        Value::Byte(v) => v.len(),
        Value::Ascii(strings) => strings.iter().map(|s| s.len() + 1).sum(),
        Value::Short(v) => v.len(),
        Value::Long(v) => v.len(),
        Value::Rational(v) => v.len(),
        Value::SByte(v) => v.len(),
        Value::Undefined(v, _) => v.len(),
        Value::SShort(v) => v.len(),
        Value::SLong(v) => v.len(),
        Value::SRational(v) => v.len(),
        Value::Float(v) => v.len(),
        Value::Double(v) => v.len(),
        Value::Unknown(_, count, _) => *count as usize,
    }
}

/// Payload size in bytes (format width times component count).
pub fn byte_len(value: &Value) -> usize {
    Format::of(value).size() * components(value)
}

/// Raw payload of a byte-oriented value.
///
/// ASCII strings are joined back together, each followed by its NUL
/// terminator. Numeric formats have no byte view and yield `None`.
pub fn raw_bytes(value: &Value) -> Option<Cow<'_, [u8]>> {
    match value {
        Value::Undefined(bytes, _) | Value::Byte(bytes) => Some(Cow::Borrowed(bytes)),
        Value::Ascii(strings) => {
            let mut joined = Vec::with_capacity(components(value));
            for s in strings {
                joined.extend_from_slice(s);
                joined.push(0);
            }
            Some(Cow::Owned(joined))
        }
        _ => None,
    }
}

/// The decoded directory set of one buffer.
///
/// Owned by a single request and dropped before the request returns.
#[derive(Debug, Clone)]
pub struct TagDirectory {
    little_endian: bool,
    ifds: [Vec<Field>; IFD_COUNT],
}

impl TagDirectory {
    /// Decodes a buffer into its directories.
    ///
    /// Returns `None` when the buffer is empty or holds no readable EXIF
    /// structure; decode failure is treated the same as absence.
    pub fn decode(buf: &[u8], continue_on_error: bool) -> Option<TagDirectory> {
        if buf.is_empty() {
            return None;
        }

        let mut reader = Reader::new();
        reader.continue_on_error(continue_on_error);

        let result = match buf.strip_prefix(EXIF_HEADER) {
            Some(tiff) => reader.read_raw(tiff.to_vec()),
            None => reader.read_from_container(&mut Cursor::new(buf)),
        };

        let exif = result.or_else(|e| {
            e.distill_partial_result(|errors| {
                for err in errors {
                    debug!("Skipped malformed EXIF entry: {}", err);
                }
            })
        });

        match exif {
            Ok(exif) => Some(Self::from_fields(
                exif.little_endian(),
                exif.fields().cloned(),
            )),
            Err(e) => {
                debug!("No EXIF data structure in {} byte buffer: {}", buf.len(), e);
                None
            }
        }
    }

    /// Sorts already-parsed fields into the five named directories, keeping
    /// their storage order.
    pub fn from_fields<I>(little_endian: bool, fields: I) -> TagDirectory
    where
        I: IntoIterator<Item = Field>,
    {
        let mut ifds: [Vec<Field>; IFD_COUNT] = Default::default();
        for field in fields {
            match ifd_of(&field) {
                Some(ifd) => ifds[ifd.index()].push(field),
                None => debug!("Ignoring {} outside the named directories", field.tag),
            }
        }
        TagDirectory {
            little_endian,
            ifds,
        }
    }

    /// Byte order the directory was stored in.
    pub fn little_endian(&self) -> bool {
        self.little_endian
    }

    pub fn entries(&self, ifd: Ifd) -> &[Field] {
        &self.ifds[ifd.index()]
    }

    pub fn is_empty(&self) -> bool {
        self.ifds.iter().all(Vec::is_empty)
    }

    /// All entries, directories in scan order and entries in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (Ifd, &Field)> + '_ {
        Ifd::ALL
            .into_iter()
            .flat_map(move |ifd| self.entries(ifd).iter().map(move |f| (ifd, f)))
    }

    /// First entry carrying `tag`, scanning every directory in order.
    pub fn find(&self, tag: Tag) -> Option<(Ifd, &Field)> {
        self.iter().find(|(_, field)| field.tag == tag)
    }

    /// Entry carrying `tag` inside one directory.
    pub fn get(&self, ifd: Ifd, tag: Tag) -> Option<&Field> {
        self.entries(ifd).iter().find(|field| field.tag == tag)
    }
}

fn ifd_of(field: &Field) -> Option<Ifd> {
    match field.tag.context() {
        Context::Tiff => match field.ifd_num.index() {
            0 => Some(Ifd::Zero),
            1 => Some(Ifd::One),
            _ => None,
        },
        Context::Exif => Some(Ifd::Exif),
        Context::Gps => Some(Ifd::Gps),
        Context::Interop => Some(Ifd::Interoperability),
        #[allow(unreachable_patterns)]
        _ => None,
    }
}
