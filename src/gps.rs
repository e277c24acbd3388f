//! GPS derived values: decimal degrees, WKT points and the GPS UTC timestamp.

use crate::directory::{byte_len, components, raw_bytes, Format, TagDirectory};
use crate::error::MetadataWarning;
use crate::ifd::Ifd;
use chrono::{DateTime, NaiveDate, NaiveTime, TimeDelta, Utc};
use exif::{Field, Tag, Value};

/// Length of a `YYYY:MM:DD` date stamp including its NUL terminator.
pub const GPS_DATE_LEN: usize = 11;

const WGS84_DATUM: &[u8] = b"WGS-84";
const WGS84_SRID_PREFIX: &str = "SRID=4326;";
const COORDINATE_PRECISION: usize = 14;

/// The four tags a point is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointTags {
    pub latitude: Tag,
    pub latitude_ref: Tag,
    pub longitude: Tag,
    pub longitude_ref: Tag,
}

/// Where the picture was taken.
pub const POSITION: PointTags = PointTags {
    latitude: Tag::GPSLatitude,
    latitude_ref: Tag::GPSLatitudeRef,
    longitude: Tag::GPSLongitude,
    longitude_ref: Tag::GPSLongitudeRef,
};

/// The destination point recorded by the device.
pub const DESTINATION: PointTags = PointTags {
    latitude: Tag::GPSDestLatitude,
    latitude_ref: Tag::GPSDestLatitudeRef,
    longitude: Tag::GPSDestLongitude,
    longitude_ref: Tag::GPSDestLongitudeRef,
};

/// Converts a degrees/minutes/seconds rational entry to decimal degrees.
///
/// Up to three components are read; missing trailing ones count as zero.
/// Yields NaN when the entry is absent or not stored as unsigned rationals.
/// A zero denominator produces an infinite or NaN result, which callers
/// must treat as unusable.
pub fn degrees(field: Option<&Field>) -> f64 {
    let Some(Value::Rational(parts)) = field.map(|f| &f.value) else {
        return f64::NAN;
    };
    parts
        .iter()
        .zip([1.0, 60.0, 3600.0])
        .map(|(r, scale)| f64::from(r.num) / f64::from(r.denom) / scale)
        .sum()
}

/// Builds `[SRID=4326;]Point(<lon> <lat>)` from the GPS directory.
///
/// `Ok(None)` when any of the four required entries is missing.
pub fn point(dir: &TagDirectory, tags: &PointTags) -> Result<Option<String>, MetadataWarning> {
    let get = |tag| dir.get(Ifd::Gps, tag);
    let (Some(lat), Some(lat_ref), Some(lon), Some(lon_ref)) = (
        get(tags.latitude),
        get(tags.latitude_ref),
        get(tags.longitude),
        get(tags.longitude_ref),
    ) else {
        return Ok(None);
    };

    let mut latitude = coordinate(lat, "latitude")?;
    let mut longitude = coordinate(lon, "longitude")?;

    if reference(lat_ref) == b'S' {
        latitude = -latitude;
    }
    if reference(lon_ref) == b'W' {
        longitude = -longitude;
    }

    let srid = match get(Tag::GPSMapDatum) {
        Some(datum) if is_wgs84(&datum.value) => WGS84_SRID_PREFIX,
        _ => "",
    };

    Ok(Some(format!(
        "{srid}Point({longitude:.prec$} {latitude:.prec$})",
        prec = COORDINATE_PRECISION
    )))
}

fn coordinate(field: &Field, what: &'static str) -> Result<f64, MetadataWarning> {
    let value = degrees(Some(field));
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MetadataWarning::InvalidCoordinate {
            what,
            format: Format::of(&field.value).name(),
        })
    }
}

// First byte of a hemisphere reference; 0 when it has no byte payload.
fn reference(field: &Field) -> u8 {
    raw_bytes(&field.value)
        .and_then(|bytes| bytes.first().copied())
        .unwrap_or(0)
}

fn is_wgs84(value: &Value) -> bool {
    let Some(bytes) = raw_bytes(value) else {
        return false;
    };
    let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    &bytes[..end] == WGS84_DATUM
}

/// Combines the GPS date stamp and the GPS time stamp into a UTC timestamp.
///
/// `Ok(None)` when either entry is missing. Wrong formats, zero denominators
/// and impossible dates are reported as warnings.
///
/// The date stamp must be an 11-byte `YYYY:MM:DD\0` ASCII value. The parser
/// drops the NUL terminator of ASCII values and its length is counted back
/// in, so a 10-byte date stored without the terminator is accepted as well.
pub fn utc_timestamp(dir: &TagDirectory) -> Result<Option<DateTime<Utc>>, MetadataWarning> {
    let (Some(time), Some(date)) = (
        dir.get(Ifd::Gps, Tag::GPSTimeStamp),
        dir.get(Ifd::Gps, Tag::GPSDateStamp),
    ) else {
        return Ok(None);
    };

    let date_format = Format::of(&date.value);
    let date_len = byte_len(&date.value);
    if date_format != Format::Ascii || date_len != GPS_DATE_LEN {
        return Err(MetadataWarning::InvalidGpsDate {
            format: date_format.name(),
            len: date_len,
        });
    }

    let parts = match &time.value {
        Value::Rational(parts) if parts.len() >= 3 => parts,
        other => {
            return Err(MetadataWarning::InvalidGpsTime {
                format: Format::of(other).name(),
                components: components(other),
            })
        }
    };
    let (h, m, s) = (&parts[0], &parts[1], &parts[2]);
    if h.denom == 0 || m.denom == 0 || s.denom == 0 {
        return Err(MetadataWarning::ZeroGpsTimeDenominator);
    }

    let raw = raw_bytes(&date.value).unwrap_or_default();
    let year = leading_int(&raw[0..]);
    let month = leading_int(&raw[5..]);
    let day = leading_int(&raw[8..]);

    let hour = h.num / h.denom;
    let minute = m.num / m.denom;
    let second = f64::from(s.num) / f64::from(s.denom);

    let out_of_range = || MetadataWarning::GpsTimestampOutOfRange {
        year: i32::try_from(year).unwrap_or(i32::MAX),
        month: u32::try_from(month).unwrap_or(0),
        day: u32::try_from(day).unwrap_or(0),
        hour,
        minute,
        second,
    };

    make_timestamp(year, month, day, hour, minute, second).ok_or_else(out_of_range).map(Some)
}

// Midnight-based arithmetic allows 24:00:00 and a leap second of 60, both of
// which roll over into the next unit.
fn make_timestamp(
    year: i64,
    month: i64,
    day: i64,
    hour: u32,
    minute: u32,
    second: f64,
) -> Option<DateTime<Utc>> {
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(year).ok()?,
        u32::try_from(month).ok()?,
        u32::try_from(day).ok()?,
    )?;

    if hour > 24 || minute > 59 || !(0.0..=60.0).contains(&second) {
        return None;
    }
    if hour == 24 && (minute > 0 || second > 0.0) {
        return None;
    }

    let offset = TimeDelta::try_hours(i64::from(hour))?
        .checked_add(&TimeDelta::try_minutes(i64::from(minute))?)?
        .checked_add(&TimeDelta::nanoseconds((second * 1e9).round() as i64))?;

    date.and_time(NaiveTime::MIN)
        .checked_add_signed(offset)
        .map(|naive| naive.and_utc())
}

// Reads a base-10 integer the way `strtol` does: optional leading
// whitespace and sign, then digits up to the first non-digit.
fn leading_int(bytes: &[u8]) -> i64 {
    let mut rest = bytes;
    while let [b, tail @ ..] = rest {
        if !b.is_ascii_whitespace() {
            break;
        }
        rest = tail;
    }

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let magnitude = rest
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .fold(0i64, |acc, b| {
            acc.saturating_mul(10).saturating_add(i64::from(b - b'0'))
        });

    if negative {
        -magnitude
    } else {
        magnitude
    }
}
