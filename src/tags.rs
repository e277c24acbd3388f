use exif::Tag;
use std::collections::HashMap;
use std::sync::LazyLock;

// Tags a caller may ask for by name. Pointer tags are consumed by the
// directory parser and never surface as entries, so they are left out.
const KNOWN_TAGS: &[Tag] = &[
    // IFD0 / IFD1
    Tag::ImageWidth,
    Tag::ImageLength,
    Tag::BitsPerSample,
    Tag::Compression,
    Tag::PhotometricInterpretation,
    Tag::ImageDescription,
    Tag::Make,
    Tag::Model,
    Tag::StripOffsets,
    Tag::Orientation,
    Tag::SamplesPerPixel,
    Tag::RowsPerStrip,
    Tag::StripByteCounts,
    Tag::TileOffsets,
    Tag::TileByteCounts,
    Tag::XResolution,
    Tag::YResolution,
    Tag::PlanarConfiguration,
    Tag::ResolutionUnit,
    Tag::TransferFunction,
    Tag::Software,
    Tag::DateTime,
    Tag::Artist,
    Tag::WhitePoint,
    Tag::PrimaryChromaticities,
    Tag::JPEGInterchangeFormat,
    Tag::JPEGInterchangeFormatLength,
    Tag::YCbCrCoefficients,
    Tag::YCbCrSubSampling,
    Tag::YCbCrPositioning,
    Tag::ReferenceBlackWhite,
    Tag::Copyright,
    // EXIF
    Tag::ExposureTime,
    Tag::FNumber,
    Tag::ExposureProgram,
    Tag::SpectralSensitivity,
    Tag::PhotographicSensitivity,
    Tag::OECF,
    Tag::SensitivityType,
    Tag::StandardOutputSensitivity,
    Tag::RecommendedExposureIndex,
    Tag::ISOSpeed,
    Tag::ISOSpeedLatitudeyyy,
    Tag::ISOSpeedLatitudezzz,
    Tag::ExifVersion,
    Tag::DateTimeOriginal,
    Tag::DateTimeDigitized,
    Tag::OffsetTime,
    Tag::OffsetTimeOriginal,
    Tag::OffsetTimeDigitized,
    Tag::ComponentsConfiguration,
    Tag::CompressedBitsPerPixel,
    Tag::ShutterSpeedValue,
    Tag::ApertureValue,
    Tag::BrightnessValue,
    Tag::ExposureBiasValue,
    Tag::MaxApertureValue,
    Tag::SubjectDistance,
    Tag::MeteringMode,
    Tag::LightSource,
    Tag::Flash,
    Tag::FocalLength,
    Tag::SubjectArea,
    Tag::MakerNote,
    Tag::UserComment,
    Tag::SubSecTime,
    Tag::SubSecTimeOriginal,
    Tag::SubSecTimeDigitized,
    Tag::Temperature,
    Tag::Humidity,
    Tag::Pressure,
    Tag::WaterDepth,
    Tag::Acceleration,
    Tag::CameraElevationAngle,
    Tag::FlashpixVersion,
    Tag::ColorSpace,
    Tag::PixelXDimension,
    Tag::PixelYDimension,
    Tag::RelatedSoundFile,
    Tag::FlashEnergy,
    Tag::SpatialFrequencyResponse,
    Tag::FocalPlaneXResolution,
    Tag::FocalPlaneYResolution,
    Tag::FocalPlaneResolutionUnit,
    Tag::SubjectLocation,
    Tag::ExposureIndex,
    Tag::SensingMethod,
    Tag::FileSource,
    Tag::SceneType,
    Tag::CFAPattern,
    Tag::CustomRendered,
    Tag::ExposureMode,
    Tag::WhiteBalance,
    Tag::DigitalZoomRatio,
    Tag::FocalLengthIn35mmFilm,
    Tag::SceneCaptureType,
    Tag::GainControl,
    Tag::Contrast,
    Tag::Saturation,
    Tag::Sharpness,
    Tag::DeviceSettingDescription,
    Tag::SubjectDistanceRange,
    Tag::ImageUniqueID,
    Tag::CameraOwnerName,
    Tag::BodySerialNumber,
    Tag::LensSpecification,
    Tag::LensMake,
    Tag::LensModel,
    Tag::LensSerialNumber,
    Tag::Gamma,
    Tag::CompositeImage,
    Tag::SourceImageNumberOfCompositeImage,
    Tag::SourceExposureTimesOfCompositeImage,
    // GPS
    Tag::GPSVersionID,
    Tag::GPSLatitudeRef,
    Tag::GPSLatitude,
    Tag::GPSLongitudeRef,
    Tag::GPSLongitude,
    Tag::GPSAltitudeRef,
    Tag::GPSAltitude,
    Tag::GPSTimeStamp,
    Tag::GPSSatellites,
    Tag::GPSStatus,
    Tag::GPSMeasureMode,
    Tag::GPSDOP,
    Tag::GPSSpeedRef,
    Tag::GPSSpeed,
    Tag::GPSTrackRef,
    Tag::GPSTrack,
    Tag::GPSImgDirectionRef,
    Tag::GPSImgDirection,
    Tag::GPSMapDatum,
    Tag::GPSDestLatitudeRef,
    Tag::GPSDestLatitude,
    Tag::GPSDestLongitudeRef,
    Tag::GPSDestLongitude,
    Tag::GPSDestBearingRef,
    Tag::GPSDestBearing,
    Tag::GPSDestDistanceRef,
    Tag::GPSDestDistance,
    Tag::GPSProcessingMethod,
    Tag::GPSAreaInformation,
    Tag::GPSDateStamp,
    Tag::GPSDifferential,
    Tag::GPSHPositioningError,
    // Interoperability
    Tag::InteroperabilityIndex,
    Tag::InteroperabilityVersion,
    Tag::RelatedImageFileFormat,
    Tag::RelatedImageWidth,
    Tag::RelatedImageLength,
];

static TAGS_BY_NAME: LazyLock<HashMap<String, Tag>> = LazyLock::new(|| {
    KNOWN_TAGS
        .iter()
        .map(|tag| (tag.to_string(), *tag))
        .collect()
});

/// Resolves an EXIF tag name such as `"GPSLatitude"`. Exact match only.
pub fn tag_from_name(name: &str) -> Option<Tag> {
    TAGS_BY_NAME.get(name).copied()
}

/// The name a tag is known by inside its directory.
///
/// Tags outside the known vocabulary keep the parser's fallback rendering,
/// which includes the context and the numeric identifier.
pub fn tag_name(tag: Tag) -> String {
    tag.to_string()
}
