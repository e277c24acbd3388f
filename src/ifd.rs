use std::fmt;

/// Number of named image file directories.
pub const IFD_COUNT: usize = 5;

/// One of the five named image file directories of an EXIF block.
///
/// The declaration order is the scan order used by every lookup that walks
/// all directories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ifd {
    Zero,
    One,
    Exif,
    Gps,
    Interoperability,
}

impl Ifd {
    /// All directories, in scan order.
    pub const ALL: [Ifd; IFD_COUNT] = [
        Ifd::Zero,
        Ifd::One,
        Ifd::Exif,
        Ifd::Gps,
        Ifd::Interoperability,
    ];

    /// Resolves a directory name. Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Option<Ifd> {
        Self::ALL.into_iter().find(|ifd| ifd.name() == name)
    }

    pub fn name(self) -> &'static str {
        match self {
            Ifd::Zero => "0",
            Ifd::One => "1",
            Ifd::Exif => "EXIF",
            Ifd::Gps => "GPS",
            Ifd::Interoperability => "Interoperability",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Ifd {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.pad(self.name())
    }
}
