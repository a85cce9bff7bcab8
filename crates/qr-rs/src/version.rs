/// A symbol version number between 1 and 40 (inclusive).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// Panics if the number is outside the range [1, 40].
    pub fn new(ver: u8) -> Self {
        assert!(
            (Version::MIN.value()..=Version::MAX.value()).contains(&ver),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Creates a version object, or `None` if the number is out of range.
    pub fn try_new(ver: u8) -> Option<Self> {
        (Version::MIN.value()..=Version::MAX.value())
            .contains(&ver)
            .then_some(Self(ver))
    }

    /// Returns the value, which is in the range [1, 40].
    pub fn value(self) -> u8 {
        self.0
    }

    /// Symbol side length in modules: `version * 4 + 17`, in [21, 177].
    pub fn size(self) -> usize {
        usize::from(self.0) * 4 + 17
    }

    /// Derives the version from a module side length, if one matches exactly.
    pub fn from_size(size: usize) -> Option<Self> {
        if size < 21 || size > 177 || (size - 17) % 4 != 0 {
            return None;
        }
        Self::try_new(((size - 17) / 4) as u8)
    }

    // Index into the three character-count width classes:
    // 0 for versions 1-9, 1 for 10-26, 2 for 27-40.
    pub(crate) fn char_count_class(self) -> usize {
        usize::from((self.0 + 7) / 17)
    }
}
