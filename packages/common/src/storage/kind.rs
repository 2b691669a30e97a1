use std::fmt;

/// Owner category of a stored image. Each kind gets its own directory
/// under the uploads tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    Venue,
    Activity,
}

impl MediaKind {
    /// Directory name below `/uploads/`.
    pub fn dir(self) -> &'static str {
        match self {
            // Kept from the first deployment so existing references resolve.
            Self::Venue => "stades",
            Self::Activity => "activities",
        }
    }

    /// Lowercase file extensions accepted for uploads of this kind.
    pub fn allowed_extensions(self) -> &'static [&'static str] {
        match self {
            Self::Venue => &["jpeg", "jpg", "png", "gif", "webp"],
            Self::Activity => &["jpeg", "jpg", "png", "gif", "svg"],
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir())
    }
}
