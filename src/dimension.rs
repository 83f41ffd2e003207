//! Named axes of fixed or unlimited extent.

/// Descriptor of a named axis.
///
/// Dimensions are immutable after creation: the id is assigned by the
/// store and file-scoped, the name never changes. An unlimited dimension
/// grows as records are written; its `size` here is the extent observed
/// when this catalog entry was built, while [`crate::Variable::shape`]
/// always reports the live extent.
#[derive(Clone, Debug)]
pub struct Dimension {
    pub(crate) id: i32,
    pub(crate) name: String,
    pub(crate) size: usize,
    pub(crate) unlimited: bool,
}

impl Dimension {
    /// File-scoped dimension id.
    #[inline]
    pub fn id(&self) -> i32 {
        self.id
    }

    /// Name of the axis.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extent of the axis. For an unlimited dimension this is the extent
    /// recorded when the entry was built.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// True if this axis grows as data is appended.
    #[inline]
    pub fn is_unlimited(&self) -> bool {
        self.unlimited
    }
}
