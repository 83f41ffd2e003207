//! Element storage and the scalar-type dispatch trait.
//!
//! [`Atomic`] ties each supported Rust scalar type to its [`DataType`] tag
//! and to the store/load entry points the transfer primitives dispatch
//! through. The set of implementations is closed: exactly the eleven
//! atomic types the container format supports.

use crate::util::DataType;

/// Backing storage for one variable's elements.
#[derive(Clone, Debug)]
pub enum ElementStore {
    /// Fixed-width elements as little-endian bytes.
    Fixed { width: usize, bytes: Vec<u8> },
    /// Variable-length strings.
    Text { values: Vec<String> },
}

impl ElementStore {
    /// Allocate zero-filled storage for `len` elements of `dtype`.
    pub fn for_type(dtype: DataType, len: usize) -> Self {
        match dtype {
            DataType::String => Self::Text {
                values: vec![String::new(); len],
            },
            _ => {
                let width = dtype.num_bytes();
                Self::Fixed {
                    width,
                    bytes: vec![0; len * width],
                }
            }
        }
    }

    /// Number of elements currently allocated.
    pub fn len(&self) -> usize {
        match self {
            Self::Fixed { width, bytes } if *width > 0 => bytes.len() / width,
            Self::Fixed { .. } => 0,
            Self::Text { values } => values.len(),
        }
    }

    /// True if no elements are allocated.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grow (or shrink) the storage to `len` elements, zero/empty-filling
    /// new space.
    pub fn resize(&mut self, len: usize) {
        match self {
            Self::Fixed { width, bytes } => bytes.resize(len * *width, 0),
            Self::Text { values } => values.resize(len, String::new()),
        }
    }
}

/// A Rust scalar type usable as a variable element.
///
/// Invariant: the engine checks a variable's declared [`DataType`] against
/// `Self::DATA_TYPE` before dispatching, so `store_into`/`load_from` always
/// see the storage variant matching the type.
pub trait Atomic: Clone + Default {
    /// Atomic type tag corresponding to this Rust type.
    const DATA_TYPE: DataType;

    /// Store one element at a flat index, growing the storage if needed.
    fn store_into(&self, store: &mut ElementStore, index: usize);

    /// Load the element at a flat index. Indices past the written extent
    /// of a growable variable yield the type's default (fill value).
    fn load_from(store: &ElementStore, index: usize) -> Self;
}

macro_rules! atomic_numeric {
    ($rust:ty, $tag:ident) => {
        impl Atomic for $rust {
            const DATA_TYPE: DataType = DataType::$tag;

            fn store_into(&self, store: &mut ElementStore, index: usize) {
                let ElementStore::Fixed { width, bytes } = store else {
                    debug_assert!(false, "numeric element stored into a string table");
                    return;
                };
                debug_assert_eq!(*width, std::mem::size_of::<$rust>());
                let offset = index * *width;
                if bytes.len() < offset + *width {
                    bytes.resize(offset + *width, 0);
                }
                bytes[offset..offset + *width].copy_from_slice(&self.to_le_bytes());
            }

            fn load_from(store: &ElementStore, index: usize) -> Self {
                let ElementStore::Fixed { width, bytes } = store else {
                    return <$rust>::default();
                };
                let offset = index * *width;
                if *width != std::mem::size_of::<$rust>() || bytes.len() < offset + *width {
                    return <$rust>::default();
                }
                let mut raw = [0u8; std::mem::size_of::<$rust>()];
                raw.copy_from_slice(&bytes[offset..offset + *width]);
                <$rust>::from_le_bytes(raw)
            }
        }
    };
}

atomic_numeric!(i8, Int8);
atomic_numeric!(u8, Uint8);
atomic_numeric!(i16, Int16);
atomic_numeric!(u16, Uint16);
atomic_numeric!(i32, Int32);
atomic_numeric!(u32, Uint32);
atomic_numeric!(i64, Int64);
atomic_numeric!(u64, Uint64);
atomic_numeric!(f32, Float32);
atomic_numeric!(f64, Float64);

impl Atomic for String {
    const DATA_TYPE: DataType = DataType::String;

    fn store_into(&self, store: &mut ElementStore, index: usize) {
        let ElementStore::Text { values } = store else {
            debug_assert!(false, "string element stored into a byte buffer");
            return;
        };
        if values.len() <= index {
            values.resize(index + 1, String::new());
        }
        values[index] = self.clone();
    }

    fn load_from(store: &ElementStore, index: usize) -> Self {
        match store {
            ElementStore::Text { values } => values.get(index).cloned().unwrap_or_default(),
            ElementStore::Fixed { .. } => String::new(),
        }
    }
}
