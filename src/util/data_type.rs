//! Atomic data types - the element types a variable can store.

use std::fmt;

/// Atomic data type enum - the closed set of element types supported
/// by the container format.
///
/// Each numeric type has a fixed size and little-endian binary
/// representation on disk. The discriminants are the on-disk type tags
/// and must not change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum DataType {
    /// Signed 8-bit integer
    Int8 = 0,
    /// Unsigned 8-bit integer
    Uint8 = 1,
    /// Signed 16-bit integer
    Int16 = 2,
    /// Unsigned 16-bit integer
    Uint16 = 3,
    /// Signed 32-bit integer
    #[default]
    Int32 = 4,
    /// Unsigned 32-bit integer
    Uint32 = 5,
    /// Signed 64-bit integer
    Int64 = 6,
    /// Unsigned 64-bit integer
    Uint64 = 7,
    /// 32-bit floating point (IEEE 754 single precision)
    Float32 = 8,
    /// 64-bit floating point (IEEE 754 double precision)
    Float64 = 9,
    /// UTF-8 string (variable length, stored in a string table)
    String = 10,
}

impl DataType {
    /// Number of supported atomic types.
    pub const COUNT: usize = 11;

    /// Returns the size in bytes of a single element of this type.
    /// Strings are variable length and report 0.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Int64 | Self::Uint64 | Self::Float64 => 8,
            Self::String => 0,
        }
    }

    /// Returns the name of this type as a string.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Uint8 => "uint8",
            Self::Int16 => "int16",
            Self::Uint16 => "uint16",
            Self::Int32 => "int32",
            Self::Uint32 => "uint32",
            Self::Int64 => "int64",
            Self::Uint64 => "uint64",
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::String => "string",
        }
    }

    /// Parse a type from its on-disk tag value.
    pub const fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Int8),
            1 => Some(Self::Uint8),
            2 => Some(Self::Int16),
            3 => Some(Self::Uint16),
            4 => Some(Self::Int32),
            5 => Some(Self::Uint32),
            6 => Some(Self::Int64),
            7 => Some(Self::Uint64),
            8 => Some(Self::Float32),
            9 => Some(Self::Float64),
            10 => Some(Self::String),
            _ => None,
        }
    }

    /// True for the fixed-width numeric types.
    #[inline]
    pub const fn is_numeric(self) -> bool {
        !matches!(self, Self::String)
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for tag in 0..DataType::COUNT as u8 {
            let dtype = DataType::from_u8(tag).unwrap();
            assert_eq!(dtype as u8, tag);
        }
        assert_eq!(DataType::from_u8(11), None);
        assert_eq!(DataType::from_u8(255), None);
    }

    #[test]
    fn test_num_bytes() {
        assert_eq!(DataType::Int8.num_bytes(), 1);
        assert_eq!(DataType::Uint16.num_bytes(), 2);
        assert_eq!(DataType::Float32.num_bytes(), 4);
        assert_eq!(DataType::Uint64.num_bytes(), 8);
        assert_eq!(DataType::String.num_bytes(), 0);
    }

    #[test]
    fn test_display() {
        assert_eq!(DataType::Float64.to_string(), "float64");
        assert_eq!(DataType::String.to_string(), "string");
    }
}
