//! Container file format constants.

/// Magic bytes at the start of a container file.
pub const MAGIC: &[u8; 4] = b"NDF1";

/// Size of the file header in bytes: magic + version + reserved.
pub const HEADER_SIZE: usize = 8;

/// Current container format version.
pub const CURRENT_VERSION: u16 = 1;

/// Payload kind tag for fixed-width element buffers.
pub const PAYLOAD_FIXED: u8 = 0;

/// Payload kind tag for string tables.
pub const PAYLOAD_TEXT: u8 = 1;
