//! Construct binary protocol messages with byte-aligned and bit-packed writes.
//!
//! # Overview
//!
//! A single writable byte sink for assembling network messages (e.g.
//! game-server packets) whose payloads mix whole-byte fields with tightly
//! packed sub-byte bitfields for bandwidth efficiency:
//! - Aligned writes of bytes, slices, and big-endian primitives
//! - Packed writes of 1 to 32-bit fields with no padding between them
//! - Backpatching of previously written bytes and bitfields
//!
//! The writer keeps a byte cursor and, while bit access is active, an
//! independent bit cursor. The two are reconciled on every transition, so a
//! message can interleave aligned and packed sections freely. Decoding is the
//! job of a symmetric reader on the receiving side; this crate only writes.
//!
//! # Example
//!
//! ```
//! use packbuf::BufferWriter;
//!
//! let mut writer = BufferWriter::new(16);
//! writer.put_u8(0x07)?; // opcode
//! writer.put_u8(0)?; // payload length, patched below
//!
//! // Pack two sub-byte fields into a single byte.
//! writer.start_bit_access()?;
//! writer.write_bits(1, 1)?; // running
//! writer.write_bits(5, 13)?; // direction
//! writer.stop_bit_access()?;
//!
//! writer.put_u16(0x1234)?; // region id, network order
//! writer.set_u8(1, (writer.position() - 2) as u8)?;
//!
//! let frame = writer.to_bytes();
//! assert_eq!(frame.len(), 5);
//! assert_eq!(frame[1], 3); // patched length
//! # Ok::<(), packbuf::Error>(())
//! ```

pub mod error;
pub mod writer;

// Re-export main types
pub use error::Error;
pub use writer::{BufferWriter, DEFAULT_CAPACITY};
