//! Dual-mode write buffer for assembling protocol messages.
//!
//! [BufferWriter] owns a fixed-capacity byte region and two cursors: a byte
//! cursor for aligned writes and a bit cursor for packed sub-byte writes. The
//! bit cursor only exists while bit access is active, enforced by an explicit
//! two-state mode so that writes issued in the wrong state surface as errors
//! instead of corrupting the message.

use crate::error::Error;
use bytes::{Bytes, BytesMut};
use std::mem::size_of;

/// Number of bits in a byte.
const BITS_PER_BYTE: usize = 8;

/// Capacity used by [BufferWriter::default], matching the typical size of a
/// small protocol message.
pub const DEFAULT_CAPACITY: usize = 64;

/// Creates a mask with the low `bits` bits set to 1.
///
/// `bits` must be at most [BITS_PER_BYTE].
#[inline(always)]
const fn low_mask(bits: usize) -> u32 {
    (1 << bits) - 1
}

/// Write state of a [BufferWriter].
///
/// Exactly one of the two cursors drives writes at any time. Entering bit
/// access seeds the bit cursor from the byte cursor; leaving it reconciles the
/// byte cursor to the next whole byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    /// Aligned writes, driven by the byte cursor.
    Byte,
    /// Packed writes, driven by `cursor` (an offset in bits from the start of
    /// the region).
    Bit { cursor: usize },
}

/// A fixed-capacity byte region with byte-aligned and bit-packed write paths.
///
/// Aligned writes advance the byte cursor and store multi-byte values in
/// big-endian (network) order. Between [BufferWriter::start_bit_access] and
/// [BufferWriter::stop_bit_access], fields of 1 to 32 bits are packed
/// back-to-back with no padding, most-significant bit first, sharing bytes
/// with neighboring fields where they fit.
///
/// The writer is exclusively owned and performs no internal synchronization;
/// use one writer per in-flight message.
#[derive(Clone, Debug)]
pub struct BufferWriter {
    /// The backing region. Its length is the write capacity; bytes past the
    /// cursor are zero until written.
    storage: BytesMut,
    /// Next write position for aligned operations.
    position: usize,
    /// Current write state.
    mode: Mode,
}

// Generates the aligned single-value and batch write methods for a primitive.
macro_rules! impl_put {
    ($type:ty, $single:ident, $many:ident) => {
        /// Writes a big-endian value at the byte cursor, advancing it by the
        /// width of the value.
        pub fn $single(&mut self, value: $type) -> Result<(), Error> {
            self.aligned(size_of::<$type>())?
                .copy_from_slice(&value.to_be_bytes());
            Ok(())
        }

        /// Writes a batch of big-endian values at the byte cursor.
        ///
        /// The output is identical to writing each element individually; the
        /// cursor ends exactly past the last element.
        pub fn $many(&mut self, values: &[$type]) -> Result<(), Error> {
            let region = self.aligned(values.len() * size_of::<$type>())?;
            for (chunk, value) in region.chunks_exact_mut(size_of::<$type>()).zip(values) {
                chunk.copy_from_slice(&value.to_be_bytes());
            }
            Ok(())
        }
    };
}

impl BufferWriter {
    /// Creates a writer over a zero-filled region of `capacity` bytes.
    pub fn new(capacity: usize) -> Self {
        Self::with_storage(BytesMut::zeroed(capacity))
    }

    /// Creates a writer over a pre-allocated region.
    ///
    /// The length of `storage` is the write capacity. Existing content is
    /// kept; bit writes merge into it.
    pub fn with_storage(storage: BytesMut) -> Self {
        Self {
            storage,
            position: 0,
            mode: Mode::Byte,
        }
    }

    // ---------- Aligned writes ----------

    /// Writes a single byte at the byte cursor, advancing it by 1.
    pub fn put_u8(&mut self, value: u8) -> Result<(), Error> {
        self.aligned(1)?[0] = value;
        Ok(())
    }

    /// Overwrites the byte at `index` without moving any cursor.
    ///
    /// Used for backpatching, e.g. writing a payload length after the payload
    /// is known. Permitted in either mode.
    pub fn set_u8(&mut self, index: usize, value: u8) -> Result<(), Error> {
        if index >= self.storage.len() {
            return Err(Error::InvalidIndex(index, self.storage.len()));
        }
        self.storage[index] = value;
        Ok(())
    }

    /// Writes a run of raw bytes at the byte cursor.
    pub fn put_slice(&mut self, value: &[u8]) -> Result<(), Error> {
        self.aligned(value.len())?.copy_from_slice(value);
        Ok(())
    }

    impl_put!(u16, put_u16, put_u16_slice);
    impl_put!(u32, put_u32, put_u32_slice);
    impl_put!(u64, put_u64, put_u64_slice);
    impl_put!(i16, put_i16, put_i16_slice);
    impl_put!(i32, put_i32, put_i32_slice);
    impl_put!(i64, put_i64, put_i64_slice);
    impl_put!(f32, put_f32, put_f32_slice);
    impl_put!(f64, put_f64, put_f64_slice);

    // ---------- Bit access ----------

    /// Enters bit access, seeding the bit cursor from the byte cursor.
    ///
    /// Returns [Error::BitAccessActive] if bit access is already active.
    pub fn start_bit_access(&mut self) -> Result<(), Error> {
        if let Mode::Bit { .. } = self.mode {
            return Err(Error::BitAccessActive);
        }
        self.mode = Mode::Bit {
            cursor: self.position * BITS_PER_BYTE,
        };
        Ok(())
    }

    /// Leaves bit access, reconciling the byte cursor to the next whole byte.
    ///
    /// A partially filled final byte is kept as-is; its unwritten low bits
    /// retain their prior value. Returns [Error::BitAccessInactive] if bit
    /// access is not active.
    pub fn stop_bit_access(&mut self) -> Result<(), Error> {
        let Mode::Bit { cursor } = self.mode else {
            return Err(Error::BitAccessInactive);
        };
        self.position = cursor.div_ceil(BITS_PER_BYTE);
        self.mode = Mode::Byte;
        Ok(())
    }

    /// Writes the low `count` bits of `value` at the bit cursor, most
    /// significant bit of the field first, advancing the cursor by `count`.
    ///
    /// Fields may straddle byte boundaries and share bytes with neighboring
    /// fields; bits outside the field are preserved. `count` must be in
    /// `1..=32` and bit access must be active.
    pub fn write_bits(&mut self, count: usize, value: u32) -> Result<(), Error> {
        let Mode::Bit { cursor } = self.mode else {
            return Err(Error::BitAccessInactive);
        };
        if !(1..=32).contains(&count) {
            return Err(Error::InvalidBitCount(count));
        }
        let end = (cursor + count).div_ceil(BITS_PER_BYTE);
        if end > self.storage.len() {
            return Err(Error::CapacityExceeded(end, self.storage.len()));
        }

        // The cursor advances by the full field width up front; the loop
        // below walks the same span byte-by-byte.
        self.mode = Mode::Bit {
            cursor: cursor + count,
        };

        let mut index = cursor / BITS_PER_BYTE;
        let mut available = BITS_PER_BYTE - (cursor % BITS_PER_BYTE);
        let mut remaining = count;

        // Fill every byte the field completely crosses, consuming the value
        // from its high bits down. Bits of the target byte outside the field
        // are preserved via mask-and-or.
        while remaining > available {
            let mask = low_mask(available);
            let byte = u32::from(self.storage[index]);
            let slice = (value >> (remaining - available)) & mask;
            self.storage[index] = ((byte & !mask) | slice) as u8;
            index += 1;
            remaining -= available;
            available = BITS_PER_BYTE;
        }

        // Final byte: if the remainder exactly fills the available bits,
        // replace them; otherwise shift it into the highest unwritten
        // positions, leaving the low bits for fields that share this byte.
        let mask = low_mask(remaining);
        let byte = u32::from(self.storage[index]);
        self.storage[index] = if remaining == available {
            ((byte & !mask) | (value & mask)) as u8
        } else {
            let shift = available - remaining;
            ((byte & !(mask << shift)) | ((value & mask) << shift)) as u8
        };
        Ok(())
    }

    /// Returns the bit cursor, or `None` when bit access is not active.
    pub fn bit_position(&self) -> Option<usize> {
        match self.mode {
            Mode::Bit { cursor } => Some(cursor),
            Mode::Byte => None,
        }
    }

    /// Moves the bit cursor, e.g. to backpatch a bit-packed flag after later
    /// fields are written.
    ///
    /// The position is not validated against the capacity; a subsequent
    /// [BufferWriter::write_bits] performs the bounds check. Returns
    /// [Error::BitAccessInactive] if bit access is not active.
    pub fn set_bit_position(&mut self, bit: usize) -> Result<(), Error> {
        let Mode::Bit { .. } = self.mode else {
            return Err(Error::BitAccessInactive);
        };
        self.mode = Mode::Bit { cursor: bit };
        Ok(())
    }

    // ---------- Introspection ----------

    /// Returns the current write position in bytes.
    ///
    /// While bit access is active this is the byte position as if it were
    /// stopped now, i.e. the bit cursor rounded up to a whole byte.
    pub fn position(&self) -> usize {
        match self.mode {
            Mode::Bit { cursor } => cursor.div_ceil(BITS_PER_BYTE),
            Mode::Byte => self.position,
        }
    }

    /// Moves the byte cursor, e.g. to backpatch a length field.
    ///
    /// Returns [Error::BitAccessActive] while bit access is active and
    /// [Error::InvalidIndex] past the capacity.
    pub fn set_position(&mut self, index: usize) -> Result<(), Error> {
        if let Mode::Bit { .. } = self.mode {
            return Err(Error::BitAccessActive);
        }
        if index > self.storage.len() {
            return Err(Error::InvalidIndex(index, self.storage.len()));
        }
        self.position = index;
        Ok(())
    }

    /// Returns the capacity of the backing region in bytes.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Returns how many more bytes can be written before exhaustion.
    pub fn remaining(&self) -> usize {
        self.capacity() - self.position()
    }

    // ---------- Draining ----------

    /// Returns a copy of the written prefix, independent of the unwritten
    /// remainder of the region.
    pub fn to_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.storage[..self.position()])
    }

    /// Borrows the raw backing region, including unwritten trailing bytes.
    ///
    /// Intended for zero-copy transport handoff together with
    /// [BufferWriter::position]; prefer [BufferWriter::to_bytes] elsewhere.
    pub fn storage(&self) -> &[u8] {
        &self.storage
    }

    /// Consumes the writer and returns the backing region without copying.
    pub fn into_storage(self) -> BytesMut {
        self.storage
    }

    /// Restores the writer to empty for reuse without reallocating.
    ///
    /// The cursor returns to 0, bit access is deactivated, and the content is
    /// zeroed so that later bit writes merge into a clean region.
    pub fn reset(&mut self) {
        self.storage.fill(0);
        self.position = 0;
        self.mode = Mode::Byte;
    }

    // ---------- Helper Functions ----------

    /// Reserves `len` bytes at the byte cursor, advancing it, and returns the
    /// reserved region for writing.
    fn aligned(&mut self, len: usize) -> Result<&mut [u8], Error> {
        if let Mode::Bit { .. } = self.mode {
            return Err(Error::BitAccessActive);
        }
        let needed = self.position + len;
        if needed > self.storage.len() {
            return Err(Error::CapacityExceeded(needed, self.storage.len()));
        }
        let start = self.position;
        self.position = needed;
        Ok(&mut self.storage[start..needed])
    }
}

impl Default for BufferWriter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
