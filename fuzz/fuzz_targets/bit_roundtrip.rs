#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use packbuf::BufferWriter;

/// One bit-packed field: the width is folded into `1..=32`.
#[derive(Arbitrary, Debug)]
struct Field {
    width: u8,
    value: u32,
}

fuzz_target!(|fields: Vec<Field>| {
    let mut writer = BufferWriter::new(1024);
    writer.start_bit_access().unwrap();

    let mut written = Vec::new();
    for field in &fields {
        let width = usize::from(field.width % 32) + 1;
        if writer.write_bits(width, field.value).is_err() {
            // Capacity reached; everything written so far must still read back.
            break;
        }
        written.push((width, field.value));
    }
    writer.stop_bit_access().unwrap();

    // Read every field back, most significant bit first.
    let data = writer.storage();
    let mut cursor = 0usize;
    for (width, value) in written {
        let mut read = 0u32;
        for _ in 0..width {
            let bit = (data[cursor / 8] >> (7 - cursor % 8)) & 1;
            read = (read << 1) | u32::from(bit);
            cursor += 1;
        }
        let mask = ((1u64 << width) - 1) as u32;
        assert_eq!(read, value & mask, "field of {width} bits corrupted");
    }

    // Bits past the last field were never touched and must still be zero.
    let end = cursor.div_ceil(8);
    assert!(data[end..].iter().all(|&byte| byte == 0));
});
