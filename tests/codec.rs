use dsp_loader::{BitCursor, Endian, FieldSign, Rvalue};

/// Assembles a window the way the codec defines it, so the tests can reason
/// about bits outside the field without going through the codec itself.
fn assemble(window: &[u8], endian: Endian) -> u64 {
    match endian {
        Endian::Little => window
            .iter()
            .enumerate()
            .fold(0u64, |acc, (i, b)| acc | (*b as u64) << (8 * i)),
        Endian::Big => window.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64),
    }
}

fn signed_bounds(size: u16) -> (i64, i64) {
    let half = 1i64 << (size - 1);
    (-half, half - 1)
}

#[test]
fn round_trip_unsigned_all_widths_and_offsets() {
    for endian in [Endian::Little, Endian::Big] {
        for size in 1..=32u16 {
            for offset in 0..8u16 {
                let max = if size == 32 {
                    u32::MAX as u64
                } else {
                    (1u64 << size) - 1
                };
                for value in [0u64, 1, max / 2, max] {
                    let value = value as u32 as Rvalue;
                    let mut window = [0u8; 8];
                    let mut cursor = BitCursor::new(&mut window, endian);
                    cursor
                        .repack(value, size, offset, FieldSign::Unsigned)
                        .unwrap_or_else(|e| panic!("w={size} o={offset}: {e}"));
                    assert_eq!(
                        cursor.unpack(size, offset, FieldSign::Unsigned),
                        value,
                        "w={size} o={offset} {endian:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn round_trip_signed_all_widths_and_offsets() {
    for endian in [Endian::Little, Endian::Big] {
        for size in 1..=32u16 {
            for offset in 0..8u16 {
                let (min, max) = signed_bounds(size);
                for value in [min, -1, 0, max] {
                    let value = value as Rvalue;
                    let mut window = [0u8; 8];
                    let mut cursor = BitCursor::new(&mut window, endian);
                    cursor
                        .repack(value, size, offset, FieldSign::Signed)
                        .unwrap_or_else(|e| panic!("w={size} o={offset}: {e}"));
                    assert_eq!(
                        cursor.unpack(size, offset, FieldSign::Signed),
                        value,
                        "w={size} o={offset} {endian:?}"
                    );
                }
            }
        }
    }
}

#[test]
fn non_field_bits_preserved() {
    for endian in [Endian::Little, Endian::Big] {
        for size in [1u16, 5, 8, 13, 24, 32] {
            for offset in [0u16, 3, 7] {
                let mut window = [0xa5u8; 8];
                let before = assemble(&window, endian);
                let mut cursor = BitCursor::new(&mut window, endian);
                let _ = cursor.repack(-1, size, offset, FieldSign::Signed);
                let after = assemble(&window, endian);
                let field_mask = if size >= 64 {
                    u64::MAX
                } else {
                    ((1u64 << size) - 1) << offset
                };
                assert_eq!(
                    before & !field_mask,
                    after & !field_mask,
                    "w={size} o={offset} {endian:?}"
                );
                assert_eq!(after & field_mask, field_mask);
            }
        }
    }
}

#[test]
fn unsigned_overflow_boundary() {
    for size in [1u16, 7, 8, 15, 16, 31] {
        let max = (1i64 << size) - 1;
        let mut window = [0u8; 8];
        let mut cursor = BitCursor::new(&mut window, Endian::Little);
        assert!(cursor.repack(max as Rvalue, size, 0, FieldSign::Unsigned).is_ok());
        let overflow = cursor
            .repack((max + 1) as Rvalue, size, 0, FieldSign::Unsigned)
            .unwrap_err();
        assert_eq!(overflow.size, size);
        assert!(cursor.repack(-1, size, 0, FieldSign::Unsigned).is_err());
    }
}

#[test]
fn signed_overflow_boundary() {
    for size in [2u16, 8, 16, 24] {
        let half = 1i64 << (size - 1);
        let mut window = [0u8; 8];
        let mut cursor = BitCursor::new(&mut window, Endian::Little);
        assert!(cursor.repack((half - 1) as Rvalue, size, 0, FieldSign::Signed).is_ok());
        assert!(cursor.repack((-half) as Rvalue, size, 0, FieldSign::Signed).is_ok());
        assert!(cursor.repack(half as Rvalue, size, 0, FieldSign::Signed).is_err());
        assert!(cursor.repack((-half - 1) as Rvalue, size, 0, FieldSign::Signed).is_err());
    }
}

#[test]
fn tolerance_classes_grant_graduated_headroom() {
    // One extra magnitude bit for the first class, two for the second.
    for (sign, extra) in [(FieldSign::SignedTol1, 1u16), (FieldSign::SignedTol2, 2u16)] {
        for size in [8u16, 16] {
            let bound = 1i64 << (size - 1 + extra);
            let mut window = [0u8; 8];
            let mut cursor = BitCursor::new(&mut window, Endian::Little);
            assert!(cursor.repack((bound - 1) as Rvalue, size, 0, sign).is_ok());
            assert!(cursor.repack((-bound) as Rvalue, size, 0, sign).is_ok());
            assert!(cursor.repack(bound as Rvalue, size, 0, sign).is_err());
            assert!(cursor.repack((-bound - 1) as Rvalue, size, 0, sign).is_err());
        }
    }
}

#[test]
fn tolerance_accepts_full_unsigned_range_of_field() {
    // A 16 bit field with one extra bit of headroom holds both 0xffff and
    // -0x8000, which is what the split-constant relocations rely on.
    let mut window = [0u8; 8];
    let mut cursor = BitCursor::new(&mut window, Endian::Little);
    assert!(cursor.repack(0xffff, 16, 0, FieldSign::SignedTol1).is_ok());
    assert!(cursor.repack(-0x8000, 16, 0, FieldSign::SignedTol1).is_ok());
    assert!(cursor.repack(0x10000, 16, 0, FieldSign::SignedTol1).is_err());
}

#[test]
fn overflow_still_writes_clipped_bits() {
    let mut window = [0u8; 4];
    let mut cursor = BitCursor::new(&mut window, Endian::Little);
    let err = cursor
        .repack(0x1234_5678, 16, 0, FieldSign::Unsigned)
        .unwrap_err();
    assert_eq!(err.value, 0x1234_5678);
    assert_eq!(cursor.unpack(16, 0, FieldSign::Unsigned), 0x5678);
}

#[test]
fn endianness_symmetry_multi_unit() {
    let value = 0x12_3456 as Rvalue;
    for endian in [Endian::Little, Endian::Big] {
        let mut window = [0u8; 4];
        let mut cursor = BitCursor::new(&mut window, endian);
        cursor.repack(value, 24, 4, FieldSign::Unsigned).unwrap();
        assert_eq!(cursor.unpack(24, 4, FieldSign::Unsigned), value);
    }
    // Flipping the byte order on read without flipping it on write must
    // produce a different value for a multi-unit field.
    let mut window = [0u8; 4];
    let mut writer = BitCursor::new(&mut window, Endian::Big);
    writer.repack(value, 24, 4, FieldSign::Unsigned).unwrap();
    let mut copy = window;
    let reader = BitCursor::new(&mut copy, Endian::Little);
    assert_ne!(reader.unpack(24, 4, FieldSign::Unsigned), value);
}

#[test]
fn big_endian_window_walks_descending_significance() {
    // 16 bit field at bit offset 0 of a 4 byte big-endian word lives in the
    // two highest-addressed bytes.
    let mut window = [0u8; 4];
    let mut cursor = BitCursor::new(&mut window, Endian::Big);
    cursor.repack(0x1234, 16, 0, FieldSign::Unsigned).unwrap();
    assert_eq!(window, [0x00, 0x00, 0x12, 0x34]);

    let mut window = [0u8; 4];
    let mut cursor = BitCursor::new(&mut window, Endian::Little);
    cursor.repack(0x1234, 16, 0, FieldSign::Unsigned).unwrap();
    assert_eq!(window, [0x34, 0x12, 0x00, 0x00]);
}
