use bundle2treemap::decode::{decode_vlq_segment, read_unsigned_varint, LineIndex};
use proptest::prelude::*;

fn leb128(mut value: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            bytes.push(byte);
            return bytes;
        }
        bytes.push(byte | 0x80);
    }
}

fn vlq(value: i64) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut rest = if value < 0 { (-value << 1) | 1 } else { value << 1 };
    let mut out = String::new();
    loop {
        let mut digit = rest & 0x1f;
        rest >>= 5;
        if rest > 0 {
            digit |= 0x20;
        }
        out.push(char::from(ALPHABET[digit as usize]));
        if rest == 0 {
            return out;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_varint_reads_what_leb128_writes(value in any::<u32>(), padding in 0usize..4) {
        let mut bytes = vec![0xff; padding];
        let encoded = leb128(value);
        bytes.extend(&encoded);
        bytes.push(0x42);

        let (decoded, next) = read_unsigned_varint(&bytes, padding).unwrap();
        prop_assert_eq!(decoded, value);
        prop_assert_eq!(next, padding + encoded.len());
    }

    #[test]
    fn prop_vlq_segments_decode_every_field(
        fields in prop::collection::vec(-1_000_000i64..1_000_000, 1..6),
    ) {
        let segment: String = fields.iter().map(|&f| vlq(f)).collect();
        prop_assert_eq!(decode_vlq_segment(&segment).unwrap(), fields);
    }

    #[test]
    fn prop_line_offsets_stay_in_bounds(
        text in "[a-z\n]{0,64}",
        line in 0usize..20,
        column in 0usize..80,
    ) {
        let index = LineIndex::new(text.as_bytes());
        prop_assert!(index.offset(line, column) <= text.len());
    }
}
