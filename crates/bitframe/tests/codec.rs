use bitframe::{
    CompileError, FieldError, Schema, Unit, Value,
    checksum::ChecksumAlgorithm,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn unsigned_schema(widths: &[usize]) -> Schema {
    widths
        .iter()
        .enumerate()
        .fold(Schema::builder(), |b, (i, &w)| b.unsigned(&format!("f{i}"), w, ""))
        .build()
        .unwrap()
}

fn signed_schema(widths: &[usize]) -> Schema {
    widths
        .iter()
        .enumerate()
        .fold(Schema::builder(), |b, (i, &w)| b.signed(&format!("f{i}"), w, ""))
        .build()
        .unwrap()
}

fn named<V: Into<Value> + Copy>(values: &[V]) -> Vec<(String, Value)> {
    values
        .iter()
        .enumerate()
        .map(|(i, &v)| (format!("f{i}"), v.into()))
        .collect()
}

fn length_prefixed() -> Schema {
    Schema::builder()
        .unsigned("field1", 8, "")
        .unsigned("len", 4, "")
        .unsigned("field3", 4, "")
        .variable_with_length("text", "len", Unit::Byte, "")
        .build()
        .unwrap()
}

#[test]
fn test_unsigned_bit_packing() {
    let schema = unsigned_schema(&[5, 3, 6, 4, 11, 2]);
    let message = schema
        .new_instance(named(&[
            0b11010u64,
            0b001,
            0b101010,
            0b1011,
            0b11101010001,
            0b11,
        ]))
        .unwrap();

    assert_eq!(
        message.serialize(),
        vec![0b11010001, 0b10101010, 0b11111010, 0b10001110]
    );
}

#[test]
fn test_signed_twos_complement() {
    let schema = signed_schema(&[8, 4, 4]);
    let message = schema.new_instance(named(&[-10i64, -4, -7])).unwrap();
    let bytes = message.serialize();
    assert_eq!(bytes, vec![0b11110110, 0b11001001]);

    let (decoded, rest) = schema.decode_one(&bytes);
    assert_eq!(decoded.unwrap(), message);
    assert!(rest.is_empty());
}

#[test]
fn test_variable_with_length_ref() {
    let schema = length_prefixed();
    let message = schema
        .new_instance([
            ("field1", Value::from(0x77)),
            ("len", Value::from(3)),
            ("field3", Value::from(0x0F)),
            ("text", Value::from("abc")),
        ])
        .unwrap();

    assert_eq!(message.serialize(), vec![0x77, 0x3F, 0x61, 0x62, 0x63]);
}

#[test]
fn test_variable_shorter_than_length_ref_is_padded() {
    let schema = length_prefixed();
    let message = schema
        .new_instance([
            ("field1", Value::from(0x77)),
            ("len", Value::from(4)),
            ("field3", Value::from(0x0F)),
            ("text", Value::from("abc")),
        ])
        .unwrap();

    let bytes = message.serialize();
    assert_eq!(bytes, vec![0x77, 0x4F, 0x61, 0x62, 0x63, 0x00]);

    let (decoded, rest) = schema.decode_one(&bytes);
    assert_eq!(decoded.unwrap().get("text"), Some(&Value::from(b"abc\0")));
    assert!(rest.is_empty());

    // Without the padding byte the message is incomplete.
    assert!(!schema.is_valid(&bytes[..5]));
}

#[test]
fn test_variable_unaligned() {
    let schema = Schema::builder()
        .unsigned("len", 4, "")
        .variable_with_length("text", "len", Unit::Byte, "")
        .unsigned("tail", 4, "")
        .build()
        .unwrap();
    let message = schema
        .new_instance([
            ("len", Value::from(2)),
            ("text", Value::from("A")),
            ("tail", Value::from(0xF)),
        ])
        .unwrap();

    let bytes = message.serialize();
    assert_eq!(bytes, vec![0x24, 0x10, 0x0F]);
    assert_eq!(schema.decode_one(&bytes).0.unwrap().get("text"), Some(&Value::from(b"A\0")));
}

#[test]
fn test_validation_rejection() {
    let schema = Schema::builder()
        .unsigned("byte", 8, "")
        .unsigned("word", 16, "")
        .build()
        .unwrap();

    assert!(matches!(
        schema.new_instance([("byte", 257)]),
        Err(FieldError::InvalidValue(_))
    ));

    let mut message = schema.default_instance();
    assert!(matches!(
        message.set("word", 0x44122),
        Err(FieldError::InvalidValue(_))
    ));
    assert_eq!(message.get("word"), Some(&Value::U64(0)));
}

#[test]
fn test_framing_and_truncation() {
    let schema = unsigned_schema(&[8, 4, 1, 16, 3]);
    let messages: Vec<_> = (0..5u64)
        .map(|i| {
            schema
                .new_instance(named(&[i, i % 16, i % 2, i * 1000, i % 8]))
                .unwrap()
        })
        .collect();
    let stream: Vec<u8> = messages.iter().flat_map(|m| m.serialize()).collect();
    assert_eq!(stream.len(), 5 * 4);

    let (decoded, rest) = schema.decode_many(&stream);
    assert_eq!(decoded, messages);
    assert!(rest.is_empty());

    let truncated = &stream[..stream.len() - 2];
    let (decoded, rest) = schema.decode_many(truncated);
    assert_eq!(decoded.len(), 4);
    assert_eq!(rest, &stream[16..18]);
}

#[test]
fn test_is_valid_on_empty_buffer() {
    assert!(!unsigned_schema(&[1]).is_valid(&[]));
    assert!(!length_prefixed().is_valid(&[]));
}

fn checksummed() -> Schema {
    Schema::builder()
        .unsigned("id", 8, "")
        .unsigned("len", 8, "")
        .variable_with_length("data", "len", Unit::Byte, "")
        .unsigned("checksum", 8, "")
        .checksum_algorithm("checksum", ChecksumAlgorithm::Sum)
        .build()
        .unwrap()
}

#[test]
fn test_checksum_corruption_detected() {
    let schema = checksummed();
    let message = schema
        .new_instance([
            ("id", Value::from(0x10)),
            ("len", Value::from(3)),
            ("data", Value::from("xyz")),
        ])
        .unwrap();
    let bytes = message.serialize();
    assert!(schema.is_valid(&bytes));

    for i in [0, 2, 3, 4] {
        let mut corrupted = bytes.clone();
        corrupted[i] ^= 0x01;
        assert!(!schema.is_valid(&corrupted), "byte {i} corruption accepted");
    }
}

const BOUNDARY_WIDTHS: [usize; 6] = [1, 7, 8, 9, 63, 64];

fn assert_round_trip(schema: &Schema, value: Value) {
    let message = schema.new_instance([("f0", value.clone())]).unwrap();
    let bytes = message.serialize();
    let (decoded, rest) = schema.decode_one(&bytes);
    assert_eq!(decoded.as_ref().and_then(|m| m.get("f0")), message.get("f0"), "{value:?}");
    assert!(rest.is_empty());
}

#[test]
fn test_unsigned_range_edges() {
    for width in BOUNDARY_WIDTHS {
        let schema = unsigned_schema(&[width]);
        let max = if width == 64 { u64::MAX } else { (1 << width) - 1 };

        for value in [0, max, max / 3] {
            assert_round_trip(&schema, Value::U64(value));
        }
        if width < 64 {
            assert!(schema.new_instance([("f0", max + 1)]).is_err(), "width {width}");
        }
        assert!(schema.new_instance([("f0", -1i64)]).is_err(), "width {width}");
    }
}

#[test]
fn test_signed_range_edges() {
    for width in BOUNDARY_WIDTHS {
        let schema = signed_schema(&[width]);
        let min = (-(1i128 << (width - 1))) as i64;
        let max = ((1i128 << (width - 1)) - 1) as i64;

        for value in [min, max, 0, -1] {
            assert_round_trip(&schema, Value::I64(value));
        }
        if width < 64 {
            assert!(schema.new_instance([("f0", max + 1)]).is_err(), "width {width}");
            assert!(schema.new_instance([("f0", min - 1)]).is_err(), "width {width}");
        } else {
            assert!(schema.new_instance([("f0", 1u64 << 63)]).is_err());
        }
    }
}

#[test]
fn test_checksum_field_cannot_size_data() {
    let err = Schema::builder()
        .unsigned("crc", 8, "")
        .variable_with_length("data", "crc", Unit::Byte, "")
        .checksum_algorithm("crc", ChecksumAlgorithm::Sum)
        .build()
        .unwrap_err();
    assert!(matches!(err, CompileError::ChecksumUsedAsLength { .. }));
}

#[test]
fn test_fields_are_read_only_view() {
    let schema = length_prefixed();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["field1", "len", "field3", "text"]);
    assert_eq!(schema.fields()[1].kind().field_kind(), bitframe::FieldKind::Unsigned);
}

proptest! {
    #[test]
    fn prop_unsigned_round_trip(
        fields in prop::collection::vec((1usize..=64, any::<u64>()), 1..12)
    ) {
        let widths: Vec<usize> = fields.iter().map(|&(w, _)| w).collect();
        let values: Vec<u64> = fields
            .iter()
            .map(|&(w, v)| if w == 64 { v } else { v & ((1 << w) - 1) })
            .collect();

        let schema = unsigned_schema(&widths);
        let message = schema.new_instance(named(&values)).unwrap();
        let bytes = message.serialize();
        prop_assert_eq!(bytes.len(), widths.iter().sum::<usize>().div_ceil(8));

        let (decoded, rest) = schema.decode_one(&bytes);
        prop_assert_eq!(decoded, Some(message));
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn prop_signed_round_trip(
        fields in prop::collection::vec((1usize..=64, any::<i64>()), 1..12)
    ) {
        let widths: Vec<usize> = fields.iter().map(|&(w, _)| w).collect();
        // Fold each value into its field's range by sign-extending the low bits.
        let values: Vec<i64> = fields
            .iter()
            .map(|&(w, v)| (v << (64 - w)) >> (64 - w))
            .collect();

        let schema = signed_schema(&widths);
        let message = schema.new_instance(named(&values)).unwrap();
        let bytes = message.serialize();
    let (decoded, rest) = schema.decode_one(&bytes);
        prop_assert_eq!(decoded, Some(message));
        prop_assert!(rest.is_empty());
    }

    #[test]
    fn prop_checksummed_messages_are_valid(
        id in any::<u8>(),
        data in prop::collection::vec(any::<u8>(), 0..32),
    ) {
        let schema = checksummed();
        let message = schema
            .new_instance([
                ("id", Value::from(id)),
                ("len", Value::from(data.len() as u64)),
                ("data", Value::from(data)),
            ])
            .unwrap();

        prop_assert!(schema.is_valid(&message.serialize()));
    }

    #[test]
    fn prop_decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..64)) {
        let schema = checksummed();
        let (messages, rest) = schema.decode_many(&data);
        let consumed: usize = messages.iter().map(|m| m.serialize().len()).sum();
        prop_assert_eq!(consumed + rest.len(), data.len());
    }
}
