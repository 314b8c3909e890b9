use std::collections::HashMap;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::codec::buffer::{DecodeCursor, EncodedBuffer};
use crate::codec::shape::{classify, inspect, inspect_with, unsupported, Category, Field, IntShape, Kind, Shape};
use crate::codec::{decode, decode_prefix, decode_with, encode, encode_with, must_decode, must_encode};
use crate::config::Config;
use crate::error::Error;
use crate::test::{init_logging, SampleValues};

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Pair {
  a: u8,
  b: u16,
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Account {
  owner: [u8; 32],
  lamports: u64,
  delta: i64,
  label: String,
  data: Vec<u8>,
  executable: bool,
  rent_epoch: Option<u64>,
  memo: Option<String>,
  seeds: Vec<Vec<u8>>,
}

fn sample_account(sample: &mut SampleValues, size: usize) -> Account {
  Account {
    owner: sample.next_key(),
    lamports: sample.next_u64(),
    delta: sample.next_i64(),
    label: sample.next_text(size),
    data: sample.next_bytes(size * 3),
    executable: sample.next_bool(),
    rent_epoch: sample.next_option(|s| s.next_u64()),
    memo: sample.next_option(|s| s.next_text(size / 2)),
    seeds: (0..size % 5).map(|i| sample.next_bytes(i * 7)).collect(),
  }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Node {
  value: u8,
  next: Option<Box<Node>>,
}

fn chain(length: usize) -> Node {
  let mut node = Node { value: 0, next: None };
  for i in 1..length {
    node = Node { value: i as u8, next: Some(Box::new(node)) };
  }
  node
}

#[test]
fn test_encode_concrete_layouts() {
  init_logging();

  assert_eq!(encode(&true).unwrap(), vec![0x01]);
  assert_eq!(encode(&false).unwrap(), vec![0x00]);
  assert_eq!(hex::encode(encode(&300u16).unwrap()), "2c01");
  assert_eq!(hex::encode(encode("hi").unwrap()), "02000000000000006869");
  assert_eq!(encode(&Vec::<u32>::new()).unwrap(), vec![0u8; 8]);
  assert_eq!(encode(&Pair { a: 1, b: 2 }).unwrap(), vec![0x01, 0x02, 0x00]);

  // 整数はすべてビット幅と同じバイト数のリトルエンディアン
  assert_eq!(hex::encode(encode(&-2i8).unwrap()), "fe");
  assert_eq!(hex::encode(encode(&-2i16).unwrap()), "feff");
  assert_eq!(hex::encode(encode(&0x01020304u32).unwrap()), "04030201");
  assert_eq!(hex::encode(encode(&-1i32).unwrap()), "ffffffff");
  assert_eq!(hex::encode(encode(&0x0102030405060708u64).unwrap()), "0807060504030201");
  assert_eq!(hex::encode(encode(&i64::MIN).unwrap()), "0000000000000080");
}

#[test]
fn test_encode_containers() {
  // 固定長配列は長さ接頭辞を持たない
  assert_eq!(encode(&[0xABu8; 4]).unwrap(), vec![0xAB; 4]);

  // シーケンスは要素数の後に各要素が区切りなしで続く
  assert_eq!(hex::encode(encode(&vec![1u16, 2]).unwrap()), "020000000000000001000200");

  // 空文字列の Option は存在フラグと長さ 0 の接頭辞になる
  assert_eq!(hex::encode(encode(&Some(String::new())).unwrap()), "010000000000000000");
  assert_eq!(encode(&None::<String>).unwrap(), vec![0x00]);

  // タプル、ニュータイプ、ユニットはフィールドを連結するだけ
  assert_eq!(hex::encode(encode(&(1u8, true, 3u32)).unwrap()), "010103000000");
  #[derive(Serialize)]
  struct Lamports(u64);
  assert_eq!(hex::encode(encode(&Lamports(5)).unwrap()), "0500000000000000");
  assert!(encode(&()).unwrap().is_empty());
}

#[test]
fn test_roundtrip_random_records() {
  init_logging();
  let mut sample = SampleValues::new(3095720345123u64);
  for size in 0..32 {
    let account = sample_account(&mut sample, size);
    let bytes = encode(&account).unwrap();
    assert_eq!(account, decode::<Account>(&bytes).unwrap());

    // 同じ値からは常に同じバイト列が得られる
    assert_eq!(bytes, encode(&account).unwrap());
  }
}

#[test]
fn test_truncated_records() {
  let mut sample = SampleValues::new(8734018732u64);
  for size in 0..32 {
    let account = sample_account(&mut sample, size);
    let bytes = encode(&account).unwrap();
    match decode::<Account>(&bytes[..bytes.len() - 1]) {
      Err(Error::TruncatedInput { .. }) => (),
      unexpected => panic!("unexpected result for size {}: {:?}", size, unexpected),
    }
  }

  // 固定長フィールドの途中で終わる
  assert_eq!(decode::<u32>(&[1, 2, 3]), Err(Error::TruncatedInput { required: 4, remaining: 3 }));
  assert_eq!(decode::<bool>(&[]), Err(Error::TruncatedInput { required: 1, remaining: 0 }));
  assert_eq!(decode::<[u8; 4]>(&[1, 2, 3]), Err(Error::TruncatedInput { required: 1, remaining: 0 }));

  // 宣言された長さが入力全体には収まるが残りのバイトが足りない
  let bytes = [5u8, 0, 0, 0, 0, 0, 0, 0, b'a', b'b'];
  assert_eq!(decode::<String>(&bytes), Err(Error::TruncatedInput { required: 5, remaining: 2 }));
  assert!(matches!(decode::<Vec<u8>>(&bytes), Err(Error::TruncatedInput { .. })));
}

#[test]
fn test_sequence_length_overflow() {
  let mut bytes = vec![0xFFu8; 8];
  bytes.extend_from_slice(&[1, 2, 3, 4]);
  let overflow = || Error::SequenceLengthOverflow { declared: u64::MAX, available: 12 };
  assert_eq!(decode::<Vec<u8>>(&bytes), Err(overflow()));
  assert_eq!(decode::<String>(&bytes), Err(overflow()));

  let bytes = [13u8, 0, 0, 0, 0, 0, 0, 0, 1, 2, 3, 4];
  assert_eq!(decode::<Vec<u32>>(&bytes), Err(Error::SequenceLengthOverflow { declared: 13, available: 12 }));
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Marker;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Tagged {
  marker: Marker,
  value: u8,
}

#[test]
fn test_zero_width_elements() {
  let zero_width = || Error::UnsupportedType { kind: "sequence of zero-width elements".to_string() };

  // 要素数を入力長と照合できないため、エンコード、デコード、構造の検査のいずれでも拒否する
  assert_eq!(encode(&vec![(); 9]), Err(zero_width()));
  assert_eq!(encode(&vec![Marker, Marker]), Err(zero_width()));
  assert_eq!(inspect::<Vec<()>>(), Err(zero_width()));
  assert_eq!(inspect::<Vec<Marker>>(), Err(zero_width()));
  assert_eq!(decode::<Vec<()>>(&[1, 0, 0, 0, 0, 0, 0, 0]), Err(zero_width()));

  // 空のシーケンスと、幅を持つ値の一部としての unit は扱える
  let empty: Vec<()> = Vec::new();
  assert_eq!(decode::<Vec<()>>(&encode(&empty).unwrap()).unwrap(), empty);
  let tagged = vec![Tagged { marker: Marker, value: 1 }, Tagged { marker: Marker, value: 2 }];
  let bytes = encode(&tagged).unwrap();
  assert_eq!(bytes, vec![2, 0, 0, 0, 0, 0, 0, 0, 1, 2]);
  assert_eq!(decode::<Vec<Tagged>>(&bytes).unwrap(), tagged);
  assert_eq!(inspect::<Vec<Tagged>>().unwrap().min_width(), 8);
  assert_eq!(encode(&(Marker, 5u8)).unwrap(), vec![5]);
}

/// 要素数の申告と実際の要素が食い違う手書きの `Serialize` 実装。
struct Misreported {
  declared: Option<usize>,
  values: Vec<u8>,
}

impl Serialize for Misreported {
  fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    use serde::ser::SerializeSeq;
    let mut seq = serializer.serialize_seq(self.declared)?;
    for value in self.values.iter() {
      seq.serialize_element(value)?;
    }
    seq.end()
  }
}

#[test]
fn test_sequence_count_mismatch() {
  let mismatch = |declared: usize, written: usize| Error::UnsupportedType {
    kind: format!("sequence declared {} elements but wrote {}", declared, written),
  };
  assert_eq!(encode(&Misreported { declared: Some(3), values: vec![1, 2] }), Err(mismatch(3, 2)));
  assert_eq!(encode(&Misreported { declared: Some(1), values: vec![1, 2] }), Err(mismatch(1, 2)));
  assert_eq!(encode(&Misreported { declared: None, values: vec![1, 2] }).err(), classify(Kind::UnsizedSeq).err());

  let bytes = encode(&Misreported { declared: Some(2), values: vec![1, 2] }).unwrap();
  assert_eq!(decode::<Vec<u8>>(&bytes).unwrap(), vec![1, 2]);
}

#[test]
fn test_unsupported_kinds_follow_classify() {
  let rejected = |kind: Kind| classify(kind).err();
  assert_eq!(encode(&1.5f32).err(), rejected(Kind::F32));
  assert_eq!(encode(&1i128).err(), rejected(Kind::I128));
  assert_eq!(encode(&vec![(); 1]).err(), rejected(Kind::ZeroWidthSeq));
  assert_eq!(decode::<char>(&[0x41, 0, 0, 0]).err(), rejected(Kind::Char));
  assert_eq!(decode::<HashMap<u8, u8>>(&[0u8; 8]).err(), rejected(Kind::Map));
  assert_eq!(inspect::<f64>().err(), rejected(Kind::F64));
  assert_eq!(inspect::<u128>().err(), rejected(Kind::U128));

  // 分類できる種別を拒否した場合もその旨を UnsupportedType で返す
  assert_eq!(unsupported::<()>(Kind::Bool), Err(Error::UnsupportedType { kind: "bool as Boolean".to_string() }));
}

#[test]
fn test_empty_and_optional_roundtrip() {
  assert_eq!(decode::<String>(&encode("").unwrap()).unwrap(), "");
  assert_eq!(decode::<Vec<u64>>(&encode(&Vec::<u64>::new()).unwrap()).unwrap(), Vec::<u64>::new());

  for value in vec![None, Some(String::new()), Some("memo".to_string())] {
    assert_eq!(decode::<Option<String>>(&encode(&value).unwrap()).unwrap(), value);
  }
  for value in vec![None, Some(None), Some(Some(7u8))] {
    assert_eq!(decode::<Option<Option<u8>>>(&encode(&value).unwrap()).unwrap(), value);
  }
}

#[test]
fn test_lenient_flags() {
  // 0 以外はすべて true / 存在として扱う
  assert_eq!(decode::<bool>(&[0x02]).unwrap(), true);
  assert_eq!(decode::<Option<u8>>(&[0x7F, 0x09]).unwrap(), Some(9));
}

#[test]
fn test_decode_borrows_input() {
  #[derive(Deserialize)]
  struct Named<'a> {
    name: &'a str,
    bytes: &'a [u8],
    tail: u8,
  }
  #[derive(Serialize)]
  struct Owned {
    name: String,
    bytes: Vec<u8>,
    tail: u8,
  }
  let bytes = encode(&Owned { name: "validator".to_string(), bytes: vec![9, 8, 7], tail: 0x42 }).unwrap();
  let named: Named = decode(&bytes).unwrap();
  assert_eq!(named.name, "validator");
  assert_eq!(named.name.as_ptr(), bytes[8..].as_ptr());
  assert_eq!(named.bytes, &[9, 8, 7]);
  assert_eq!(named.tail, 0x42);
}

#[test]
fn test_variable_length_field_inside_record() {
  #[derive(Debug, PartialEq, Serialize, Deserialize)]
  struct Seeded {
    tag: u32,
    seed: String,
    amount: u64,
  }
  let value = Seeded { tag: 3, seed: "seed-あ".to_string(), amount: 1_000_000 };
  let bytes = encode(&value).unwrap();
  assert_eq!(bytes.len(), 4 + 8 + value.seed.len() + 8);
  assert_eq!(&bytes[12..12 + value.seed.len()], value.seed.as_bytes());
  assert_eq!(decode::<Seeded>(&bytes).unwrap(), value);
}

#[test]
fn test_invalid_text() {
  let bytes = [2u8, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFE];
  assert_eq!(decode::<String>(&bytes), Err(Error::InvalidText { position: 8 }));
  // バイト列としては読み出せる
  assert_eq!(decode::<Vec<u8>>(&bytes).unwrap(), vec![0xFF, 0xFE]);
}

#[test]
fn test_unsupported_types() {
  #[derive(Serialize, Deserialize)]
  enum Side {
    Buy,
    Sell,
  }
  let unsupported = |kind: &str| Error::UnsupportedType { kind: kind.to_string() };

  let mut map = HashMap::new();
  map.insert(1u8, 2u8);
  assert_eq!(encode(&map), Err(unsupported("map")));
  assert_eq!(encode(&Side::Sell), Err(unsupported("enum")));
  assert_eq!(encode(&1.5f64), Err(unsupported("f64")));
  assert_eq!(encode(&'x'), Err(unsupported("char")));
  assert_eq!(encode(&1u128), Err(unsupported("u128")));

  let bytes = [0u8; 32];
  assert_eq!(decode::<HashMap<u8, u8>>(&bytes).err(), Some(unsupported("map")));
  assert_eq!(decode::<Side>(&bytes).err(), Some(unsupported("enum")));
  assert_eq!(decode::<f32>(&bytes).err(), Some(unsupported("f32")));
  assert_eq!(decode::<i128>(&bytes).err(), Some(unsupported("i128")));

  // スキップされたフィールドはワイヤ上の位置が失われるため拒否する
  #[derive(Serialize)]
  struct Sparse {
    #[serde(skip_serializing_if = "Option::is_none")]
    memo: Option<u8>,
  }
  assert!(matches!(encode(&Sparse { memo: None }), Err(Error::UnsupportedType { .. })));
  assert_eq!(encode(&Sparse { memo: Some(1) }).unwrap(), vec![0x01, 0x01]);
}

#[test]
fn test_target_not_writable() {
  // 目的の型がデコードした値を受け付けない
  assert!(matches!(decode::<NonZeroU32>(&[0, 0, 0, 0]), Err(Error::TargetNotWritable { .. })));
  assert_eq!(decode::<NonZeroU32>(&[1, 0, 0, 0]).unwrap().get(), 1);
}

#[test]
fn test_depth_limit() {
  let config = Config::new().with_max_depth(2);
  let nested = vec![vec![Vec::<u8>::new()]];
  assert_eq!(encode_with(&nested, &config), Err(Error::DepthLimitExceeded { limit: 2 }));

  let bytes = encode(&nested).unwrap();
  assert_eq!(decode_with::<Vec<Vec<Vec<u8>>>>(&bytes, &config), Err(Error::DepthLimitExceeded { limit: 2 }));
  assert_eq!(decode_with::<Vec<Vec<Vec<u8>>>>(&bytes, &Config::new().with_max_depth(3)).unwrap(), nested);

  // 深い連結リストもデフォルトの上限で止まる
  assert!(matches!(encode(&chain(100)), Err(Error::DepthLimitExceeded { .. })));
  let shallow = encode(&chain(10)).unwrap();
  assert_eq!(decode::<Node>(&shallow).unwrap().value, 9);
}

#[test]
fn test_trailing_bytes() {
  let bytes = encode(&Pair { a: 12, b: 0xBEEF }).unwrap();

  // 長いメッセージから先頭のフィールドだけを読み出せる
  assert_eq!(decode::<u8>(&bytes).unwrap(), 12);
  assert_eq!(decode_prefix::<u8>(&bytes).unwrap(), (12, 1));
  assert_eq!(decode_prefix::<Pair>(&bytes).unwrap(), (Pair { a: 12, b: 0xBEEF }, 3));

  let strict = Config::new().reject_trailing_bytes();
  assert_eq!(decode_with::<u8>(&bytes, &strict), Err(Error::TrailingBytes { count: 2 }));
  assert_eq!(decode_with::<Pair>(&bytes, &strict).unwrap(), Pair { a: 12, b: 0xBEEF });
  assert!(strict.allow_trailing_bytes().trailing_bytes_allowed());
}

#[test]
fn test_must_variants() {
  let bytes = must_encode(&Pair { a: 1, b: 2 });
  assert_eq!(must_decode::<Pair>(&bytes), Pair { a: 1, b: 2 });
}

#[test]
#[should_panic(expected = "failed to encode value")]
fn test_must_encode_panics() {
  must_encode(&1.0f32);
}

#[test]
#[should_panic(expected = "failed to decode value")]
fn test_must_decode_panics() {
  must_decode::<u64>(&[1, 2, 3]);
}

#[test]
fn test_inspect_shapes() {
  assert_eq!(inspect::<bool>().unwrap(), Shape::Bool);
  assert_eq!(inspect::<i16>().unwrap(), Shape::Integer(IntShape::I16));
  assert_eq!(inspect::<[u8; 32]>().unwrap(), Shape::FixedBytes(32));
  assert_eq!(inspect::<String>().unwrap(), Shape::Text);
  assert_eq!(inspect::<Vec<u32>>().unwrap(), Shape::Sequence(Box::new(Shape::Integer(IntShape::U32))));
  assert_eq!(inspect::<Option<u8>>().unwrap(), Shape::Optional(Box::new(Shape::Integer(IntShape::U8))));
  assert_eq!(
    inspect::<Pair>().unwrap(),
    Shape::Record(vec![
      Field { name: Some("a"), shape: Shape::Integer(IntShape::U8) },
      Field { name: Some("b"), shape: Shape::Integer(IntShape::U16) },
    ])
  );
  assert_eq!(
    inspect::<(u8, [u16; 2])>().unwrap(),
    Shape::Record(vec![
      Field { name: None, shape: Shape::Integer(IntShape::U8) },
      Field {
        name: None,
        shape: Shape::Record(vec![
          Field { name: None, shape: Shape::Integer(IntShape::U16) },
          Field { name: None, shape: Shape::Integer(IntShape::U16) },
        ]),
      },
    ])
  );
  assert_eq!(inspect::<()>().unwrap(), Shape::Record(Vec::new()));

  assert_eq!(inspect::<HashMap<u8, u8>>(), Err(Error::UnsupportedType { kind: "map".to_string() }));
  assert_eq!(inspect::<f64>(), Err(Error::UnsupportedType { kind: "f64".to_string() }));

  // 自己再帰する型は Option の存在側を辿り続けるため構造を決められないが、値のエンコードとデコードはできる
  assert_eq!(inspect::<Node>(), Err(Error::DepthLimitExceeded { limit: 128 }));
  assert_eq!(decode::<Node>(&encode(&chain(3)).unwrap()).unwrap(), chain(3));

  let shallow = Config::new().with_max_depth(1);
  assert_eq!(inspect_with::<Vec<Vec<u8>>>(&shallow), Err(Error::DepthLimitExceeded { limit: 1 }));
}

#[test]
fn test_shape_widths() {
  assert_eq!(inspect::<Pair>().unwrap().fixed_width(), Some(3));
  assert_eq!(inspect::<([u8; 32], u64, bool)>().unwrap().fixed_width(), Some(41));

  let account = inspect::<Account>().unwrap();
  assert_eq!(account.category(), Category::Record);
  assert!(!account.is_fixed_width());
  // owner + lamports + delta + label + data + executable + rent_epoch + memo + seeds
  assert_eq!(account.min_width(), 32 + 8 + 8 + 8 + 8 + 1 + 1 + 1 + 8);

  // 固定長の型はエンコード結果の長さと一致する
  let width = inspect::<Pair>().unwrap().fixed_width().unwrap();
  assert_eq!(encode(&Pair { a: 0xFF, b: 0xFFFF }).unwrap().len(), width);
}

#[test]
fn test_classify() {
  assert_eq!(classify(Kind::Bool), Ok(Category::Boolean));
  assert_eq!(classify(Kind::U64), Ok(Category::Integer));
  assert_eq!(classify(Kind::Bytes), Ok(Category::Sequence));
  assert_eq!(classify(Kind::Str), Ok(Category::Text));
  assert_eq!(classify(Kind::Option), Ok(Category::Optional));
  assert_eq!(classify(Kind::NewtypeStruct), Ok(Category::Record));
  for kind in [Kind::Map, Kind::Enum, Kind::F32, Kind::Char, Kind::Any, Kind::UnsizedSeq, Kind::ZeroWidthSeq].iter() {
    assert_eq!(classify(*kind), Err(Error::UnsupportedType { kind: kind.to_string() }));
  }
}

#[test]
fn test_buffer_and_cursor() {
  let mut buffer = EncodedBuffer::with_capacity(16);
  assert!(buffer.is_empty());
  buffer.write_u8(0x01);
  buffer.write_i16(-2);
  buffer.write_len(3);
  buffer.write(b"abc");
  assert_eq!(buffer.len(), 1 + 2 + 8 + 3);
  let bytes = buffer.finish();

  let mut cursor = DecodeCursor::new(&bytes);
  assert_eq!(cursor.len(), bytes.len());
  assert_eq!(cursor.read_u8().unwrap(), 0x01);
  assert_eq!(cursor.peek(2).unwrap(), &[0xFE, 0xFF]);
  assert_eq!(cursor.position(), 1);
  assert_eq!(cursor.read_i16().unwrap(), -2);
  let length = cursor.read_len().unwrap();
  assert_eq!(length, 3);

  // 残りより多くを要求した場合は位置を変えずに失敗する
  assert_eq!(cursor.consume(4), Err(Error::TruncatedInput { required: 4, remaining: 3 }));
  assert_eq!(cursor.position(), 11);
  assert_eq!(cursor.consume(length).unwrap(), b"abc");
  assert_eq!(cursor.remaining(), 0);
}
