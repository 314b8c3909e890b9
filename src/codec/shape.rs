use std::fmt;

use serde::de::{self, DeserializeOwned, DeserializeSeed, Deserializer, SeqAccess, Visitor};

use crate::config::Config;
use crate::error::Error;
use crate::Result;

use super::buffer::LENGTH_PREFIX_SIZE;

/// serde のデータモデル上の種別です。エンコーダ、デコーダ、インスペクタのすべての入口がいずれかの `Kind` に対応し、
/// `category()` によってワイヤ上のカテゴリが決まります。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
  Bool,
  I8,
  I16,
  I32,
  I64,
  I128,
  U8,
  U16,
  U32,
  U64,
  U128,
  F32,
  F64,
  Char,
  Str,
  Bytes,
  Option,
  Unit,
  UnitStruct,
  NewtypeStruct,
  Seq,
  /// 要素数を事前に知らせないシーケンス。
  UnsizedSeq,
  /// 要素のエンコードが 0 バイトになるシーケンス。
  ZeroWidthSeq,
  Tuple,
  TupleStruct,
  Struct,
  Map,
  Enum,
  Any,
  Identifier,
  IgnoredAny,
}

/// ワイヤ上のエンコード規則を決めるカテゴリです。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
  Boolean,
  Integer,
  FixedBytes,
  Sequence,
  Text,
  Optional,
  Record,
}

impl Kind {
  /// この種別が対応するカテゴリを返します。どのカテゴリにも属さない種別は `None` です。
  pub fn category(self) -> Option<Category> {
    match self {
      Kind::Bool => Some(Category::Boolean),
      Kind::I8 | Kind::I16 | Kind::I32 | Kind::I64 | Kind::U8 | Kind::U16 | Kind::U32 | Kind::U64 => {
        Some(Category::Integer)
      }
      Kind::Str => Some(Category::Text),
      Kind::Bytes | Kind::Seq => Some(Category::Sequence),
      Kind::Option => Some(Category::Optional),
      // `[u8; N]` もタプルとして現れる。FixedBytes との区別は要素の構造による
      Kind::Unit | Kind::UnitStruct | Kind::NewtypeStruct | Kind::Tuple | Kind::TupleStruct | Kind::Struct => {
        Some(Category::Record)
      }
      Kind::I128
      | Kind::U128
      | Kind::F32
      | Kind::F64
      | Kind::Char
      | Kind::UnsizedSeq
      | Kind::ZeroWidthSeq
      | Kind::Map
      | Kind::Enum
      | Kind::Any
      | Kind::Identifier
      | Kind::IgnoredAny => None,
    }
  }
}

impl fmt::Display for Kind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      Kind::Bool => "bool",
      Kind::I8 => "i8",
      Kind::I16 => "i16",
      Kind::I32 => "i32",
      Kind::I64 => "i64",
      Kind::I128 => "i128",
      Kind::U8 => "u8",
      Kind::U16 => "u16",
      Kind::U32 => "u32",
      Kind::U64 => "u64",
      Kind::U128 => "u128",
      Kind::F32 => "f32",
      Kind::F64 => "f64",
      Kind::Char => "char",
      Kind::Str => "string",
      Kind::Bytes => "byte sequence",
      Kind::Option => "option",
      Kind::Unit => "unit",
      Kind::UnitStruct => "unit struct",
      Kind::NewtypeStruct => "newtype struct",
      Kind::Seq => "sequence",
      Kind::UnsizedSeq => "sequence of unknown length",
      Kind::ZeroWidthSeq => "sequence of zero-width elements",
      Kind::Tuple => "tuple",
      Kind::TupleStruct => "tuple struct",
      Kind::Struct => "struct",
      Kind::Map => "map",
      Kind::Enum => "enum",
      Kind::Any => "self-describing value",
      Kind::Identifier => "identifier",
      Kind::IgnoredAny => "ignored value",
    };
    f.write_str(name)
  }
}

/// 指定された種別をカテゴリに分類します。カテゴリを持たない種別は `UnsupportedType` です。
pub fn classify(kind: Kind) -> Result<Category> {
  kind.category().ok_or_else(|| Error::UnsupportedType { kind: kind.to_string() })
}

/// エンコーダ、デコーダ、インスペクタが扱えない種別に到達したときのエラーを `classify` から得ます。
pub(crate) fn unsupported<T>(kind: Kind) -> Result<T> {
  let category = classify(kind)?;
  // 分類できる種別をここで拒否するのは呼び出し側の誤り
  Err(Error::UnsupportedType { kind: format!("{} as {:?}", kind, category) })
}

/// 固定長整数の符号とバイト幅です。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntShape {
  pub signed: bool,
  pub width: usize,
}

impl IntShape {
  pub const U8: IntShape = IntShape { signed: false, width: 1 };
  pub const U16: IntShape = IntShape { signed: false, width: 2 };
  pub const U32: IntShape = IntShape { signed: false, width: 4 };
  pub const U64: IntShape = IntShape { signed: false, width: 8 };
  pub const I8: IntShape = IntShape { signed: true, width: 1 };
  pub const I16: IntShape = IntShape { signed: true, width: 2 };
  pub const I32: IntShape = IntShape { signed: true, width: 4 };
  pub const I64: IntShape = IntShape { signed: true, width: 8 };
}

/// レコードのフィールドです。タプルの要素は名前を持ちません。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
  pub name: Option<&'static str>,
  pub shape: Shape,
}

/// 値または型のワイヤ上の構造を表す記述子です。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Shape {
  Bool,
  Integer(IntShape),
  /// 長さ接頭辞を持たない N バイトの配列。
  FixedBytes(usize),
  Sequence(Box<Shape>),
  Text,
  Optional(Box<Shape>),
  /// 宣言順に並んだフィールド。
  Record(Vec<Field>),
}

impl Shape {
  pub fn category(&self) -> Category {
    match self {
      Shape::Bool => Category::Boolean,
      Shape::Integer(_) => Category::Integer,
      Shape::FixedBytes(_) => Category::FixedBytes,
      Shape::Sequence(_) => Category::Sequence,
      Shape::Text => Category::Text,
      Shape::Optional(_) => Category::Optional,
      Shape::Record(_) => Category::Record,
    }
  }

  /// エンコード後のバイト長が値によらず一定であればその長さを返します。
  pub fn fixed_width(&self) -> Option<usize> {
    match self {
      Shape::Bool => Some(1),
      Shape::Integer(int) => Some(int.width),
      Shape::FixedBytes(length) => Some(*length),
      Shape::Sequence(_) | Shape::Text | Shape::Optional(_) => None,
      Shape::Record(fields) => fields.iter().map(|field| field.shape.fixed_width()).sum(),
    }
  }

  /// エンコード後のバイト長の下限。
  pub fn min_width(&self) -> usize {
    match self {
      Shape::Bool => 1,
      Shape::Integer(int) => int.width,
      Shape::FixedBytes(length) => *length,
      Shape::Sequence(_) | Shape::Text => LENGTH_PREFIX_SIZE,
      Shape::Optional(_) => 1,
      Shape::Record(fields) => fields.iter().map(|field| field.shape.min_width()).sum(),
    }
  }

  pub fn is_fixed_width(&self) -> bool {
    self.fixed_width().is_some()
  }
}

/// 型 `T` のワイヤ上の構造を調べます。`T` の `Deserialize` 実装に仮の値 (ゼロの整数、空文字列、シーケンスごとに
/// 1 つの要素、Option は存在側) を与えて走査し、その過程で要求された種別から `Shape` を組み立てます。
///
/// `Shape` は木構造なので自己再帰する型は表せません。`Option<Box<Self>>` のようなフィールドを持つ型は存在側を
/// 辿り続けるため `DepthLimitExceeded` で終わります。このような型もエンコードとデコードは値の深さの範囲で行えます。
/// 要素が 0 バイトになるシーケンス (`Vec<()>` など) は要素数をバイト長と照合できないため `UnsupportedType` です。
pub fn inspect<T: DeserializeOwned>() -> Result<Shape> {
  inspect_with::<T>(&Config::default())
}

pub fn inspect_with<T: DeserializeOwned>(config: &Config) -> Result<Shape> {
  let mut inspector = Inspector::new(config);
  T::deserialize(&mut inspector)?;
  inspector.take()
}

struct Inspector {
  shape: Option<Shape>,
  depth: usize,
  max_depth: usize,
}

impl Inspector {
  fn new(config: &Config) -> Inspector {
    Inspector { shape: None, depth: 0, max_depth: config.max_depth() }
  }

  fn record(&mut self, shape: Shape) {
    self.shape = Some(shape);
  }

  fn take(&mut self) -> Result<Shape> {
    match self.shape.take() {
      Some(shape) => Ok(shape),
      None => unsupported(Kind::Any),
    }
  }

  fn enter(&mut self) -> Result<()> {
    if self.depth >= self.max_depth {
      Err(Error::DepthLimitExceeded { limit: self.max_depth })
    } else {
      self.depth += 1;
      Ok(())
    }
  }

  fn leave(&mut self) {
    self.depth -= 1;
  }

  /// `length` 個の要素を与えて各要素の構造を集めます。
  fn elements<'de, V: Visitor<'de>>(&mut self, length: usize, visitor: V) -> Result<(V::Value, Vec<Shape>)> {
    self.enter()?;
    let mut sampler = Sampler { inspector: &mut *self, remaining: length, shapes: Vec::with_capacity(length) };
    let value = visitor.visit_seq(&mut sampler)?;
    let shapes = sampler.shapes;
    self.leave();
    Ok((value, shapes))
  }

  fn integer<'de, V: Visitor<'de>>(&mut self, int: IntShape, visitor: V) -> Result<V::Value> {
    self.record(Shape::Integer(int));
    match (int.signed, int.width) {
      (false, 1) => visitor.visit_u8(0),
      (false, 2) => visitor.visit_u16(0),
      (false, 4) => visitor.visit_u32(0),
      (false, _) => visitor.visit_u64(0),
      (true, 1) => visitor.visit_i8(0),
      (true, 2) => visitor.visit_i16(0),
      (true, 4) => visitor.visit_i32(0),
      (true, _) => visitor.visit_i64(0),
    }
  }
}

struct Sampler<'a> {
  inspector: &'a mut Inspector,
  remaining: usize,
  shapes: Vec<Shape>,
}

impl<'de, 'a> SeqAccess<'de> for Sampler<'a> {
  type Error = Error;

  fn next_element_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<Option<S::Value>> {
    if self.remaining == 0 {
      return Ok(None);
    }
    self.remaining -= 1;
    let value = seed.deserialize(&mut *self.inspector)?;
    self.shapes.push(self.inspector.take()?);
    Ok(Some(value))
  }

  fn size_hint(&self) -> Option<usize> {
    Some(self.remaining)
  }
}

fn unnamed(shapes: Vec<Shape>) -> Vec<Field> {
  shapes.into_iter().map(|shape| Field { name: None, shape }).collect()
}

impl<'de, 'a> de::Deserializer<'de> for &'a mut Inspector {
  type Error = Error;

  fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::Any)
  }

  fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.record(Shape::Bool);
    visitor.visit_bool(false)
  }

  fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.integer(IntShape::I8, visitor)
  }

  fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.integer(IntShape::I16, visitor)
  }

  fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.integer(IntShape::I32, visitor)
  }

  fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.integer(IntShape::I64, visitor)
  }

  fn deserialize_i128<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::I128)
  }

  fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.integer(IntShape::U8, visitor)
  }

  fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.integer(IntShape::U16, visitor)
  }

  fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.integer(IntShape::U32, visitor)
  }

  fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.integer(IntShape::U64, visitor)
  }

  fn deserialize_u128<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::U128)
  }

  fn deserialize_f32<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::F32)
  }

  fn deserialize_f64<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::F64)
  }

  fn deserialize_char<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::Char)
  }

  fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.record(Shape::Text);
    visitor.visit_borrowed_str("")
  }

  fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.deserialize_str(visitor)
  }

  fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.record(Shape::Sequence(Box::new(Shape::Integer(IntShape::U8))));
    visitor.visit_borrowed_bytes(&[])
  }

  fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.deserialize_bytes(visitor)
  }

  fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.enter()?;
    let value = visitor.visit_some(&mut *self)?;
    let inner = self.take()?;
    self.leave();
    self.record(Shape::Optional(Box::new(inner)));
    Ok(value)
  }

  fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.record(Shape::Record(Vec::new()));
    visitor.visit_unit()
  }

  fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
    self.deserialize_unit(visitor)
  }

  fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
    // ワイヤ上は内側の値と同一
    visitor.visit_newtype_struct(self)
  }

  fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    let (value, shapes) = self.elements(1, visitor)?;
    let element = match shapes.into_iter().next() {
      Some(element) => element,
      None => return unsupported(Kind::UnsizedSeq),
    };
    if element.min_width() == 0 {
      return unsupported(Kind::ZeroWidthSeq);
    }
    self.record(Shape::Sequence(Box::new(element)));
    Ok(value)
  }

  fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
    let (value, shapes) = self.elements(len, visitor)?;
    let bytes = len > 0 && shapes.iter().all(|shape| *shape == Shape::Integer(IntShape::U8));
    if bytes {
      self.record(Shape::FixedBytes(len));
    } else {
      self.record(Shape::Record(unnamed(shapes)));
    }
    Ok(value)
  }

  fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, len: usize, visitor: V) -> Result<V::Value> {
    let (value, shapes) = self.elements(len, visitor)?;
    self.record(Shape::Record(unnamed(shapes)));
    Ok(value)
  }

  fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::Map)
  }

  fn deserialize_struct<V: Visitor<'de>>(
    self,
    _name: &'static str,
    fields: &'static [&'static str],
    visitor: V,
  ) -> Result<V::Value> {
    let (value, shapes) = self.elements(fields.len(), visitor)?;
    let fields = fields.iter().zip(shapes).map(|(name, shape)| Field { name: Some(*name), shape }).collect();
    self.record(Shape::Record(fields));
    Ok(value)
  }

  fn deserialize_enum<V: Visitor<'de>>(
    self,
    _name: &'static str,
    _variants: &'static [&'static str],
    _visitor: V,
  ) -> Result<V::Value> {
    unsupported(Kind::Enum)
  }

  fn deserialize_identifier<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::Identifier)
  }

  fn deserialize_ignored_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::IgnoredAny)
  }

  fn is_human_readable(&self) -> bool {
    false
  }
}
