use serde::de::{self, DeserializeSeed, Deserializer, SeqAccess, Visitor};

use crate::config::Config;
use crate::error::Error;
use crate::Result;

use super::buffer::DecodeCursor;
use super::shape::{unsupported, Kind};

/// 目的の型が要求する構造に従って `DecodeCursor` からバイトを消費し、新しい値を構築するデコーダです。レコードの
/// フィールドは宣言順に、直前のフィールドを読み終えた位置から順に読み出します。先読みや巻き戻しは行いません。
pub struct Decoder<'de> {
  cursor: DecodeCursor<'de>,
  depth: usize,
  max_depth: usize,
}

impl<'de> Decoder<'de> {
  pub fn new(input: &'de [u8], config: &Config) -> Decoder<'de> {
    Decoder { cursor: DecodeCursor::new(input), depth: 0, max_depth: config.max_depth() }
  }

  /// これまでに消費したバイト数。
  pub fn position(&self) -> usize {
    self.cursor.position()
  }

  pub fn remaining(&self) -> usize {
    self.cursor.remaining()
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

  fn read_text(&mut self) -> Result<&'de str> {
    let length = self.cursor.read_len()?;
    let position = self.cursor.position();
    let bytes = self.cursor.consume(length)?;
    std::str::from_utf8(bytes).map_err(|_| Error::InvalidText { position })
  }

  /// `length` 個の要素を順に読み出す `SeqAccess` を visitor に渡します。`sequence` が真の場合は長さ接頭辞付きの
  /// シーケンスとして 0 バイトの要素を拒否します。
  fn elements<V: Visitor<'de>>(&mut self, length: usize, sequence: bool, visitor: V) -> Result<V::Value> {
    self.enter()?;
    let value = visitor.visit_seq(Elements { decoder: &mut *self, remaining: length, sequence })?;
    self.leave();
    Ok(value)
  }
}

struct Elements<'a, 'de> {
  decoder: &'a mut Decoder<'de>,
  remaining: usize,
  sequence: bool,
}

impl<'de, 'a> SeqAccess<'de> for Elements<'a, 'de> {
  type Error = Error;

  fn next_element_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<Option<S::Value>> {
    if self.remaining == 0 {
      return Ok(None);
    }
    self.remaining -= 1;
    let start = self.decoder.position();
    let value = seed.deserialize(&mut *self.decoder)?;
    if self.sequence && self.decoder.position() == start {
      return unsupported(Kind::ZeroWidthSeq);
    }
    Ok(Some(value))
  }

  fn size_hint(&self) -> Option<usize> {
    Some(self.remaining)
  }
}

impl<'de, 'a> de::Deserializer<'de> for &'a mut Decoder<'de> {
  type Error = Error;

  fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::Any)
  }

  fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_bool(self.cursor.read_u8()? != 0)
  }

  fn deserialize_i8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_i8(self.cursor.read_i8()?)
  }

  fn deserialize_i16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_i16(self.cursor.read_i16()?)
  }

  fn deserialize_i32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_i32(self.cursor.read_i32()?)
  }

  fn deserialize_i64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_i64(self.cursor.read_i64()?)
  }

  fn deserialize_i128<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value> {
    unsupported(Kind::I128)
  }

  fn deserialize_u8<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_u8(self.cursor.read_u8()?)
  }

  fn deserialize_u16<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_u16(self.cursor.read_u16()?)
  }

  fn deserialize_u32<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_u32(self.cursor.read_u32()?)
  }

  fn deserialize_u64<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_u64(self.cursor.read_u64()?)
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
    visitor.visit_borrowed_str(self.read_text()?)
  }

  fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.deserialize_str(visitor)
  }

  fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    let length = self.cursor.read_len()?;
    visitor.visit_borrowed_bytes(self.cursor.consume(length)?)
  }

  fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    self.deserialize_bytes(visitor)
  }

  fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    match self.cursor.read_u8()? {
      0x00 => visitor.visit_none(),
      _ => {
        self.enter()?;
        let value = visitor.visit_some(&mut *self)?;
        self.leave();
        Ok(value)
      }
    }
  }

  fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    visitor.visit_unit()
  }

  fn deserialize_unit_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
    visitor.visit_unit()
  }

  fn deserialize_newtype_struct<V: Visitor<'de>>(self, _name: &'static str, visitor: V) -> Result<V::Value> {
    visitor.visit_newtype_struct(self)
  }

  fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value> {
    let length = self.cursor.read_len()?;
    self.elements(length, true, visitor)
  }

  fn deserialize_tuple<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value> {
    self.elements(len, false, visitor)
  }

  fn deserialize_tuple_struct<V: Visitor<'de>>(self, _name: &'static str, len: usize, visitor: V) -> Result<V::Value> {
    self.elements(len, false, visitor)
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
    self.elements(fields.len(), false, visitor)
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
