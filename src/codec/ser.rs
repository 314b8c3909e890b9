use serde::ser::{self, Impossible, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::Result;

use super::buffer::EncodedBuffer;
use super::shape::{unsupported, Kind};

/// 値を構造に従って走査し、正準順序のバイト列を `EncodedBuffer` に追記するエンコーダです。
pub struct Encoder {
  buffer: EncodedBuffer,
  depth: usize,
  max_depth: usize,
}

impl Encoder {
  pub fn new(config: &Config) -> Encoder {
    Encoder { buffer: EncodedBuffer::new(), depth: 0, max_depth: config.max_depth() }
  }

  /// これまでに書き込んだバイト数。
  pub fn len(&self) -> usize {
    self.buffer.len()
  }

  pub fn is_empty(&self) -> bool {
    self.buffer.is_empty()
  }

  pub fn finish(self) -> Vec<u8> {
    self.buffer.finish()
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
}

impl<'a> ser::Serializer for &'a mut Encoder {
  type Ok = ();
  type Error = Error;

  type SerializeSeq = SeqWriter<'a>;
  type SerializeTuple = Self;
  type SerializeTupleStruct = Self;
  type SerializeTupleVariant = Impossible<(), Error>;
  type SerializeMap = Impossible<(), Error>;
  type SerializeStruct = Self;
  type SerializeStructVariant = Impossible<(), Error>;

  fn serialize_bool(self, v: bool) -> Result<()> {
    self.buffer.write_u8(if v { 0x01 } else { 0x00 });
    Ok(())
  }

  fn serialize_i8(self, v: i8) -> Result<()> {
    self.buffer.write_i8(v);
    Ok(())
  }

  fn serialize_i16(self, v: i16) -> Result<()> {
    self.buffer.write_i16(v);
    Ok(())
  }

  fn serialize_i32(self, v: i32) -> Result<()> {
    self.buffer.write_i32(v);
    Ok(())
  }

  fn serialize_i64(self, v: i64) -> Result<()> {
    self.buffer.write_i64(v);
    Ok(())
  }

  fn serialize_i128(self, _v: i128) -> Result<()> {
    unsupported(Kind::I128)
  }

  fn serialize_u8(self, v: u8) -> Result<()> {
    self.buffer.write_u8(v);
    Ok(())
  }

  fn serialize_u16(self, v: u16) -> Result<()> {
    self.buffer.write_u16(v);
    Ok(())
  }

  fn serialize_u32(self, v: u32) -> Result<()> {
    self.buffer.write_u32(v);
    Ok(())
  }

  fn serialize_u64(self, v: u64) -> Result<()> {
    self.buffer.write_u64(v);
    Ok(())
  }

  fn serialize_u128(self, _v: u128) -> Result<()> {
    unsupported(Kind::U128)
  }

  fn serialize_f32(self, _v: f32) -> Result<()> {
    unsupported(Kind::F32)
  }

  fn serialize_f64(self, _v: f64) -> Result<()> {
    unsupported(Kind::F64)
  }

  fn serialize_char(self, _v: char) -> Result<()> {
    unsupported(Kind::Char)
  }

  fn serialize_str(self, v: &str) -> Result<()> {
    self.buffer.write_len(v.len());
    self.buffer.write(v.as_bytes());
    Ok(())
  }

  fn serialize_bytes(self, v: &[u8]) -> Result<()> {
    self.buffer.write_len(v.len());
    self.buffer.write(v);
    Ok(())
  }

  fn serialize_none(self) -> Result<()> {
    self.buffer.write_u8(0x00);
    Ok(())
  }

  fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
    self.enter()?;
    self.buffer.write_u8(0x01);
    value.serialize(&mut *self)?;
    self.leave();
    Ok(())
  }

  fn serialize_unit(self) -> Result<()> {
    Ok(())
  }

  fn serialize_unit_struct(self, _name: &'static str) -> Result<()> {
    Ok(())
  }

  fn serialize_unit_variant(self, _name: &'static str, _index: u32, _variant: &'static str) -> Result<()> {
    unsupported(Kind::Enum)
  }

  fn serialize_newtype_struct<T: ?Sized + Serialize>(self, _name: &'static str, value: &T) -> Result<()> {
    value.serialize(self)
  }

  fn serialize_newtype_variant<T: ?Sized + Serialize>(
    self,
    _name: &'static str,
    _index: u32,
    _variant: &'static str,
    _value: &T,
  ) -> Result<()> {
    unsupported(Kind::Enum)
  }

  fn serialize_seq(self, len: Option<usize>) -> Result<Self::SerializeSeq> {
    let declared = match len {
      Some(declared) => declared,
      None => return unsupported(Kind::UnsizedSeq),
    };
    self.enter()?;
    self.buffer.write_len(declared);
    Ok(SeqWriter { encoder: self, declared, written: 0 })
  }

  fn serialize_tuple(self, _len: usize) -> Result<Self::SerializeTuple> {
    self.enter()?;
    Ok(self)
  }

  fn serialize_tuple_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeTupleStruct> {
    self.enter()?;
    Ok(self)
  }

  fn serialize_tuple_variant(
    self,
    _name: &'static str,
    _index: u32,
    _variant: &'static str,
    _len: usize,
  ) -> Result<Self::SerializeTupleVariant> {
    unsupported(Kind::Enum)
  }

  fn serialize_map(self, _len: Option<usize>) -> Result<Self::SerializeMap> {
    unsupported(Kind::Map)
  }

  fn serialize_struct(self, _name: &'static str, _len: usize) -> Result<Self::SerializeStruct> {
    self.enter()?;
    Ok(self)
  }

  fn serialize_struct_variant(
    self,
    _name: &'static str,
    _index: u32,
    _variant: &'static str,
    _len: usize,
  ) -> Result<Self::SerializeStructVariant> {
    unsupported(Kind::Enum)
  }

  fn is_human_readable(&self) -> bool {
    false
  }
}

/// 要素数の接頭辞を書き込んだシーケンスの要素を受け取ります。接頭辞と実際の要素数が一致しなければ `end()` で
/// 失敗します。
pub struct SeqWriter<'a> {
  encoder: &'a mut Encoder,
  declared: usize,
  written: usize,
}

impl<'a> ser::SerializeSeq for SeqWriter<'a> {
  type Ok = ();
  type Error = Error;

  fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
    let start = self.encoder.len();
    value.serialize(&mut *self.encoder)?;
    // 0 バイトの要素は要素数を入力長と照合できずデコードできない
    if self.encoder.len() == start {
      return unsupported(Kind::ZeroWidthSeq);
    }
    self.written += 1;
    Ok(())
  }

  fn end(self) -> Result<()> {
    if self.written != self.declared {
      return Err(Error::UnsupportedType {
        kind: format!("sequence declared {} elements but wrote {}", self.declared, self.written),
      });
    }
    self.encoder.leave();
    Ok(())
  }
}

impl<'a> ser::SerializeTuple for &'a mut Encoder {
  type Ok = ();
  type Error = Error;

  fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
    value.serialize(&mut **self)
  }

  fn end(self) -> Result<()> {
    self.leave();
    Ok(())
  }
}

impl<'a> ser::SerializeTupleStruct for &'a mut Encoder {
  type Ok = ();
  type Error = Error;

  fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
    value.serialize(&mut **self)
  }

  fn end(self) -> Result<()> {
    self.leave();
    Ok(())
  }
}

impl<'a> ser::SerializeStruct for &'a mut Encoder {
  type Ok = ();
  type Error = Error;

  fn serialize_field<T: ?Sized + Serialize>(&mut self, _key: &'static str, value: &T) -> Result<()> {
    value.serialize(&mut **self)
  }

  fn skip_field(&mut self, key: &'static str) -> Result<()> {
    // スキップされたフィールドはデコード側と位置がずれる
    Err(Error::UnsupportedType { kind: format!("skipped field `{}`", key) })
  }

  fn end(self) -> Result<()> {
    self.leave();
    Ok(())
  }
}
