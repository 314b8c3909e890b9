use std::convert::TryFrom;

use byteorder::{ByteOrder, LittleEndian};

use crate::error::Error;
use crate::Result;

/// シーケンスの要素数および文字列のバイト長を表す接頭辞のバイト長です。
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// エンコード結果を蓄積する追記専用のバイト列です。1 回のエンコード呼び出しが排他的に所有し、`finish()` で確定する
/// まで切り詰められることはありません。
#[derive(Debug, Default)]
pub struct EncodedBuffer {
  bytes: Vec<u8>,
}

impl EncodedBuffer {
  pub fn new() -> EncodedBuffer {
    EncodedBuffer { bytes: Vec::new() }
  }

  pub fn with_capacity(capacity: usize) -> EncodedBuffer {
    EncodedBuffer { bytes: Vec::with_capacity(capacity) }
  }

  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  /// 指定されたバイト列をそのまま末尾に追加します。
  #[inline]
  pub fn write(&mut self, bytes: &[u8]) {
    self.bytes.extend_from_slice(bytes)
  }

  #[inline]
  pub fn write_u8(&mut self, value: u8) {
    self.bytes.push(value)
  }

  #[inline]
  pub fn write_u16(&mut self, value: u16) {
    let mut buf = [0u8; 2];
    LittleEndian::write_u16(&mut buf, value);
    self.write(&buf)
  }

  #[inline]
  pub fn write_u32(&mut self, value: u32) {
    let mut buf = [0u8; 4];
    LittleEndian::write_u32(&mut buf, value);
    self.write(&buf)
  }

  #[inline]
  pub fn write_u64(&mut self, value: u64) {
    let mut buf = [0u8; 8];
    LittleEndian::write_u64(&mut buf, value);
    self.write(&buf)
  }

  #[inline]
  pub fn write_i8(&mut self, value: i8) {
    self.bytes.push(value as u8)
  }

  #[inline]
  pub fn write_i16(&mut self, value: i16) {
    let mut buf = [0u8; 2];
    LittleEndian::write_i16(&mut buf, value);
    self.write(&buf)
  }

  #[inline]
  pub fn write_i32(&mut self, value: i32) {
    let mut buf = [0u8; 4];
    LittleEndian::write_i32(&mut buf, value);
    self.write(&buf)
  }

  #[inline]
  pub fn write_i64(&mut self, value: i64) {
    let mut buf = [0u8; 8];
    LittleEndian::write_i64(&mut buf, value);
    self.write(&buf)
  }

  /// シーケンスの要素数または文字列のバイト長を 8 バイトの接頭辞として書き込みます。
  #[inline]
  pub fn write_len(&mut self, length: usize) {
    self.write_u64(length as u64)
  }

  pub fn finish(self) -> Vec<u8> {
    self.bytes
  }
}

/// 入力バイト列に対する前方向のみの読み出しカーソルです。要求したバイト数が残っていない場合は位置を動かさずに
/// 失敗し、成功した場合は要求したバイト数だけ正確に進みます。
#[derive(Debug)]
pub struct DecodeCursor<'de> {
  input: &'de [u8],
  offset: usize,
}

impl<'de> DecodeCursor<'de> {
  pub fn new(input: &'de [u8]) -> DecodeCursor<'de> {
    DecodeCursor { input, offset: 0 }
  }

  /// 入力全体のバイト長。
  pub fn len(&self) -> usize {
    self.input.len()
  }

  pub fn is_empty(&self) -> bool {
    self.input.is_empty()
  }

  /// 次に読み出すバイトの入力先頭からの位置。
  pub fn position(&self) -> usize {
    self.offset
  }

  pub fn remaining(&self) -> usize {
    self.input.len() - self.offset
  }

  /// 位置を進めずに次の `length` バイトを参照します。
  pub fn peek(&self, length: usize) -> Result<&'de [u8]> {
    let remaining = self.remaining();
    if length > remaining {
      Err(Error::TruncatedInput { required: length, remaining })
    } else {
      let input: &'de [u8] = self.input;
      Ok(&input[self.offset..self.offset + length])
    }
  }

  /// 次の `length` バイトを読み出して位置を進めます。
  pub fn consume(&mut self, length: usize) -> Result<&'de [u8]> {
    let bytes = self.peek(length)?;
    self.offset += length;
    Ok(bytes)
  }

  #[inline]
  pub fn read_u8(&mut self) -> Result<u8> {
    Ok(self.consume(1)?[0])
  }

  #[inline]
  pub fn read_u16(&mut self) -> Result<u16> {
    self.consume(2).map(LittleEndian::read_u16)
  }

  #[inline]
  pub fn read_u32(&mut self) -> Result<u32> {
    self.consume(4).map(LittleEndian::read_u32)
  }

  #[inline]
  pub fn read_u64(&mut self) -> Result<u64> {
    self.consume(8).map(LittleEndian::read_u64)
  }

  #[inline]
  pub fn read_i8(&mut self) -> Result<i8> {
    Ok(self.consume(1)?[0] as i8)
  }

  #[inline]
  pub fn read_i16(&mut self) -> Result<i16> {
    self.consume(2).map(LittleEndian::read_i16)
  }

  #[inline]
  pub fn read_i32(&mut self) -> Result<i32> {
    self.consume(4).map(LittleEndian::read_i32)
  }

  #[inline]
  pub fn read_i64(&mut self) -> Result<i64> {
    self.consume(8).map(LittleEndian::read_i64)
  }

  /// 8 バイトの長さ接頭辞を読み出します。宣言された長さが入力全体のバイト長を超える場合、このバイト列がどれだけ
  /// 読み進めても満たせない値であるため `Error::SequenceLengthOverflow` となります。範囲内であっても残りのバイトが
  /// 足りない場合は、後続の読み出しが `Error::TruncatedInput` で失敗します。
  pub fn read_len(&mut self) -> Result<usize> {
    let declared = self.read_u64()?;
    let available = self.input.len();
    match usize::try_from(declared) {
      Ok(length) if length <= available => Ok(length),
      _ => Err(Error::SequenceLengthOverflow { declared, available }),
    }
  }
}
