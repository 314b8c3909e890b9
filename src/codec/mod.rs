use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::Error;
use crate::Result;

use self::de::Decoder;
use self::ser::Encoder;

pub mod buffer;
pub mod de;
pub mod ser;
pub mod shape;

#[cfg(test)]
mod test;

/// 値をデフォルト設定でエンコードします。
///
/// | カテゴリ | エンコード |
/// |---|---|
/// | `bool` | 1 バイト (`0x00` / `0x01`) |
/// | 整数 (8/16/32/64 ビット) | ビット幅と同じバイト数のリトルエンディアン |
/// | 固定長配列・タプル | 要素をそのまま連結 (長さ接頭辞なし) |
/// | シーケンス | 8 バイト LE の要素数 + 各要素 |
/// | 文字列 | 8 バイト LE のバイト長 + UTF-8 バイト列 |
/// | `Option` | 1 バイトの存在フラグ + 存在する場合は内側の値 |
/// | 構造体 | 各フィールドを宣言順に連結 (タグ・パディングなし) |
pub fn encode<T: ?Sized + Serialize>(value: &T) -> Result<Vec<u8>> {
  encode_with(value, &Config::default())
}

pub fn encode_with<T: ?Sized + Serialize>(value: &T, config: &Config) -> Result<Vec<u8>> {
  let mut encoder = Encoder::new(config);
  match value.serialize(&mut encoder) {
    Ok(()) => {
      log::trace!("encoded {} bytes", encoder.len());
      Ok(encoder.finish())
    }
    Err(err) => {
      log::debug!("encode failed: {}", err);
      Err(err)
    }
  }
}

/// エンコードの失敗をプログラムの論理的な誤りとして扱う呼び出し側のための変種です。失敗した場合はパニックします。
pub fn must_encode<T: ?Sized + Serialize>(value: &T) -> Vec<u8> {
  encode(value).unwrap_or_else(|err| {
    log::error!("unrecoverable encode failure: {}", err);
    panic!("failed to encode value: {}", err)
  })
}

/// バイト列から型 `T` の値をデフォルト設定でデコードします。値の後に残ったバイトは無視されます。
pub fn decode<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<T> {
  decode_with(bytes, &Config::default())
}

pub fn decode_with<'de, T: Deserialize<'de>>(bytes: &'de [u8], config: &Config) -> Result<T> {
  let (value, consumed) = decode_prefix_with(bytes, config)?;
  let count = bytes.len() - consumed;
  if count > 0 && !config.trailing_bytes_allowed() {
    log::debug!("decode failed: {} trailing bytes", count);
    return Err(Error::TrailingBytes { count });
  }
  Ok(value)
}

/// 先頭から型 `T` の値をデコードし、その値と消費したバイト数を返します。
pub fn decode_prefix<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> Result<(T, usize)> {
  decode_prefix_with(bytes, &Config::default())
}

pub fn decode_prefix_with<'de, T: Deserialize<'de>>(bytes: &'de [u8], config: &Config) -> Result<(T, usize)> {
  let mut decoder = Decoder::new(bytes, config);
  match T::deserialize(&mut decoder) {
    Ok(value) => {
      log::trace!("decoded {} of {} bytes", decoder.position(), bytes.len());
      Ok((value, decoder.position()))
    }
    Err(err) => {
      log::debug!("decode failed at offset {}: {}", decoder.position(), err);
      Err(err)
    }
  }
}

/// デコードの失敗をプログラムの論理的な誤りとして扱う呼び出し側のための変種です。失敗した場合はパニックします。
pub fn must_decode<'de, T: Deserialize<'de>>(bytes: &'de [u8]) -> T {
  decode(bytes).unwrap_or_else(|err| {
    log::error!("unrecoverable decode failure: {}", err);
    panic!("failed to decode value: {}", err)
  })
}
