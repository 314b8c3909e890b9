/// 入れ子になった複合値 (シーケンス、タプル、レコード、存在する Option) の深さのデフォルト上限です。
pub const DEFAULT_MAX_DEPTH: usize = 128;

/// エンコード/デコード 1 回ごとの動作を指定する設定です。グローバルな状態は持たず、呼び出し側が値として渡します。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
  max_depth: usize,
  allow_trailing_bytes: bool,
}

impl Config {
  pub const fn new() -> Config {
    Config { max_depth: DEFAULT_MAX_DEPTH, allow_trailing_bytes: true }
  }

  /// 入れ子の深さの上限を指定します。上限を超えた値やバイト列は `Error::DepthLimitExceeded` で失敗します。
  pub const fn with_max_depth(mut self, max_depth: usize) -> Config {
    self.max_depth = max_depth;
    self
  }

  /// デコードした値の後にバイトが残っている場合に `Error::TrailingBytes` で失敗させます。
  pub const fn reject_trailing_bytes(mut self) -> Config {
    self.allow_trailing_bytes = false;
    self
  }

  /// デコードした値の後に残ったバイトを無視します (デフォルト)。長いメッセージから先頭の識別子だけを読み出す
  /// 用途で使用します。
  pub const fn allow_trailing_bytes(mut self) -> Config {
    self.allow_trailing_bytes = true;
    self
  }

  pub fn max_depth(&self) -> usize {
    self.max_depth
  }

  pub fn trailing_bytes_allowed(&self) -> bool {
    self.allow_trailing_bytes
  }
}

impl Default for Config {
  fn default() -> Self {
    Config::new()
  }
}
