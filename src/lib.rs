pub mod codec;
pub mod config;
pub mod error;


pub use codec::buffer::{DecodeCursor, EncodedBuffer};
pub use codec::de::Decoder;
pub use codec::ser::Encoder;
pub use codec::shape::{classify, inspect, inspect_with, Category, Field, IntShape, Kind, Shape};
pub use codec::{decode, decode_prefix, decode_prefix_with, decode_with, encode, encode_with, must_decode, must_encode};
pub use config::{Config, DEFAULT_MAX_DEPTH};
pub use error::Error;

pub type Result<T> = std::result::Result<T, error::Error>;
