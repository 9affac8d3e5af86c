//! Decoder trait for type-safe conversions.
//!
//! A `Decoder<T, D>` is implemented on the source type `T` and produces the
//! destination type `D`. The destination must opt in with
//! `DecodableFrom<T>`, which keeps the set of legal conversions explicit.
//!
//! ```no_run
//! use kagi::decoder::{DecodableFrom, Decoder};
//!
//! struct Armored(String);
//! struct Binary(Vec<u8>);
//!
//! #[derive(Debug)]
//! struct DecodeError;
//!
//! impl DecodableFrom<Armored> for Binary {}
//!
//! impl Decoder<Armored, Binary> for Armored {
//!     type Error = DecodeError;
//!
//!     fn decode(&self) -> Result<Binary, Self::Error> {
//!         Ok(Binary(self.0.as_bytes().to_vec()))
//!     }
//! }
//! ```

/// Converts `self` (of type `T`) into `D`.
pub trait Decoder<T, D: DecodableFrom<T>> {
    /// The error type returned when decoding fails.
    type Error;

    /// Decodes `self` into type `D`.
    ///
    /// # Errors
    ///
    /// Returns an error if the conversion fails. The specific error
    /// conditions depend on the implementing type.
    fn decode(&self) -> Result<D, Self::Error>;
}

/// Marker trait indicating that type `D` can be decoded from type `T`.
pub trait DecodableFrom<T> {}
