//! # kagi
//!
//! Core conversion traits shared by the kagi key-management toolkit.
//!
//! Every representation of key material in kagi is a step on one chain:
//! ```text
//! text (PEM / SSH) → Vec<u8> (DER) → Tlv → typed key structure
//! ```
//!
//! Moving right is a [`decoder::Decoder`] conversion, moving left is an
//! [`encoder::Encoder`] conversion. The marker traits
//! [`decoder::DecodableFrom`] and [`encoder::EncodableTo`] restrict which pairs
//! of types may be converted, so an impossible conversion is a compile error
//! rather than a runtime one.
//!
//! ```ignore
//! use kagi::decoder::Decoder;
//! use kagi_pem::Pem;
//!
//! let pem: Pem = text.parse()?;
//! let der: Vec<u8> = pem.decode()?;
//! ```

#![forbid(unsafe_code)]

pub mod decoder;
pub mod encoder;
