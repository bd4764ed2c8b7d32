//! Core XML parsing primitives
//!
//! This module contains the fundamental building blocks for XML parsing:
//! - Entities: XML entity decoding with Cow (zero-copy when possible)
//! - Attributes: Attribute parsing and extraction
//! - Encoding: UTF-16 detection and conversion to UTF-8
//! - DTD: DOCTYPE parsing for entity declarations and subset markup
//! - Push: incremental parser reporting to a `SaxHandler`

pub mod attributes;
pub mod dtd;
pub mod encoding;
pub mod entities;
pub mod push;

pub use push::PushParser;
