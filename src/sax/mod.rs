//! SAX (Simple API for XML) Module
//!
//! Event-based plumbing between a push parser and the database builder.
//!
//! ## Architecture
//!
//! ```text
//! PushParser ---> SaxHandler ---> SaxAdapter ---> Builder
//!                     |
//!                     +---------> SaxCollector (owned events, replay)
//! ```
//!
//! The adapter is the only place where callback chunking is undone:
//! buffered text becomes one `Builder::text` call, buffered namespace
//! declarations are forwarded right before the element that owns them.

pub mod adapter;
pub mod attributes;
pub mod collector;
pub mod handler;
pub mod text;

pub use adapter::SaxAdapter;
pub use attributes::AttributeBuffer;
pub use collector::{SaxCollector, SaxEvent};
pub use handler::{CharData, SaxHandler};
pub use text::TextAccumulator;
