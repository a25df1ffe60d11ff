//! Primitivas do codec binário.
//!
//! - [`BinaryCursor`]: leituras e escritas little-endian sobre um stream
//! - [`AlignedBuffer`]: armazenamento de parâmetros zerado e alinhado à linha de cache

mod aligned;
mod cursor;

pub use aligned::{AlignedBuffer, Element, CACHE_LINE_SIZE};
pub use cursor::{BinaryCursor, ReadCursor, WriteCursor};
