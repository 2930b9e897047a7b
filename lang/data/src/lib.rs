//! Leaf crate of the SL pipeline: tokens, source coordinates, the pushback
//! character stream, and the structured errors every later stage reports
//! through.

pub mod errors;
pub mod stream;
pub mod tokens;

pub use errors::{LoadError, ParsingError, ParsingErrorKind, RuntimeError};
pub use stream::PushbackStream;
pub use tokens::{Keyword, Operator, Span, Token, TokenValue};
