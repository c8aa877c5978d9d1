pub mod schema;
pub mod sexp;
pub mod stackup;

// Re-export for convenience
pub use schema::*;
pub use sexp::{ParseError, SExp, SExpParser};
pub use stackup::{StackupParseError, StackupParser};
