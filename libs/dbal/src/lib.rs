//! Database abstraction layer.
//!
//! Algorithmic code reads its inputs through [`ValueSource`] and gets back
//! [`AbstractValue`] handles. It never learns whether a value came from a
//! function's argument list or from a packed record; the concrete sources
//! live in the connector crates.

pub mod error;
pub mod source;
pub mod value;

pub use error::{DbalError, IdDomain};
pub use source::ValueSource;
pub use value::{AbstractValue, AbstractValueSPtr, CompositeValue, TypeTag, Value};
