use std::fmt;

use crate::error::DbalError;
use crate::value::AbstractValueSPtr;

/// Identifier-indexed access to values, independent of where they live.
///
/// Implementations wrap a borrowed native structure (an argument vector, a
/// packed record, ...) and materialize values on demand. The meaning of the
/// identifier is source specific; an identifier outside the source's domain
/// fails with [`DbalError::InvalidIdentifier`]. The wrapped structure is
/// never written through.
pub trait ValueSource<'a>: fmt::Debug + Send + Sync {
    fn get_value_by_id(&self, id: u32) -> Result<AbstractValueSPtr<'a>, DbalError>;

    /// Owning copy of the same concrete source over the same borrowed data.
    ///
    /// The copy answers every `get_value_by_id` exactly like `self`, and
    /// either can be dropped without affecting the other.
    fn clone_source(&self) -> Box<dyn ValueSource<'a> + 'a>;
}

impl<'a> Clone for Box<dyn ValueSource<'a> + 'a> {
    fn clone(&self) -> Self {
        self.clone_source()
    }
}
