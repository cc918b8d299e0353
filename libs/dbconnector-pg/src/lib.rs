//! Native value sources for the database abstraction layer.
//!
//! [`CallArgumentSource`] exposes the arguments of a function call,
//! [`RecordSource`] the fields of a packed composite record. Both implement
//! [`dbal::ValueSource`] and borrow the native data for `'a`, the duration
//! of the enclosing call.

mod convert;

pub mod array;
pub mod config;
pub mod datum;
pub mod descriptor;
pub mod fmgr;
pub mod pg_type;
pub mod pg_value;
pub mod record;
pub mod type_cache;
pub mod varlena;

pub use config::{ConfigError, ConnectorConfig};
pub use datum::{Datum, NullableDatum};
pub use descriptor::{Attribute, DescriptorResolver, TupleDescriptor};
pub use fmgr::{FmgrInfo, FunctionCallInfo};
pub use pg_value::{CallArgumentSource, RecordSource};
pub use record::{PackedRecord, form_record};
pub use type_cache::TypeCache;
