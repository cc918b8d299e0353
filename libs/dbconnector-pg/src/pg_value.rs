//! The two native value sources: a function's argument list and a packed
//! composite record.

use std::fmt;
use std::sync::Arc;

use dbal::{AbstractValue, AbstractValueSPtr, DbalError, IdDomain, ValueSource};
use tracing::{debug, trace};

use crate::convert::datum_to_value;
use crate::descriptor::{DescriptorResolver, TupleDescriptor};
use crate::fmgr::FunctionCallInfo;
use crate::record::PackedRecord;

// ════════════════════════════════════════════════════════════════
//  CallArgumentSource
// ════════════════════════════════════════════════════════════════

/// Positional arguments of a function call. Identifiers are 0-based
/// argument indexes.
///
/// Arguments are not self-describing, so each one is decoded using the
/// argument type recorded in the call metadata.
#[derive(Clone, Copy)]
pub struct CallArgumentSource<'a> {
    fcinfo: &'a FunctionCallInfo<'a>,
}

impl<'a> CallArgumentSource<'a> {
    pub fn new(fcinfo: &'a FunctionCallInfo<'a>) -> Self {
        Self { fcinfo }
    }
}

impl<'a> ValueSource<'a> for CallArgumentSource<'a> {
    fn get_value_by_id(&self, id: u32) -> Result<AbstractValueSPtr<'a>, DbalError> {
        let i = id as usize;
        let arg = self.fcinfo.arg(i).ok_or(DbalError::InvalidIdentifier {
            id,
            domain: IdDomain::Argument {
                count: self.fcinfo.nargs(),
            },
        })?;
        let tag = self.fcinfo.arg_type(i);
        trace!(
            function = %self.fcinfo.flinfo().fn_name,
            arg = i,
            oid = tag.0,
            is_null = arg.is_null,
            "reading call argument"
        );

        if arg.is_null {
            return Ok(AbstractValue::null(tag).into_sptr());
        }
        if !tag.is_valid() {
            return Err(DbalError::unsupported(
                tag,
                format!("could not determine the type of argument {i}"),
            ));
        }
        datum_to_value(arg.value, tag, self.fcinfo.resolver())
            .map(AbstractValue::into_sptr)
            .map_err(|e| e.with_context(format!("argument {i}")))
    }

    fn clone_source(&self) -> Box<dyn ValueSource<'a> + 'a> {
        Box::new(*self)
    }
}

impl fmt::Debug for CallArgumentSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallArgumentSource")
            .field("fcinfo", self.fcinfo)
            .finish()
    }
}

// ════════════════════════════════════════════════════════════════
//  RecordSource
// ════════════════════════════════════════════════════════════════

/// Fields of a packed composite record. Identifiers are 1-based field
/// numbers.
///
/// The record only carries its type; the field layout is resolved through
/// the descriptor resolver on every access.
#[derive(Clone, Copy)]
pub struct RecordSource<'a> {
    record: PackedRecord<'a>,
    resolver: &'a dyn DescriptorResolver,
}

impl<'a> RecordSource<'a> {
    /// Wrap the record at the start of `bytes`, validating its header.
    pub fn new(bytes: &'a [u8], resolver: &'a dyn DescriptorResolver) -> Result<Self, DbalError> {
        Ok(Self::from_record(PackedRecord::new(bytes)?, resolver))
    }

    pub fn from_record(record: PackedRecord<'a>, resolver: &'a dyn DescriptorResolver) -> Self {
        Self { record, resolver }
    }

    pub fn record(&self) -> PackedRecord<'a> {
        self.record
    }

    /// Runtime descriptor of the wrapped record.
    pub fn descriptor(&self) -> Result<Arc<TupleDescriptor>, DbalError> {
        self.resolver
            .lookup_rowtype(self.record.type_tag(), self.record.typmod())
    }
}

impl<'a> ValueSource<'a> for RecordSource<'a> {
    fn get_value_by_id(&self, id: u32) -> Result<AbstractValueSPtr<'a>, DbalError> {
        let desc = self.descriptor()?;
        if self.record.natts() > desc.natts() {
            debug!(
                oid = desc.type_tag.0,
                stored = self.record.natts(),
                declared = desc.natts(),
                "record stores more attributes than its type declares"
            );
        }

        let attr = desc.attr(id).ok_or(DbalError::InvalidIdentifier {
            id,
            domain: IdDomain::Field {
                count: desc.natts(),
            },
        })?;
        let datum = self.record.get_attr(&desc, id)?;
        trace!(oid = desc.type_tag.0, field = id, is_null = datum.is_null, "reading record field");

        if datum.is_null {
            return Ok(AbstractValue::null(attr.type_tag).into_sptr());
        }
        datum_to_value(datum.value, attr.type_tag, self.resolver)
            .map(AbstractValue::into_sptr)
            .map_err(|e| e.with_context(format!("field \"{}\"", attr.name)))
    }

    fn clone_source(&self) -> Box<dyn ValueSource<'a> + 'a> {
        Box::new(*self)
    }
}

impl fmt::Debug for RecordSource<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordSource")
            .field("type", &self.record.type_tag())
            .field("typmod", &self.record.typmod())
            .field("natts", &self.record.natts())
            .finish()
    }
}
