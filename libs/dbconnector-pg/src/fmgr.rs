use std::fmt;

use dbal::TypeTag;

use crate::datum::NullableDatum;
use crate::descriptor::DescriptorResolver;

/// Call metadata of the invoked function.
#[derive(Debug, Clone, PartialEq)]
pub struct FmgrInfo {
    pub fn_oid: u32,
    pub fn_name: String,
    /// Declared or resolved argument types, by position. May be shorter than
    /// the argument list when the caller could not resolve every type.
    pub arg_types: Vec<TypeTag>,
    pub ret_type: TypeTag,
}

/// Invocation context of one function call.
///
/// Owned by the caller for the duration of the call. Argument datums borrow
/// memory that lives at least as long (`'a`).
pub struct FunctionCallInfo<'a> {
    flinfo: &'a FmgrInfo,
    args: Vec<NullableDatum<'a>>,
    resolver: &'a dyn DescriptorResolver,
}

impl<'a> FunctionCallInfo<'a> {
    pub fn new(
        flinfo: &'a FmgrInfo,
        args: Vec<NullableDatum<'a>>,
        resolver: &'a dyn DescriptorResolver,
    ) -> Self {
        Self {
            flinfo,
            args,
            resolver,
        }
    }

    pub fn flinfo(&self) -> &'a FmgrInfo {
        self.flinfo
    }

    pub fn resolver(&self) -> &'a dyn DescriptorResolver {
        self.resolver
    }

    pub fn nargs(&self) -> usize {
        self.args.len()
    }

    pub fn arg(&self, i: usize) -> Option<NullableDatum<'a>> {
        self.args.get(i).copied()
    }

    pub fn is_arg_null(&self, i: usize) -> bool {
        self.args.get(i).is_some_and(|a| a.is_null)
    }

    /// Type of argument `i`, `TypeTag::INVALID` when it is not known.
    pub fn arg_type(&self, i: usize) -> TypeTag {
        self.flinfo
            .arg_types
            .get(i)
            .copied()
            .unwrap_or(TypeTag::INVALID)
    }
}

impl fmt::Debug for FunctionCallInfo<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionCallInfo")
            .field("fn_name", &self.flinfo.fn_name)
            .field("fn_oid", &self.flinfo.fn_oid)
            .field("nargs", &self.args.len())
            .finish_non_exhaustive()
    }
}
