/*!
 * Guarded Attribute Dispatcher
 * The single entry point for attribute reads by restricted code
 */

use super::overrides::Resolved;
use crate::authority::context::ExecutionContext;
use crate::authority::traits::AccessRequest;
use crate::core::errors::{GuardError, GuardResult, NativeError};
use crate::core::limits::PRIVATE_ATTR_PREFIX;
use crate::value::{native_getattr, Value};
use tracing::{trace, warn};

/// Guarded `getattr(object, name)`
///
/// Private names are refused outright. Otherwise the override table for
/// the object's type decides; names it does not cover are read natively
/// and then put to the authority.
pub fn guarded_getattr(ctx: &ExecutionContext, object: &Value, name: &str) -> GuardResult<Value> {
    if name.starts_with(PRIVATE_ATTR_PREFIX) {
        warn!(context = %ctx.id(), name, "private attribute refused");
        return Err(GuardError::denied(name, "private attributes are not accessible"));
    }

    match ctx.overrides().resolve(object.type_key(), name) {
        Resolved::Allow => {
            trace!(name, type_name = object.type_name(), "override allows attribute");
            Ok(native_getattr(object, name)?)
        }
        Resolved::Redirect(factory) => {
            trace!(name, type_name = object.type_name(), "override redirects attribute");
            factory(ctx, object, name)
        }
        Resolved::Deny => Err(GuardError::denied(
            name,
            format!("'{}' objects do not expose this attribute", object.type_name()),
        )),
        Resolved::FallThrough => {
            let value = native_getattr(object, name)?;
            ctx.validate(&AccessRequest::attribute(object, name, &value))?;
            Ok(value)
        }
    }
}

/// Guarded `getattr(object, name, default)`
///
/// `default` replaces a missing attribute only; a refusal still surfaces.
pub fn guarded_getattr_or(ctx: &ExecutionContext, object: &Value, name: &str, default: Value) -> GuardResult<Value> {
    match guarded_getattr(ctx, object, name) {
        Err(GuardError::Native(NativeError::Attribute { .. })) => Ok(default),
        other => other,
    }
}

/// Guarded `hasattr(object, name)`
///
/// False for missing or refused attributes. A missing authority is still
/// an error.
pub fn guarded_hasattr(ctx: &ExecutionContext, object: &Value, name: &str) -> GuardResult<bool> {
    match guarded_getattr(ctx, object, name) {
        Ok(_) => Ok(true),
        Err(GuardError::Native(NativeError::Attribute { .. })) | Err(GuardError::Denied { .. }) => Ok(false),
        Err(err) => Err(err),
    }
}
