//! The closed interception catalogue.
//!
//! These runtime-library types have no IL bodies in any loadable assembly;
//! calls, constructions and field accesses that target them are replaced
//! with inline C++ over the frozen runtime primitive surface instead of
//! being lifted. Dispatch order is fixed: multi-dimensional arrays, spans,
//! thread, cancellation source, cancellation token, task-completion source,
//! equality comparer; the first matching predicate owns the call.

mod cancellation;
mod equality;
mod mdarray;
mod span;
mod task_completion;
mod thread;

use crate::il::model::MethodRefDesc;
use crate::il::provider::MetadataProvider;
use crate::lift::MethodLifter;
use crate::names;

pub const SPAN: &str = "System.Span`1";
pub const READONLY_SPAN: &str = "System.ReadOnlySpan`1";
pub const THREAD: &str = "System.Threading.Thread";
pub const CTS: &str = "System.Threading.CancellationTokenSource";
pub const CANCELLATION_TOKEN: &str = "System.Threading.CancellationToken";
pub const TCS: &str = "System.Threading.Tasks.TaskCompletionSource`1";
pub const TASK: &str = "System.Threading.Tasks.Task`1";
pub const EQUALITY_COMPARER: &str = "System.Collections.Generic.EqualityComparer`1";

pub(crate) fn try_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    mdarray::try_call(lifter, mref)
        || span::try_call(lifter, mref)
        || thread::try_call(lifter, mref)
        || cancellation::try_source_call(lifter, mref)
        || cancellation::try_token_call(lifter, mref)
        || task_completion::try_call(lifter, mref)
        || equality::try_call(lifter, mref)
}

pub(crate) fn try_newobj<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    mdarray::try_newobj(lifter, mref)
        || span::try_newobj(lifter, mref)
        || thread::try_newobj(lifter, mref)
        || cancellation::try_source_newobj(lifter, mref)
        || task_completion::try_newobj(lifter, mref)
}

/// Whether the IL name belongs to the catalogue.
pub fn is_intercepted_type(il_name: &str) -> bool {
    if names::mdarray_rank(il_name).is_some_and(|rank| rank >= 2) {
        return true;
    }
    if matches!(il_name, THREAD | CTS | CANCELLATION_TOKEN) {
        return true;
    }
    match names::generic_parts(il_name) {
        Some((open, _)) => {
            matches!(open.as_str(), SPAN | READONLY_SPAN | TCS | EQUALITY_COMPARER)
        }
        None => false,
    }
}

/// Catalogued types that are value types (spans and the cancellation token);
/// the mapper may not have them registered yet when a body mentions them
/// for the first time.
pub fn is_builtin_value_type(il_name: &str) -> bool {
    if il_name == CANCELLATION_TOKEN {
        return true;
    }
    matches!(names::generic_parts(il_name),
        Some((open, _)) if open == SPAN || open == READONLY_SPAN)
}

/// Member access through an expression that is either a value or an address.
/// Address-of expressions the lifter pushes all start with `(&`; anything
/// else denotes the value itself.
pub(crate) fn member_access(expr: &str) -> String {
    if expr.starts_with("(&") {
        format!("({expr})->")
    } else {
        format!("({expr}).")
    }
}

/// Drains an unrecognized call's operands and pushes a placeholder result so
/// lifting can continue.
pub(crate) fn drain_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
    placeholder: &str,
) {
    let mut n = mref.param_types.len();
    if mref.has_this {
        n += 1;
    }
    let _ = lifter.pop_args(n);
    if mref.return_type != "System.Void" && !mref.return_type.is_empty() {
        lifter.push(placeholder.to_string());
    }
}
