//! `CancellationTokenSource` and `CancellationToken`.
//!
//! The source is a synthetic reference type the runtime allocates through
//! `cts_create`; the token is a synthetic value type holding nothing but a
//! reference back to its source, so every token operation forwards that
//! field to the `ct_*` primitives.

use crate::il::model::MethodRefDesc;
use crate::il::provider::MetadataProvider;
use crate::intercept::{CANCELLATION_TOKEN, CTS, drain_call, member_access};
use crate::lift::MethodLifter;

pub(crate) fn try_source_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    if mref.owner != CTS {
        return false;
    }
    lifter.request(CTS);
    match (mref.name.as_str(), mref.param_types.len()) {
        ("get_Token", 0) => {
            let this = lifter.pop();
            lifter.request(CANCELLATION_TOKEN);
            let token_ty = lifter.cpp_type(CANCELLATION_TOKEN);
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "{token_ty} {t} = {{}}; {t}.f_source = (intptr_t)({this});"
            ));
            lifter.push(t);
        }
        ("get_IsCancellationRequested", 0) => {
            let this = lifter.pop();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "bool {t} = cil2cpp::cts_is_cancellation_requested({this});"
            ));
            lifter.push(t);
        }
        ("Cancel", 0) => {
            let this = lifter.pop();
            lifter.emit_raw(format!("cil2cpp::cts_cancel({this});"));
        }
        ("CancelAfter", 1) => {
            let delay = lifter.pop();
            let this = lifter.pop();
            lifter.emit_raw(format!("cil2cpp::cts_cancel_after({this}, ({delay}));"));
        }
        ("Dispose", 0) => {
            let this = lifter.pop();
            lifter.emit_raw(format!("cil2cpp::cts_dispose({this});"));
        }
        _ => drain_call(lifter, mref, "nullptr"),
    }
    true
}

pub(crate) fn try_source_newobj<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    if mref.owner != CTS {
        return false;
    }
    lifter.request(CTS);
    let ty = lifter.cpp_type(CTS);
    let delay = if mref.param_types.is_empty() {
        "-1".to_string()
    } else {
        let mut args = lifter.pop_args(mref.param_types.len());
        args.remove(0)
    };
    let t = lifter.fresh();
    lifter.emit_raw(format!("{ty}* {t} = ({ty}*)cil2cpp::cts_create(({delay}));"));
    lifter.push(t);
    true
}

pub(crate) fn try_token_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    if mref.owner != CANCELLATION_TOKEN {
        return false;
    }
    lifter.request(CANCELLATION_TOKEN);
    match (mref.name.as_str(), mref.param_types.len()) {
        ("get_IsCancellationRequested", 0) => {
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "bool {t} = cil2cpp::ct_is_cancellation_requested({this}f_source);"
            ));
            lifter.push(t);
        }
        ("get_CanBeCanceled", 0) => {
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "bool {t} = cil2cpp::ct_can_be_canceled({this}f_source);"
            ));
            lifter.push(t);
        }
        ("ThrowIfCancellationRequested", 0) => {
            let this = member_access(&lifter.pop());
            lifter.emit_raw(format!(
                "cil2cpp::ct_throw_if_cancellation_requested({this}f_source);"
            ));
        }
        ("get_None", 0) => {
            let token_ty = lifter.cpp_type(CANCELLATION_TOKEN);
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "{token_ty} {t} = {{}}; {t}.f_source = cil2cpp::ct_get_none();"
            ));
            lifter.push(t);
        }
        _ => drain_call(lifter, mref, "nullptr"),
    }
    true
}
