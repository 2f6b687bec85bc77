//! `Span<T>` and `ReadOnlySpan<T>`.
//!
//! Their real bodies live below the surface the loader can see, so the
//! specializer installs the synthetic `_reference`/`_length` pair and every
//! operation inlines against those two fields as one `RawCpp` fragment. The
//! indexer carries the unsigned-compare bounds check, `CopyTo` a length
//! check plus a byte-wise copy; nothing else ever mutates a span.

use crate::il::model::MethodRefDesc;
use crate::il::provider::MetadataProvider;
use crate::intercept::{READONLY_SPAN, SPAN, drain_call, member_access};
use crate::lift::MethodLifter;
use crate::names;

fn span_element(owner: &str) -> Option<String> {
    let (open, args) = names::generic_parts(owner)?;
    if open == SPAN || open == READONLY_SPAN {
        args.into_iter().next()
    } else {
        None
    }
}

pub(crate) fn try_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    let Some(element) = span_element(&mref.owner) else {
        return false;
    };
    lifter.request(&mref.owner);
    let span_ty = lifter.cpp_type(&mref.owner);
    let elem = lifter.decl_type(&element);

    match (mref.name.as_str(), mref.param_types.len()) {
        ("get_Length", 0) => {
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!("int32_t {t} = {this}f_length;"));
            lifter.push(t);
        }
        ("get_IsEmpty", 0) => {
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!("bool {t} = ({this}f_length == 0);"));
            lifter.push(t);
        }
        ("get_Item", 1) => {
            let index = lifter.pop();
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "if ((uint32_t)({index}) >= (uint32_t){this}f_length) cil2cpp::throw_index_out_of_range(); \
                 {elem}* {t} = ({elem}*){this}f_reference + ({index});"
            ));
            lifter.push(t);
        }
        ("Slice", 1) => {
            let start = lifter.pop();
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "{span_ty} {t} = {{}}; \
                 {t}.f_reference = {this}f_reference + (intptr_t)((size_t)({start}) * sizeof({elem})); \
                 {t}.f_length = {this}f_length - ({start});"
            ));
            lifter.push(t);
        }
        ("Slice", 2) => {
            let length = lifter.pop();
            let start = lifter.pop();
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "{span_ty} {t} = {{}}; \
                 {t}.f_reference = {this}f_reference + (intptr_t)((size_t)({start}) * sizeof({elem})); \
                 {t}.f_length = ({length});"
            ));
            lifter.push(t);
        }
        ("ToArray", 0) => {
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "cil2cpp::Array* {t} = cil2cpp::array_create(sizeof({elem}), {this}f_length); \
                 memcpy(cil2cpp::array_data({t}), (void*){this}f_reference, (size_t){this}f_length * sizeof({elem}));"
            ));
            lifter.push(t);
        }
        ("GetPinnableReference", 0) => {
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!("{elem}* {t} = ({elem}*){this}f_reference;"));
            lifter.push(t);
        }
        ("CopyTo", 1) => {
            // Destination is popped first, the receiver second.
            let dest = member_access(&lifter.pop());
            let this = member_access(&lifter.pop());
            lifter.emit_raw(format!(
                "if ({dest}f_length < {this}f_length) cil2cpp::throw_argument(); \
                 memcpy((void*){dest}f_reference, (void*){this}f_reference, (size_t){this}f_length * sizeof({elem}));"
            ));
        }
        ("Clear", 0) => {
            let this = member_access(&lifter.pop());
            lifter.emit_raw(format!(
                "memset((void*){this}f_reference, 0, (size_t){this}f_length * sizeof({elem}));"
            ));
        }
        ("Fill", 1) => {
            let value = lifter.pop();
            let this = member_access(&lifter.pop());
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "for (int32_t {t}_i = 0; {t}_i < {this}f_length; {t}_i++) (({elem}*){this}f_reference)[{t}_i] = ({value});"
            ));
        }
        _ => drain_call(lifter, mref, "{}"),
    }
    true
}

pub(crate) fn try_newobj<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    let Some(element) = span_element(&mref.owner) else {
        return false;
    };
    lifter.request(&mref.owner);
    let span_ty = lifter.cpp_type(&mref.owner);
    let elem = lifter.decl_type(&element);
    let t = lifter.fresh();
    match mref.param_types.len() {
        0 => {
            lifter.emit_raw(format!("{span_ty} {t} = {{}};"));
        }
        1 => {
            let array = lifter.pop();
            lifter.emit_raw(format!(
                "{span_ty} {t} = {{}}; \
                 {t}.f_reference = (intptr_t)cil2cpp::array_data({array}); \
                 {t}.f_length = ({array})->f_length;"
            ));
        }
        2 => {
            let length = lifter.pop();
            let pointer = lifter.pop();
            lifter.emit_raw(format!(
                "{span_ty} {t} = {{}}; \
                 {t}.f_reference = (intptr_t)({pointer}); \
                 {t}.f_length = ({length});"
            ));
        }
        _ => {
            let length = lifter.pop();
            let start = lifter.pop();
            let array = lifter.pop();
            lifter.emit_raw(format!(
                "{span_ty} {t} = {{}}; \
                 {t}.f_reference = (intptr_t)((char*)cil2cpp::array_data({array}) + (size_t)({start}) * sizeof({elem})); \
                 {t}.f_length = ({length});"
            ));
        }
    }
    lifter.push(t);
    true
}
