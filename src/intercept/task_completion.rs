//! `TaskCompletionSource<T>`.
//!
//! The synthesized source carries an `f_task` reference to a synthesized
//! `Task<T>` whose `f_result` field holds the outcome; the `tcs_*`
//! primitives own state transitions while result values are stored inline.

use crate::il::model::MethodRefDesc;
use crate::il::provider::MetadataProvider;
use crate::intercept::{TASK, TCS, drain_call};
use crate::lift::MethodLifter;
use crate::names;

fn result_type(owner: &str) -> Option<String> {
    let (open, args) = names::generic_parts(owner)?;
    if open == TCS { args.into_iter().next() } else { None }
}

fn task_name(result: &str) -> String {
    format!("{TASK}<{result}>")
}

pub(crate) fn try_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    let Some(result) = result_type(&mref.owner) else {
        return false;
    };
    let task_il = task_name(&result);
    lifter.request(&mref.owner);
    lifter.request(&task_il);
    let task_ty = lifter.cpp_type(&task_il);

    match (mref.name.as_str(), mref.param_types.len()) {
        ("get_Task", 0) => {
            let this = lifter.pop();
            let t = lifter.fresh();
            lifter.emit_raw(format!("{task_ty}* {t} = ({this})->f_task;"));
            lifter.push(t);
        }
        ("SetResult", 1) => {
            let value = lifter.pop();
            let this = lifter.pop();
            lifter.emit_raw(format!(
                "({this})->f_task->f_result = ({value}); cil2cpp::tcs_set_result(({this})->f_task);"
            ));
        }
        ("SetException", 1) => {
            let exception = lifter.pop();
            let this = lifter.pop();
            lifter.emit_raw(format!(
                "cil2cpp::tcs_set_exception(({this})->f_task, {exception});"
            ));
        }
        ("TrySetResult", 1) => {
            let value = lifter.pop();
            let this = lifter.pop();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "({this})->f_task->f_result = ({value}); \
                 bool {t} = cil2cpp::tcs_try_set_result(({this})->f_task);"
            ));
            lifter.push(t);
        }
        ("TrySetException", 1) => {
            let exception = lifter.pop();
            let this = lifter.pop();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "bool {t} = cil2cpp::tcs_try_set_exception(({this})->f_task, {exception});"
            ));
            lifter.push(t);
        }
        ("TrySetCanceled", n) => {
            let _ = lifter.pop_args(n);
            let this = lifter.pop();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "bool {t} = cil2cpp::tcs_try_set_canceled(({this})->f_task);"
            ));
            lifter.push(t);
        }
        ("SetCanceled", n) => {
            let _ = lifter.pop_args(n);
            let this = lifter.pop();
            lifter.emit_raw(format!("cil2cpp::tcs_set_canceled(({this})->f_task);"));
        }
        _ => drain_call(lifter, mref, "nullptr"),
    }
    true
}

pub(crate) fn try_newobj<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    let Some(result) = result_type(&mref.owner) else {
        return false;
    };
    let task_il = task_name(&result);
    lifter.request(&mref.owner);
    lifter.request(&task_il);
    let tcs_ty = lifter.cpp_type(&mref.owner);
    let task_ty = lifter.cpp_type(&task_il);
    // Every constructor overload behaves the same: state and options are the
    // runtime's business.
    let _ = lifter.pop_args(mref.param_types.len());
    let t = lifter.fresh();
    lifter.emit_raw(format!(
        "{tcs_ty}* {t} = ({tcs_ty}*)cil2cpp::gc::alloc(sizeof({tcs_ty})); \
         {t}->f_task = ({task_ty}*)cil2cpp::gc::alloc(sizeof({task_ty})); \
         cil2cpp::task_init_pending({t}->f_task);"
    ));
    lifter.push(t);
    true
}
