//! `System.Threading.Thread`, lowered onto the runtime's `thread::`
//! primitives through a synthetic handle field. `MemoryBarrier` is the one
//! exception: it emits a sequentially-consistent fence directly.

use crate::il::model::MethodRefDesc;
use crate::il::provider::MetadataProvider;
use crate::intercept::{THREAD, drain_call};
use crate::lift::MethodLifter;

pub(crate) fn try_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    if mref.owner != THREAD {
        return false;
    }
    lifter.request(THREAD);
    match (mref.name.as_str(), mref.param_types.len()) {
        ("Start", 0) => {
            let this = lifter.pop();
            lifter.emit_raw(format!("cil2cpp::thread::start(({this})->f_handle);"));
        }
        ("Join", 0) => {
            let this = lifter.pop();
            lifter.emit_raw(format!("cil2cpp::thread::join(({this})->f_handle);"));
        }
        ("Join", 1) => {
            let timeout = lifter.pop();
            let this = lifter.pop();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "bool {t} = cil2cpp::thread::join_timeout(({this})->f_handle, ({timeout}));"
            ));
            lifter.push(t);
        }
        ("get_IsAlive", 0) => {
            let this = lifter.pop();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "bool {t} = cil2cpp::thread::is_alive(({this})->f_handle);"
            ));
            lifter.push(t);
        }
        ("get_ManagedThreadId", 0) => {
            let this = lifter.pop();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "int32_t {t} = cil2cpp::thread::get_managed_id(({this})->f_handle);"
            ));
            lifter.push(t);
        }
        ("Sleep", 1) => {
            let timeout = lifter.pop();
            lifter.emit_raw(format!("cil2cpp::thread::sleep(({timeout}));"));
        }
        ("MemoryBarrier", 0) => {
            lifter.emit_raw("std::atomic_thread_fence(std::memory_order_seq_cst);".to_string());
        }
        _ => drain_call(lifter, mref, "nullptr"),
    }
    true
}

pub(crate) fn try_newobj<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    if mref.owner != THREAD {
        return false;
    }
    lifter.request(THREAD);
    let ty = lifter.cpp_type(THREAD);
    let mut args = lifter.pop_args(mref.param_types.len());
    let entry = if args.is_empty() {
        "nullptr".to_string()
    } else {
        args.remove(0)
    };
    let t = lifter.fresh();
    lifter.emit_raw(format!(
        "{ty}* {t} = ({ty}*)cil2cpp::gc::alloc(sizeof({ty})); \
         {t}->f_handle = cil2cpp::thread::create({entry});"
    ));
    lifter.push(t);
    true
}
