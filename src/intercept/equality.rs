//! `EqualityComparer<T>`.
//!
//! `get_Default` hands out a lazily allocated singleton parked in the
//! owner's statics block. `Equals`/`GetHashCode` split on whether `T` is a
//! value type; the explicit non-generic interface overloads always take the
//! object-based route. `IndexOf`/`LastIndexOf` unroll to linear-search
//! loops. Anything else pops its arguments and pushes the null literal so
//! lifting can continue.

use crate::il::model::MethodRefDesc;
use crate::il::provider::MetadataProvider;
use crate::intercept::{EQUALITY_COMPARER, drain_call};
use crate::lift::MethodLifter;
use crate::names;

fn comparand(owner: &str) -> Option<String> {
    let (open, args) = names::generic_parts(owner)?;
    if open == EQUALITY_COMPARER {
        args.into_iter().next()
    } else {
        None
    }
}

pub(crate) fn try_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    let Some(element) = comparand(&mref.owner) else {
        return false;
    };
    lifter.request(&mref.owner);
    let owner = lifter.cpp_type(&mref.owner);
    // The explicit IEqualityComparer overloads are typed over object and must
    // ignore what T happens to be.
    let object_route = !lifter.is_value_type(&element)
        || mref.name.contains('.')
        || mref.param_types.iter().any(|p| p == "System.Object");

    if mref.name == "get_Default" && mref.param_types.is_empty() {
        let t = lifter.fresh();
        lifter.emit_raw(format!(
            "if (!{owner}_statics.f_default) {owner}_statics.f_default = (cil2cpp::Object*)cil2cpp::gc::alloc(sizeof({owner})); \
             {owner}* {t} = ({owner}*){owner}_statics.f_default;"
        ));
        lifter.push(t);
        return true;
    }

    let plain_name = mref.name.rsplit('.').next().unwrap_or(&mref.name);
    match (plain_name, mref.param_types.len()) {
        ("Equals", 2) => {
            let y = lifter.pop();
            let x = lifter.pop();
            let _this = lifter.pop();
            let t = lifter.fresh();
            if object_route {
                lifter.emit_raw(format!(
                    "bool {t} = cil2cpp::object_equals((cil2cpp::Object*)({x}), (cil2cpp::Object*)({y}));"
                ));
            } else {
                lifter.emit_raw(format!("bool {t} = (({x}) == ({y}));"));
            }
            lifter.push(t);
        }
        ("GetHashCode", 1) => {
            let x = lifter.pop();
            let _this = lifter.pop();
            let t = lifter.fresh();
            if object_route {
                lifter.emit_raw(format!(
                    "int32_t {t} = cil2cpp::object_get_hash_code((cil2cpp::Object*)({x}));"
                ));
            } else {
                lifter.emit_raw(format!("int32_t {t} = (int32_t)({x});"));
            }
            lifter.push(t);
        }
        ("IndexOf", n) if n >= 2 => {
            emit_search(lifter, mref, &element, object_route, false);
        }
        ("LastIndexOf", n) if n >= 2 => {
            emit_search(lifter, mref, &element, object_route, true);
        }
        _ => drain_call(lifter, mref, "nullptr"),
    }
    true
}

fn emit_search<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
    element: &str,
    object_route: bool,
    backwards: bool,
) {
    let args = lifter.pop_args(mref.param_types.len());
    let _this = lifter.pop();
    let array = args[0].clone();
    let value = args[1].clone();
    let lo = args.get(2).cloned().unwrap_or_else(|| "0".to_string());
    let hi = match args.get(3) {
        Some(count) => format!("(({lo}) + ({count}))"),
        None => format!("({array})->f_length"),
    };
    let elem = lifter.decl_type(element);
    let t = lifter.fresh();
    let probe = format!("cil2cpp::array_get({array}, {t}_i)");
    let hit = if object_route {
        format!("cil2cpp::object_equals(*(cil2cpp::Object**){probe}, (cil2cpp::Object*)({value}))")
    } else {
        format!("(*({elem}*){probe} == ({value}))")
    };
    if backwards {
        lifter.emit_raw(format!(
            "int32_t {t} = -1; \
             for (int32_t {t}_i = {hi} - 1; {t}_i >= ({lo}); {t}_i--) {{ if ({hit}) {{ {t} = {t}_i; break; }} }}"
        ));
    } else {
        lifter.emit_raw(format!(
            "int32_t {t} = -1; \
             for (int32_t {t}_i = ({lo}); {t}_i < {hi}; {t}_i++) {{ if ({hit}) {{ {t} = {t}_i; break; }} }}"
        ));
    }
    lifter.push(t);
}
