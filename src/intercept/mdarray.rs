//! Arrays of rank two and up. The loader has no body for `Get`/`Set`/
//! `Address`/`.ctor`; each lowers to an index array literal plus one of the
//! runtime's `mdarray_*` primitives with a cast on the element pointer.

use crate::il::model::MethodRefDesc;
use crate::il::provider::MetadataProvider;
use crate::intercept::drain_call;
use crate::lift::MethodLifter;
use crate::names;

fn md_element(owner: &str) -> Option<String> {
    let rank = names::mdarray_rank(owner)?;
    if rank < 2 {
        return None;
    }
    names::array_element(owner).map(str::to_string)
}

pub(crate) fn try_call<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    let Some(element) = md_element(&mref.owner) else {
        return false;
    };
    let elem = lifter.decl_type(&element);
    match mref.name.as_str() {
        "Get" => {
            let indices = lifter.pop_args(mref.param_types.len());
            let array = lifter.pop();
            let rank = indices.len();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "int32_t {t}_idx[{rank}] = {{ {} }}; \
                 {elem} {t} = *({elem}*)cil2cpp::mdarray_get_element_ptr({array}, {rank}, {t}_idx);",
                indices.join(", ")
            ));
            lifter.push(t);
        }
        "Set" => {
            let mut args = lifter.pop_args(mref.param_types.len());
            let value = args.pop().unwrap_or_else(|| "0".to_string());
            let array = lifter.pop();
            let rank = args.len();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "int32_t {t}_idx[{rank}] = {{ {} }}; \
                 *({elem}*)cil2cpp::mdarray_get_element_ptr({array}, {rank}, {t}_idx) = ({value});",
                args.join(", ")
            ));
        }
        "Address" => {
            let indices = lifter.pop_args(mref.param_types.len());
            let array = lifter.pop();
            let rank = indices.len();
            let t = lifter.fresh();
            lifter.emit_raw(format!(
                "int32_t {t}_idx[{rank}] = {{ {} }}; \
                 {elem}* {t} = ({elem}*)cil2cpp::mdarray_get_element_ptr({array}, {rank}, {t}_idx);",
                indices.join(", ")
            ));
            lifter.push(t);
        }
        _ => drain_call(lifter, mref, "nullptr"),
    }
    true
}

pub(crate) fn try_newobj<P: MetadataProvider>(
    lifter: &mut MethodLifter<'_, P>,
    mref: &MethodRefDesc,
) -> bool {
    let Some(element) = md_element(&mref.owner) else {
        return false;
    };
    let elem = lifter.decl_type(&element);
    let dims = lifter.pop_args(mref.param_types.len());
    let rank = dims.len();
    let t = lifter.fresh();
    lifter.emit_raw(format!(
        "int32_t {t}_dims[{rank}] = {{ {} }}; \
         cil2cpp::MdArray* {t} = cil2cpp::mdarray_create({rank}, {t}_dims, sizeof({elem}));",
        dims.join(", ")
    ));
    lifter.push(t);
    true
}
