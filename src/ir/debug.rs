use std::fmt::Write as _;

use crate::ir::instr::IrInstr;
use crate::ir::module::{IrBasicBlock, IrMethod, IrModule, IrType};

/// Renders a module as deterministic text. Meant for logs and test
/// snapshots, not for the emitter.
pub fn dump_module(m: &IrModule) -> String {
    let mut s = String::new();
    let _ = writeln!(&mut s, "module: {} types", m.types.len());
    for ty in &m.types {
        s.push_str(&dump_type(ty));
    }
    s
}

pub fn dump_type(ty: &IrType) -> String {
    let mut s = String::new();
    let kind = match (ty.is_interface, ty.is_value_type) {
        (true, _) => "interface",
        (_, true) => "struct",
        _ => "class",
    };
    let _ = writeln!(&mut s, "{} {} ({})", kind, ty.cpp_name, ty.il_name);
    for f in &ty.fields {
        let _ = writeln!(&mut s, "  field {}: {}", f.cpp_name, f.field_type);
    }
    for f in &ty.static_fields {
        let _ = writeln!(&mut s, "  static field {}: {}", f.cpp_name, f.field_type);
    }
    for m in &ty.methods {
        s.push_str(&dump_method(m));
    }
    s
}

pub fn dump_method(m: &IrMethod) -> String {
    let mut s = String::new();
    let params = m
        .params
        .iter()
        .map(|p| format!("{}: {}", p.name, p.param_type))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(&mut s, "  fn {}({}) -> {}", m.cpp_name, params, m.return_type);
    for b in &m.blocks {
        s.push_str(&dump_block(b));
    }
    s
}

pub fn dump_block(b: &IrBasicBlock) -> String {
    let mut s = String::new();
    let _ = writeln!(&mut s, "    block IL_{:04X}:", b.label);
    for i in &b.instructions {
        let _ = writeln!(&mut s, "      {}", fmt_instr(i));
    }
    s
}

fn fmt_instr(i: &IrInstr) -> String {
    match i {
        IrInstr::Local { name, cpp_type, init } => match init {
            Some(init) => format!("local {name}: {cpp_type} = {init}"),
            None => format!("local {name}: {cpp_type}"),
        },
        IrInstr::Assign { dst, src } => format!("{dst} = {src}"),
        IrInstr::Binary { op, dst, lhs, rhs } => {
            format!("{dst} = {lhs} {} {rhs}", op.token())
        }
        IrInstr::LoadString { dst, value } => format!("{dst} = string {value:?}"),
        IrInstr::LoadField { dst, object, field } => match object {
            Some(object) => format!("{dst} = {object}.{}", field.cpp_name),
            None => format!("{dst} = static {}::{}", field.owner, field.cpp_name),
        },
        IrInstr::StoreField { object, field, value } => match object {
            Some(object) => format!("{object}.{} = {value}", field.cpp_name),
            None => format!("static {}::{} = {value}", field.owner, field.cpp_name),
        },
        IrInstr::LoadElement { dst, array, index, element } => {
            format!("{dst} = {array}[{index}] as {element}")
        }
        IrInstr::StoreElement { array, index, value, element } => {
            format!("{array}[{index}] = {value} as {element}")
        }
        IrInstr::NewArray { dst, element, length } => {
            format!("{dst} = newarr {}[{length}]", element.cpp_name)
        }
        IrInstr::NewObject { dst, ty, ctor, args } => {
            format!("{dst} = new {} via {}({})", ty.cpp_name, ctor.cpp_name, args.join(", "))
        }
        IrInstr::Call { dst, method, args, .. } => match dst {
            Some(dst) => format!("{dst} = call {}({})", method.cpp_name, args.join(", ")),
            None => format!("call {}({})", method.cpp_name, args.join(", ")),
        },
        IrInstr::Box { dst, ty, value } => format!("{dst} = box {} {value}", ty.cpp_name),
        IrInstr::Unbox { dst, ty, value } => format!("{dst} = unbox {} {value}", ty.cpp_name),
        IrInstr::CastClass { dst, ty, value } => {
            format!("{dst} = cast {} {value}", ty.cpp_name)
        }
        IrInstr::IsInst { dst, ty, value } => format!("{dst} = isinst {} {value}", ty.cpp_name),
        IrInstr::Jump { target } => format!("jump IL_{target:04X}"),
        IrInstr::BranchIf { cond, target } => format!("if {cond} jump IL_{target:04X}"),
        IrInstr::Switch { value, targets } => {
            let targets = targets
                .iter()
                .map(|t| format!("IL_{t:04X}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!("switch {value} [{targets}]")
        }
        IrInstr::Return { value } => match value {
            Some(value) => format!("return {value}"),
            None => "return".to_string(),
        },
        IrInstr::Throw { value } => format!("throw {value}"),
        IrInstr::Rethrow => "rethrow".to_string(),
        IrInstr::Leave { target } => format!("leave IL_{target:04X}"),
        IrInstr::EndFinally => "endfinally".to_string(),
        IrInstr::EndFilter { value } => format!("endfilter {value}"),
        IrInstr::RawCpp(text) => format!("cpp {{ {text} }}"),
    }
}
