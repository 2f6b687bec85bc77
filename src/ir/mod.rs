//! The typed tree handed to the source emitter: modules, types, fields,
//! methods, basic blocks and the closed instruction set.

pub mod attributes;
pub mod debug;
pub mod instr;
pub mod module;

pub use attributes::CustomAttribute;
pub use debug::{dump_method, dump_module};
pub use instr::{BinOp, FieldRef, IrInstr, MethodRef, TypeRef};
pub use module::{
    IrBasicBlock, IrField, IrLocal, IrMethod, IrModule, IrParam, IrType, PrimitiveDesc,
};
