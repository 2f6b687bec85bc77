use std::collections::BTreeSet;

use log::trace;

use crate::errors::LiftError;
use crate::il::body::{BodyDesc, HandlerKind};
use crate::il::model::{AssemblyHandle, MethodDesc, MethodHandle, Token};
use crate::il::opcode::{ConvTarget, ElemKind, OpCode};
use crate::il::provider::MetadataProvider;
use crate::intercept;
use crate::ir::instr::{BinOp, FieldRef, IrInstr, MethodRef, TypeRef};
use crate::ir::module::{IrBasicBlock, IrLocal};
use crate::names::{self, NameMapper};

/// Output of lifting one method body.
#[derive(Debug)]
pub struct Lifted {
    pub blocks: Vec<IrBasicBlock>,
    pub locals: Vec<IrLocal>,
    /// Closed generic instantiations the body touched; the builder hands
    /// these to the specializer.
    pub requested: Vec<String>,
}

/// Lifts one method body by simulating the IL evaluation stack with native
/// expression strings.
///
/// Every entry on the stack is a self-contained expression: a temporary, a
/// literal or a parenthesized compound. Opcodes pop and push expressions and
/// append typed instructions to the current basic block; interception owns
/// the transformation whenever a call, construction or field access targets
/// one of the catalogued built-ins. When the stack comes up short (corrupt
/// input, or an interception mismatched on arity upstream) a zero literal
/// stands in and lifting continues.
pub fn lift_method<P: MetadataProvider>(
    provider: &P,
    mapper: &NameMapper,
    method: &MethodHandle,
    desc: &MethodDesc,
    body: &BodyDesc,
) -> Result<Lifted, LiftError> {
    let mut lifter = MethodLifter::new(provider, mapper, method.assembly, desc, body);
    for (offset, op) in &body.instructions {
        lifter.begin_block_if_needed(*offset);
        lifter.step(*offset, op)?;
    }
    Ok(Lifted {
        blocks: lifter.blocks,
        locals: lifter.locals,
        requested: lifter.requested,
    })
}

pub struct MethodLifter<'a, P: MetadataProvider> {
    provider: &'a P,
    mapper: &'a NameMapper,
    assembly: AssemblyHandle,
    desc: &'a MethodDesc,
    body: &'a BodyDesc,
    stack: Vec<String>,
    temp: u32,
    blocks: Vec<IrBasicBlock>,
    starts: BTreeSet<u32>,
    locals: Vec<IrLocal>,
    arg_names: Vec<String>,
    requested: Vec<String>,
    constrained: Option<String>,
}

impl<'a, P: MetadataProvider> MethodLifter<'a, P> {
    fn new(
        provider: &'a P,
        mapper: &'a NameMapper,
        assembly: AssemblyHandle,
        desc: &'a MethodDesc,
        body: &'a BodyDesc,
    ) -> Self {
        let locals = body
            .locals
            .iter()
            .enumerate()
            .map(|(i, l)| IrLocal {
                name: l
                    .name
                    .as_deref()
                    .map(NameMapper::cpp_identifier)
                    .unwrap_or_else(|| format!("loc{i}")),
                local_type: l.local_type.clone(),
                address_taken: false,
            })
            .collect();

        let mut arg_names = Vec::new();
        if desc.has_this {
            arg_names.push("__this".to_string());
        }
        for (i, p) in desc.params.iter().enumerate() {
            if p.name.is_empty() {
                arg_names.push(format!("a{i}"));
            } else {
                arg_names.push(NameMapper::cpp_identifier(&p.name));
            }
        }

        let mut starts = BTreeSet::new();
        starts.insert(0);
        for (_, op) in &body.instructions {
            for target in op.branch_targets() {
                starts.insert(target);
            }
        }
        for region in &body.exception_regions {
            starts.insert(region.try_offset);
            starts.insert(region.try_offset + region.try_length);
            starts.insert(region.handler_offset);
            starts.insert(region.handler_offset + region.handler_length);
            if let Some(filter) = region.filter_offset {
                starts.insert(filter);
            }
        }

        Self {
            provider,
            mapper,
            assembly,
            desc,
            body,
            stack: Vec::new(),
            temp: 0,
            blocks: vec![IrBasicBlock::default()],
            starts,
            locals,
            arg_names,
            requested: Vec::new(),
            constrained: None,
        }
    }

    fn begin_block_if_needed(&mut self, offset: u32) {
        if !self.starts.contains(&offset) {
            return;
        }
        let current = self.blocks.last().expect("at least one block");
        if current.label == offset {
            return;
        }
        self.blocks.push(IrBasicBlock {
            label: offset,
            instructions: Vec::new(),
        });
        // A catch or filter handler begins with the caught exception on the
        // stack; the emitter binds it as __ex.
        for region in &self.body.exception_regions {
            let enters_handler = region.handler_offset == offset
                && matches!(region.kind, HandlerKind::Catch | HandlerKind::Filter);
            let enters_filter = region.filter_offset == Some(offset);
            if enters_handler || enters_filter {
                self.stack.push("__ex".to_string());
                break;
            }
        }
    }

    // ---- stack and emission helpers, shared with the interception tables ----

    pub(crate) fn pop(&mut self) -> String {
        match self.stack.pop() {
            Some(expr) => expr,
            None => {
                trace!("evaluation stack underflow, substituting 0");
                "0".to_string()
            }
        }
    }

    /// Pops `n` operands, returning them in push (left-to-right) order.
    pub(crate) fn pop_args(&mut self, n: usize) -> Vec<String> {
        let mut args = Vec::with_capacity(n);
        for _ in 0..n {
            args.push(self.pop());
        }
        args.reverse();
        args
    }

    pub(crate) fn push(&mut self, expr: impl Into<String>) {
        self.stack.push(expr.into());
    }

    pub(crate) fn fresh(&mut self) -> String {
        let name = format!("t{}", self.temp);
        self.temp += 1;
        name
    }

    pub(crate) fn emit(&mut self, instr: IrInstr) {
        self.blocks
            .last_mut()
            .expect("at least one block")
            .instructions
            .push(instr);
    }

    pub(crate) fn emit_raw(&mut self, text: String) {
        self.emit(IrInstr::RawCpp(text));
    }

    pub(crate) fn request(&mut self, il_name: &str) {
        if !self.requested.iter().any(|r| r == il_name) {
            self.requested.push(il_name.to_string());
        }
    }

    pub(crate) fn cpp_type(&self, il_name: &str) -> String {
        self.mapper.cpp_type(il_name, true)
    }

    pub(crate) fn decl_type(&self, il_name: &str) -> String {
        self.mapper.cpp_declaration_type(il_name)
    }

    pub(crate) fn default_literal(&self, il_name: &str) -> String {
        if intercept::is_builtin_value_type(il_name) {
            return "{}".to_string();
        }
        self.mapper.default_literal(il_name)
    }

    pub(crate) fn is_value_type(&self, il_name: &str) -> bool {
        if intercept::is_builtin_value_type(il_name) {
            return true;
        }
        self.mapper.is_value_type(il_name)
    }

    // ---- opcode dispatch ----

    fn step(&mut self, offset: u32, op: &OpCode) -> Result<(), LiftError> {
        match op {
            OpCode::Nop | OpCode::Break => {}

            OpCode::LdArg(i) => {
                let name = self.arg_name(*i);
                self.push(name);
            }
            OpCode::LdArgA(i) => {
                let name = self.arg_name(*i);
                self.push(format!("(&{name})"));
            }
            OpCode::StArg(i) => {
                let value = self.pop();
                let name = self.arg_name(*i);
                self.emit(IrInstr::Assign { dst: name, src: value });
            }
            OpCode::LdLoc(i) => {
                let name = self.local_name(*i);
                self.push(name);
            }
            OpCode::LdLocA(i) => {
                let name = self.local_name(*i);
                if let Some(local) = self.locals.get_mut(*i as usize) {
                    local.address_taken = true;
                }
                self.push(format!("(&{name})"));
            }
            OpCode::StLoc(i) => {
                let value = self.pop();
                let name = self.local_name(*i);
                self.emit(IrInstr::Assign { dst: name, src: value });
            }

            OpCode::LdNull => self.push("nullptr"),
            OpCode::LdcI4(v) => self.push(v.to_string()),
            OpCode::LdcI8(v) => self.push(format!("{v}LL")),
            OpCode::LdcR4(v) => {
                if v.is_finite() {
                    self.push(format!("{v:?}f"));
                } else {
                    self.push("0.0f");
                }
            }
            OpCode::LdcR8(v) => {
                if v.is_finite() {
                    self.push(format!("{v:?}"));
                } else {
                    self.push("0.0");
                }
            }
            OpCode::LdStr(value) => {
                let dst = self.fresh();
                self.emit(IrInstr::LoadString {
                    dst: dst.clone(),
                    value: value.clone(),
                });
                self.push(dst);
            }

            OpCode::Dup => {
                let expr = self.pop();
                if is_simple(&expr) {
                    self.push(expr.clone());
                    self.push(expr);
                } else {
                    let dst = self.fresh();
                    self.emit(IrInstr::Local {
                        name: dst.clone(),
                        cpp_type: "auto".to_string(),
                        init: Some(expr),
                    });
                    self.push(dst.clone());
                    self.push(dst);
                }
            }
            OpCode::Pop => {
                let _ = self.pop();
            }

            OpCode::Call(t) | OpCode::CallVirt(t) => self.do_call(*t),
            OpCode::NewObj(t) => self.do_newobj(*t),
            OpCode::CallI(t) => self.do_calli(*t),
            OpCode::Jmp(t) => self.do_jmp(*t),

            OpCode::Ret => {
                let value = if self.returns_value() {
                    Some(self.pop())
                } else {
                    None
                };
                self.emit(IrInstr::Return { value });
            }

            OpCode::Br(t) => self.emit(IrInstr::Jump { target: *t }),
            OpCode::BrFalse(t) => {
                let v = self.pop();
                self.emit(IrInstr::BranchIf {
                    cond: format!("(!({v}))"),
                    target: *t,
                });
            }
            OpCode::BrTrue(t) => {
                let v = self.pop();
                self.emit(IrInstr::BranchIf {
                    cond: format!("({v})"),
                    target: *t,
                });
            }
            OpCode::Beq(t) => self.branch_cmp("==", *t, false),
            OpCode::Bge(t) => self.branch_cmp(">=", *t, false),
            OpCode::Bgt(t) => self.branch_cmp(">", *t, false),
            OpCode::Ble(t) => self.branch_cmp("<=", *t, false),
            OpCode::Blt(t) => self.branch_cmp("<", *t, false),
            OpCode::BneUn(t) => self.branch_cmp("!=", *t, false),
            OpCode::BgeUn(t) => self.branch_cmp(">=", *t, true),
            OpCode::BgtUn(t) => self.branch_cmp(">", *t, true),
            OpCode::BleUn(t) => self.branch_cmp("<=", *t, true),
            OpCode::BltUn(t) => self.branch_cmp("<", *t, true),
            OpCode::Switch(targets) => {
                let value = self.pop();
                self.emit(IrInstr::Switch {
                    value,
                    targets: targets.clone(),
                });
            }

            OpCode::LdInd(kind) => {
                let addr = self.pop();
                let ty = elem_cpp(*kind);
                self.push(format!("(*({ty}*)({addr}))"));
            }
            OpCode::StInd(kind) => {
                let value = self.pop();
                let addr = self.pop();
                let ty = elem_cpp(*kind);
                self.emit(IrInstr::Assign {
                    dst: format!("*({ty}*)({addr})"),
                    src: value,
                });
            }

            OpCode::Add => self.binary("+", false),
            OpCode::Sub => self.binary("-", false),
            OpCode::Mul => self.binary("*", false),
            OpCode::Div => self.binary("/", false),
            OpCode::DivUn => self.binary("/", true),
            OpCode::Rem => self.binary("%", false),
            OpCode::RemUn => self.binary("%", true),
            OpCode::And => self.binary("&", false),
            OpCode::Or => self.binary("|", false),
            OpCode::Xor => self.binary("^", false),
            OpCode::Shl => self.binary("<<", false),
            OpCode::Shr => self.binary(">>", false),
            OpCode::ShrUn => self.binary(">>", true),
            OpCode::Neg => {
                let v = self.pop();
                self.push(format!("(-({v}))"));
            }
            OpCode::Not => {
                let v = self.pop();
                self.push(format!("(~({v}))"));
            }

            // The overflow-checked family materializes into a temporary so a
            // later pass (or the runtime) can hang a check off it.
            OpCode::AddOvf | OpCode::AddOvfUn => self.binary_ovf(BinOp::Add),
            OpCode::SubOvf | OpCode::SubOvfUn => self.binary_ovf(BinOp::Sub),
            OpCode::MulOvf | OpCode::MulOvfUn => self.binary_ovf(BinOp::Mul),

            OpCode::Conv(target) | OpCode::ConvOvf(target) | OpCode::ConvOvfUn(target) => {
                let v = self.pop();
                let ty = conv_cpp(*target);
                self.push(format!("(({ty})({v}))"));
            }

            OpCode::Ceq => self.compare("==", false),
            OpCode::Cgt => self.compare(">", false),
            OpCode::CgtUn => self.compare(">", true),
            OpCode::Clt => self.compare("<", false),
            OpCode::CltUn => self.compare("<", true),

            OpCode::LdFld(t) => {
                let Some(fref) = self.provider.field_ref(self.assembly, *t) else {
                    return Ok(());
                };
                if names::generic_parts(&fref.owner).is_some() {
                    self.request(&fref.owner);
                }
                let object = self.pop();
                let dst = self.fresh();
                self.emit(IrInstr::LoadField {
                    dst: dst.clone(),
                    object: Some(object),
                    field: field_ref(&fref),
                });
                self.push(dst);
            }
            OpCode::LdFldA(t) => {
                let Some(fref) = self.provider.field_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let object = self.pop();
                let name = NameMapper::cpp_field_name(&fref.name);
                self.push(format!("(&({object})->{name})"));
            }
            OpCode::StFld(t) => {
                let Some(fref) = self.provider.field_ref(self.assembly, *t) else {
                    return Ok(());
                };
                if names::generic_parts(&fref.owner).is_some() {
                    self.request(&fref.owner);
                }
                let value = self.pop();
                let object = self.pop();
                self.emit(IrInstr::StoreField {
                    object: Some(object),
                    field: field_ref(&fref),
                    value,
                });
            }
            OpCode::LdSFld(t) => {
                let Some(fref) = self.provider.field_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let dst = self.fresh();
                self.emit(IrInstr::LoadField {
                    dst: dst.clone(),
                    object: None,
                    field: field_ref(&fref),
                });
                self.push(dst);
            }
            OpCode::LdSFldA(t) => {
                let Some(fref) = self.provider.field_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let owner = self.cpp_type(&fref.owner);
                let name = NameMapper::cpp_field_name(&fref.name);
                self.push(format!("(&{owner}_statics.{name})"));
            }
            OpCode::StSFld(t) => {
                let Some(fref) = self.provider.field_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let value = self.pop();
                self.emit(IrInstr::StoreField {
                    object: None,
                    field: field_ref(&fref),
                    value,
                });
            }

            OpCode::NewArr(t) => {
                let Some(element) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let length = self.pop();
                let dst = self.fresh();
                let cpp = self.cpp_type(&element);
                self.emit(IrInstr::NewArray {
                    dst: dst.clone(),
                    element: TypeRef {
                        il_name: element,
                        cpp_name: cpp,
                    },
                    length,
                });
                self.push(dst);
            }
            OpCode::LdLen => {
                let array = self.pop();
                self.push(format!("({array})->f_length"));
            }
            OpCode::LdElemA(t) => {
                let Some(element) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let index = self.pop();
                let array = self.pop();
                let ty = self.decl_type(&element);
                self.push(format!(
                    "(({ty}*)cil2cpp::array_data({array}) + ({index}))"
                ));
            }
            OpCode::LdElem(kind) => {
                let index = self.pop();
                let array = self.pop();
                let dst = self.fresh();
                self.emit(IrInstr::LoadElement {
                    dst: dst.clone(),
                    array,
                    index,
                    element: elem_cpp(*kind).to_string(),
                });
                self.push(dst);
            }
            OpCode::LdElemAny(t) => {
                let index = self.pop();
                let array = self.pop();
                let element = self
                    .provider
                    .type_ref(self.assembly, *t)
                    .map(|il| self.decl_type(&il))
                    .unwrap_or_else(|| "cil2cpp::Object*".to_string());
                let dst = self.fresh();
                self.emit(IrInstr::LoadElement {
                    dst: dst.clone(),
                    array,
                    index,
                    element,
                });
                self.push(dst);
            }
            OpCode::StElem(kind) => {
                let value = self.pop();
                let index = self.pop();
                let array = self.pop();
                self.emit(IrInstr::StoreElement {
                    array,
                    index,
                    value,
                    element: elem_cpp(*kind).to_string(),
                });
            }
            OpCode::StElemAny(t) => {
                let value = self.pop();
                let index = self.pop();
                let array = self.pop();
                let element = self
                    .provider
                    .type_ref(self.assembly, *t)
                    .map(|il| self.decl_type(&il))
                    .unwrap_or_else(|| "cil2cpp::Object*".to_string());
                self.emit(IrInstr::StoreElement {
                    array,
                    index,
                    value,
                    element,
                });
            }

            OpCode::CastClass(t) => self.cast_like(*t, false),
            OpCode::IsInst(t) => self.cast_like(*t, true),
            OpCode::Box(t) => {
                let Some(il) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let value = self.pop();
                let dst = self.fresh();
                let cpp = self.cpp_type(&il);
                self.emit(IrInstr::Box {
                    dst: dst.clone(),
                    ty: TypeRef {
                        il_name: il,
                        cpp_name: cpp,
                    },
                    value,
                });
                self.push(dst);
            }
            OpCode::Unbox(t) | OpCode::UnboxAny(t) => {
                let Some(il) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let value = self.pop();
                let dst = self.fresh();
                let cpp = self.cpp_type(&il);
                self.emit(IrInstr::Unbox {
                    dst: dst.clone(),
                    ty: TypeRef {
                        il_name: il,
                        cpp_name: cpp,
                    },
                    value,
                });
                if matches!(op, OpCode::Unbox(_)) {
                    self.push(format!("(&{dst})"));
                } else {
                    self.push(dst);
                }
            }

            OpCode::LdObj(t) => {
                let Some(il) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let addr = self.pop();
                let ty = self.decl_type(&il);
                self.push(format!("(*({ty}*)({addr}))"));
            }
            OpCode::StObj(t) => {
                let Some(il) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let value = self.pop();
                let addr = self.pop();
                let ty = self.decl_type(&il);
                self.emit(IrInstr::Assign {
                    dst: format!("*({ty}*)({addr})"),
                    src: value,
                });
            }
            OpCode::CpObj(t) => {
                let Some(il) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let src = self.pop();
                let dst = self.pop();
                let ty = self.decl_type(&il);
                self.emit(IrInstr::Assign {
                    dst: format!("*({ty}*)({dst})"),
                    src: format!("(*({ty}*)({src}))"),
                });
            }
            OpCode::InitObj(t) => {
                let Some(il) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                if names::generic_parts(&il).is_some() {
                    self.request(&il);
                }
                let addr = self.pop();
                let ty = self.decl_type(&il);
                let zero = self.default_literal(&il);
                self.emit(IrInstr::Assign {
                    dst: format!("*({ty}*)({addr})"),
                    src: zero,
                });
            }
            OpCode::SizeOf(t) => {
                let Some(il) = self.provider.type_ref(self.assembly, *t) else {
                    return Ok(());
                };
                let ty = self.decl_type(&il);
                self.push(format!("sizeof({ty})"));
            }

            OpCode::Throw => {
                let value = self.pop();
                self.emit(IrInstr::Throw { value });
                self.stack.clear();
            }
            OpCode::Rethrow => {
                self.emit(IrInstr::Rethrow);
                self.stack.clear();
            }
            OpCode::Leave(t) => {
                self.stack.clear();
                self.emit(IrInstr::Leave { target: *t });
            }
            OpCode::EndFinally => {
                self.stack.clear();
                self.emit(IrInstr::EndFinally);
            }
            OpCode::EndFilter => {
                let value = self.pop();
                self.emit(IrInstr::EndFilter { value });
                self.stack.clear();
            }

            OpCode::LdFtn(t) => {
                if let Some(mref) = self.provider.method_ref(self.assembly, *t) {
                    let owner = self.cpp_type(&mref.owner);
                    let name = NameMapper::cpp_method_name(&owner, &mref.name);
                    self.push(format!("((void*)&{name})"));
                }
            }
            OpCode::LdVirtFtn(t) => {
                let _object = self.pop();
                if let Some(mref) = self.provider.method_ref(self.assembly, *t) {
                    let owner = self.cpp_type(&mref.owner);
                    let name = NameMapper::cpp_method_name(&owner, &mref.name);
                    self.push(format!("((void*)&{name})"));
                }
            }

            OpCode::LdToken(_) => self.push("0"),
            OpCode::ArgList => self.push("nullptr"),
            OpCode::MkRefAny(_) | OpCode::RefAnyVal(_) => {
                let _ = self.pop();
                self.push("nullptr");
            }
            OpCode::RefAnyType => {
                let _ = self.pop();
                self.push("0");
            }
            OpCode::CkFinite => {
                let v = self.pop();
                self.push(v);
            }
            OpCode::LocAlloc => {
                let size = self.pop();
                self.push(format!("alloca({size})"));
            }
            OpCode::InitBlk => {
                let size = self.pop();
                let value = self.pop();
                let addr = self.pop();
                self.emit_raw(format!(
                    "memset((void*)({addr}), (int)({value}), (size_t)({size}));"
                ));
            }
            OpCode::CpBlk => {
                let size = self.pop();
                let src = self.pop();
                let dst = self.pop();
                self.emit_raw(format!(
                    "memcpy((void*)({dst}), (void*)({src}), (size_t)({size}));"
                ));
            }

            OpCode::Constrained(t) => {
                self.constrained = self.provider.type_ref(self.assembly, *t);
            }
            OpCode::Volatile | OpCode::Unaligned(_) | OpCode::Tail | OpCode::Readonly => {}

            OpCode::Unknown(opcode) => {
                return Err(LiftError::UnknownOpCode {
                    opcode: *opcode,
                    offset,
                });
            }
        }
        Ok(())
    }

    // ---- call family ----

    fn do_call(&mut self, token: Token) {
        let Some(mref) = self.provider.method_ref(self.assembly, token) else {
            return;
        };
        let constrained = self.constrained.take();
        if intercept::try_call(self, &mref) {
            return;
        }
        if names::generic_parts(&mref.owner).is_some() {
            self.request(&mref.owner);
        }
        let mut args = self.pop_args(mref.param_types.len());
        if mref.has_this {
            let this = self.pop();
            // Under a constrained prefix the receiver is an address; value
            // types take it as-is, reference types get one dereference.
            let this = match constrained {
                Some(c) if !self.is_value_type(&c) => format!("(*({this}))"),
                _ => this,
            };
            args.insert(0, this);
        }
        let owner = self.cpp_type(&mref.owner);
        let cpp_name = NameMapper::cpp_method_name(&owner, &mref.name);
        let dst = if mref.return_type != "System.Void" && !mref.return_type.is_empty() {
            let dst = self.fresh();
            self.push(dst.clone());
            Some(dst)
        } else {
            None
        };
        self.emit(IrInstr::Call {
            dst,
            method: MethodRef {
                owner: mref.owner.clone(),
                name: mref.name.clone(),
                cpp_name,
            },
            return_type: mref.return_type.clone(),
            args,
        });
    }

    fn do_newobj(&mut self, token: Token) {
        let Some(mref) = self.provider.method_ref(self.assembly, token) else {
            return;
        };
        if intercept::try_newobj(self, &mref) {
            return;
        }
        if names::generic_parts(&mref.owner).is_some() {
            self.request(&mref.owner);
        }
        let args = self.pop_args(mref.param_types.len());
        let owner_cpp = self.cpp_type(&mref.owner);
        let dst = self.fresh();
        self.emit(IrInstr::NewObject {
            dst: dst.clone(),
            ty: TypeRef {
                il_name: mref.owner.clone(),
                cpp_name: owner_cpp.clone(),
            },
            ctor: MethodRef {
                owner: mref.owner.clone(),
                name: mref.name.clone(),
                cpp_name: NameMapper::cpp_method_name(&owner_cpp, &mref.name),
            },
            args,
        });
        self.push(dst);
    }

    fn do_calli(&mut self, token: Token) {
        let Some(sig) = self.provider.method_ref(self.assembly, token) else {
            return;
        };
        let args = self.pop_args(sig.param_types.len());
        let callee = self.pop();
        let ret = self.decl_type(&sig.return_type);
        let param_types = sig
            .param_types
            .iter()
            .map(|p| self.decl_type(p))
            .collect::<Vec<_>>()
            .join(", ");
        let call = format!("(({ret}(*)({param_types}))({callee}))({})", args.join(", "));
        if ret == "void" {
            self.emit_raw(format!("{call};"));
        } else {
            let dst = self.fresh();
            self.emit_raw(format!("{ret} {dst} = {call};"));
            self.push(dst);
        }
    }

    /// `jmp` transfers control to a method with the same signature, forwarding
    /// the current arguments untouched.
    fn do_jmp(&mut self, token: Token) {
        let Some(mref) = self.provider.method_ref(self.assembly, token) else {
            return;
        };
        let owner = self.cpp_type(&mref.owner);
        let cpp_name = NameMapper::cpp_method_name(&owner, &mref.name);
        let args = self.arg_names.clone();
        let dst = if self.returns_value() {
            let dst = self.fresh();
            Some(dst)
        } else {
            None
        };
        self.emit(IrInstr::Call {
            dst: dst.clone(),
            method: MethodRef {
                owner: mref.owner.clone(),
                name: mref.name.clone(),
                cpp_name,
            },
            return_type: mref.return_type.clone(),
            args,
        });
        self.emit(IrInstr::Return { value: dst });
    }

    // ---- small expression helpers ----

    fn binary(&mut self, token: &str, unsigned: bool) {
        let b = self.pop();
        let a = self.pop();
        if unsigned {
            self.push(format!("((uint64_t)({a}) {token} (uint64_t)({b}))"));
        } else {
            self.push(format!("({a} {token} {b})"));
        }
    }

    fn binary_ovf(&mut self, op: BinOp) {
        let rhs = self.pop();
        let lhs = self.pop();
        let dst = self.fresh();
        self.emit(IrInstr::Binary {
            op,
            dst: dst.clone(),
            lhs,
            rhs,
        });
        self.push(dst);
    }

    fn compare(&mut self, token: &str, unsigned: bool) {
        let b = self.pop();
        let a = self.pop();
        if unsigned {
            self.push(format!(
                "(((uint64_t)({a}) {token} (uint64_t)({b})) ? 1 : 0)"
            ));
        } else {
            self.push(format!("((({a}) {token} ({b})) ? 1 : 0)"));
        }
    }

    fn branch_cmp(&mut self, token: &str, target: u32, unsigned: bool) {
        let b = self.pop();
        let a = self.pop();
        let cond = if unsigned {
            format!("((uint64_t)({a}) {token} (uint64_t)({b}))")
        } else {
            format!("(({a}) {token} ({b}))")
        };
        self.emit(IrInstr::BranchIf { cond, target });
    }

    fn cast_like(&mut self, token: Token, is_inst: bool) {
        let Some(il) = self.provider.type_ref(self.assembly, token) else {
            return;
        };
        let value = self.pop();
        let dst = self.fresh();
        let cpp = self.cpp_type(&il);
        let ty = TypeRef {
            il_name: il,
            cpp_name: cpp,
        };
        if is_inst {
            self.emit(IrInstr::IsInst {
                dst: dst.clone(),
                ty,
                value,
            });
        } else {
            self.emit(IrInstr::CastClass {
                dst: dst.clone(),
                ty,
                value,
            });
        }
        self.push(dst);
    }

    fn arg_name(&self, index: u16) -> String {
        self.arg_names
            .get(index as usize)
            .cloned()
            .unwrap_or_else(|| format!("a{index}"))
    }

    fn local_name(&self, index: u16) -> String {
        self.locals
            .get(index as usize)
            .map(|l| l.name.clone())
            .unwrap_or_else(|| format!("loc{index}"))
    }

    fn returns_value(&self) -> bool {
        self.desc.return_type != "System.Void" && !self.desc.return_type.is_empty()
    }
}

fn field_ref(fref: &crate::il::model::FieldRefDesc) -> FieldRef {
    FieldRef {
        owner: fref.owner.clone(),
        name: fref.name.clone(),
        cpp_name: NameMapper::cpp_field_name(&fref.name),
        field_type: fref.field_type.clone(),
    }
}

fn is_simple(expr: &str) -> bool {
    !expr.is_empty()
        && expr
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn elem_cpp(kind: ElemKind) -> &'static str {
    match kind {
        ElemKind::I1 => "int8_t",
        ElemKind::U1 => "uint8_t",
        ElemKind::I2 => "int16_t",
        ElemKind::U2 => "uint16_t",
        ElemKind::I4 => "int32_t",
        ElemKind::U4 => "uint32_t",
        ElemKind::I8 => "int64_t",
        ElemKind::I => "intptr_t",
        ElemKind::R4 => "float",
        ElemKind::R8 => "double",
        ElemKind::Ref => "cil2cpp::Object*",
    }
}

fn conv_cpp(target: ConvTarget) -> &'static str {
    match target {
        ConvTarget::I1 => "int8_t",
        ConvTarget::U1 => "uint8_t",
        ConvTarget::I2 => "int16_t",
        ConvTarget::U2 => "uint16_t",
        ConvTarget::I4 => "int32_t",
        ConvTarget::U4 => "uint32_t",
        ConvTarget::I8 => "int64_t",
        ConvTarget::U8 => "uint64_t",
        ConvTarget::I => "intptr_t",
        ConvTarget::U => "uintptr_t",
        ConvTarget::R4 => "float",
        ConvTarget::R8 => "double",
        ConvTarget::RUn => "double",
    }
}
