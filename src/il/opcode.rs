use crate::il::model::Token;

/// Conversion target of the `conv.*` family.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConvTarget {
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    U8,
    I,
    U,
    R4,
    R8,
    RUn,
}

/// Element access width of the `ldind`/`stind`/`ldelem`/`stelem` families.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ElemKind {
    I1,
    U1,
    I2,
    U2,
    I4,
    U4,
    I8,
    I,
    R4,
    R8,
    Ref,
}

/// The closed IL opcode set, as the loader hands it to the lifter.
///
/// Short and macro forms are normalized away (`ldarg.0`, `ldc.i4.s`,
/// `br.s`, ... collapse into the canonical variant) and branch operands are
/// absolute byte offsets into the body rather than the encoded relative
/// displacements. Token operands resolve through the provider against the
/// assembly that owns the body.
#[derive(Clone, Debug, PartialEq)]
pub enum OpCode {
    Nop,
    Break,
    LdArg(u16),
    LdArgA(u16),
    StArg(u16),
    LdLoc(u16),
    LdLocA(u16),
    StLoc(u16),
    LdNull,
    LdcI4(i32),
    LdcI8(i64),
    LdcR4(f32),
    LdcR8(f64),
    LdStr(String),
    Dup,
    Pop,
    Jmp(Token),
    Call(Token),
    CallI(Token),
    CallVirt(Token),
    Ret,
    Br(u32),
    BrFalse(u32),
    BrTrue(u32),
    Beq(u32),
    Bge(u32),
    Bgt(u32),
    Ble(u32),
    Blt(u32),
    BneUn(u32),
    BgeUn(u32),
    BgtUn(u32),
    BleUn(u32),
    BltUn(u32),
    Switch(Vec<u32>),
    LdInd(ElemKind),
    StInd(ElemKind),
    Add,
    Sub,
    Mul,
    Div,
    DivUn,
    Rem,
    RemUn,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    ShrUn,
    Neg,
    Not,
    Conv(ConvTarget),
    ConvOvf(ConvTarget),
    ConvOvfUn(ConvTarget),
    AddOvf,
    AddOvfUn,
    MulOvf,
    MulOvfUn,
    SubOvf,
    SubOvfUn,
    CpObj(Token),
    LdObj(Token),
    StObj(Token),
    InitObj(Token),
    NewObj(Token),
    CastClass(Token),
    IsInst(Token),
    Box(Token),
    Unbox(Token),
    UnboxAny(Token),
    Throw,
    Rethrow,
    LdFld(Token),
    LdFldA(Token),
    StFld(Token),
    LdSFld(Token),
    LdSFldA(Token),
    StSFld(Token),
    NewArr(Token),
    LdLen,
    LdElemA(Token),
    LdElem(ElemKind),
    LdElemAny(Token),
    StElem(ElemKind),
    StElemAny(Token),
    RefAnyVal(Token),
    CkFinite,
    MkRefAny(Token),
    LdToken(Token),
    Leave(u32),
    EndFinally,
    EndFilter,
    ArgList,
    Ceq,
    Cgt,
    CgtUn,
    Clt,
    CltUn,
    LdFtn(Token),
    LdVirtFtn(Token),
    LocAlloc,
    InitBlk,
    CpBlk,
    SizeOf(Token),
    RefAnyType,
    Constrained(Token),
    Volatile,
    Unaligned(u8),
    Tail,
    Readonly,
    /// Anything the loader could not classify. Fatal during lifting.
    Unknown(u8),
}

impl OpCode {
    /// Branch targets referenced by this opcode, if any. Used for basic-block
    /// splitting.
    pub fn branch_targets(&self) -> Vec<u32> {
        match self {
            OpCode::Br(t)
            | OpCode::BrFalse(t)
            | OpCode::BrTrue(t)
            | OpCode::Beq(t)
            | OpCode::Bge(t)
            | OpCode::Bgt(t)
            | OpCode::Ble(t)
            | OpCode::Blt(t)
            | OpCode::BneUn(t)
            | OpCode::BgeUn(t)
            | OpCode::BgtUn(t)
            | OpCode::BleUn(t)
            | OpCode::BltUn(t)
            | OpCode::Leave(t) => vec![*t],
            OpCode::Switch(targets) => targets.clone(),
            _ => Vec::new(),
        }
    }
}
