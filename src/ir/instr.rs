/// Symbolic reference to a type: IL full name plus projected C++ name.
///
/// Instructions never point into the module tree directly; references by
/// name keep the tree cycle-free and traversable in any order.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeRef {
    pub il_name: String,
    pub cpp_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MethodRef {
    /// IL full name of the declaring type.
    pub owner: String,
    /// IL method name.
    pub name: String,
    /// Projected flat C++ function name.
    pub cpp_name: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub cpp_name: String,
    /// Declared IL type of the field.
    pub field_type: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
}

impl BinOp {
    pub fn token(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Rem => "%",
            BinOp::And => "&",
            BinOp::Or => "|",
            BinOp::Xor => "^",
            BinOp::Shl => "<<",
            BinOp::Shr => ">>",
        }
    }
}

/// The closed instruction set of a basic block.
///
/// Operand strings are native expressions the lifter assembled: temporaries,
/// literals or parenthesized compounds. Branch targets are the labels of
/// other blocks in the same method (IL byte offsets). `RawCpp` is the escape
/// hatch every interception emits; the lifter prefers the typed variants for
/// everything it can express.
#[derive(Clone, Debug, PartialEq)]
pub enum IrInstr {
    /// Declare a fresh temporary with an optional initializer.
    Local {
        name: String,
        cpp_type: String,
        init: Option<String>,
    },
    Assign {
        dst: String,
        src: String,
    },
    Binary {
        op: BinOp,
        dst: String,
        lhs: String,
        rhs: String,
    },
    LoadString {
        dst: String,
        value: String,
    },
    /// Field read; `object` is `None` for static fields.
    LoadField {
        dst: String,
        object: Option<String>,
        field: FieldRef,
    },
    StoreField {
        object: Option<String>,
        field: FieldRef,
        value: String,
    },
    LoadElement {
        dst: String,
        array: String,
        index: String,
        element: String,
    },
    StoreElement {
        array: String,
        index: String,
        value: String,
        element: String,
    },
    NewArray {
        dst: String,
        element: TypeRef,
        length: String,
    },
    NewObject {
        dst: String,
        ty: TypeRef,
        ctor: MethodRef,
        args: Vec<String>,
    },
    Call {
        dst: Option<String>,
        method: MethodRef,
        /// IL return type, for the temporary's declaration.
        return_type: String,
        args: Vec<String>,
    },
    Box {
        dst: String,
        ty: TypeRef,
        value: String,
    },
    Unbox {
        dst: String,
        ty: TypeRef,
        value: String,
    },
    CastClass {
        dst: String,
        ty: TypeRef,
        value: String,
    },
    IsInst {
        dst: String,
        ty: TypeRef,
        value: String,
    },
    Jump {
        target: u32,
    },
    BranchIf {
        cond: String,
        target: u32,
    },
    Switch {
        value: String,
        targets: Vec<u32>,
    },
    Return {
        value: Option<String>,
    },
    Throw {
        value: String,
    },
    Rethrow,
    Leave {
        target: u32,
    },
    EndFinally,
    EndFilter {
        value: String,
    },
    /// Verbatim C++ fragment produced by an interception.
    RawCpp(String),
}
