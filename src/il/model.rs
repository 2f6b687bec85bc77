use std::fmt;

/// Opaque metadata token, resolved against the owning assembly through the
/// provider. The numeric value is whatever the loader interned.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Token(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct AssemblyHandle(pub usize);

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct TypeHandle {
    pub assembly: AssemblyHandle,
    pub fullname: String,
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.fullname)
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodHandle {
    pub assembly: AssemblyHandle,
    pub owner_fqn: String,
    pub ordinal: usize,
}

/// What a type definition looks like to the builder. All names are IL full
/// names; generic definitions carry their parameter count and reference their
/// own parameters as `!0`, `!1`, ...
#[derive(Clone, Debug, Default)]
pub struct TypeDesc {
    pub fullname: String,
    pub namespace: String,
    pub is_public: bool,
    pub is_value_type: bool,
    pub is_sealed: bool,
    pub is_interface: bool,
    pub generic_param_count: usize,
    pub base: Option<String>,
    pub interfaces: Vec<String>,
    pub nested: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct FieldDesc {
    pub name: String,
    pub field_type: String,
    pub is_static: bool,
    pub is_public: bool,
}

#[derive(Clone, Debug)]
pub struct ParamDesc {
    pub name: String,
    pub param_type: String,
}

#[derive(Clone, Debug, Default)]
pub struct MethodDesc {
    pub name: String,
    pub params: Vec<ParamDesc>,
    pub return_type: String,
    pub has_this: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_ctor: bool,
    pub is_public: bool,
    pub is_family: bool,
}

/// Description of a method reference operand. Always available from the token
/// tables, even when the definition lives outside the loaded assembly set;
/// the interception predicates run on these.
#[derive(Clone, Debug, Default)]
pub struct MethodRefDesc {
    pub owner: String,
    pub name: String,
    pub param_types: Vec<String>,
    pub return_type: String,
    pub has_this: bool,
    pub generic_args: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct FieldRefDesc {
    pub owner: String,
    pub name: String,
    pub field_type: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TokenKind {
    Type,
    Method,
    Field,
}

/// Boxed custom-attribute argument value. The set is closed: primitives and
/// strings are representable, everything else is dropped by the collector.
#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(u16),
    Str(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttrArg {
    pub arg_type: String,
    pub value: AttrValue,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AttributeDesc {
    pub attr_type: String,
    pub args: Vec<AttrArg>,
}
