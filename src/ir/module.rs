use std::collections::HashMap;

use crate::il::body::ExceptionRegion;
use crate::il::model::TypeHandle;
use crate::ir::attributes::CustomAttribute;
use crate::ir::instr::IrInstr;

/// Array element reflection record, mirrored into the emitted module so the
/// runtime can size and hash primitive array elements.
#[derive(Clone, Debug, PartialEq)]
pub struct PrimitiveDesc {
    pub il_name: String,
    pub cpp_name: String,
    pub size: u32,
}

/// Root container of the IR. Built once per translation invocation, handed to
/// the emitter by value and read-only afterwards.
#[derive(Clone, Debug, Default)]
pub struct IrModule {
    pub types: Vec<IrType>,
    pub primitives: Vec<PrimitiveDesc>,
    index: HashMap<String, usize>,
}

impl IrModule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_type(&mut self, ty: IrType) {
        self.index.insert(ty.il_name.clone(), self.types.len());
        self.types.push(ty);
    }

    pub fn has_type(&self, il_name: &str) -> bool {
        self.index.contains_key(il_name)
    }

    pub fn get_type(&self, il_name: &str) -> Option<&IrType> {
        self.index.get(il_name).map(|idx| &self.types[*idx])
    }

    pub fn get_type_mut(&mut self, il_name: &str) -> Option<&mut IrType> {
        self.index.get(il_name).copied().map(|idx| &mut self.types[idx])
    }
}

#[derive(Clone, Debug)]
pub struct IrType {
    pub il_name: String,
    pub cpp_name: String,
    pub namespace: String,
    pub is_value_type: bool,
    pub is_sealed: bool,
    /// Synthesized by the translator, with no definition in the loaded set.
    pub is_runtime_provided: bool,
    pub has_generic_params: bool,
    pub is_interface: bool,
    pub base: Option<String>,
    pub fields: Vec<IrField>,
    pub static_fields: Vec<IrField>,
    pub methods: Vec<IrMethod>,
    pub attributes: Vec<CustomAttribute>,
    /// Back-reference into the loader's metadata, absent on synthetic types.
    pub origin: Option<TypeHandle>,
}

impl IrType {
    /// A bare shell with the given names; the builder fills the rest in.
    pub fn new(il_name: impl Into<String>, cpp_name: impl Into<String>) -> Self {
        Self {
            il_name: il_name.into(),
            cpp_name: cpp_name.into(),
            namespace: String::new(),
            is_value_type: false,
            is_sealed: false,
            is_runtime_provided: false,
            has_generic_params: false,
            is_interface: false,
            base: None,
            fields: Vec::new(),
            static_fields: Vec::new(),
            methods: Vec::new(),
            attributes: Vec::new(),
            origin: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct IrField {
    pub name: String,
    pub cpp_name: String,
    pub field_type: String,
    pub is_static: bool,
    pub is_public: bool,
    pub attributes: Vec<CustomAttribute>,
}

#[derive(Clone, Debug)]
pub struct IrParam {
    pub name: String,
    pub param_type: String,
}

#[derive(Clone, Debug)]
pub struct IrLocal {
    /// Projected local name, as the instructions reference it.
    pub name: String,
    pub local_type: String,
    pub address_taken: bool,
}

#[derive(Clone, Debug)]
pub struct IrMethod {
    pub name: String,
    pub cpp_name: String,
    pub params: Vec<IrParam>,
    pub return_type: String,
    pub has_this: bool,
    pub is_ctor: bool,
    pub is_static: bool,
    pub is_virtual: bool,
    pub locals: Vec<IrLocal>,
    pub init_locals: bool,
    pub blocks: Vec<IrBasicBlock>,
    pub exception_regions: Vec<ExceptionRegion>,
    pub attributes: Vec<CustomAttribute>,
}

/// Maximal straight-line instruction run; branch targets begin new blocks.
/// The label is the IL byte offset the block starts at.
#[derive(Clone, Debug, Default)]
pub struct IrBasicBlock {
    pub label: u32,
    pub instructions: Vec<IrInstr>,
}

impl IrMethod {
    /// Every instruction of every block, in order.
    pub fn instructions(&self) -> impl Iterator<Item = &IrInstr> {
        self.blocks.iter().flat_map(|b| b.instructions.iter())
    }
}
