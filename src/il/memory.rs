use std::collections::HashMap;

use crate::il::body::BodyDesc;
use crate::il::model::{
    AssemblyHandle, AttributeDesc, FieldDesc, FieldRefDesc, MethodDesc, MethodHandle,
    MethodRefDesc, Token, TokenKind, TypeDesc, TypeHandle,
};
use crate::il::provider::MetadataProvider;

enum TokenTarget {
    Type(String),
    Method(MethodRefDesc),
    Field(FieldRefDesc),
}

struct MemoryMethod {
    desc: MethodDesc,
    body: Option<BodyDesc>,
    attrs: Vec<AttributeDesc>,
}

struct MemoryType {
    desc: TypeDesc,
    fields: Vec<FieldDesc>,
    field_attrs: HashMap<String, Vec<AttributeDesc>>,
    methods: Vec<MemoryMethod>,
    attrs: Vec<AttributeDesc>,
}

struct MemoryAssembly {
    name: String,
    types: Vec<MemoryType>,
    by_name: HashMap<String, usize>,
    tokens: HashMap<u32, TokenTarget>,
    next_token: u32,
}

/// In-memory implementation of [`MetadataProvider`].
///
/// Assemblies, types, methods and token tables are registered by hand; the
/// first assembly added plays the role of the root. This is the reference
/// implementation of the provider contract and the fixture every test drives.
#[derive(Default)]
pub struct MemoryProvider {
    assemblies: Vec<MemoryAssembly>,
    global_type_index: HashMap<String, TypeHandle>,
    entry: Option<MethodHandle>,
}

impl MemoryProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_assembly(&mut self, name: &str) -> AssemblyHandle {
        let handle = AssemblyHandle(self.assemblies.len());
        self.assemblies.push(MemoryAssembly {
            name: name.to_string(),
            types: Vec::new(),
            by_name: HashMap::new(),
            tokens: HashMap::new(),
            next_token: 1,
        });
        handle
    }

    pub fn declare_type(&mut self, assembly: AssemblyHandle, desc: TypeDesc) -> TypeHandle {
        let handle = TypeHandle {
            assembly,
            fullname: desc.fullname.clone(),
        };
        let asm = &mut self.assemblies[assembly.0];
        asm.by_name.insert(desc.fullname.clone(), asm.types.len());
        asm.types.push(MemoryType {
            desc,
            fields: Vec::new(),
            field_attrs: HashMap::new(),
            methods: Vec::new(),
            attrs: Vec::new(),
        });
        self.global_type_index
            .entry(handle.fullname.clone())
            .or_insert_with(|| handle.clone());
        handle
    }

    pub fn add_field(&mut self, ty: &TypeHandle, field: FieldDesc) {
        if let Some(t) = self.mem_type_mut(ty) {
            t.fields.push(field);
        }
    }

    pub fn add_method(
        &mut self,
        ty: &TypeHandle,
        desc: MethodDesc,
        body: Option<BodyDesc>,
    ) -> MethodHandle {
        let t = self.mem_type_mut(ty).expect("type was declared");
        let ordinal = t.methods.len();
        t.methods.push(MemoryMethod {
            desc,
            body,
            attrs: Vec::new(),
        });
        MethodHandle {
            assembly: ty.assembly,
            owner_fqn: ty.fullname.clone(),
            ordinal,
        }
    }

    pub fn set_entry_point(&mut self, method: &MethodHandle) {
        self.entry = Some(method.clone());
    }

    pub fn type_token(&mut self, assembly: AssemblyHandle, fqn: &str) -> Token {
        self.intern(assembly, TokenTarget::Type(fqn.to_string()))
    }

    pub fn method_token(&mut self, assembly: AssemblyHandle, mref: MethodRefDesc) -> Token {
        self.intern(assembly, TokenTarget::Method(mref))
    }

    pub fn field_token(&mut self, assembly: AssemblyHandle, fref: FieldRefDesc) -> Token {
        self.intern(assembly, TokenTarget::Field(fref))
    }

    pub fn add_type_attribute(&mut self, ty: &TypeHandle, attr: AttributeDesc) {
        if let Some(t) = self.mem_type_mut(ty) {
            t.attrs.push(attr);
        }
    }

    pub fn add_field_attribute(&mut self, ty: &TypeHandle, field_name: &str, attr: AttributeDesc) {
        if let Some(t) = self.mem_type_mut(ty) {
            t.field_attrs.entry(field_name.to_string()).or_default().push(attr);
        }
    }

    pub fn add_method_attribute(&mut self, method: &MethodHandle, attr: AttributeDesc) {
        let ty = TypeHandle {
            assembly: method.assembly,
            fullname: method.owner_fqn.clone(),
        };
        if let Some(t) = self.mem_type_mut(&ty) {
            if let Some(m) = t.methods.get_mut(method.ordinal) {
                m.attrs.push(attr);
            }
        }
    }

    fn intern(&mut self, assembly: AssemblyHandle, target: TokenTarget) -> Token {
        let asm = &mut self.assemblies[assembly.0];
        let token = Token(asm.next_token);
        asm.next_token += 1;
        asm.tokens.insert(token.0, target);
        token
    }

    fn mem_type(&self, ty: &TypeHandle) -> Option<&MemoryType> {
        let asm = self.assemblies.get(ty.assembly.0)?;
        asm.by_name.get(&ty.fullname).map(|idx| &asm.types[*idx])
    }

    fn mem_type_mut(&mut self, ty: &TypeHandle) -> Option<&mut MemoryType> {
        let asm = self.assemblies.get_mut(ty.assembly.0)?;
        asm.by_name
            .get(&ty.fullname)
            .copied()
            .map(|idx| &mut asm.types[idx])
    }

    fn token_target(&self, assembly: AssemblyHandle, token: Token) -> Option<&TokenTarget> {
        self.assemblies.get(assembly.0)?.tokens.get(&token.0)
    }
}

impl MetadataProvider for MemoryProvider {
    fn entry_point(&self) -> Option<MethodHandle> {
        self.entry.clone()
    }

    fn assembly_name(&self, assembly: AssemblyHandle) -> Option<String> {
        self.assemblies.get(assembly.0).map(|a| a.name.clone())
    }

    fn root_types(&self) -> Vec<TypeHandle> {
        let Some(root) = self.assemblies.first() else {
            return Vec::new();
        };
        root.types
            .iter()
            .map(|t| TypeHandle {
                assembly: AssemblyHandle(0),
                fullname: t.desc.fullname.clone(),
            })
            .collect()
    }

    fn find_type(&self, fqn: &str) -> Option<TypeHandle> {
        self.global_type_index.get(fqn).cloned()
    }

    fn type_desc(&self, ty: &TypeHandle) -> Option<TypeDesc> {
        self.mem_type(ty).map(|t| t.desc.clone())
    }

    fn fields(&self, ty: &TypeHandle) -> Vec<FieldDesc> {
        self.mem_type(ty).map(|t| t.fields.clone()).unwrap_or_default()
    }

    fn methods(&self, ty: &TypeHandle) -> Vec<MethodHandle> {
        let Some(t) = self.mem_type(ty) else {
            return Vec::new();
        };
        (0..t.methods.len())
            .map(|ordinal| MethodHandle {
                assembly: ty.assembly,
                owner_fqn: ty.fullname.clone(),
                ordinal,
            })
            .collect()
    }

    fn method_desc(&self, method: &MethodHandle) -> Option<MethodDesc> {
        let ty = TypeHandle {
            assembly: method.assembly,
            fullname: method.owner_fqn.clone(),
        };
        self.mem_type(&ty)?
            .methods
            .get(method.ordinal)
            .map(|m| m.desc.clone())
    }

    fn method_body(&self, method: &MethodHandle) -> Option<BodyDesc> {
        let ty = TypeHandle {
            assembly: method.assembly,
            fullname: method.owner_fqn.clone(),
        };
        self.mem_type(&ty)?
            .methods
            .get(method.ordinal)?
            .body
            .clone()
    }

    fn find_method(
        &self,
        owner_fqn: &str,
        name: &str,
        param_count: usize,
    ) -> Option<MethodHandle> {
        let handle = self.find_type(owner_fqn)?;
        let t = self.mem_type(&handle)?;
        t.methods
            .iter()
            .position(|m| m.desc.name == name && m.desc.params.len() == param_count)
            .map(|ordinal| MethodHandle {
                assembly: handle.assembly,
                owner_fqn: handle.fullname.clone(),
                ordinal,
            })
    }

    fn token_kind(&self, assembly: AssemblyHandle, token: Token) -> Option<TokenKind> {
        self.token_target(assembly, token).map(|t| match t {
            TokenTarget::Type(_) => TokenKind::Type,
            TokenTarget::Method(_) => TokenKind::Method,
            TokenTarget::Field(_) => TokenKind::Field,
        })
    }

    fn type_ref(&self, assembly: AssemblyHandle, token: Token) -> Option<String> {
        match self.token_target(assembly, token)? {
            TokenTarget::Type(fqn) => Some(fqn.clone()),
            _ => None,
        }
    }

    fn method_ref(&self, assembly: AssemblyHandle, token: Token) -> Option<MethodRefDesc> {
        match self.token_target(assembly, token)? {
            TokenTarget::Method(m) => Some(m.clone()),
            _ => None,
        }
    }

    fn field_ref(&self, assembly: AssemblyHandle, token: Token) -> Option<FieldRefDesc> {
        match self.token_target(assembly, token)? {
            TokenTarget::Field(f) => Some(f.clone()),
            _ => None,
        }
    }

    fn type_attributes(&self, ty: &TypeHandle) -> Vec<AttributeDesc> {
        self.mem_type(ty).map(|t| t.attrs.clone()).unwrap_or_default()
    }

    fn field_attributes(&self, ty: &TypeHandle, field_name: &str) -> Vec<AttributeDesc> {
        self.mem_type(ty)
            .and_then(|t| t.field_attrs.get(field_name).cloned())
            .unwrap_or_default()
    }

    fn method_attributes(&self, method: &MethodHandle) -> Vec<AttributeDesc> {
        let ty = TypeHandle {
            assembly: method.assembly,
            fullname: method.owner_fqn.clone(),
        };
        self.mem_type(&ty)
            .and_then(|t| t.methods.get(method.ordinal))
            .map(|m| m.attrs.clone())
            .unwrap_or_default()
    }
}
