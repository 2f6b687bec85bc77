use crate::il::body::BodyDesc;
use crate::il::model::{
    AssemblyHandle, AttributeDesc, FieldDesc, FieldRefDesc, MethodDesc, MethodHandle,
    MethodRefDesc, Token, TokenKind, TypeDesc, TypeHandle,
};

/// Contract of the external metadata reader.
///
/// The builder never touches PE images or blob heaps itself; everything it
/// needs arrives through this trait. Resolution methods return `Option`: a
/// `None` is a reference into an assembly outside the loaded set (or an
/// ill-formed token) and is silently skipped by the analyzer; built-in types
/// whose bodies can never resolve are intercepted by name instead.
pub trait MetadataProvider {
    /// Entry-point method of the root assembly, if it declares one.
    fn entry_point(&self) -> Option<MethodHandle>;

    /// Display name of a loaded assembly.
    fn assembly_name(&self, assembly: AssemblyHandle) -> Option<String>;

    /// Types of the root assembly's main module, in declaration order.
    fn root_types(&self) -> Vec<TypeHandle>;

    fn find_type(&self, fqn: &str) -> Option<TypeHandle>;

    fn type_desc(&self, ty: &TypeHandle) -> Option<TypeDesc>;

    fn fields(&self, ty: &TypeHandle) -> Vec<FieldDesc>;

    fn methods(&self, ty: &TypeHandle) -> Vec<MethodHandle>;

    fn method_desc(&self, method: &MethodHandle) -> Option<MethodDesc>;

    /// Body of a method defined in the loaded set. `None` for abstract,
    /// extern and runtime-provided methods.
    fn method_body(&self, method: &MethodHandle) -> Option<BodyDesc>;

    /// Definition lookup by owner full name, method name and parameter count.
    fn find_method(&self, owner_fqn: &str, name: &str, param_count: usize)
    -> Option<MethodHandle>;

    /// Classifies a `ldtoken` operand.
    fn token_kind(&self, assembly: AssemblyHandle, token: Token) -> Option<TokenKind>;

    /// IL full name of a type reference operand.
    fn type_ref(&self, assembly: AssemblyHandle, token: Token) -> Option<String>;

    fn method_ref(&self, assembly: AssemblyHandle, token: Token) -> Option<MethodRefDesc>;

    fn field_ref(&self, assembly: AssemblyHandle, token: Token) -> Option<FieldRefDesc>;

    fn type_attributes(&self, ty: &TypeHandle) -> Vec<AttributeDesc>;

    fn field_attributes(&self, ty: &TypeHandle, field_name: &str) -> Vec<AttributeDesc>;

    fn method_attributes(&self, method: &MethodHandle) -> Vec<AttributeDesc>;
}
