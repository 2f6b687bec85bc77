//! The loader-facing side of the translator: handles, descriptor records,
//! the normalized opcode set and the [`MetadataProvider`] trait the external
//! metadata reader implements. [`MemoryProvider`] is the in-memory
//! implementation the tests drive.

pub mod body;
pub mod memory;
pub mod model;
pub mod opcode;
pub mod provider;

pub use body::{BodyDesc, ExceptionRegion, HandlerKind, LocalDesc};
pub use memory::MemoryProvider;
pub use model::{
    AssemblyHandle, AttrArg, AttrValue, AttributeDesc, FieldDesc, FieldRefDesc, MethodDesc,
    MethodHandle, MethodRefDesc, ParamDesc, Token, TokenKind, TypeDesc, TypeHandle,
};
pub use opcode::{ConvTarget, ElemKind, OpCode};
pub use provider::MetadataProvider;
