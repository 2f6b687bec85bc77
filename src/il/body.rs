use crate::il::opcode::OpCode;

#[derive(Clone, Debug)]
pub struct LocalDesc {
    pub name: Option<String>,
    pub local_type: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum HandlerKind {
    Catch,
    Filter,
    Finally,
    Fault,
}

/// One row of the body's exception-handler table. The lifter copies these
/// onto the IR method unchanged; offsets are IL byte offsets.
#[derive(Clone, Debug)]
pub struct ExceptionRegion {
    pub kind: HandlerKind,
    pub try_offset: u32,
    pub try_length: u32,
    pub handler_offset: u32,
    pub handler_length: u32,
    pub catch_type: Option<String>,
    pub filter_offset: Option<u32>,
}

/// A method body as the loader yields it: offset/opcode pairs plus the local
/// signature and handler table.
#[derive(Clone, Debug, Default)]
pub struct BodyDesc {
    pub max_stack: u16,
    pub init_locals: bool,
    pub locals: Vec<LocalDesc>,
    pub instructions: Vec<(u32, OpCode)>,
    pub exception_regions: Vec<ExceptionRegion>,
}
