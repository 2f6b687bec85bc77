use crate::il::model::AttrArg;

/// A custom attribute surviving the collector's filter, with its constructor
/// arguments restricted to primitives and strings.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomAttribute {
    pub il_name: String,
    pub cpp_name: String,
    pub args: Vec<AttrArg>,
}
