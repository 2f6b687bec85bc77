#![allow(dead_code)]

use cil2cpp::il::{BodyDesc, MethodDesc, MethodRefDesc, OpCode, ParamDesc, TypeDesc};

pub fn class(fqn: &str) -> TypeDesc {
    let namespace = fqn.rsplit_once('.').map(|(ns, _)| ns).unwrap_or("");
    TypeDesc {
        fullname: fqn.to_string(),
        namespace: namespace.to_string(),
        is_public: true,
        ..Default::default()
    }
}

pub fn value_type(fqn: &str) -> TypeDesc {
    TypeDesc {
        is_value_type: true,
        ..class(fqn)
    }
}

pub fn static_method(name: &str, params: &[(&str, &str)], ret: &str) -> MethodDesc {
    MethodDesc {
        name: name.to_string(),
        params: params
            .iter()
            .map(|(name, param_type)| ParamDesc {
                name: name.to_string(),
                param_type: param_type.to_string(),
            })
            .collect(),
        return_type: ret.to_string(),
        is_static: true,
        is_public: true,
        ..Default::default()
    }
}

pub fn instance_method(name: &str, params: &[(&str, &str)], ret: &str) -> MethodDesc {
    MethodDesc {
        has_this: true,
        is_static: false,
        ..static_method(name, params, ret)
    }
}

/// A body whose opcodes sit at consecutive offsets. Good enough whenever the
/// test does not branch.
pub fn body(ops: Vec<OpCode>) -> BodyDesc {
    body_at(ops.into_iter().enumerate().map(|(i, op)| (i as u32, op)).collect())
}

pub fn body_at(instructions: Vec<(u32, OpCode)>) -> BodyDesc {
    BodyDesc {
        max_stack: 8,
        init_locals: true,
        instructions,
        ..Default::default()
    }
}

pub fn call_ref(
    owner: &str,
    name: &str,
    params: &[&str],
    ret: &str,
    has_this: bool,
) -> MethodRefDesc {
    MethodRefDesc {
        owner: owner.to_string(),
        name: name.to_string(),
        param_types: params.iter().map(|p| p.to_string()).collect(),
        return_type: ret.to_string(),
        has_this,
        generic_args: Vec::new(),
    }
}
