mod common;

use cil2cpp::LiftError;
use cil2cpp::il::{AssemblyHandle, MemoryProvider, MethodHandle, OpCode};
use cil2cpp::ir::IrInstr;
use cil2cpp::lift::lift_method;
use cil2cpp::names::NameMapper;

fn handle(asm: AssemblyHandle) -> MethodHandle {
    MethodHandle {
        assembly: asm,
        owner_fqn: "App.Program".to_string(),
        ordinal: 0,
    }
}

#[test]
fn arithmetic_folds_into_expressions() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let desc = common::static_method(
        "Sum",
        &[("x", "System.Int32"), ("y", "System.Int32")],
        "System.Int32",
    );
    let body = common::body(vec![
        OpCode::LdArg(0),
        OpCode::LdArg(1),
        OpCode::Add,
        OpCode::Ret,
    ]);
    let mapper = NameMapper::new();
    let lifted = lift_method(&p, &mapper, &handle(asm), &desc, &body).expect("lift");

    assert_eq!(lifted.blocks.len(), 1);
    assert_eq!(
        lifted.blocks[0].instructions,
        vec![IrInstr::Return {
            value: Some("(x + y)".to_string())
        }]
    );
}

#[test]
fn stack_underflow_substitutes_a_zero_literal() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let desc = common::static_method("Broken", &[], "System.Int32");
    let body = common::body(vec![OpCode::Add, OpCode::Ret]);
    let mapper = NameMapper::new();
    let lifted = lift_method(&p, &mapper, &handle(asm), &desc, &body).expect("lift");

    assert_eq!(
        lifted.blocks[0].instructions,
        vec![IrInstr::Return {
            value: Some("(0 + 0)".to_string())
        }]
    );
}

#[test]
fn unknown_opcodes_are_fatal() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let desc = common::static_method("Bad", &[], "System.Void");
    let body = common::body_at(vec![(0, OpCode::Unknown(0xA7)), (1, OpCode::Ret)]);
    let mapper = NameMapper::new();

    let err = lift_method(&p, &mapper, &handle(asm), &desc, &body).unwrap_err();
    let LiftError::UnknownOpCode { opcode, offset } = err;
    assert_eq!(opcode, 0xA7);
    assert_eq!(offset, 0);
}

#[test]
fn calls_become_typed_call_instructions() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let tok = p.method_token(
        asm,
        common::call_ref("App.Math", "Twice", &["System.Int32"], "System.Int32", false),
    );
    let desc = common::static_method("Run", &[], "System.Int32");
    let body = common::body(vec![OpCode::LdcI4(21), OpCode::Call(tok), OpCode::Ret]);
    let mapper = NameMapper::new();
    let lifted = lift_method(&p, &mapper, &handle(asm), &desc, &body).expect("lift");

    let instrs = &lifted.blocks[0].instructions;
    let IrInstr::Call { dst, method, args, .. } = &instrs[0] else {
        panic!("expected a call, got {:?}", instrs[0]);
    };
    assert_eq!(method.cpp_name, "App_Math_Twice");
    assert_eq!(args, &["21".to_string()]);
    let result = dst.clone().expect("value-returning call gets a temporary");
    assert_eq!(
        instrs[1],
        IrInstr::Return {
            value: Some(result)
        }
    );
}

#[test]
fn branch_targets_begin_new_blocks() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let desc = common::static_method("Pick", &[("flag", "System.Boolean")], "System.Int32");
    // 0: ldarg.0   1: brtrue 4   2: ldc 0   3: ret   4: ldc 1   5: ret
    let body = common::body_at(vec![
        (0, OpCode::LdArg(0)),
        (1, OpCode::BrTrue(4)),
        (2, OpCode::LdcI4(0)),
        (3, OpCode::Ret),
        (4, OpCode::LdcI4(1)),
        (5, OpCode::Ret),
    ]);
    let mapper = NameMapper::new();
    let lifted = lift_method(&p, &mapper, &handle(asm), &desc, &body).expect("lift");

    let labels: Vec<u32> = lifted.blocks.iter().map(|b| b.label).collect();
    assert_eq!(labels, vec![0, 4]);
    assert_eq!(
        lifted.blocks[0].instructions[0],
        IrInstr::BranchIf {
            cond: "(flag)".to_string(),
            target: 4
        }
    );
    assert_eq!(
        lifted.blocks[1].instructions.last(),
        Some(&IrInstr::Return {
            value: Some("1".to_string())
        })
    );
}

#[test]
fn address_of_marks_locals() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let desc = common::static_method("Swap", &[], "System.Void");
    let mut body = common::body(vec![
        OpCode::LdcI4(7),
        OpCode::StLoc(0),
        OpCode::LdLocA(0),
        OpCode::Pop,
        OpCode::Ret,
    ]);
    body.locals.push(cil2cpp::il::LocalDesc {
        name: None,
        local_type: "System.Int32".to_string(),
    });
    let mapper = NameMapper::new();
    let lifted = lift_method(&p, &mapper, &handle(asm), &desc, &body).expect("lift");

    assert_eq!(lifted.locals.len(), 1);
    assert_eq!(lifted.locals[0].name, "loc0");
    assert!(lifted.locals[0].address_taken);
    assert_eq!(
        lifted.blocks[0].instructions[0],
        IrInstr::Assign {
            dst: "loc0".to_string(),
            src: "7".to_string()
        }
    );
}

#[test]
fn span_construction_and_length_read_are_leaf() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let span = "System.Span`1<System.Int32>";
    let ctor = p.method_token(
        asm,
        common::call_ref(span, ".ctor", &["System.Int32[]"], "System.Void", true),
    );
    let get_length = p.method_token(
        asm,
        common::call_ref(span, "get_Length", &[], "System.Int32", true),
    );
    let desc = common::static_method("Measure", &[("data", "System.Int32[]")], "System.Int32");
    let body = common::body(vec![
        OpCode::LdArg(0),
        OpCode::NewObj(ctor),
        OpCode::Call(get_length),
        OpCode::Ret,
    ]);
    let mapper = NameMapper::new();
    let lifted = lift_method(&p, &mapper, &handle(asm), &desc, &body).expect("lift");

    let instrs = &lifted.blocks[0].instructions;
    assert_eq!(instrs.len(), 3, "ctor, length read, return: {instrs:?}");
    let IrInstr::RawCpp(ctor_text) = &instrs[0] else {
        panic!("span construction should be raw C++, got {:?}", instrs[0]);
    };
    assert!(ctor_text.contains("t0"));
    assert!(ctor_text.contains("f_reference"));
    let IrInstr::RawCpp(length_text) = &instrs[1] else {
        panic!("length read should be raw C++, got {:?}", instrs[1]);
    };
    assert!(length_text.contains("(t0).f_length"));
    assert!(
        !instrs.iter().any(|i| matches!(i, IrInstr::Call { .. })),
        "no typed call may target a span"
    );
    assert_eq!(lifted.requested, vec![span.to_string()]);
}
