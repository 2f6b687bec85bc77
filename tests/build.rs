mod common;

use std::collections::HashSet;

use anyhow::Result;
use cil2cpp::il::{ExceptionRegion, HandlerKind, MemoryProvider, OpCode};
use cil2cpp::ir::{IrInstr, dump_module};
use cil2cpp::{BuildOptions, IrBuilder};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn entry_program() -> MemoryProvider {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let program = p.declare_type(asm, common::class("App.Program"));
    let helper = p.method_token(
        asm,
        common::call_ref("App.Program", "Twice", &["System.Int32"], "System.Int32", false),
    );
    let main = p.add_method(
        &program,
        common::static_method("Main", &[], "System.Void"),
        Some(common::body(vec![
            OpCode::LdcI4(21),
            OpCode::Call(helper),
            OpCode::Pop,
            OpCode::Ret,
        ])),
    );
    p.add_method(
        &program,
        common::static_method("Twice", &[("x", "System.Int32")], "System.Int32"),
        Some(common::body(vec![
            OpCode::LdArg(0),
            OpCode::LdcI4(2),
            OpCode::Mul,
            OpCode::Ret,
        ])),
    );
    p.set_entry_point(&main);
    p
}

#[test]
fn builds_an_entry_program_end_to_end() -> Result<()> {
    init_logging();
    let p = entry_program();
    let module = IrBuilder::new(&p).build()?;

    let program = module.get_type("App.Program").expect("program type");
    insta::assert_snapshot!(program.cpp_name, @"App_Program");
    assert_eq!(program.methods.len(), 2);

    let main = &program.methods[0];
    insta::assert_snapshot!(main.cpp_name, @"App_Program_Main");
    let call = main
        .instructions()
        .find_map(|i| match i {
            IrInstr::Call { method, .. } => Some(method.cpp_name.clone()),
            _ => None,
        })
        .expect("Main calls Twice");
    assert_eq!(call, "App_Program_Twice");

    let twice = &program.methods[1];
    assert_eq!(
        twice.instructions().last(),
        Some(&IrInstr::Return {
            value: Some("(x * 2)".to_string())
        })
    );
    Ok(())
}

#[test]
fn projected_type_names_are_unique() {
    let p = entry_program();
    let module = IrBuilder::new(&p).build().expect("build");
    let mut seen = HashSet::new();
    for ty in &module.types {
        assert!(seen.insert(ty.cpp_name.clone()), "duplicate {}", ty.cpp_name);
    }
}

#[test]
fn building_twice_yields_identical_modules() {
    let p = entry_program();
    let first = dump_module(&IrBuilder::new(&p).build().expect("build"));
    let second = dump_module(&IrBuilder::new(&p).build().expect("build"));
    assert_eq!(first, second);
}

#[test]
fn primitive_descriptor_table_is_populated() {
    let p = entry_program();
    let module = IrBuilder::new(&p).build().expect("build");
    assert_eq!(module.primitives.len(), 14);
    let int32 = module
        .primitives
        .iter()
        .find(|d| d.il_name == "System.Int32")
        .expect("int32 descriptor");
    assert_eq!(int32.cpp_name, "int32_t");
    assert_eq!(int32.size, 4);
    assert!(
        !module.primitives.iter().any(|d| d.il_name == "System.String"),
        "reference primitives never appear as array elements"
    );
}

#[test]
fn library_mode_builds_without_an_entry_point() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("Lib");
    let api = p.declare_type(asm, common::class("Lib.Api"));
    p.add_method(
        &api,
        common::static_method("Ping", &[], "System.Int32"),
        Some(common::body(vec![OpCode::LdcI4(1), OpCode::Ret])),
    );

    let module = IrBuilder::with_options(&p, BuildOptions { force_library: true })
        .build()
        .expect("build");
    let api = module.get_type("Lib.Api").expect("api type");
    assert_eq!(api.methods.len(), 1);
    assert!(!api.methods[0].blocks.is_empty());
}

#[test]
fn exception_regions_are_copied_and_handlers_bind_the_exception() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let program = p.declare_type(asm, common::class("App.Program"));
    let mut body = common::body_at(vec![
        (0, OpCode::Nop),
        (1, OpCode::Leave(4)),
        (2, OpCode::Pop),
        (3, OpCode::Leave(4)),
        (4, OpCode::Ret),
    ]);
    body.exception_regions.push(ExceptionRegion {
        kind: HandlerKind::Catch,
        try_offset: 0,
        try_length: 2,
        handler_offset: 2,
        handler_length: 2,
        catch_type: Some("System.Exception".to_string()),
        filter_offset: None,
    });
    let main = p.add_method(
        &program,
        common::static_method("Main", &[], "System.Void"),
        Some(body),
    );
    p.set_entry_point(&main);

    let module = IrBuilder::new(&p).build().expect("build");
    let main = &module.get_type("App.Program").expect("program").methods[0];

    assert_eq!(main.exception_regions.len(), 1);
    assert_eq!(main.exception_regions[0].handler_offset, 2);

    let labels: Vec<u32> = main.blocks.iter().map(|b| b.label).collect();
    assert_eq!(labels, vec![0, 2, 4]);
    // The handler's Pop consumed the bound exception, so nothing leaked into
    // the handler block beyond the leave.
    assert_eq!(
        main.blocks[1].instructions,
        vec![IrInstr::Leave { target: 4 }]
    );
}
