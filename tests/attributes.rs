mod common;

use cil2cpp::IrBuilder;
use cil2cpp::il::{AttrArg, AttrValue, AttributeDesc, FieldDesc, MemoryProvider, OpCode};

const INTERNAL: &str = "System.Runtime.CompilerServices.CompilerGeneratedAttribute";

fn attr(name: &str, args: Vec<AttrArg>) -> AttributeDesc {
    AttributeDesc {
        attr_type: name.to_string(),
        args,
    }
}

fn int_arg(v: i32) -> AttrArg {
    AttrArg {
        arg_type: "System.Int32".to_string(),
        value: AttrValue::I32(v),
    }
}

#[test]
fn attributes_survive_with_primitive_arguments_only() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let program = p.declare_type(asm, common::class("App.Program"));
    p.add_field(
        &program,
        FieldDesc {
            name: "counter".to_string(),
            field_type: "System.Int32".to_string(),
            is_static: false,
            is_public: false,
        },
    );
    let main = p.add_method(
        &program,
        common::static_method("Main", &[], "System.Void"),
        Some(common::body(vec![OpCode::Ret])),
    );
    p.set_entry_point(&main);

    p.add_type_attribute(&program, attr(INTERNAL, Vec::new()));
    p.add_type_attribute(
        &program,
        attr(
            "App.VersionAttribute",
            vec![
                int_arg(3),
                AttrArg {
                    arg_type: "System.String".to_string(),
                    value: AttrValue::Str("beta".to_string()),
                },
                AttrArg {
                    arg_type: "System.Type".to_string(),
                    value: AttrValue::Str("App.Program".to_string()),
                },
            ],
        ),
    );
    p.add_field_attribute(&program, "counter", attr("App.TrackedAttribute", vec![int_arg(1)]));
    p.add_method_attribute(&main, attr("App.EntryAttribute", Vec::new()));
    p.add_method_attribute(&main, attr(INTERNAL, Vec::new()));

    let module = IrBuilder::new(&p).build().expect("build");
    let ty = module.get_type("App.Program").expect("program type");

    assert_eq!(ty.attributes.len(), 1, "compiler-internal attribute dropped");
    let version = &ty.attributes[0];
    assert_eq!(version.il_name, "App.VersionAttribute");
    assert_eq!(version.cpp_name, "App_VersionAttribute");
    assert_eq!(version.args.len(), 2, "System.Type argument is not representable");
    assert_eq!(version.args[0].value, AttrValue::I32(3));
    assert_eq!(version.args[1].value, AttrValue::Str("beta".to_string()));

    assert_eq!(ty.fields[0].attributes.len(), 1);
    assert_eq!(ty.fields[0].attributes[0].il_name, "App.TrackedAttribute");

    let main_ir = ty.methods.iter().find(|m| m.name == "Main").expect("Main");
    assert_eq!(main_ir.attributes.len(), 1);
    assert_eq!(main_ir.attributes[0].il_name, "App.EntryAttribute");

    // The compiler-internal list is closed and nothing in it survives.
    for ty in &module.types {
        for a in ty
            .attributes
            .iter()
            .chain(ty.methods.iter().flat_map(|m| m.attributes.iter()))
        {
            assert_ne!(a.il_name, INTERNAL);
        }
    }
}
