mod common;

use cil2cpp::il::{MemoryProvider, MetadataProvider, OpCode, TypeDesc};
use cil2cpp::reach::ReachabilityAnalyzer;

#[test]
fn entry_call_chain_is_reachable() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");

    let a = p.declare_type(asm, TypeDesc {
        base: Some("App.Base".to_string()),
        ..common::class("App.A")
    });
    let b = p.declare_type(asm, common::class("App.B"));
    let c = p.declare_type(asm, common::class("App.C"));
    p.declare_type(asm, common::class("App.Base"));

    let n_tok = p.method_token(asm, common::call_ref("App.B", "N", &[], "System.Void", false));
    let o_tok = p.method_token(asm, common::call_ref("App.C", "O", &[], "System.Void", false));

    let main = p.add_method(
        &a,
        common::static_method("M", &[], "System.Void"),
        Some(common::body(vec![OpCode::Call(n_tok), OpCode::Ret])),
    );
    p.add_method(
        &b,
        common::static_method("N", &[], "System.Void"),
        Some(common::body(vec![OpCode::Call(o_tok), OpCode::Ret])),
    );
    p.add_method(
        &c,
        common::static_method("O", &[], "System.Void"),
        Some(common::body(vec![OpCode::Ret])),
    );
    p.set_entry_point(&main);

    let reach = ReachabilityAnalyzer::new(&p).run();

    for ty in ["App.A", "App.B", "App.C", "App.Base"] {
        assert!(reach.contains_type(ty), "{ty} should be reachable");
    }
    let names: Vec<_> = reach
        .methods
        .iter()
        .map(|m| format!("{}::{}", m.owner_fqn, m.ordinal))
        .collect();
    assert_eq!(names.len(), 3, "exactly M, N and O: {names:?}");
}

#[test]
fn library_mode_seeds_only_the_public_surface() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("Lib");

    let public_ty = p.declare_type(asm, common::class("Lib.Api"));
    p.add_method(
        &public_ty,
        common::static_method("Visible", &[], "System.Void"),
        Some(common::body(vec![OpCode::Ret])),
    );
    let mut hidden = common::static_method("Hidden", &[], "System.Void");
    hidden.is_public = false;
    p.add_method(&public_ty, hidden, Some(common::body(vec![OpCode::Ret])));

    let mut internal = common::class("Lib.Internal");
    internal.is_public = false;
    p.declare_type(asm, internal);

    let reach = ReachabilityAnalyzer::new(&p).run();

    assert!(reach.contains_type("Lib.Api"));
    assert!(!reach.contains_type("Lib.Internal"));
    // Marking Lib.Api conservatively seeds all of its methods, so Hidden
    // rides along with the public surface.
    assert_eq!(reach.methods.len(), 2);
}

#[test]
fn unresolvable_references_are_silently_skipped() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let a = p.declare_type(asm, common::class("App.A"));

    let missing = p.method_token(
        asm,
        common::call_ref("Elsewhere.Gone", "Missing", &[], "System.Void", false),
    );
    let main = p.add_method(
        &a,
        common::static_method("M", &[], "System.Void"),
        Some(common::body(vec![OpCode::Call(missing), OpCode::Ret])),
    );
    p.set_entry_point(&main);

    let reach = ReachabilityAnalyzer::new(&p).run();
    assert!(!reach.contains_type("Elsewhere.Gone"));
    assert_eq!(reach.methods.len(), 1);
}

#[test]
fn nested_types_and_static_constructors_ride_along() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let outer = p.declare_type(asm, TypeDesc {
        nested: vec!["App.Outer/Closure".to_string()],
        ..common::class("App.Outer")
    });
    let closure = p.declare_type(asm, {
        let mut t = common::class("App.Outer/Closure");
        t.is_public = false;
        t
    });
    p.add_method(
        &closure,
        common::static_method("Run", &[], "System.Void"),
        Some(common::body(vec![OpCode::Ret])),
    );
    p.add_method(
        &outer,
        common::static_method(".cctor", &[], "System.Void"),
        Some(common::body(vec![OpCode::Ret])),
    );
    let main = p.add_method(
        &outer,
        common::static_method("Main", &[], "System.Void"),
        Some(common::body(vec![OpCode::Ret])),
    );
    p.set_entry_point(&main);

    let reach = ReachabilityAnalyzer::new(&p).run();
    assert!(reach.contains_type("App.Outer/Closure"));
    let owners: Vec<_> = reach.methods.iter().map(|m| m.owner_fqn.as_str()).collect();
    assert!(owners.contains(&"App.Outer/Closure"));
    assert_eq!(
        reach.methods.len(),
        3,
        ".cctor, Main and Closure::Run: {owners:?}"
    );
}

#[test]
fn generic_instance_operands_mark_arguments_and_open_element() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let a = p.declare_type(asm, common::class("App.A"));
    p.declare_type(asm, TypeDesc {
        generic_param_count: 1,
        ..common::class("App.List`1")
    });
    p.declare_type(asm, common::class("App.Elem"));

    let tok = p.type_token(asm, "App.List`1<App.Elem>");
    let main = p.add_method(
        &a,
        common::static_method("M", &[], "System.Void"),
        Some(common::body(vec![
            OpCode::LdNull,
            OpCode::IsInst(tok),
            OpCode::Pop,
            OpCode::Ret,
        ])),
    );
    p.set_entry_point(&main);

    let reach = ReachabilityAnalyzer::new(&p).run();
    assert!(reach.contains_type("App.List`1"));
    assert!(reach.contains_type("App.Elem"));
}

#[test]
fn extra_seeds_only_grow_the_closure() {
    let mut p = MemoryProvider::new();
    let asm = p.add_assembly("App");
    let a = p.declare_type(asm, common::class("App.A"));
    let island = p.declare_type(asm, {
        let mut t = common::class("App.Island");
        t.is_public = false;
        t
    });
    let main = p.add_method(
        &a,
        common::static_method("Main", &[], "System.Void"),
        Some(common::body(vec![OpCode::Ret])),
    );
    let extra = p.add_method(
        &island,
        common::static_method("Lonely", &[], "System.Void"),
        Some(common::body(vec![OpCode::Ret])),
    );
    p.set_entry_point(&main);

    let baseline = ReachabilityAnalyzer::new(&p).run();
    assert!(!baseline.contains_type("App.Island"));

    let mut analyzer = ReachabilityAnalyzer::new(&p);
    analyzer.add_seed(extra);
    let grown = analyzer.run();

    for m in &baseline.methods {
        let desc = p.method_desc(m).expect("method desc");
        assert!(
            grown.contains_method(&m.owner_fqn, &desc),
            "seeded run lost {}",
            m.owner_fqn
        );
    }
    assert!(grown.contains_type("App.Island"));
    assert!(grown.methods.len() > baseline.methods.len());
}
