use std::collections::{HashSet, VecDeque};

use log::{debug, trace};

use crate::il::model::{MethodDesc, MethodHandle, MethodRefDesc, TokenKind, TypeHandle};
use crate::il::opcode::OpCode;
use crate::il::provider::MetadataProvider;
use crate::names;

/// Result of the closure: types in first-marked order, methods in seed
/// order. Orders are stable for a given input, which keeps the emitted
/// module deterministic.
#[derive(Debug, Default)]
pub struct ReachableSet {
    pub types: Vec<TypeHandle>,
    pub methods: Vec<MethodHandle>,
    type_names: HashSet<String>,
    method_keys: HashSet<String>,
}

impl ReachableSet {
    pub fn contains_type(&self, il_name: &str) -> bool {
        self.type_names.contains(il_name)
    }

    pub fn contains_method(&self, owner_fqn: &str, desc: &MethodDesc) -> bool {
        self.method_keys.contains(&method_key(owner_fqn, desc))
    }
}

/// Dedupe key for a method: owner full name plus signature.
pub fn method_key(owner_fqn: &str, desc: &MethodDesc) -> String {
    let params = desc
        .params
        .iter()
        .map(|p| p.param_type.as_str())
        .collect::<Vec<_>>()
        .join(",");
    format!("{}::{}({})", owner_fqn, desc.name, params)
}

/// Worklist closure over methods, types and fields.
///
/// Seeding starts from the entry point, or from the whole public surface in
/// library mode. Marking a type conservatively seeds every one of its
/// methods: virtual dispatch targets are hard to predict without a hierarchy
/// analysis, and a spurious reachable method is much cheaper downstream than
/// a missing one. References that do not resolve within the loaded assembly
/// set are skipped without diagnostics; the interception tables cover the
/// built-ins this intentionally leaves behind.
pub struct ReachabilityAnalyzer<'a, P: MetadataProvider> {
    provider: &'a P,
    force_library: bool,
    marked: HashSet<String>,
    types: Vec<TypeHandle>,
    method_keys: HashSet<String>,
    methods: Vec<MethodHandle>,
    queue: VecDeque<MethodHandle>,
}

impl<'a, P: MetadataProvider> ReachabilityAnalyzer<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self {
            provider,
            force_library: false,
            marked: HashSet::new(),
            types: Vec::new(),
            method_keys: HashSet::new(),
            methods: Vec::new(),
            queue: VecDeque::new(),
        }
    }

    /// Treat the root assembly as a library even if it has an entry point.
    pub fn force_library(mut self) -> Self {
        self.force_library = true;
        self
    }

    /// Adds an extra root before `run`. The closure only ever grows with
    /// additional seeds.
    pub fn add_seed(&mut self, method: MethodHandle) {
        self.mark_type(&method.owner_fqn);
        self.seed_method(method);
    }

    pub fn run(mut self) -> ReachableSet {
        match self.provider.entry_point() {
            Some(entry) if !self.force_library => {
                debug!("seeding from entry point {}::{}", entry.owner_fqn, entry.ordinal);
                self.mark_type(&entry.owner_fqn);
                self.seed_method(entry);
            }
            _ => self.seed_public_surface(),
        }

        while let Some(method) = self.queue.pop_front() {
            self.process_method(&method);
        }

        debug!(
            "reachability: {} types, {} methods",
            self.types.len(),
            self.methods.len()
        );
        // `marked` also remembers names that never resolved; the result only
        // reports the types that did.
        let type_names = self.types.iter().map(|t| t.fullname.clone()).collect();
        ReachableSet {
            types: self.types,
            methods: self.methods,
            type_names,
            method_keys: self.method_keys,
        }
    }

    fn seed_public_surface(&mut self) {
        debug!("no entry point, seeding the public surface");
        for handle in self.provider.root_types() {
            let Some(desc) = self.provider.type_desc(&handle) else {
                continue;
            };
            if !desc.is_public {
                continue;
            }
            self.mark_type(&handle.fullname);
            for method in self.provider.methods(&handle) {
                let Some(mdesc) = self.provider.method_desc(&method) else {
                    continue;
                };
                if mdesc.is_public || mdesc.is_family {
                    self.seed_method(method);
                }
            }
        }
    }

    fn seed_method(&mut self, method: MethodHandle) {
        let Some(desc) = self.provider.method_desc(&method) else {
            return;
        };
        let key = method_key(&method.owner_fqn, &desc);
        if !self.method_keys.insert(key) {
            return;
        }
        self.methods.push(method.clone());
        self.queue.push_back(method);
    }

    fn mark_type(&mut self, il_name: &str) {
        let name = il_name.trim();
        if name.is_empty() || !self.marked.insert(name.to_string()) {
            return;
        }

        // Closed instantiations mark their arguments and the open element;
        // the instantiation itself has no loader-side definition.
        if let Some((open, args)) = names::generic_parts(name) {
            for arg in &args {
                self.mark_type(arg);
            }
            self.mark_type(&open);
            return;
        }
        // Decorated names reduce to their element.
        if let Some(rest) = name.strip_suffix('&').or_else(|| name.strip_suffix('*')) {
            self.mark_type(rest);
            return;
        }
        if let Some(element) = names::array_element(name) {
            self.mark_type(element);
            return;
        }

        let Some(handle) = self.provider.find_type(name) else {
            trace!("unresolved type {name}, skipping");
            return;
        };
        let Some(desc) = self.provider.type_desc(&handle) else {
            return;
        };
        trace!("type reachable: {name}");
        self.types.push(handle.clone());

        if let Some(base) = &desc.base {
            self.mark_type(base);
        }
        for iface in &desc.interfaces {
            self.mark_type(iface);
        }
        if let Some(cctor) = self.provider.find_method(name, ".cctor", 0) {
            self.seed_method(cctor);
        }
        for method in self.provider.methods(&handle) {
            self.seed_method(method);
        }
        for field in self.provider.fields(&handle) {
            self.mark_type(&field.field_type);
        }
        for nested in &desc.nested {
            self.mark_type(nested);
        }
    }

    fn process_method(&mut self, method: &MethodHandle) {
        let Some(body) = self.provider.method_body(method) else {
            return;
        };
        let assembly = method.assembly;
        for (_, op) in &body.instructions {
            match op {
                OpCode::Call(t)
                | OpCode::CallVirt(t)
                | OpCode::NewObj(t)
                | OpCode::Jmp(t)
                | OpCode::LdFtn(t)
                | OpCode::LdVirtFtn(t) => {
                    if let Some(mref) = self.provider.method_ref(assembly, *t) {
                        self.follow_method_ref(&mref);
                    }
                }
                OpCode::NewArr(t)
                | OpCode::CastClass(t)
                | OpCode::IsInst(t)
                | OpCode::Box(t)
                | OpCode::Unbox(t)
                | OpCode::UnboxAny(t)
                | OpCode::InitObj(t)
                | OpCode::LdObj(t)
                | OpCode::StObj(t)
                | OpCode::CpObj(t)
                | OpCode::LdElemAny(t)
                | OpCode::StElemAny(t)
                | OpCode::LdElemA(t)
                | OpCode::SizeOf(t)
                | OpCode::MkRefAny(t)
                | OpCode::RefAnyVal(t)
                | OpCode::Constrained(t) => {
                    if let Some(name) = self.provider.type_ref(assembly, *t) {
                        self.mark_type(&name);
                    }
                }
                OpCode::LdFld(t)
                | OpCode::StFld(t)
                | OpCode::LdFldA(t)
                | OpCode::LdSFld(t)
                | OpCode::StSFld(t)
                | OpCode::LdSFldA(t) => {
                    if let Some(fref) = self.provider.field_ref(assembly, *t) {
                        self.mark_type(&fref.owner);
                        self.mark_type(&fref.field_type);
                    }
                }
                OpCode::LdToken(t) => match self.provider.token_kind(assembly, *t) {
                    Some(TokenKind::Type) => {
                        if let Some(name) = self.provider.type_ref(assembly, *t) {
                            self.mark_type(&name);
                        }
                    }
                    Some(TokenKind::Method) => {
                        if let Some(mref) = self.provider.method_ref(assembly, *t) {
                            self.follow_method_ref(&mref);
                        }
                    }
                    Some(TokenKind::Field) => {
                        if let Some(fref) = self.provider.field_ref(assembly, *t) {
                            self.mark_type(&fref.owner);
                            self.mark_type(&fref.field_type);
                        }
                    }
                    None => trace!("unresolved ldtoken operand"),
                },
                _ => {}
            }
        }
    }

    fn follow_method_ref(&mut self, mref: &MethodRefDesc) {
        self.mark_type(&mref.owner);
        for arg in &mref.generic_args {
            self.mark_type(arg);
        }
        // The definition lives on the open type when the owner is a closed
        // instantiation.
        let lookup = names::generic_parts(&mref.owner)
            .map(|(open, _)| open)
            .unwrap_or_else(|| mref.owner.clone());
        match self
            .provider
            .find_method(&lookup, &mref.name, mref.param_types.len())
        {
            Some(target) => self.seed_method(target),
            None => trace!("unresolved method {}::{}", mref.owner, mref.name),
        }
    }
}
