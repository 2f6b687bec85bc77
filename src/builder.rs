use log::{debug, info};

use crate::attrs;
use crate::errors::{BuildError, Result};
use crate::generics;
use crate::il::model::{AssemblyHandle, MethodHandle};
use crate::il::provider::MetadataProvider;
use crate::ir::module::{IrField, IrMethod, IrModule, IrParam, IrType, PrimitiveDesc};
use crate::lift;
use crate::names::{self, NameMapper};
use crate::reach::{ReachabilityAnalyzer, method_key};

#[derive(Clone, Debug, Default)]
pub struct BuildOptions {
    /// Seed from the public surface even when the root assembly declares an
    /// entry point.
    pub force_library: bool,
}

/// Drives one translation: reachability, shells, body lifting, attributes.
///
/// The builder owns the name mapper (and with it the registered value-type
/// set), so concurrent translations in one host cannot interfere as long as
/// each gets its own builder.
pub struct IrBuilder<'a, P: MetadataProvider> {
    provider: &'a P,
    mapper: NameMapper,
    options: BuildOptions,
}

impl<'a, P: MetadataProvider> IrBuilder<'a, P> {
    pub fn new(provider: &'a P) -> Self {
        Self::with_options(provider, BuildOptions::default())
    }

    pub fn with_options(provider: &'a P, options: BuildOptions) -> Self {
        Self {
            provider,
            mapper: NameMapper::new(),
            options,
        }
    }

    pub fn build(mut self) -> Result<IrModule> {
        self.mapper.reset();
        if let Some(name) = self.provider.assembly_name(AssemblyHandle(0)) {
            debug!("translating root assembly {name}");
        }

        let mut analyzer = ReachabilityAnalyzer::new(self.provider);
        if self.options.force_library {
            analyzer = analyzer.force_library();
        }
        let reach = analyzer.run();

        let mut module = IrModule::new();
        for (il_name, cpp_name, size) in names::primitive_descriptors() {
            module.primitives.push(PrimitiveDesc {
                il_name: il_name.to_string(),
                cpp_name: cpp_name.to_string(),
                size,
            });
        }

        // Value types must be registered before anything projects a
        // declaration type or default literal.
        for handle in &reach.types {
            if let Some(desc) = self.provider.type_desc(handle) {
                if desc.is_value_type {
                    self.mapper.register_value_type(&desc.fullname);
                }
            }
        }

        debug!("building shells for {} types", reach.types.len());
        for handle in &reach.types {
            let Some(desc) = self.provider.type_desc(handle) else {
                continue;
            };
            let mut ty = IrType::new(
                desc.fullname.clone(),
                self.mapper.cpp_type(&desc.fullname, true),
            );
            ty.namespace = desc.namespace.clone();
            ty.is_value_type = desc.is_value_type;
            ty.is_sealed = desc.is_sealed;
            ty.is_interface = desc.is_interface;
            ty.has_generic_params = desc.generic_param_count > 0;
            ty.base = desc.base.clone();
            ty.origin = Some(handle.clone());
            for field in self.provider.fields(handle) {
                let ir_field = IrField {
                    cpp_name: NameMapper::cpp_field_name(&field.name),
                    name: field.name,
                    field_type: field.field_type,
                    is_static: field.is_static,
                    is_public: field.is_public,
                    attributes: Vec::new(),
                };
                if ir_field.is_static {
                    ty.static_fields.push(ir_field);
                } else {
                    ty.fields.push(ir_field);
                }
            }
            module.push_type(ty);
        }

        // Field layouts may mention closed instantiations the worklist only
        // knows by name.
        let mut layout_requests = Vec::new();
        for ty in &module.types {
            for field in ty.fields.iter().chain(ty.static_fields.iter()) {
                if names::generic_parts(&field.field_type).is_some() {
                    layout_requests.push(field.field_type.clone());
                }
            }
        }
        satisfy_requests(self.provider, &mut self.mapper, &mut module, layout_requests);

        // Method shells, remembering which bodies to lift. Open generic
        // definitions keep their shells; their bodies only make sense per
        // closed instantiation.
        let mut pending: Vec<(String, usize, MethodHandle)> = Vec::new();
        for mh in &reach.methods {
            let Some(desc) = self.provider.method_desc(mh) else {
                continue;
            };
            let Some(ty) = module.get_type_mut(&mh.owner_fqn) else {
                continue;
            };
            let cpp_name = NameMapper::cpp_method_name(&ty.cpp_name, &desc.name);
            let params = desc
                .params
                .iter()
                .enumerate()
                .map(|(i, p)| IrParam {
                    name: if p.name.is_empty() {
                        format!("a{i}")
                    } else {
                        NameMapper::cpp_identifier(&p.name)
                    },
                    param_type: p.param_type.clone(),
                })
                .collect();
            let index = ty.methods.len();
            ty.methods.push(IrMethod {
                name: desc.name.clone(),
                cpp_name,
                params,
                return_type: desc.return_type.clone(),
                has_this: desc.has_this,
                is_ctor: desc.is_ctor,
                is_static: desc.is_static,
                is_virtual: desc.is_virtual,
                locals: Vec::new(),
                init_locals: false,
                blocks: Vec::new(),
                exception_regions: Vec::new(),
                attributes: Vec::new(),
            });
            if !ty.has_generic_params {
                pending.push((mh.owner_fqn.clone(), index, mh.clone()));
            }
        }

        debug!("lifting {} method bodies", pending.len());
        for (owner, index, mh) in pending {
            let Some(desc) = self.provider.method_desc(&mh) else {
                continue;
            };
            let Some(body) = self.provider.method_body(&mh) else {
                continue;
            };
            let lifted = lift::lift_method(self.provider, &self.mapper, &mh, &desc, &body)
                .map_err(|source| BuildError::Lift {
                    method: method_key(&owner, &desc),
                    source,
                })?;
            if let Some(method) = module
                .get_type_mut(&owner)
                .and_then(|ty| ty.methods.get_mut(index))
            {
                method.blocks = lifted.blocks;
                method.locals = lifted.locals;
                method.init_locals = body.init_locals;
                method.exception_regions = body.exception_regions.clone();
            }
            satisfy_requests(self.provider, &mut self.mapper, &mut module, lifted.requested);
        }

        attrs::collect(self.provider, &self.mapper, &mut module);

        info!(
            "module built: {} types, {} reachable methods",
            module.types.len(),
            reach.methods.len()
        );
        Ok(module)
    }
}

/// Drains instantiation requests to a fixpoint; a synthesized type may name
/// further closed instantiations in its own layout.
fn satisfy_requests<P: MetadataProvider>(
    provider: &P,
    mapper: &mut NameMapper,
    module: &mut IrModule,
    mut requests: Vec<String>,
) {
    while let Some(name) = requests.pop() {
        requests.extend(generics::ensure_instantiation(provider, mapper, module, &name));
    }
}
