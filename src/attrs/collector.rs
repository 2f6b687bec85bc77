use log::trace;

use crate::il::model::{AttrArg, AttributeDesc};
use crate::il::provider::MetadataProvider;
use crate::ir::attributes::CustomAttribute;
use crate::ir::module::IrModule;
use crate::names::NameMapper;

/// Attributes the source-language compiler synthesizes for its own
/// bookkeeping. They carry no meaning in the emitted program and are dropped
/// wholesale.
const COMPILER_INTERNAL: &[&str] = &[
    "System.Runtime.CompilerServices.CompilerGeneratedAttribute",
    "System.Runtime.CompilerServices.NullableAttribute",
    "System.Runtime.CompilerServices.NullableContextAttribute",
    "System.Runtime.CompilerServices.IsReadOnlyAttribute",
    "System.Runtime.CompilerServices.IsByRefLikeAttribute",
    "System.Runtime.CompilerServices.AsyncStateMachineAttribute",
    "System.Runtime.CompilerServices.IteratorStateMachineAttribute",
    "System.Runtime.CompilerServices.ScopedRefAttribute",
    "System.ParamArrayAttribute",
    "Microsoft.CodeAnalysis.EmbeddedAttribute",
];

/// Second pass over the populated module: copies custom attributes from the
/// loader onto types, then fields (matched by name), then methods (matched
/// by name and parameter count). Open generic definitions are skipped; they
/// have no instantiable attribute values.
pub fn collect<P: MetadataProvider>(provider: &P, mapper: &NameMapper, module: &mut IrModule) {
    for ty in module.types.iter_mut() {
        let Some(origin) = ty.origin.clone() else {
            continue;
        };
        if ty.has_generic_params {
            continue;
        }
        ty.attributes = convert(mapper, provider.type_attributes(&origin));

        for field in ty.fields.iter_mut().chain(ty.static_fields.iter_mut()) {
            let attrs = provider.field_attributes(&origin, &field.name);
            if !attrs.is_empty() {
                trace!("{} attributes on field {}", attrs.len(), field.name);
            }
            field.attributes = convert(mapper, attrs);
        }

        let loader_methods = provider.methods(&origin);
        for method in ty.methods.iter_mut() {
            let matched = loader_methods.iter().find(|m| {
                provider
                    .method_desc(m)
                    .is_some_and(|d| d.name == method.name && d.params.len() == method.params.len())
            });
            if let Some(handle) = matched {
                method.attributes = convert(mapper, provider.method_attributes(handle));
            }
        }
    }
}

fn convert(mapper: &NameMapper, attrs: Vec<AttributeDesc>) -> Vec<CustomAttribute> {
    attrs
        .into_iter()
        .filter(|a| !COMPILER_INTERNAL.contains(&a.attr_type.as_str()))
        .map(|a| CustomAttribute {
            cpp_name: mapper.cpp_type(&a.attr_type, true),
            args: a.args.into_iter().filter(arg_representable).collect(),
            il_name: a.attr_type,
        })
        .collect()
}

/// Only primitive and string constructor arguments survive; typed or array
/// arguments are dropped.
fn arg_representable(arg: &AttrArg) -> bool {
    NameMapper::is_primitive(&arg.arg_type)
}
