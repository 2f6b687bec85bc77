use log::trace;

use crate::il::provider::MetadataProvider;
use crate::intercept::{
    CANCELLATION_TOKEN, CTS, EQUALITY_COMPARER, READONLY_SPAN, SPAN, TASK, TCS, THREAD,
};
use crate::ir::module::{IrField, IrModule, IrType};
use crate::names::{self, NameMapper};

/// Makes sure the module holds a `Type` for the given name, synthesizing the
/// catalogued built-ins and instantiating user generics from their open
/// definitions. Returns follow-up names the new type depends on (field types
/// that are themselves closed instantiations); the builder drains those to a
/// fixpoint.
pub fn ensure_instantiation<P: MetadataProvider>(
    provider: &P,
    mapper: &mut NameMapper,
    module: &mut IrModule,
    il_name: &str,
) -> Vec<String> {
    if module.has_type(il_name) {
        return Vec::new();
    }
    match il_name {
        THREAD => {
            let mut ty = synthetic(mapper, il_name);
            ty.fields.push(synthetic_field("_handle", "System.IntPtr"));
            module.push_type(ty);
            return Vec::new();
        }
        CTS => {
            let mut ty = synthetic(mapper, il_name);
            ty.fields.push(synthetic_field("_state", "System.Int32"));
            module.push_type(ty);
            return Vec::new();
        }
        CANCELLATION_TOKEN => {
            mapper.register_value_type(il_name);
            let mut ty = synthetic(mapper, il_name);
            ty.is_value_type = true;
            ty.fields.push(synthetic_field("_source", "System.IntPtr"));
            module.push_type(ty);
            return Vec::new();
        }
        _ => {}
    }

    let Some((open, args)) = names::generic_parts(il_name) else {
        return Vec::new();
    };
    match open.as_str() {
        SPAN | READONLY_SPAN => {
            mapper.register_value_type(il_name);
            let mut ty = synthetic(mapper, il_name);
            ty.is_value_type = true;
            ty.is_sealed = true;
            ty.fields.push(synthetic_field("_reference", "System.IntPtr"));
            ty.fields.push(synthetic_field("_length", "System.Int32"));
            module.push_type(ty);
            Vec::new()
        }
        TCS => {
            let Some(result) = args.first() else {
                return Vec::new();
            };
            let task = format!("{TASK}<{result}>");
            let mut ty = synthetic(mapper, il_name);
            ty.fields.push(synthetic_field("_task", &task));
            module.push_type(ty);
            vec![task]
        }
        TASK => {
            let Some(result) = args.first() else {
                return Vec::new();
            };
            let mut ty = synthetic(mapper, il_name);
            ty.fields.push(synthetic_field("_result", result));
            module.push_type(ty);
            Vec::new()
        }
        EQUALITY_COMPARER => {
            let mut ty = synthetic(mapper, il_name);
            ty.is_sealed = true;
            let mut slot = synthetic_field("_default", "System.Object");
            slot.is_static = true;
            ty.static_fields.push(slot);
            module.push_type(ty);
            Vec::new()
        }
        _ => instantiate_user_generic(provider, mapper, module, il_name, &open, &args),
    }
}

/// Closes a user generic over concrete arguments by copying the open
/// definition's fields with `!n` placeholders substituted. Method bodies stay
/// with the open definition; only the layout is per-instantiation.
fn instantiate_user_generic<P: MetadataProvider>(
    provider: &P,
    mapper: &mut NameMapper,
    module: &mut IrModule,
    il_name: &str,
    open: &str,
    args: &[String],
) -> Vec<String> {
    let cpp_name = mapper.cpp_type(il_name, true);
    let Some(handle) = provider.find_type(open) else {
        trace!("no open definition for {il_name}, synthesizing an empty shell");
        module.push_type(IrType::new(il_name, cpp_name));
        return Vec::new();
    };
    let Some(desc) = provider.type_desc(&handle) else {
        module.push_type(IrType::new(il_name, cpp_name));
        return Vec::new();
    };

    if desc.is_value_type {
        mapper.register_value_type(il_name);
    }
    let mut ty = IrType::new(il_name, cpp_name);
    ty.namespace = desc.namespace.clone();
    ty.is_value_type = desc.is_value_type;
    ty.is_sealed = desc.is_sealed;
    ty.is_interface = desc.is_interface;
    ty.base = desc.base.as_deref().map(|b| substitute(b, args));
    ty.origin = Some(handle.clone());

    let mut follow_ups = Vec::new();
    for field in provider.fields(&handle) {
        let field_type = substitute(&field.field_type, args);
        if names::generic_parts(&field_type).is_some() {
            follow_ups.push(field_type.clone());
        }
        let target = if field.is_static {
            &mut ty.static_fields
        } else {
            &mut ty.fields
        };
        target.push(IrField {
            cpp_name: NameMapper::cpp_field_name(&field.name),
            name: field.name,
            field_type,
            is_static: field.is_static,
            is_public: field.is_public,
            attributes: Vec::new(),
        });
    }
    module.push_type(ty);
    follow_ups
}

/// Replaces `!0`, `!1`, ... generic parameter placeholders with the closed
/// argument list. Highest indices go first so `!12` never collides with `!1`.
fn substitute(type_name: &str, args: &[String]) -> String {
    let mut out = type_name.to_string();
    for (i, arg) in args.iter().enumerate().rev() {
        out = out.replace(&format!("!{i}"), arg);
    }
    out
}

fn synthetic(mapper: &NameMapper, il_name: &str) -> IrType {
    let mut ty = IrType::new(il_name, mapper.cpp_type(il_name, true));
    ty.is_runtime_provided = true;
    ty
}

fn synthetic_field(name: &str, field_type: &str) -> IrField {
    IrField {
        name: name.to_string(),
        cpp_name: NameMapper::cpp_field_name(name),
        field_type: field_type.to_string(),
        is_static: false,
        is_public: false,
        attributes: Vec::new(),
    }
}
