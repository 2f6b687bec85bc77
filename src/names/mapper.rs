use std::collections::HashSet;

/// Projects IL type and member names onto flat C++ identifiers.
///
/// Everything here is deterministic: the same IL name always maps to the same
/// identifier for a given set of registered value types. The set lives on the
/// mapper value itself (owned by the builder) so that two translations running
/// in one process cannot bleed into each other.
#[derive(Debug, Default, Clone)]
pub struct NameMapper {
    value_types: HashSet<String>,
}

const SANITIZED: &[char] = &['.', '/', '<', '>', ',', '`', '+', '=', '-'];

/// IL exception types backed directly by the runtime header. The table is
/// closed; everything else sanitizes like an ordinary class name.
const EXCEPTION_TYPES: &[(&str, &str)] = &[
    ("System.Exception", "cil2cpp::Exception"),
    ("System.NullReferenceException", "cil2cpp::NullReferenceException"),
    ("System.IndexOutOfRangeException", "cil2cpp::IndexOutOfRangeException"),
    ("System.InvalidCastException", "cil2cpp::InvalidCastException"),
    ("System.InvalidOperationException", "cil2cpp::InvalidOperationException"),
    ("System.ArgumentException", "cil2cpp::ArgumentException"),
    ("System.ArgumentNullException", "cil2cpp::ArgumentNullException"),
    ("System.OverflowException", "cil2cpp::OverflowException"),
    ("System.ArithmeticException", "cil2cpp::OverflowException"),
    ("System.NotSupportedException", "cil2cpp::InvalidOperationException"),
    ("System.NotImplementedException", "cil2cpp::InvalidOperationException"),
];

/// (IL name, C++ spelling, byte size). Size 0 marks the reference primitives
/// and void, which never appear as array elements.
const PRIMITIVES: &[(&str, &str, u32)] = &[
    ("System.Void", "void", 0),
    ("System.Boolean", "bool", 1),
    ("System.Char", "char16_t", 2),
    ("System.SByte", "int8_t", 1),
    ("System.Byte", "uint8_t", 1),
    ("System.Int16", "int16_t", 2),
    ("System.UInt16", "uint16_t", 2),
    ("System.Int32", "int32_t", 4),
    ("System.UInt32", "uint32_t", 4),
    ("System.Int64", "int64_t", 8),
    ("System.UInt64", "uint64_t", 8),
    ("System.Single", "float", 4),
    ("System.Double", "double", 8),
    ("System.IntPtr", "intptr_t", 8),
    ("System.UIntPtr", "uintptr_t", 8),
    ("System.String", "cil2cpp::String", 0),
    ("System.Object", "cil2cpp::Object", 0),
];

impl NameMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the registered value-type set. Called once at the start of every
    /// translation invocation.
    pub fn reset(&mut self) {
        self.value_types.clear();
    }

    pub fn register_value_type(&mut self, il_name: &str) {
        self.value_types.insert(il_name.to_string());
    }

    pub fn is_primitive(il_name: &str) -> bool {
        PRIMITIVES.iter().any(|(il, _, _)| *il == il_name)
    }

    /// Value types are the non-reference primitives plus anything registered
    /// during IR build (user structs, spans, cancellation tokens).
    pub fn is_value_type(&self, il_name: &str) -> bool {
        match il_name {
            "System.Void" | "System.String" | "System.Object" => false,
            _ => Self::is_primitive(il_name) || self.value_types.contains(il_name),
        }
    }

    /// Projects an IL type name to its C++ spelling. `as_pointer` records that
    /// the caller already appends a pointer marker, so reference primitives do
    /// not grow a second one.
    pub fn cpp_type(&self, il_name: &str, as_pointer: bool) -> String {
        let name = strip_modifiers(il_name).trim();
        if let Some(rest) = name.strip_suffix('&').or_else(|| name.strip_suffix('*')) {
            return format!("{}*", self.cpp_type(rest.trim_end(), true));
        }
        if name.ends_with("[]") {
            return "cil2cpp::Array*".to_string();
        }
        if mdarray_rank(name).is_some() {
            return "cil2cpp::MdArray*".to_string();
        }
        if let Some((_, cpp)) = EXCEPTION_TYPES.iter().find(|(il, _)| *il == name) {
            return cpp.to_string();
        }
        if let Some((_, cpp, _)) = PRIMITIVES.iter().find(|(il, _, _)| *il == name) {
            if matches!(name, "System.String" | "System.Object") && !as_pointer {
                return format!("{cpp}*");
            }
            return cpp.to_string();
        }
        if let Some((open, args)) = generic_parts(name) {
            return mangle_instance(&open, &args);
        }
        sanitize(name)
    }

    /// Projection for declaration sites: reference types carry a single
    /// trailing pointer marker, value types and void stay bare.
    pub fn cpp_declaration_type(&self, il_name: &str) -> String {
        let name = strip_modifiers(il_name).trim();
        let cpp = self.cpp_type(name, false);
        if cpp == "void" || cpp.ends_with('*') || self.is_value_type(name) {
            return cpp;
        }
        format!("{cpp}*")
    }

    pub fn cpp_method_name(owner_cpp: &str, method_name: &str) -> String {
        format!("{}_{}", owner_cpp, sanitize(method_name))
    }

    /// Fields drop one leading underscore and gain an `f_` prefix, which keeps
    /// them clear of both C++ keywords and the reserved identifier space.
    pub fn cpp_field_name(field_name: &str) -> String {
        let name = field_name.strip_prefix('_').unwrap_or(field_name);
        format!("f_{}", sanitize(name))
    }

    pub fn cpp_identifier(name: &str) -> String {
        sanitize(name)
    }

    /// The C++ literal that zero-initializes a value of the given type. The
    /// argument may be an IL name or an already projected C++ spelling.
    pub fn default_literal(&self, type_name: &str) -> String {
        let name = strip_modifiers(type_name).trim();
        if self.value_types.contains(name) {
            return "{}".to_string();
        }
        match name {
            "System.Boolean" | "bool" => "false".to_string(),
            "System.Single" | "float" => "0.0f".to_string(),
            "System.Double" | "double" => "0.0".to_string(),
            "System.Char" | "char16_t" => "u'\\0'".to_string(),
            "System.String" | "System.Object" => "nullptr".to_string(),
            _ if name.ends_with('*') || name.ends_with('&') || name.ends_with(']') => {
                "nullptr".to_string()
            }
            _ if Self::is_primitive(name) => "0".to_string(),
            _ if is_primitive_cpp(name) => "0".to_string(),
            _ => "nullptr".to_string(),
        }
    }
}

/// The module side table the runtime uses for array element reflection:
/// every value primitive with its C++ spelling and byte size.
pub fn primitive_descriptors() -> impl Iterator<Item = (&'static str, &'static str, u32)> {
    PRIMITIVES
        .iter()
        .filter(|(_, _, size)| *size != 0)
        .map(|(il, cpp, size)| (*il, *cpp, *size))
}

/// Splits a closed generic instantiation (``Open`N<A, B>``) into the open
/// name and its argument list, honoring nested angle brackets. Open
/// definitions without an argument list return `None`.
pub fn generic_parts(il_name: &str) -> Option<(String, Vec<String>)> {
    let tick = il_name.find('`')?;
    let rest = &il_name[tick + 1..];
    let digits = rest.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || !rest[digits..].starts_with('<') || !il_name.ends_with('>') {
        return None;
    }
    let open = il_name[..tick + 1 + digits].to_string();
    let inner = &il_name[tick + 1 + digits + 1..il_name.len() - 1];
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    for (i, c) in inner.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                args.push(inner[start..i].trim().to_string());
                start = i + 1;
            }
            _ => {}
        }
    }
    if !inner.is_empty() {
        args.push(inner[start..].trim().to_string());
    }
    Some((open, args))
}

/// Rank of a multi-dimensional array name (`T[,]`, `T[0...,0...]`), if the
/// trailing bracket group carries commas or bound ranges. Plain `T[]` is the
/// single-dimension case and returns `None`.
pub fn mdarray_rank(il_name: &str) -> Option<usize> {
    if !il_name.ends_with(']') {
        return None;
    }
    let open = il_name.rfind('[')?;
    let inner = &il_name[open + 1..il_name.len() - 1];
    if inner.contains(',') {
        return Some(inner.matches(',').count() + 1);
    }
    if inner.contains("..") {
        return Some(1);
    }
    None
}

/// Element IL name of an array name, single- or multi-dimensional.
pub fn array_element(il_name: &str) -> Option<&str> {
    if !il_name.ends_with(']') {
        return None;
    }
    il_name.rfind('[').map(|open| il_name[..open].trim_end())
}

pub fn sanitize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ')
        .map(|c| if SANITIZED.contains(&c) { '_' } else { c })
        .collect()
}

fn mangle_instance(open_name: &str, args: &[String]) -> String {
    let mut out = sanitize(open_name);
    for arg in args {
        out.push('_');
        out.push_str(&sanitize(arg));
    }
    out
}

fn strip_modifiers(il_name: &str) -> &str {
    for marker in [" modreq(", " modopt("] {
        if let Some(pos) = il_name.find(marker) {
            return &il_name[..pos];
        }
    }
    il_name
}

fn is_primitive_cpp(name: &str) -> bool {
    PRIMITIVES.iter().any(|(_, cpp, _)| *cpp == name)
        || matches!(
            name,
            "int8_t"
                | "uint8_t"
                | "int16_t"
                | "uint16_t"
                | "int32_t"
                | "uint32_t"
                | "int64_t"
                | "uint64_t"
                | "intptr_t"
                | "uintptr_t"
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_project_to_fixed_width_spellings() {
        let mapper = NameMapper::new();
        assert_eq!(mapper.cpp_type("System.Int32", false), "int32_t");
        assert_eq!(mapper.cpp_declaration_type("System.Int32"), "int32_t");
        assert_eq!(mapper.default_literal("System.Int32"), "0");
        assert_eq!(mapper.cpp_type("System.Double", false), "double");
        assert_eq!(mapper.cpp_type("System.Void", false), "void");
    }

    #[test]
    fn reference_primitives_gain_a_pointer() {
        let mapper = NameMapper::new();
        assert_eq!(mapper.cpp_type("System.String", false), "cil2cpp::String*");
        assert_eq!(mapper.cpp_type("System.Object", false), "cil2cpp::Object*");
        assert_eq!(mapper.default_literal("System.String"), "nullptr");
        // the caller already appends a pointer marker
        assert_eq!(mapper.cpp_type("System.String", true), "cil2cpp::String");
    }

    #[test]
    fn nested_generic_names_collapse_to_flat_identifiers() {
        let mapper = NameMapper::new();
        assert_eq!(
            mapper.cpp_type("Foo.Bar/Baz`1<System.Int32>", false),
            "Foo_Bar_Baz_1_System_Int32"
        );
    }

    #[test]
    fn runtime_exception_table_wins_over_the_sanitizer() {
        let mapper = NameMapper::new();
        assert_eq!(
            mapper.cpp_type("System.NullReferenceException", false),
            "cil2cpp::NullReferenceException"
        );
        assert_eq!(
            mapper.cpp_type("System.NotImplementedException", false),
            "cil2cpp::InvalidOperationException"
        );
        assert_eq!(
            mapper.cpp_declaration_type("System.ArgumentException"),
            "cil2cpp::ArgumentException*"
        );
    }

    #[test]
    fn arrays_project_to_runtime_array_pointers() {
        let mapper = NameMapper::new();
        assert_eq!(mapper.cpp_type("System.Int32[]", false), "cil2cpp::Array*");
        assert_eq!(mapper.cpp_type("System.Int32[,]", false), "cil2cpp::MdArray*");
        assert_eq!(
            mapper.cpp_type("System.Int32[0...,0...]", false),
            "cil2cpp::MdArray*"
        );
        assert_eq!(mdarray_rank("System.Int32[,,]"), Some(3));
        assert_eq!(mdarray_rank("System.Int32[]"), None);
        assert_eq!(array_element("System.Int32[,]"), Some("System.Int32"));
    }

    #[test]
    fn byref_recurses_and_appends_a_pointer() {
        let mapper = NameMapper::new();
        assert_eq!(mapper.cpp_type("System.Int32&", false), "int32_t*");
        assert_eq!(mapper.cpp_type("System.String&", false), "cil2cpp::String*");
    }

    #[test]
    fn modifier_suffixes_are_stripped() {
        let mapper = NameMapper::new();
        assert_eq!(
            mapper.cpp_type("System.Int32 modreq(System.Runtime.InteropServices.InAttribute)", false),
            "int32_t"
        );
    }

    #[test]
    fn registered_value_types_stay_bare_and_default_to_aggregates() {
        let mut mapper = NameMapper::new();
        assert_eq!(mapper.cpp_declaration_type("App.Point"), "App_Point*");
        mapper.register_value_type("App.Point");
        assert_eq!(mapper.cpp_declaration_type("App.Point"), "App_Point");
        assert_eq!(mapper.default_literal("App.Point"), "{}");
        mapper.reset();
        assert_eq!(mapper.cpp_declaration_type("App.Point"), "App_Point*");
    }

    #[test]
    fn generic_mangling_starts_with_the_sanitized_open_name() {
        for args in [
            vec!["System.Int32".to_string()],
            vec!["System.String".to_string()],
            vec!["System.Collections.Generic.List`1<System.Int32>".to_string()],
        ] {
            let name = format!("My.Dict`1<{}>", args.join(", "));
            let mapper = NameMapper::new();
            let mangled = mapper.cpp_type(&name, false);
            let mut expected = sanitize("My.Dict`1");
            for arg in &args {
                expected.push('_');
                expected.push_str(&sanitize(arg));
            }
            assert_eq!(mangled, expected);
        }
    }

    #[test]
    fn generic_parts_honors_nesting() {
        let (open, args) =
            generic_parts("A.B`2<System.Int32, A.C`1<System.String>>").expect("closed instance");
        assert_eq!(open, "A.B`2");
        assert_eq!(args, ["System.Int32", "A.C`1<System.String>"]);
        assert!(generic_parts("System.Span`1").is_none());
    }

    #[test]
    fn member_projection() {
        assert_eq!(NameMapper::cpp_method_name("App_Program", ".ctor"), "App_Program__ctor");
        assert_eq!(NameMapper::cpp_method_name("App_Program", "Main"), "App_Program_Main");
        assert_eq!(NameMapper::cpp_field_name("_length"), "f_length");
        assert_eq!(NameMapper::cpp_field_name("value"), "f_value");
        assert_eq!(
            NameMapper::cpp_field_name("<Count>k__BackingField"),
            "f__Count_k__BackingField"
        );
    }
}
