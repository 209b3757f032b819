use cs_model::{ClassAccessFlag, ClassFile, FieldDescriptor, MethodAccessFlag, MethodDescriptor};
use std::borrow::Cow;
use std::io;
use std::io::Write;
use std::str::FromStr;

/// `Utf8` constant-pool content is a raw byte string (it may not even be
/// valid UTF-8 until `format_check` has run); the printer only ever needs it
/// for display, so it decodes lossily rather than carrying `Result`s through
/// every render path.
fn text(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

pub fn display_class<W: Write>(mut w: W, class: &ClassFile) -> Result<(), io::Error> {
    let cp = &class.constant_pool;

    writeln!(
        w,
        ".class ({:#X?}) file version {}.{}",
        class.magic, class.major_version, class.minor_version
    )?;

    writeln!(w)?;

    writeln!(
        w,
        "{}class {} extends {}{} {{",
        class_access_flags(class.access_flags),
        text(class.this_class.get(cp).name_index.get(cp)),
        match class.super_class.maybe_get(cp) {
            None => Cow::Borrowed("<none>"),
            Some(class) => text(class.name_index.get(cp)),
        },
        if class.interfaces.is_empty() {
            "".to_string()
        } else {
            format!(
                " implements {}",
                class
                    .interfaces
                    .iter()
                    .map(|i| i.get(cp))
                    .map(|i| text(i.name_index.get(cp)))
                    .collect::<Vec<_>>()
                    .join(",")
            )
        },
    )?;

    writeln!(w, " Attributes:")?;
    for attr in &class.attributes {
        writeln!(w, "  {}", text(attr.attribute_name_index.get(cp)))?;
    }
    writeln!(w)?;

    writeln!(w, " Fields:")?;
    for field in &class.fields {
        let descriptor = text(field.descriptor_index.get(cp));
        writeln!(
            w,
            "  {}{} {}",
            field_access_flags(field.access_flags),
            render_field_descriptor(&descriptor),
            text(field.name_index.get(cp))
        )?;
    }
    writeln!(w)?;

    writeln!(w, " Methods:")?;
    for method in &class.methods {
        let descriptor = text(method.descriptor_index.get(cp));
        writeln!(
            w,
            "  {}{} {}",
            method_access_flags(method.access_flags),
            text(method.name_index.get(cp)),
            render_method_descriptor(&descriptor),
        )?;
    }

    writeln!(w, "}}")?;
    Ok(())
}

/// Renders a field descriptor as a Java-ish type name. Falls back to the
/// raw descriptor string if it doesn't parse — the printer never fails on
/// account of an unparseable descriptor.
fn render_field_descriptor(descriptor: &str) -> String {
    match FieldDescriptor::from_str(descriptor) {
        Ok(d) => d.0.to_string(),
        Err(_) => descriptor.to_string(),
    }
}

fn render_method_descriptor(descriptor: &str) -> String {
    match MethodDescriptor::from_str(descriptor) {
        Ok(d) => d.to_string(),
        Err(_) => descriptor.to_string(),
    }
}

macro_rules! flag_string {
    ($flags:expr, $( $flag:ident => $keyword:literal ),* $(,)?) => {{
        let mut out = String::new();
        $(
            if $flags & ($flag as u16) != 0 {
                out.push_str($keyword);
                out.push(' ');
            }
        )*
        out
    }};
}

fn class_access_flags(flags: u16) -> String {
    use ClassAccessFlag::*;
    flag_string!(
        flags,
        Public => "public",
        Final => "final",
        Abstract => "abstract",
        Interface => "interface",
        Annotation => "@interface",
        Enum => "enum",
        Synthetic => "synthetic",
    )
}

fn field_access_flags(flags: u16) -> String {
    use cs_model::FieldAccessFlags::*;
    flag_string!(
        flags,
        Public => "public",
        Private => "private",
        Protected => "protected",
        Static => "static",
        Final => "final",
        Volatile => "volatile",
        Transient => "transient",
        Synthetic => "synthetic",
        Enum => "enum",
    )
}

fn method_access_flags(flags: u16) -> String {
    use MethodAccessFlag::*;
    flag_string!(
        flags,
        Public => "public",
        Private => "private",
        Protected => "protected",
        Static => "static",
        Final => "final",
        Synchronized => "synchronized",
        Bridge => "bridge",
        Varargs => "varargs",
        Native => "native",
        Abstract => "abstract",
        Strict => "strictfp",
        Synthetic => "synthetic",
    )
}
