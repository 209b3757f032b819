use crate::error::{FormatError, FormatErrorKind};
use cs_model::{cp_info, ClassFile, CpInfo, CpInfoInner, LoaderConfig};

/// Cross-entry validation over an already-parsed `ClassFile`, per JVMS
/// §4.8 checks (4) and (5). Operates only on the in-memory value; no byte
/// buffer is consulted. Idempotent and side-effect-free aside from the
/// trace logging `LoaderConfig::trace_format_check` enables.
pub fn format_check(class: &ClassFile, config: &LoaderConfig) -> Result<(), FormatError> {
    let cp_count = class.cp_count();
    let pool = &class.constant_pool;

    check_class_index(pool, cp_count, class.this_class.inner())?;
    if class.super_class.inner() != 0 {
        check_class_index(pool, cp_count, class.super_class.inner())?;
    }
    for iface in &class.interfaces {
        check_class_index(pool, cp_count, iface.inner())?;
    }

    let mut i: usize = 0;
    while i < pool.len() {
        let slot = &pool[i];
        let index = (i + 1) as u16;
        trace(config, index, slot);

        match &slot.inner {
            CpInfoInner::Dummy => {
                // Only reachable as the second half of a Long/Double pair,
                // which is consumed below when we see the Long/Double itself.
            }
            CpInfoInner::Utf8(utf8) => check_utf8(index, utf8)?,
            CpInfoInner::Integer(_) | CpInfoInner::Float(_) => {}
            CpInfoInner::Long(_) | CpInfoInner::Double(_) => {
                match pool.get(i + 1) {
                    Some(CpInfo {
                        inner: CpInfoInner::Dummy,
                        ..
                    }) => {}
                    _ => return Err(FormatError::new(FormatErrorKind::MissingDummy { index })),
                }
            }
            CpInfoInner::Class(class_ref) => {
                check_utf8_index(pool, cp_count, class_ref.name_index.inner())?;
            }
            CpInfoInner::String(s) => {
                check_utf8_index(pool, cp_count, s.string_index.inner())?;
            }
            CpInfoInner::Fieldref(r) => check_member_ref(pool, cp_count, index, r.class_index.inner(), r.name_and_type_index.inner(), false)?,
            CpInfoInner::MethodRef(r) => check_member_ref(pool, cp_count, index, r.class_index.inner(), r.name_and_type_index.inner(), true)?,
            CpInfoInner::InterfaceMethodref(r) => check_member_ref(pool, cp_count, index, r.class_index.inner(), r.name_and_type_index.inner(), false)?,
            CpInfoInner::NameAndType(nt) => {
                check_utf8_index(pool, cp_count, nt.name_index.inner())?;
                let descriptor = resolve_utf8(pool, cp_count, nt.descriptor_index.inner())?;
                check_descriptor_lead_byte(index, descriptor)?;
            }
            CpInfoInner::MethodHandle(mh) => {
                if !(1..=9).contains(&mh.reference_kind) {
                    return Err(FormatError::new(FormatErrorKind::BadMethodHandleKind {
                        index,
                        kind: mh.reference_kind,
                    }));
                }
                let target = match mh.reference_index {
                    cp_info::MethodHandleIndex::Field(f) => f.inner(),
                    cp_info::MethodHandleIndex::Method(m) => m.inner(),
                    cp_info::MethodHandleIndex::Interface(m) => m.inner(),
                };
                check_index(cp_count, target, config)?;
            }
            CpInfoInner::MethodType(mt) => {
                let descriptor = resolve_utf8(pool, cp_count, mt.descriptor_index.inner())?;
                if descriptor.first() != Some(&b'(') {
                    return Err(FormatError::new(FormatErrorKind::BadDescriptor {
                        index,
                        found: lossy(descriptor),
                    }));
                }
            }
            CpInfoInner::InvokeDynamic(id) => {
                // Bootstrap method table cross-check is deferred to a later
                // pass (see design notes) once attribute parsing is
                // strengthened to surface BootstrapMethods by class.
                check_index(cp_count, id.name_and_type_index.inner(), config)?;
                match pool.get(id.name_and_type_index.inner() as usize - 1) {
                    Some(CpInfo {
                        inner: CpInfoInner::NameAndType(_),
                        ..
                    }) => {}
                    Some(found) => {
                        return Err(FormatError::new(FormatErrorKind::CpVariantMismatch {
                            index: id.name_and_type_index.inner(),
                            expected: "NameAndType",
                            found: found.inner.variant_name(),
                        }))
                    }
                    None => {
                        return Err(FormatError::new(FormatErrorKind::CpIndexOutOfRange {
                            index: id.name_and_type_index.inner(),
                            cp_count,
                        }))
                    }
                }
            }
        }

        if matches!(slot.inner, CpInfoInner::Long(_) | CpInfoInner::Double(_)) {
            i += 2;
        } else {
            i += 1;
        }
    }

    for (field_index, field) in class.fields.iter().enumerate() {
        check_utf8_index(pool, cp_count, field.name_index.inner())?;
        check_utf8_index(pool, cp_count, field.descriptor_index.inner())?;

        let name = resolve_utf8(pool, cp_count, field.name_index.inner())?;
        if name.first().map_or(false, |b| b.is_ascii_digit()) || name.contains(&b' ') {
            return Err(FormatError::new(FormatErrorKind::BadFieldName {
                field_index,
                name: lossy(name),
            }));
        }

        let descriptor = resolve_utf8(pool, cp_count, field.descriptor_index.inner())?;
        check_descriptor_lead_byte(field.descriptor_index.inner(), descriptor)?;
    }

    for method in &class.methods {
        check_utf8_index(pool, cp_count, method.name_index.inner())?;
        let descriptor = resolve_utf8(pool, cp_count, method.descriptor_index.inner())?;
        check_descriptor_lead_byte(method.descriptor_index.inner(), descriptor)?;
    }

    Ok(())
}

fn trace(config: &LoaderConfig, index: u16, slot: &CpInfo) {
    if config.trace_format_check {
        log::trace!(
            "format_check: cp[{}] = {}",
            index,
            slot.inner.variant_name()
        );
    }
}

fn check_index(cp_count: u16, index: u16, _config: &LoaderConfig) -> Result<(), FormatError> {
    if index == 0 || index >= cp_count {
        return Err(FormatError::new(FormatErrorKind::CpIndexOutOfRange {
            index,
            cp_count,
        }));
    }
    Ok(())
}

/// Like `check_index`, but additionally requires the entry to be a `Class`.
/// Used for `this_class`/`super_class`/`interfaces`, per spec §3's "Every CP
/// index stored in any entry ... resolves to an entry of the required
/// variant" — a range check alone lets `this_class` point at a `Utf8` and
/// panic downstream the first time something dereferences it.
fn check_class_index(pool: &[CpInfo], cp_count: u16, index: u16) -> Result<(), FormatError> {
    match index.checked_sub(1).and_then(|i| pool.get(i as usize)) {
        Some(CpInfo {
            inner: CpInfoInner::Class(_),
            ..
        }) => Ok(()),
        Some(found) => Err(FormatError::new(FormatErrorKind::CpVariantMismatch {
            index,
            expected: "Class",
            found: found.inner.variant_name(),
        })),
        None => Err(FormatError::new(FormatErrorKind::CpIndexOutOfRange {
            index,
            cp_count,
        })),
    }
}

fn resolve_utf8(
    pool: &[CpInfo],
    cp_count: u16,
    index: u16,
) -> Result<&[u8], FormatError> {
    match index.checked_sub(1).and_then(|i| pool.get(i as usize)) {
        Some(CpInfo {
            inner: CpInfoInner::Utf8(utf8),
            ..
        }) => Ok(&utf8.bytes),
        Some(found) => Err(FormatError::new(FormatErrorKind::CpVariantMismatch {
            index,
            expected: "Utf8",
            found: found.inner.variant_name(),
        })),
        None => Err(FormatError::new(FormatErrorKind::CpIndexOutOfRange {
            index,
            cp_count,
        })),
    }
}

fn check_utf8_index(pool: &[CpInfo], cp_count: u16, index: u16) -> Result<(), FormatError> {
    resolve_utf8(pool, cp_count, index).map(|_| ())
}

fn check_utf8(index: u16, utf8: &cp_info::Utf8) -> Result<(), FormatError> {
    for &byte in &utf8.bytes {
        if byte == 0x00 || byte >= 0xF0 {
            return Err(FormatError::new(FormatErrorKind::BadUtf8Byte { index, byte }));
        }
    }
    Ok(())
}

const ALLOWED_DESCRIPTOR_LEAD: &[u8] = b"(BCDFIJLSZ[";

fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

fn check_descriptor_lead_byte(index: u16, descriptor: &[u8]) -> Result<(), FormatError> {
    let ok = matches!(descriptor.first(), Some(b) if ALLOWED_DESCRIPTOR_LEAD.contains(b));
    if !ok {
        return Err(FormatError::new(FormatErrorKind::BadDescriptor {
            index,
            found: lossy(descriptor),
        }));
    }
    Ok(())
}

fn check_member_ref(
    pool: &[CpInfo],
    cp_count: u16,
    index: u16,
    class_index: u16,
    name_and_type_index: u16,
    check_init_name: bool,
) -> Result<(), FormatError> {
    match class_index.checked_sub(1).and_then(|i| pool.get(i as usize)) {
        Some(CpInfo {
            inner: CpInfoInner::Class(_),
            ..
        }) => {}
        Some(found) => {
            return Err(FormatError::new(FormatErrorKind::CpVariantMismatch {
                index: class_index,
                expected: "Class",
                found: found.inner.variant_name(),
            }))
        }
        None => {
            return Err(FormatError::new(FormatErrorKind::CpIndexOutOfRange {
                index: class_index,
                cp_count,
            }))
        }
    }

    let name_and_type = match name_and_type_index
        .checked_sub(1)
        .and_then(|i| pool.get(i as usize))
    {
        Some(CpInfo {
            inner: CpInfoInner::NameAndType(nt),
            ..
        }) => nt,
        Some(found) => {
            return Err(FormatError::new(FormatErrorKind::CpVariantMismatch {
                index: name_and_type_index,
                expected: "NameAndType",
                found: found.inner.variant_name(),
            }))
        }
        None => {
            return Err(FormatError::new(FormatErrorKind::CpIndexOutOfRange {
                index: name_and_type_index,
                cp_count,
            }))
        }
    };

    if check_init_name {
        let name = resolve_utf8(pool, cp_count, name_and_type.name_index.inner())?;
        if name.first() == Some(&b'<') && name != b"<init>" {
            return Err(FormatError::new(FormatErrorKind::BadMethodName {
                index,
                name: lossy(name),
            }));
        }
    }

    Ok(())
}
