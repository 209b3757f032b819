use super::*;
use cs_model::cp_info::{Class, Double, Long, MethodRef, NameAndType, Utf8};
use cs_model::{CpInfo, CpInfoInner, FieldInfo, FromPool};

fn config() -> LoaderConfig {
    LoaderConfig::default()
}

/// Bare-bones byte-stream builder for exercising the parser without real
/// `.class` fixtures on disk.
struct Builder {
    cp: Vec<Vec<u8>>,
    wide_count: u16,
}

impl Builder {
    fn new() -> Self {
        Self {
            cp: Vec::new(),
            wide_count: 0,
        }
    }

    fn push(&mut self, bytes: Vec<u8>) -> u16 {
        self.cp.push(bytes);
        self.cp.len() as u16 + self.wide_count
    }

    fn utf8(&mut self, s: &str) -> u16 {
        let mut b = vec![1u8];
        b.extend_from_slice(&(s.len() as u16).to_be_bytes());
        b.extend_from_slice(s.as_bytes());
        self.push(b)
    }

    fn class(&mut self, name_index: u16) -> u16 {
        let mut b = vec![7u8];
        b.extend_from_slice(&name_index.to_be_bytes());
        self.push(b)
    }

    fn name_and_type(&mut self, name_index: u16, descriptor_index: u16) -> u16 {
        let mut b = vec![12u8];
        b.extend_from_slice(&name_index.to_be_bytes());
        b.extend_from_slice(&descriptor_index.to_be_bytes());
        self.push(b)
    }

    fn method_ref(&mut self, class_index: u16, name_and_type_index: u16) -> u16 {
        let mut b = vec![10u8];
        b.extend_from_slice(&class_index.to_be_bytes());
        b.extend_from_slice(&name_and_type_index.to_be_bytes());
        self.push(b)
    }

    fn build(self, major_version: u16, this_class: u16, super_class: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xCAFEBABEu32.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // minor_version
        out.extend_from_slice(&major_version.to_be_bytes());
        let cp_count = self.cp.len() as u16 + 1 + self.wide_count;
        out.extend_from_slice(&cp_count.to_be_bytes());
        for entry in &self.cp {
            out.extend_from_slice(entry);
        }
        out.extend_from_slice(&0u16.to_be_bytes()); // access_flags
        out.extend_from_slice(&this_class.to_be_bytes());
        out.extend_from_slice(&super_class.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes()); // interfaces_count
        out.extend_from_slice(&0u16.to_be_bytes()); // fields_count
        out.extend_from_slice(&0u16.to_be_bytes()); // methods_count
        out.extend_from_slice(&0u16.to_be_bytes()); // attributes_count
        out
    }
}

// S1: a minimal valid class parses and format-checks cleanly.
#[test]
fn minimal_class_parses_and_format_checks() {
    let mut b = Builder::new();
    let empty_name = b.utf8("Empty");
    let this_class = b.class(empty_name);
    let object_name = b.utf8("java/lang/Object");
    let super_class = b.class(object_name);

    let bytes = b.build(52, this_class, super_class);
    let class = parse_class_file(&bytes, &config()).expect("should parse");
    format_check(&class, &config()).expect("should format-check");

    assert_eq!(
        class.this_class.get(&class.constant_pool).name_index.get(&class.constant_pool),
        b"Empty"
    );
}

// S5: bad magic aborts in the parser, before format-check ever runs.
#[test]
fn bad_magic_is_rejected() {
    let mut bytes = Builder::new().build(52, 0, 0);
    bytes[0] = 0xDE;
    bytes[1] = 0xAD;
    let err = parse_class_file(&bytes, &config()).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::BadMagic { .. }));
}

// S6: major_version above the configured ceiling is rejected by the parser.
#[test]
fn unsupported_version_is_rejected() {
    let bytes = Builder::new().build(56, 0, 0);
    let err = parse_class_file(&bytes, &config()).unwrap_err();
    assert!(matches!(
        err.kind,
        ParseErrorKind::UnsupportedVersion { major: 56 }
    ));
}

#[test]
fn truncated_input_is_rejected() {
    let mut bytes = Builder::new().build(52, 0, 0);
    bytes.truncate(bytes.len() - 3);
    let err = parse_class_file(&bytes, &config()).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::Truncated));
}

#[test]
fn trailing_bytes_are_rejected() {
    let mut bytes = Builder::new().build(52, 0, 0);
    bytes.push(0);
    let err = parse_class_file(&bytes, &config()).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::TrailingBytes { .. }));
}

#[test]
fn unknown_constant_pool_tag_is_rejected() {
    let mut b = Builder::new();
    b.push(vec![200]); // no payload, tag 200 is unrecognized
    let bytes = b.build(52, 0, 0);
    let err = parse_class_file(&bytes, &config()).unwrap_err();
    assert!(matches!(err.kind, ParseErrorKind::UnknownCpTag { tag: 200, .. }));
}

/// Helper for the format-check-only tests below: these construct a
/// `ClassFile` directly rather than going through the byte parser, since
/// `format_check` only cares about the in-memory shape.
fn base_class(constant_pool: Vec<CpInfo>) -> ClassFile {
    ClassFile {
        magic: 0xCAFEBABE,
        minor_version: 0,
        major_version: 52,
        constant_pool,
        access_flags: 0,
        this_class: FromPool::from(1),
        super_class: FromPool::from(0),
        interfaces: vec![],
        fields: vec![],
        methods: vec![],
        attributes: vec![],
    }
}

fn utf8_entry(s: &str) -> CpInfo {
    CpInfo {
        tag: 1,
        inner: CpInfoInner::Utf8(Utf8 {
            bytes: s.as_bytes().to_vec(),
        }),
    }
}

// S2: a UTF-8 entry containing a forbidden byte value fails format_check.
#[test]
fn bad_utf8_byte_is_rejected() {
    let bad = vec![b'A', 0xF5, b'B'];
    let pool = vec![
        CpInfo {
            tag: 1,
            inner: CpInfoInner::Utf8(Utf8 { bytes: bad }),
        },
        CpInfo {
            tag: 7,
            inner: CpInfoInner::Class(Class {
                name_index: FromPool::from(1),
            }),
        },
    ];
    let class = base_class(pool);
    let err = format_check(&class, &config()).unwrap_err();
    assert!(matches!(
        err.kind,
        FormatErrorKind::BadUtf8Byte { index: 1, byte: 0xF5 }
    ));
}

// S3: a Long constant without a following Dummy slot fails format_check.
#[test]
fn missing_dummy_after_long_is_rejected() {
    let pool = vec![
        CpInfo {
            tag: 5,
            inner: CpInfoInner::Long(Long {
                high_bytes: 0,
                low_bytes: 1,
            }),
        },
        utf8_entry("Empty"),
        CpInfo {
            tag: 7,
            inner: CpInfoInner::Class(Class {
                name_index: FromPool::from(2),
            }),
        },
    ];
    let mut class = base_class(pool);
    class.this_class = FromPool::from(3);
    let err = format_check(&class, &config()).unwrap_err();
    assert!(matches!(err.kind, FormatErrorKind::MissingDummy { index: 1 }));
}

#[test]
fn long_followed_by_dummy_format_checks_cleanly() {
    let pool = vec![
        CpInfo {
            tag: 5,
            inner: CpInfoInner::Long(Long {
                high_bytes: 0,
                low_bytes: 1,
            }),
        },
        CpInfo {
            tag: 0,
            inner: CpInfoInner::Dummy,
        },
        utf8_entry("Empty"),
        CpInfo {
            tag: 7,
            inner: CpInfoInner::Class(Class {
                name_index: FromPool::from(3),
            }),
        },
    ];
    let mut class = base_class(pool);
    class.this_class = FromPool::from(4);
    format_check(&class, &config()).expect("dummy slot present, should pass");
}

// S4: a MethodRef whose NameAndType name starts with '<' but isn't <init>.
#[test]
fn method_ref_with_bad_clinit_name_is_rejected() {
    let pool = vec![
        utf8_entry("Empty"),
        CpInfo {
            tag: 7,
            inner: CpInfoInner::Class(Class {
                name_index: FromPool::from(1),
            }),
        },
        utf8_entry("<clinit>"),
        utf8_entry("()V"),
        CpInfo {
            tag: 12,
            inner: CpInfoInner::NameAndType(NameAndType {
                name_index: FromPool::from(3),
                descriptor_index: FromPool::from(4),
            }),
        },
        CpInfo {
            tag: 10,
            inner: CpInfoInner::MethodRef(MethodRef {
                class_index: FromPool::from(2),
                name_and_type_index: FromPool::from(5),
            }),
        },
    ];
    let mut class = base_class(pool);
    class.this_class = FromPool::from(2);
    let err = format_check(&class, &config()).unwrap_err();
    assert!(matches!(
        err.kind,
        FormatErrorKind::BadMethodName { index: 6, .. }
    ));
}

#[test]
fn method_ref_to_init_is_accepted() {
    let pool = vec![
        utf8_entry("Empty"),
        CpInfo {
            tag: 7,
            inner: CpInfoInner::Class(Class {
                name_index: FromPool::from(1),
            }),
        },
        utf8_entry("<init>"),
        utf8_entry("()V"),
        CpInfo {
            tag: 12,
            inner: CpInfoInner::NameAndType(NameAndType {
                name_index: FromPool::from(3),
                descriptor_index: FromPool::from(4),
            }),
        },
        CpInfo {
            tag: 10,
            inner: CpInfoInner::MethodRef(MethodRef {
                class_index: FromPool::from(2),
                name_and_type_index: FromPool::from(5),
            }),
        },
    ];
    let mut class = base_class(pool);
    class.this_class = FromPool::from(2);
    format_check(&class, &config()).expect("<init> is a legal MethodRef name");
}

// S7: a field named "2foo" fails format_check.
#[test]
fn field_name_starting_with_digit_is_rejected() {
    let pool = vec![
        utf8_entry("Empty"),
        CpInfo {
            tag: 7,
            inner: CpInfoInner::Class(Class {
                name_index: FromPool::from(1),
            }),
        },
        utf8_entry("2foo"),
        utf8_entry("I"),
    ];
    let mut class = base_class(pool);
    class.this_class = FromPool::from(2);
    class.fields.push(FieldInfo {
        access_flags: 0,
        name_index: FromPool::from(3),
        descriptor_index: FromPool::from(4),
        attributes: vec![],
    });
    let err = format_check(&class, &config()).unwrap_err();
    assert!(matches!(
        err.kind,
        FormatErrorKind::BadFieldName { field_index: 0, .. }
    ));
}

#[test]
fn field_name_with_space_is_rejected() {
    let pool = vec![
        utf8_entry("Empty"),
        CpInfo {
            tag: 7,
            inner: CpInfoInner::Class(Class {
                name_index: FromPool::from(1),
            }),
        },
        utf8_entry("foo bar"),
        utf8_entry("I"),
    ];
    let mut class = base_class(pool);
    class.this_class = FromPool::from(2);
    class.fields.push(FieldInfo {
        access_flags: 0,
        name_index: FromPool::from(3),
        descriptor_index: FromPool::from(4),
        attributes: vec![],
    });
    let err = format_check(&class, &config()).unwrap_err();
    assert!(matches!(err.kind, FormatErrorKind::BadFieldName { .. }));
}

#[test]
fn bad_descriptor_lead_byte_is_rejected() {
    let pool = vec![
        utf8_entry("Empty"),
        CpInfo {
            tag: 7,
            inner: CpInfoInner::Class(Class {
                name_index: FromPool::from(1),
            }),
        },
        utf8_entry("foo"),
        utf8_entry("Q"),
    ];
    let mut class = base_class(pool);
    class.this_class = FromPool::from(2);
    class.fields.push(FieldInfo {
        access_flags: 0,
        name_index: FromPool::from(3),
        descriptor_index: FromPool::from(4),
        attributes: vec![],
    });
    let err = format_check(&class, &config()).unwrap_err();
    assert!(matches!(err.kind, FormatErrorKind::BadDescriptor { .. }));
}

// Property 7: format_check is idempotent and pure.
#[test]
fn format_check_is_idempotent() {
    let mut b = Builder::new();
    let empty_name = b.utf8("Empty");
    let this_class = b.class(empty_name);
    let object_name = b.utf8("java/lang/Object");
    let super_class = b.class(object_name);
    let bytes = b.build(52, this_class, super_class);

    let class = parse_class_file(&bytes, &config()).unwrap();
    let first = format_check(&class, &config());
    let second = format_check(&class, &config());
    assert_eq!(first, second);
}

#[test]
fn double_constant_round_trips_through_value() {
    let d = Double {
        high_bytes: 0x3FF00000,
        low_bytes: 0,
    };
    assert_eq!(d.value(), 1.0_f64);
}
