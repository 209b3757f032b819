use crate::error::{ParseError, ParseErrorKind};
use crate::reader::RawReader;
use cs_model::cp_info::{
    self, Class, Double, Fieldref, InterfaceMethodref, Long, MethodHandle, MethodHandleIndex,
    MethodRef, NameAndType, String as CpString, Utf8,
};
use cs_model::{
    u1, u2, u4, Annotation, AnnotationElementValue, AnnotationElementValuePair,
    AnnotationElementValueValue, AttributeCodeException, AttributeInfo, AttributeInfoInner,
    AttributeInnerClass, AttributeLineNumber, AttributeLocalVariableTable, BootstrapMethod,
    ClassFile, CpInfo, CpInfoInner, FieldInfo, FromPool, LoaderConfig, MethodInfo,
    ParameterAnnotation, StackMapFrame, VerificationTypeInfo,
};

const MAGIC: u4 = 0xCAFEBABE;

/// Drives a `RawReader` over the JVMS §4.1 `ClassFile` grammar, producing a
/// fully populated `ClassFile`. Fails fast: the first structural error
/// aborts and no partial value is ever returned.
pub fn parse_class_file(data: &[u1], config: &LoaderConfig) -> Result<ClassFile, ParseError> {
    let mut reader = RawReader::new(data);

    let magic = reader.read_u4()?;
    if magic != MAGIC {
        return Err(ParseError::new(
            ParseErrorKind::BadMagic { found: magic },
            reader.pos(),
        ));
    }

    let minor_version = reader.read_u2()?;
    let major_version = reader.read_u2()?;
    if major_version > config.max_major_version || major_version < config.min_major_version {
        return Err(ParseError::new(
            ParseErrorKind::UnsupportedVersion {
                major: major_version,
            },
            reader.pos(),
        ));
    }

    let constant_pool = parse_constant_pool(&mut reader)?;

    let access_flags = reader.read_u2()?;
    let this_class = FromPool::from(reader.read_u2()?);
    let super_class = FromPool::from(reader.read_u2()?);

    let interfaces_count = reader.read_u2()?;
    let interfaces = parse_vec(&mut reader, interfaces_count as usize, |r| {
        Ok(FromPool::from(r.read_u2()?))
    })?;

    let fields_count = reader.read_u2()?;
    let fields = parse_vec(&mut reader, fields_count as usize, |r| {
        parse_field_info(r, &constant_pool)
    })?;

    let methods_count = reader.read_u2()?;
    let methods = parse_vec(&mut reader, methods_count as usize, |r| {
        parse_method_info(r, &constant_pool)
    })?;

    let attributes_count = reader.read_u2()?;
    let attributes = parse_vec(&mut reader, attributes_count as usize, |r| {
        parse_attribute_info(r, &constant_pool)
    })?;

    if !reader.eof() {
        return Err(ParseError::new(
            ParseErrorKind::TrailingBytes {
                remaining: reader.remaining(),
            },
            reader.pos(),
        ));
    }

    Ok(ClassFile {
        magic,
        minor_version,
        major_version,
        constant_pool,
        access_flags,
        this_class,
        super_class,
        interfaces,
        fields,
        methods,
        attributes,
    })
}

fn parse_vec<T>(
    reader: &mut RawReader,
    count: usize,
    mut f: impl FnMut(&mut RawReader) -> Result<T, ParseError>,
) -> Result<Vec<T>, ParseError> {
    let mut vec = Vec::with_capacity(count);
    for _ in 0..count {
        vec.push(f(reader)?);
    }
    Ok(vec)
}

/// Reads `cp_count - 1` logical slots, pushing an explicit `Dummy` entry
/// after every `Long`/`Double` so that `constant_pool[index - 1]` always
/// addresses the right logical slot, matching the JVMS-mandated layout.
fn parse_constant_pool(reader: &mut RawReader) -> Result<Vec<CpInfo>, ParseError> {
    let cp_count = reader.read_u2()?;
    let mut constant_pool = Vec::with_capacity(cp_count as usize);

    let mut index: u2 = 1;
    while index < cp_count {
        let entry = parse_cp_info(reader, index)?;
        let is_wide = matches!(entry.inner, CpInfoInner::Long(_) | CpInfoInner::Double(_));
        constant_pool.push(entry);
        index += 1;
        if is_wide {
            constant_pool.push(CpInfo {
                tag: 0,
                inner: CpInfoInner::Dummy,
            });
            index += 1;
        }
    }

    Ok(constant_pool)
}

fn parse_cp_info(reader: &mut RawReader, index: u2) -> Result<CpInfo, ParseError> {
    let tag = reader.read_u1()?;
    let inner = match tag {
        1 => {
            let length = reader.read_u2()?;
            let bytes = reader.read_bytes(length as usize)?;
            CpInfoInner::Utf8(Utf8 { bytes })
        }
        3 => CpInfoInner::Integer(cp_info::Integer {
            bytes: reader.read_u4()?,
        }),
        4 => CpInfoInner::Float(cp_info::Float {
            bytes: reader.read_u4()?,
        }),
        5 => CpInfoInner::Long(Long {
            high_bytes: reader.read_u4()?,
            low_bytes: reader.read_u4()?,
        }),
        6 => CpInfoInner::Double(Double {
            high_bytes: reader.read_u4()?,
            low_bytes: reader.read_u4()?,
        }),
        7 => CpInfoInner::Class(Class {
            name_index: FromPool::from(reader.read_u2()?),
        }),
        8 => CpInfoInner::String(CpString {
            string_index: FromPool::from(reader.read_u2()?),
        }),
        9 => CpInfoInner::Fieldref(Fieldref {
            class_index: FromPool::from(reader.read_u2()?),
            name_and_type_index: FromPool::from(reader.read_u2()?),
        }),
        10 => CpInfoInner::MethodRef(MethodRef {
            class_index: FromPool::from(reader.read_u2()?),
            name_and_type_index: FromPool::from(reader.read_u2()?),
        }),
        11 => CpInfoInner::InterfaceMethodref(InterfaceMethodref {
            class_index: FromPool::from(reader.read_u2()?),
            name_and_type_index: FromPool::from(reader.read_u2()?),
        }),
        12 => CpInfoInner::NameAndType(NameAndType {
            name_index: FromPool::from(reader.read_u2()?),
            descriptor_index: FromPool::from(reader.read_u2()?),
        }),
        15 => {
            let reference_kind = reader.read_u1()?;
            let raw_index = reader.read_u2()?;
            let reference_index = match reference_kind {
                1..=4 => MethodHandleIndex::Field(FromPool::from(raw_index)),
                5 | 8 => MethodHandleIndex::Method(FromPool::from(raw_index)),
                6 | 7 => MethodHandleIndex::Method(FromPool::from(raw_index)),
                9 => MethodHandleIndex::Interface(FromPool::from(raw_index)),
                _ => MethodHandleIndex::Method(FromPool::from(raw_index)),
            };
            CpInfoInner::MethodHandle(MethodHandle {
                reference_kind,
                reference_index,
            })
        }
        16 => CpInfoInner::MethodType(cp_info::MethodType {
            descriptor_index: FromPool::from(reader.read_u2()?),
        }),
        18 => CpInfoInner::InvokeDynamic(cp_info::InvokeDynamic {
            bootstrap_method_attr_index: reader.read_u2()?,
            name_and_type_index: FromPool::from(reader.read_u2()?),
        }),
        _ => {
            return Err(ParseError::new(
                ParseErrorKind::UnknownCpTag { tag, index },
                reader.pos(),
            ))
        }
    };
    Ok(CpInfo { tag, inner })
}

fn parse_field_info(reader: &mut RawReader, pool: &[CpInfo]) -> Result<FieldInfo, ParseError> {
    let access_flags = reader.read_u2()?;
    let name_index = FromPool::from(reader.read_u2()?);
    let descriptor_index = FromPool::from(reader.read_u2()?);
    let attributes_count = reader.read_u2()?;
    let attributes = parse_vec(reader, attributes_count as usize, |r| {
        parse_attribute_info(r, pool)
    })?;
    Ok(FieldInfo {
        access_flags,
        name_index,
        descriptor_index,
        attributes,
    })
}

fn parse_method_info(reader: &mut RawReader, pool: &[CpInfo]) -> Result<MethodInfo, ParseError> {
    let access_flags = reader.read_u2()?;
    let name_index = FromPool::from(reader.read_u2()?);
    let descriptor_index = FromPool::from(reader.read_u2()?);
    let attributes_count = reader.read_u2()?;
    let attributes = parse_vec(reader, attributes_count as usize, |r| {
        parse_attribute_info(r, pool)
    })?;
    Ok(MethodInfo {
        access_flags,
        name_index,
        descriptor_index,
        attributes,
    })
}

/// Decodes an attribute name for dispatch purposes only (matching it against
/// known attribute strings below). A non-UTF-8 byte here just means the name
/// won't match anything and falls through to `UnknownAttributeTag` — the
/// forbidden-byte contract on `Utf8` entries is `format_check`'s, not this
/// lossy decode's, to enforce.
fn utf8_name(pool: &[CpInfo], index: u2, pos: usize) -> Result<std::string::String, ParseError> {
    match index.checked_sub(1).and_then(|i| pool.get(i as usize)) {
        Some(CpInfo {
            inner: CpInfoInner::Utf8(utf8),
            ..
        }) => Ok(std::string::String::from_utf8_lossy(&utf8.bytes).into_owned()),
        _ => Err(ParseError::new(
            ParseErrorKind::InvalidAttributeNameIndex { index },
            pos,
        )),
    }
}

fn parse_attribute_info(reader: &mut RawReader, pool: &[CpInfo]) -> Result<AttributeInfo, ParseError> {
    let name_index_raw = reader.read_u2()?;
    let attribute_length = reader.read_u4()?;
    let content = reader.read_bytes(attribute_length as usize)?;
    let name = utf8_name(pool, name_index_raw, reader.pos())?;

    let mut inner_reader = RawReader::new(&content);
    let inner = parse_attribute_inner(&name, attribute_length, &mut inner_reader, pool)?;

    Ok(AttributeInfo {
        attribute_name_index: FromPool::from(name_index_raw),
        attribute_length,
        inner,
    })
}

fn expect_length(name: &str, got: u4, want: u4, pos: usize) -> Result<(), ParseError> {
    if got != want {
        return Err(ParseError::new(
            ParseErrorKind::BadAttributeLength {
                name: name.to_string(),
                got,
                want,
            },
            pos,
        ));
    }
    Ok(())
}

fn parse_attribute_inner(
    name: &str,
    attribute_length: u4,
    reader: &mut RawReader,
    pool: &[CpInfo],
) -> Result<AttributeInfoInner, ParseError> {
    Ok(match name {
        "ConstantValue" => {
            expect_length(name, attribute_length, 2, reader.pos())?;
            AttributeInfoInner::ConstantValue {
                constantvalue_index: FromPool::from(reader.read_u2()?),
            }
        }
        "Code" => {
            let max_stack = reader.read_u2()?;
            let max_locals = reader.read_u2()?;
            let code_length = reader.read_u4()?;
            let code = reader.read_bytes(code_length as usize)?;
            let exception_table_length = reader.read_u2()?;
            let exception_table = parse_vec(reader, exception_table_length as usize, |r| {
                Ok(AttributeCodeException {
                    start_pc: r.read_u2()?,
                    end_pc: r.read_u2()?,
                    handler_pc: r.read_u2()?,
                    catch_type: r.read_u2()?,
                })
            })?;
            let attributes_count = reader.read_u2()?;
            let attributes = parse_vec(reader, attributes_count as usize, |r| {
                parse_attribute_info(r, pool)
            })?;
            AttributeInfoInner::Code {
                max_stack,
                max_locals,
                code,
                exception_table,
                attributes,
            }
        }
        "StackMapTable" => {
            let entries_count = reader.read_u2()?;
            let entries = parse_vec(reader, entries_count as usize, parse_stack_map_frame)?;
            AttributeInfoInner::StackMapTable { entries }
        }
        "Exceptions" => {
            let count = reader.read_u2()?;
            let exception_index_table = parse_vec(reader, count as usize, |r| r.read_u2())?;
            AttributeInfoInner::Exceptions {
                exception_index_table,
            }
        }
        "InnerClasses" => {
            let count = reader.read_u2()?;
            let classes = parse_vec(reader, count as usize, |r| {
                Ok(AttributeInnerClass {
                    inner_class_info_index: FromPool::from(r.read_u2()?),
                    outer_class_info_index: FromPool::from(r.read_u2()?),
                    inner_class_name_index: FromPool::from(r.read_u2()?),
                    inner_class_access_flags: r.read_u2()?,
                })
            })?;
            AttributeInfoInner::InnerClasses { classes }
        }
        "EnclosingMethod" => {
            expect_length(name, attribute_length, 4, reader.pos())?;
            AttributeInfoInner::EnclosingMethod {
                class_index: FromPool::from(reader.read_u2()?),
                method_index: FromPool::from(reader.read_u2()?),
            }
        }
        "Synthetic" => {
            expect_length(name, attribute_length, 0, reader.pos())?;
            AttributeInfoInner::Synthetic
        }
        "Signature" => {
            expect_length(name, attribute_length, 2, reader.pos())?;
            AttributeInfoInner::Signature {
                signature_index: FromPool::from(reader.read_u2()?),
            }
        }
        "SourceFile" => {
            expect_length(name, attribute_length, 2, reader.pos())?;
            AttributeInfoInner::SourceFile {
                sourcefile_index: FromPool::from(reader.read_u2()?),
            }
        }
        "SourceDebugExtension" => AttributeInfoInner::SourceDebugExtension {
            debug_extension: reader.read_bytes(attribute_length as usize)?,
        },
        "LineNumberTable" => {
            let count = reader.read_u2()?;
            let line_number_table = parse_vec(reader, count as usize, |r| {
                Ok(AttributeLineNumber {
                    start_pc: r.read_u2()?,
                    line_number: r.read_u2()?,
                })
            })?;
            AttributeInfoInner::LineNumberTable { line_number_table }
        }
        "LocalVariableTable" => {
            let count = reader.read_u2()?;
            let local_variable_table = parse_vec(reader, count as usize, parse_local_variable)?;
            AttributeInfoInner::LocalVariableTable {
                local_variable_table,
            }
        }
        "LocalVariableTypeTable" => {
            let count = reader.read_u2()?;
            let local_variable_table = parse_vec(reader, count as usize, parse_local_variable)?;
            AttributeInfoInner::LocalVariableTypeTable {
                local_variable_table,
            }
        }
        "Deprecated" => {
            expect_length(name, attribute_length, 0, reader.pos())?;
            AttributeInfoInner::Deprecated
        }
        "RuntimeVisibleAnnotations" => {
            let count = reader.read_u2()?;
            let annotations = parse_vec(reader, count as usize, |r| parse_annotation(r, pool))?;
            AttributeInfoInner::RuntimeVisibleAnnotations { annotations }
        }
        "RuntimeInvisibleAnnotations" => {
            let count = reader.read_u2()?;
            let annotations = parse_vec(reader, count as usize, |r| parse_annotation(r, pool))?;
            AttributeInfoInner::RuntimeInvisibleAnnotations { annotations }
        }
        "RuntimeVisibleParameterAnnotations" => {
            let num_parameters = reader.read_u1()?;
            let parameter_annotations =
                parse_vec(reader, num_parameters as usize, |r| parse_parameter_annotation(r, pool))?;
            AttributeInfoInner::RuntimeVisibleParameterAnnotations {
                parameter_annotations,
            }
        }
        "RuntimeInvisibleParameterAnnotations" => {
            let num_parameters = reader.read_u1()?;
            let parameter_annotations =
                parse_vec(reader, num_parameters as usize, |r| parse_parameter_annotation(r, pool))?;
            AttributeInfoInner::RuntimeInvisibleParameterAnnotations {
                parameter_annotations,
            }
        }
        "AnnotationDefault" => AttributeInfoInner::AnnotationDefault {
            default_value: parse_annotation_element_value(reader, pool)?,
        },
        "BootstrapMethods" => {
            let count = reader.read_u2()?;
            let bootstrap_methods = parse_vec(reader, count as usize, |r| {
                let bootstrap_method_ref = FromPool::from(r.read_u2()?);
                let arg_count = r.read_u2()?;
                let bootstrap_arguments =
                    parse_vec(r, arg_count as usize, |r2| Ok(FromPool::from(r2.read_u2()?)))?;
                Ok(BootstrapMethod {
                    bootstrap_method_ref,
                    bootstrap_arguments,
                })
            })?;
            AttributeInfoInner::BootstrapMethods { bootstrap_methods }
        }
        other => {
            return Err(ParseError::new(
                ParseErrorKind::UnknownAttributeTag {
                    name: other.to_string(),
                },
                reader.pos(),
            ))
        }
    })
}

fn parse_local_variable(
    reader: &mut RawReader,
) -> Result<AttributeLocalVariableTable, ParseError> {
    Ok(AttributeLocalVariableTable {
        start_pc: reader.read_u2()?,
        length: reader.read_u2()?,
        name_index: FromPool::from(reader.read_u2()?),
        descriptor_or_signature_index: FromPool::from(reader.read_u2()?),
        index: reader.read_u2()?,
    })
}

fn parse_annotation(reader: &mut RawReader, pool: &[CpInfo]) -> Result<Annotation, ParseError> {
    let type_index = FromPool::from(reader.read_u2()?);
    let count = reader.read_u2()?;
    let element_value_pairs = parse_vec(reader, count as usize, |r| {
        Ok(AnnotationElementValuePair {
            element_name_index: FromPool::from(r.read_u2()?),
            value: parse_annotation_element_value(r, pool)?,
        })
    })?;
    Ok(Annotation {
        type_index,
        element_value_pairs,
    })
}

fn parse_parameter_annotation(
    reader: &mut RawReader,
    pool: &[CpInfo],
) -> Result<ParameterAnnotation, ParseError> {
    let count = reader.read_u2()?;
    let annotations = parse_vec(reader, count as usize, |r| parse_annotation(r, pool))?;
    Ok(ParameterAnnotation { annotations })
}

fn parse_annotation_element_value(
    reader: &mut RawReader,
    pool: &[CpInfo],
) -> Result<AnnotationElementValue, ParseError> {
    let tag = reader.read_u1()?;
    let value = parse_annotation_element_value_value(tag, reader, pool)?;
    Ok(AnnotationElementValue { tag, value })
}

fn parse_annotation_element_value_value(
    tag: u1,
    reader: &mut RawReader,
    pool: &[CpInfo],
) -> Result<AnnotationElementValueValue, ParseError> {
    Ok(match tag as char {
        'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' | 's' => {
            AnnotationElementValueValue::ConstValueIndex {
                index: FromPool::from(reader.read_u2()?),
            }
        }
        'e' => AnnotationElementValueValue::EnumConstValue {
            type_name_index: FromPool::from(reader.read_u2()?),
            const_name_index: FromPool::from(reader.read_u2()?),
        },
        'c' => AnnotationElementValueValue::ClassInfoIndex {
            index: FromPool::from(reader.read_u2()?),
        },
        '@' => AnnotationElementValueValue::AnnotationValue {
            annotation: Box::new(parse_annotation(reader, pool)?),
        },
        '[' => {
            let count = reader.read_u2()?;
            AnnotationElementValueValue::ArrayValue {
                values: parse_vec(reader, count as usize, |r| {
                    parse_annotation_element_value(r, pool)
                })?,
            }
        }
        _ => {
            return Err(ParseError::new(
                ParseErrorKind::UnknownSubTag {
                    what: "annotation element value",
                    tag,
                },
                reader.pos(),
            ))
        }
    })
}

fn parse_verification_type_info(
    reader: &mut RawReader,
) -> Result<VerificationTypeInfo, ParseError> {
    let tag = reader.read_u1()?;
    Ok(match tag {
        0 => VerificationTypeInfo::Top { tag },
        1 => VerificationTypeInfo::Integer { tag },
        2 => VerificationTypeInfo::Float { tag },
        3 => VerificationTypeInfo::Double { tag },
        4 => VerificationTypeInfo::Long { tag },
        5 => VerificationTypeInfo::Null { tag },
        6 => VerificationTypeInfo::UninitializedThis { tag },
        7 => VerificationTypeInfo::Object {
            tag,
            cpool_index: FromPool::from(reader.read_u2()?),
        },
        8 => VerificationTypeInfo::Uninitialized {
            tag,
            offset: reader.read_u2()?,
        },
        _ => {
            return Err(ParseError::new(
                ParseErrorKind::UnknownSubTag {
                    what: "verification type info",
                    tag,
                },
                reader.pos(),
            ))
        }
    })
}

fn parse_stack_map_frame(reader: &mut RawReader) -> Result<StackMapFrame, ParseError> {
    let frame_type = reader.read_u1()?;
    Ok(match frame_type {
        0..=63 => StackMapFrame::SameFrame { frame_type },
        64..=127 => StackMapFrame::SameLocals1StackItemFrame {
            frame_type,
            stack: parse_verification_type_info(reader)?,
        },
        128..=246 => {
            return Err(ParseError::new(
                ParseErrorKind::UnknownSubTag {
                    what: "stack map frame",
                    tag: frame_type,
                },
                reader.pos(),
            ))
        }
        247 => StackMapFrame::SameLocals1StackItemFrameExtended {
            frame_type,
            offset_delta: reader.read_u2()?,
            stack: parse_verification_type_info(reader)?,
        },
        248..=250 => StackMapFrame::ChopFrame {
            frame_type,
            offset_delta: reader.read_u2()?,
        },
        251 => StackMapFrame::SameFrameExtended {
            frame_type,
            offset_delta: reader.read_u2()?,
        },
        252..=254 => {
            let offset_delta = reader.read_u2()?;
            let local_count = (frame_type - 251) as usize;
            let locals = parse_vec(reader, local_count, |r| parse_verification_type_info(r))?;
            StackMapFrame::AppendFrame {
                frame_type,
                offset_delta,
                locals,
            }
        }
        255 => {
            let offset_delta = reader.read_u2()?;
            let number_of_locals = reader.read_u2()?;
            let locals = parse_vec(reader, number_of_locals as usize, |r| {
                parse_verification_type_info(r)
            })?;
            let number_of_stack_items = reader.read_u2()?;
            let stack = parse_vec(reader, number_of_stack_items as usize, |r| {
                parse_verification_type_info(r)
            })?;
            StackMapFrame::FullFrame {
                frame_type,
                offset_delta,
                locals,
                stack,
            }
        }
    })
}
