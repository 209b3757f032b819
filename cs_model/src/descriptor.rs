//!
//! Field and method descriptor grammar (JVMS §11 4.3).
//!
//! The Format Checker only validates the *first* byte of a descriptor (see
//! the "descriptor grammar" Open Question in the design notes) — this module
//! parses the full grammar and is used by `cs_class_printer` to render
//! human-readable signatures instead of raw descriptor strings.
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug)]
pub struct ParseErr(pub Cow<'static, str>);

impl ParseErr {
    pub fn str(str: &'static str) -> Self {
        Self(Cow::Borrowed(str))
    }
    pub fn string(str: String) -> Self {
        Self(Cow::Owned(str))
    }
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ParseErr {}

/// A field descriptor: the type of a field or a method parameter
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FieldDescriptor(pub FieldType);

/// The type of a field or method parameter
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum FieldType {
    /// B
    Byte,
    /// C
    Char,
    /// D
    Double,
    /// F
    Float,
    /// I
    Int,
    /// J
    Long,
    /// L `ClassName` ;
    Object(String),
    /// S
    Short,
    /// Z
    Boolean,
    /// [
    Array(Box<Self>),
}

/// A method descriptor: parameter types plus a return type
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MethodDescriptor {
    pub parameters: Vec<FieldType>,
    pub return_: MethodType,
}

/// The return type of a method
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum MethodType {
    Some(FieldType),
    /// V
    Void,
}

impl FromStr for FieldDescriptor {
    type Err = ParseErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let parsed = Self(FieldType::from_char_iter(&mut chars)?);
        if chars.next().is_some() {
            return Err(ParseErr::str("Trailing characters after field descriptor"));
        }
        Ok(parsed)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Byte => write!(f, "byte"),
            Self::Char => write!(f, "char"),
            Self::Double => write!(f, "double"),
            Self::Float => write!(f, "float"),
            Self::Int => write!(f, "int"),
            Self::Long => write!(f, "long"),
            Self::Short => write!(f, "short"),
            Self::Boolean => write!(f, "boolean"),
            Self::Object(name) => write!(f, "{}", name.replace('/', ".")),
            Self::Array(inner) => write!(f, "{}[]", inner),
        }
    }
}

impl FieldType {
    /// Consumes as many chars as needed from the iterator and parses itself
    pub fn from_char_iter<I>(chars: &mut I) -> Result<Self, ParseErr>
    where
        I: Iterator<Item = char>,
    {
        let first = chars.next().ok_or_else(|| ParseErr::str("Empty string"))?;
        Ok(match first {
            'B' => Self::Byte,
            'C' => Self::Char,
            'D' => Self::Double,
            'F' => Self::Float,
            'I' => Self::Int,
            'J' => Self::Long,
            'L' => Self::Object({
                let mut name = String::with_capacity(32); // class names tend to be at least this long
                loop {
                    let char = chars
                        .next()
                        .ok_or_else(|| ParseErr::str("Expected ; before end of string"))?;
                    if char == ';' {
                        break;
                    }
                    name.push(char);
                }
                name
            }),
            'S' => Self::Short,
            'Z' => Self::Boolean,
            '[' => Self::Array(Box::new(Self::from_char_iter(chars)?)),
            c => {
                return Err(ParseErr::string(format!(
                    "Invalid char in field descriptor {}",
                    c
                )))
            }
        })
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, param) in self.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", param)?;
        }
        write!(f, ")")?;
        match &self.return_ {
            MethodType::Void => write!(f, "void"),
            MethodType::Some(ty) => write!(f, "{}", ty),
        }
    }
}

impl FromStr for MethodDescriptor {
    type Err = ParseErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars().peekable();
        if chars.next().ok_or_else(|| ParseErr::str("Empty string"))? != '(' {
            return Err(ParseErr::str("Needs to start with '('"));
        }

        let mut parameters = Vec::new();
        loop {
            match chars.peek() {
                Some(')') => {
                    let _ = chars.next();
                    break;
                }
                None => return Err(ParseErr::str("Unterminated parameter list")),
                _ => parameters.push(FieldType::from_char_iter(&mut chars)?),
            }
        }

        let return_ = match chars.peek() {
            Some('V') => {
                let _ = chars.next();
                MethodType::Void
            }
            _ => MethodType::Some(FieldType::from_char_iter(&mut chars)?),
        };

        if chars.next().is_some() {
            return Err(ParseErr::str("Trailing characters after method descriptor"));
        }

        Ok(Self {
            parameters,
            return_,
        })
    }
}
