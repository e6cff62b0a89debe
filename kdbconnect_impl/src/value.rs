//! The host-side representation of wire values (§3, §9 Design Notes).

use uuid::Uuid;

use crate::error::{QError, QResult};

/// Primitive type codes (§3). Positive codes are atoms/vectors;
/// negative-as-unsigned-byte (`256 - code`) tags an atom of that code
/// on the wire — see [`crate::wire`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum TypeCode {
    MixedList = 0,
    Boolean = 1,
    Guid = 2,
    Byte = 4,
    Short = 5,
    Int = 6,
    Long = 7,
    Real = 8,
    Float = 9,
    Char = 10,
    Symbol = 11,
    Timestamp = 12,
    Month = 13,
    Date = 14,
    Datetime = 15,
    Timespan = 16,
    Minute = 17,
    Second = 18,
    Time = 19,
    Table = 98,
    Dict = 99,
    SortedDict = 127,
    Error = -128,
    Lambda = 100,
    UnaryPrim = 101,
    BinaryPrim = 102,
    TernaryOp = 103,
    Projection = 104,
    Composition = 105,
    FEach = 106,
    FOver = 107,
    FScan = 108,
    FEachPrior = 109,
    FEachRight = 110,
    FEachLeft = 111,
}

impl TypeCode {
    /// Byte width of this type's fixed-width wire representation, or
    /// `None` for the variable-width types (symbol, mixed list, ...).
    #[must_use]
    pub const fn width(self) -> Option<usize> {
        use TypeCode::{
            Boolean, Byte, Date, Datetime, Float, Int, Long, Minute, Month, Real, Second, Short,
            Time, Timespan, Timestamp,
        };
        match self {
            Boolean | Byte => Some(1),
            Short => Some(2),
            Int | Month | Date | Minute | Second | Time | Real => Some(4),
            Long | Float | Timestamp | Timespan | Datetime => Some(8),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_temporal(self) -> bool {
        matches!(
            self,
            TypeCode::Timestamp
                | TypeCode::Month
                | TypeCode::Date
                | TypeCode::Datetime
                | TypeCode::Timespan
                | TypeCode::Minute
                | TypeCode::Second
                | TypeCode::Time
        )
    }

    pub fn try_from_positive(code: i8) -> QResult<Self> {
        Ok(match code {
            0 => Self::MixedList,
            1 => Self::Boolean,
            2 => Self::Guid,
            4 => Self::Byte,
            5 => Self::Short,
            6 => Self::Int,
            7 => Self::Long,
            8 => Self::Real,
            9 => Self::Float,
            10 => Self::Char,
            11 => Self::Symbol,
            12 => Self::Timestamp,
            13 => Self::Month,
            14 => Self::Date,
            15 => Self::Datetime,
            16 => Self::Timespan,
            17 => Self::Minute,
            18 => Self::Second,
            19 => Self::Time,
            98 => Self::Table,
            99 => Self::Dict,
            127 => Self::SortedDict,
            100 => Self::Lambda,
            101 => Self::UnaryPrim,
            102 => Self::BinaryPrim,
            103 => Self::TernaryOp,
            104 => Self::Projection,
            105 => Self::Composition,
            106 => Self::FEach,
            107 => Self::FOver,
            108 => Self::FScan,
            109 => Self::FEachPrior,
            110 => Self::FEachRight,
            111 => Self::FEachLeft,
            other => {
                return Err(QError::Deserialization(format!(
                    "unknown type code: {other}"
                )))
            }
        })
    }

    /// Whether a raw integer value matches this type's null sentinel.
    /// Only meaningful for the integer-backed temporal/numeric types;
    /// floats are recognised by NaN separately.
    #[must_use]
    pub fn is_null_i64(self, raw: i64) -> bool {
        use TypeCode::{Byte, Date, Int, Long, Minute, Month, Second, Short, Time, Timespan, Timestamp};
        match self {
            Byte => raw == 0x00,
            Short => raw == i64::from(i16::MIN),
            Int | Month | Date | Minute | Second | Time => raw == i64::from(i32::MIN),
            Long | Timestamp | Timespan => raw == i64::MIN,
            _ => false,
        }
    }
}

/// Per-item vector attribute byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Attribute {
    #[default]
    None = 0,
    Sorted = 1,
    Unique = 2,
    Parted = 3,
    Grouped = 5,
}

impl Attribute {
    #[must_use]
    pub const fn from_byte(b: u8) -> Self {
        match b {
            1 => Self::Sorted,
            2 => Self::Unique,
            3 => Self::Parted,
            5 => Self::Grouped,
            _ => Self::None,
        }
    }

    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }
}

/// Homogeneous per-type vector payload. Elements are stored at their
/// raw wire width (e.g. `Vec<i32>` for an int vector); a slot holding
/// the type's null sentinel bit-pattern is a null, recognised with
/// [`TypeCode::is_null_i64`] or `f64::is_nan` rather than boxed into
/// `Option` (see `SPEC_FULL.md` §3).
#[derive(Debug, Clone, PartialEq)]
pub enum VecData {
    Bool(Vec<bool>),
    Guid(Vec<Uuid>),
    Byte(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Long(Vec<i64>),
    Real(Vec<f32>),
    Float(Vec<f64>),
    Char(String),
    Symbol(Vec<String>),
    Timestamp(Vec<i64>),
    Month(Vec<i32>),
    Date(Vec<i32>),
    Datetime(Vec<f64>),
    Timespan(Vec<i64>),
    Minute(Vec<i32>),
    Second(Vec<i32>),
    Time(Vec<i32>),
    /// Enumerated vector (tags 20-76): raw domain indices. Decode-only,
    /// see Open Question 3 in `DESIGN.md`.
    Enum(Vec<i32>),
}

impl VecData {
    #[must_use]
    pub fn type_code(&self) -> TypeCode {
        match self {
            VecData::Bool(_) => TypeCode::Boolean,
            VecData::Guid(_) => TypeCode::Guid,
            VecData::Byte(_) => TypeCode::Byte,
            VecData::Short(_) => TypeCode::Short,
            VecData::Int(_) => TypeCode::Int,
            VecData::Long(_) => TypeCode::Long,
            VecData::Real(_) => TypeCode::Real,
            VecData::Float(_) => TypeCode::Float,
            VecData::Char(_) => TypeCode::Char,
            VecData::Symbol(_) => TypeCode::Symbol,
            VecData::Timestamp(_) => TypeCode::Timestamp,
            VecData::Month(_) => TypeCode::Month,
            VecData::Date(_) => TypeCode::Date,
            VecData::Datetime(_) => TypeCode::Datetime,
            VecData::Timespan(_) => TypeCode::Timespan,
            VecData::Minute(_) => TypeCode::Minute,
            VecData::Second(_) => TypeCode::Second,
            VecData::Time(_) => TypeCode::Time,
            VecData::Enum(_) => TypeCode::Int,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            VecData::Bool(v) => v.len(),
            VecData::Guid(v) => v.len(),
            VecData::Byte(v) => v.len(),
            VecData::Short(v) => v.len(),
            VecData::Int(v) => v.len(),
            VecData::Long(v) => v.len(),
            VecData::Real(v) => v.len(),
            VecData::Float(v) => v.len(),
            VecData::Char(v) => v.chars().count(),
            VecData::Symbol(v) => v.len(),
            VecData::Timestamp(v) => v.len(),
            VecData::Month(v) => v.len(),
            VecData::Date(v) => v.len(),
            VecData::Datetime(v) => v.len(),
            VecData::Timespan(v) => v.len(),
            VecData::Minute(v) => v.len(),
            VecData::Second(v) => v.len(),
            VecData::Time(v) => v.len(),
            VecData::Enum(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Vector {
    pub attribute: Attribute,
    pub data: VecData,
}

impl Vector {
    #[must_use]
    pub fn new(data: VecData) -> Self {
        Self {
            attribute: Attribute::None,
            data,
        }
    }
}

/// Opaque descriptor for the function-family tags (100-111): these
/// cannot be meaningfully represented as host values, only passed
/// through or inspected (§4.C).
#[derive(Debug, Clone, PartialEq)]
pub enum FuncValue {
    Lambda { namespace: String, body: Box<Value> },
    UnaryPrim(u8),
    BinaryPrim(u8),
    TernaryOp(u8),
    Projection(Vec<Value>),
    Composition(Vec<Value>),
    Each(Box<Value>),
    Over(Box<Value>),
    Scan(Box<Value>),
    EachPrior(Box<Value>),
    EachRight(Box<Value>),
    EachLeft(Box<Value>),
}

/// A decoded or to-be-encoded host value (§9 Design Notes).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null(TypeCode),
    Bool(bool),
    Guid(Uuid),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Real(f32),
    Float(f64),
    Char(char),
    Symbol(String),
    /// Nanoseconds since the q epoch (2000-01-01).
    Timestamp(i64),
    /// Months since 2000-01.
    Month(i32),
    /// Days since the q epoch.
    Date(i32),
    /// Fractional days since the q epoch.
    Datetime(f64),
    /// Nanoseconds since midnight.
    Timespan(i64),
    /// Minutes since midnight.
    Minute(i32),
    /// Seconds since midnight.
    Second(i32),
    /// Milliseconds since midnight.
    Time(i32),
    List(Vec<Value>),
    Vector(Vector),
    Dict(Box<Value>, Box<Value>),
    /// A dict whose keys are a symbol vector of column names and whose
    /// values are a mixed list of equal-length column vectors.
    Table(Box<Value>),
    Error(String),
    Func(FuncValue),
}

impl Value {
    #[must_use]
    pub fn type_code(&self) -> TypeCode {
        match self {
            Value::Null(tc) => *tc,
            Value::Bool(_) => TypeCode::Boolean,
            Value::Guid(_) => TypeCode::Guid,
            Value::Byte(_) => TypeCode::Byte,
            Value::Short(_) => TypeCode::Short,
            Value::Int(_) => TypeCode::Int,
            Value::Long(_) => TypeCode::Long,
            Value::Real(_) => TypeCode::Real,
            Value::Float(_) => TypeCode::Float,
            Value::Char(_) => TypeCode::Char,
            Value::Symbol(_) => TypeCode::Symbol,
            Value::Timestamp(_) => TypeCode::Timestamp,
            Value::Month(_) => TypeCode::Month,
            Value::Date(_) => TypeCode::Date,
            Value::Datetime(_) => TypeCode::Datetime,
            Value::Timespan(_) => TypeCode::Timespan,
            Value::Minute(_) => TypeCode::Minute,
            Value::Second(_) => TypeCode::Second,
            Value::Time(_) => TypeCode::Time,
            Value::List(_) => TypeCode::MixedList,
            Value::Vector(v) => v.data.type_code(),
            Value::Dict(..) => TypeCode::Dict,
            Value::Table(_) => TypeCode::Table,
            Value::Error(_) => TypeCode::Error,
            Value::Func(_) => TypeCode::Lambda,
        }
    }

    /// Build a `Table` value from column names and column vectors.
    pub fn table(names: Vec<String>, columns: Vec<Value>) -> Self {
        let keys = Value::Vector(Vector::new(VecData::Symbol(names)));
        let vals = Value::List(columns);
        Value::Table(Box::new(Value::Dict(Box::new(keys), Box::new(vals))))
    }

    /// If this is a `Table`, return `(column_names, column_values)`.
    #[must_use]
    pub fn as_table(&self) -> Option<(&[String], &[Value])> {
        let Value::Table(inner) = self else {
            return None;
        };
        let Value::Dict(keys, vals) = inner.as_ref() else {
            return None;
        };
        let Value::Vector(Vector {
            data: VecData::Symbol(names),
            ..
        }) = keys.as_ref()
        else {
            return None;
        };
        let Value::List(columns) = vals.as_ref() else {
            return None;
        };
        Some((names, columns))
    }
}
