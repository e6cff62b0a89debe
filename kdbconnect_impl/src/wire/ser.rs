use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{QError, QResult};
use crate::value::{Attribute, TypeCode, VecData, Value, Vector};
use crate::wire::header::pack_header;

/// Serializes host [`Value`]s into the q IPC binary format (§4.B).
///
/// Mirrors the teacher's pattern of writing directly into a growable
/// buffer with `byteorder::WriteBytesExt` rather than building a
/// format string per call.
#[derive(Debug, Default)]
pub struct Serializer {
    buf: Vec<u8>,
}

impl Serializer {
    #[must_use]
    pub fn new() -> Self {
        Self { buf: Vec::with_capacity(256) }
    }

    /// Serialize a complete IPC message: header + payload.
    pub fn serialize_message(&mut self, value: &Value, msg_type: u8) -> QResult<Vec<u8>> {
        self.buf.clear();
        self.buf.extend_from_slice(&[0u8; 8]);
        self.serialize(value)?;
        let total_len = self.buf.len() as i32;
        let header = pack_header(msg_type, total_len);
        self.buf[0..8].copy_from_slice(&header);
        Ok(std::mem::take(&mut self.buf))
    }

    fn serialize(&mut self, value: &Value) -> QResult<()> {
        match value {
            Value::Null(code) => self.write_null_atom(*code),
            Value::Bool(b) => self.write_atom_tag(TypeCode::Boolean).and_then(|()| {
                self.buf.push(u8::from(*b));
                Ok(())
            }),
            Value::Guid(g) => {
                self.write_atom_tag(TypeCode::Guid)?;
                self.buf.extend_from_slice(g.as_bytes());
                Ok(())
            }
            Value::Byte(v) => {
                self.write_atom_tag(TypeCode::Byte)?;
                self.buf.push(*v);
                Ok(())
            }
            Value::Short(v) => {
                self.write_atom_tag(TypeCode::Short)?;
                self.buf.write_i16::<LittleEndian>(*v).map_err(QError::Io)
            }
            Value::Int(v) => {
                self.write_atom_tag(TypeCode::Int)?;
                self.buf.write_i32::<LittleEndian>(*v).map_err(QError::Io)
            }
            Value::Long(v) => {
                self.write_atom_tag(TypeCode::Long)?;
                self.buf.write_i64::<LittleEndian>(*v).map_err(QError::Io)
            }
            Value::Real(v) => {
                self.write_atom_tag(TypeCode::Real)?;
                self.buf.write_f32::<LittleEndian>(*v).map_err(QError::Io)
            }
            Value::Float(v) => {
                self.write_atom_tag(TypeCode::Float)?;
                self.buf.write_f64::<LittleEndian>(*v).map_err(QError::Io)
            }
            Value::Char(c) => {
                self.write_atom_tag(TypeCode::Char)?;
                self.buf.push(ascii_byte(*c));
                Ok(())
            }
            Value::Symbol(s) => {
                self.write_atom_tag(TypeCode::Symbol)?;
                self.buf.extend_from_slice(s.as_bytes());
                self.buf.push(0);
                Ok(())
            }
            Value::Timestamp(v) => self.write_i64_atom(TypeCode::Timestamp, *v),
            Value::Month(v) => self.write_i32_atom(TypeCode::Month, *v),
            Value::Date(v) => self.write_i32_atom(TypeCode::Date, *v),
            Value::Datetime(v) => {
                self.write_atom_tag(TypeCode::Datetime)?;
                self.buf.write_f64::<LittleEndian>(*v).map_err(QError::Io)
            }
            Value::Timespan(v) => self.write_i64_atom(TypeCode::Timespan, *v),
            Value::Minute(v) => self.write_i32_atom(TypeCode::Minute, *v),
            Value::Second(v) => self.write_i32_atom(TypeCode::Second, *v),
            Value::Time(v) => self.write_i32_atom(TypeCode::Time, *v),
            Value::List(items) => {
                self.buf.push(TypeCode::MixedList as u8);
                self.buf.push(Attribute::None.as_byte());
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for item in items {
                    self.serialize(item)?;
                }
                Ok(())
            }
            Value::Vector(v) => self.serialize_vector(v),
            Value::Dict(keys, vals) => {
                self.buf.push(TypeCode::Dict as u8);
                self.serialize(keys)?;
                self.serialize(vals)
            }
            Value::Table(inner) => {
                self.buf.push(TypeCode::Table as u8);
                self.buf.push(Attribute::None.as_byte());
                self.serialize(inner)
            }
            Value::Error(msg) => {
                self.buf.push(128u8);
                self.buf.extend_from_slice(msg.as_bytes());
                self.buf.push(0);
                Ok(())
            }
            Value::Func(_) => Err(QError::Serialization("function value")),
        }
    }

    fn write_atom_tag(&mut self, code: TypeCode) -> QResult<()> {
        self.buf.push(atom_tag_byte(code));
        Ok(())
    }

    fn write_i32_atom(&mut self, code: TypeCode, v: i32) -> QResult<()> {
        self.write_atom_tag(code)?;
        self.buf.write_i32::<LittleEndian>(v).map_err(QError::Io)
    }

    fn write_i64_atom(&mut self, code: TypeCode, v: i64) -> QResult<()> {
        self.write_atom_tag(code)?;
        self.buf.write_i64::<LittleEndian>(v).map_err(QError::Io)
    }

    fn write_null_atom(&mut self, code: TypeCode) -> QResult<()> {
        self.write_atom_tag(code)?;
        match code {
            TypeCode::Guid => self.buf.extend_from_slice(&[0u8; 16]),
            TypeCode::Symbol => self.buf.push(0),
            TypeCode::Char => self.buf.push(b' '),
            // Boolean/byte have no distinct null bit-pattern on the
            // wire; this writes the same zero atom a plain `false`/`0`
            // value would, so it decodes back as that, not `Null`.
            TypeCode::Boolean | TypeCode::Byte => self.buf.push(0),
            TypeCode::Short => self.buf.write_i16::<LittleEndian>(i16::MIN).map_err(QError::Io)?,
            TypeCode::Int | TypeCode::Month | TypeCode::Date | TypeCode::Minute | TypeCode::Second
            | TypeCode::Time => self.buf.write_i32::<LittleEndian>(i32::MIN).map_err(QError::Io)?,
            TypeCode::Long | TypeCode::Timestamp | TypeCode::Timespan => {
                self.buf.write_i64::<LittleEndian>(i64::MIN).map_err(QError::Io)?;
            }
            TypeCode::Real => self.buf.write_f32::<LittleEndian>(f32::NAN).map_err(QError::Io)?,
            TypeCode::Float | TypeCode::Datetime => {
                self.buf.write_f64::<LittleEndian>(f64::NAN).map_err(QError::Io)?;
            }
            other => return Err(QError::Serialization(type_name(other))),
        }
        Ok(())
    }

    fn serialize_vector(&mut self, v: &Vector) -> QResult<()> {
        let code = v.data.type_code();
        self.buf.push(code as u8);
        self.buf.push(v.attribute.as_byte());
        match &v.data {
            VecData::Bool(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for b in items {
                    self.buf.push(u8::from(*b));
                }
            }
            VecData::Guid(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for g in items {
                    self.buf.extend_from_slice(g.as_bytes());
                }
            }
            VecData::Byte(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                self.buf.extend_from_slice(items);
            }
            VecData::Short(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for x in items {
                    self.buf.write_i16::<LittleEndian>(*x).map_err(QError::Io)?;
                }
            }
            VecData::Int(items) | VecData::Month(items) | VecData::Date(items)
            | VecData::Minute(items) | VecData::Second(items) | VecData::Time(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for x in items {
                    self.buf.write_i32::<LittleEndian>(*x).map_err(QError::Io)?;
                }
            }
            VecData::Long(items) | VecData::Timestamp(items) | VecData::Timespan(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for x in items {
                    self.buf.write_i64::<LittleEndian>(*x).map_err(QError::Io)?;
                }
            }
            VecData::Real(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for x in items {
                    self.buf.write_f32::<LittleEndian>(*x).map_err(QError::Io)?;
                }
            }
            VecData::Float(items) | VecData::Datetime(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for x in items {
                    self.buf.write_f64::<LittleEndian>(*x).map_err(QError::Io)?;
                }
            }
            VecData::Char(s) => {
                let bytes = s.as_bytes();
                self.buf.write_i32::<LittleEndian>(bytes.len() as i32).map_err(QError::Io)?;
                self.buf.extend_from_slice(bytes);
            }
            VecData::Symbol(items) => {
                self.buf.write_i32::<LittleEndian>(items.len() as i32).map_err(QError::Io)?;
                for s in items {
                    self.buf.extend_from_slice(s.as_bytes());
                    self.buf.push(0);
                }
            }
            VecData::Enum(_) => return Err(QError::Serialization("enumerated vector")),
        }
        Ok(())
    }
}

/// The `256 - code` unsigned-byte convention for atoms (§4.B).
const fn atom_tag_byte(code: TypeCode) -> u8 {
    (256 - code as i16) as u8
}

fn ascii_byte(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        b'?'
    }
}

fn type_name(code: TypeCode) -> &'static str {
    match code {
        TypeCode::MixedList => "mixed list",
        TypeCode::Table => "table",
        TypeCode::Dict => "dict",
        TypeCode::SortedDict => "sorted dict",
        TypeCode::Error => "error",
        _ => "function",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_integer_42_like_the_reference_example() {
        let mut ser = Serializer::new();
        let msg = ser.serialize_message(&Value::Long(42), 1).unwrap();
        assert_eq!(
            msg,
            vec![0x01, 0x01, 0x00, 0x00, 0x0E, 0x00, 0x00, 0x00, 0xF9, 0x2A, 0, 0, 0, 0, 0, 0]
        );
    }

    #[test]
    fn serializes_char_vector() {
        let mut ser = Serializer::new();
        let v = Value::Vector(Vector::new(VecData::Char("test".to_string())));
        let msg = ser.serialize_message(&v, 1).unwrap();
        assert_eq!(&msg[8..18], &[0x0A, 0x00, 0x04, 0x00, 0x00, 0x00, b't', b'e', b's', b't']);
    }

    #[test]
    fn serializes_symbol_vector() {
        let mut ser = Serializer::new();
        let v = Value::Vector(Vector::new(VecData::Symbol(vec![
            "AAPL".to_string(),
            "GOOG".to_string(),
        ])));
        let msg = ser.serialize_message(&v, 1).unwrap();
        assert_eq!(
            &msg[8..24],
            &[
                0x0B, 0x00, 0x02, 0x00, 0x00, 0x00, b'A', b'A', b'P', b'L', 0x00, b'G', b'O', b'O',
                b'G', 0x00
            ]
        );
    }

    #[test]
    fn rejects_enum_vector() {
        let mut ser = Serializer::new();
        let v = Value::Vector(Vector::new(VecData::Enum(vec![0, 1])));
        assert!(ser.serialize_message(&v, 1).is_err());
    }
}
