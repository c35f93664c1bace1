use byteorder::{BigEndian, ByteOrder as _, LittleEndian};

use serde::{Deserialize, Serialize};

use crate::descriptor::{Field, FieldRef, ScalarKind, TypeDescriptor};
use crate::error::{DecodeError, EncodeError};
use crate::value::{Fields, Value};

/// Order of the bytes of multi-byte scalars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ByteOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl ByteOrder {
    /// Byte order of the running machine.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;
    /// Byte order of the running machine.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;

    /// Returns the opposite byte order.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::Little => Self::Big,
            Self::Big => Self::Little,
        }
    }
}

impl Default for ByteOrder {
    fn default() -> Self {
        Self::NATIVE
    }
}

macro_rules! read_scalars {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Reads a `", stringify!($ty), "` in the reader byte order.")]
            ///
            /// # Errors
            ///
            /// Fails when the input is too short.
            pub fn $method(&mut self) -> Result<$ty, DecodeError> {
                let bytes = self.take(size_of::<$ty>())?;
                Ok(match self.order {
                    ByteOrder::Little => LittleEndian::$method(bytes),
                    ByteOrder::Big => BigEndian::$method(bytes),
                })
            }
        )*
    };
}

/// A cursor over an input buffer, decoding scalars in a declared byte
/// order.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    input: &'a [u8],
    position: usize,
    order: ByteOrder,
}

impl<'a> Reader<'a> {
    /// Creates a [`Reader`] over `input`, whose scalars were written in
    /// `order`.
    #[must_use]
    pub const fn new(order: ByteOrder, input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            order,
        }
    }

    /// Returns the byte order.
    #[must_use]
    pub const fn order(&self) -> ByteOrder {
        self.order
    }

    /// Returns the number of bytes consumed.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes left.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.input.len() - self.position
    }

    /// Returns the bytes left, without consuming them.
    #[must_use]
    pub fn remaining_bytes(&self) -> &'a [u8] {
        &self.input[self.position..]
    }

    /// Consumes and returns `count` bytes.
    ///
    /// # Errors
    ///
    /// Fails when fewer than `count` bytes are left.
    pub fn take(&mut self, count: usize) -> Result<&'a [u8], DecodeError> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(DecodeError::Truncated {
                needed: count,
                remaining,
            });
        }
        let bytes = &self.input[self.position..self.position + count];
        self.position += count;
        Ok(bytes)
    }

    /// Skips `count` bytes.
    ///
    /// # Errors
    ///
    /// Fails when fewer than `count` bytes are left.
    pub fn skip(&mut self, count: usize) -> Result<(), DecodeError> {
        self.take(count).map(|_| ())
    }

    /// Reads an `u8`.
    ///
    /// # Errors
    ///
    /// Fails when the input is exhausted.
    pub fn read_u8(&mut self) -> Result<u8, DecodeError> {
        self.take(1).map(|bytes| bytes[0])
    }

    /// Reads an `i8`.
    ///
    /// # Errors
    ///
    /// Fails when the input is exhausted.
    pub fn read_i8(&mut self) -> Result<i8, DecodeError> {
        self.read_u8().map(u8::cast_signed)
    }

    read_scalars! {
        read_u16: u16,
        read_u32: u32,
        read_u64: u64,
        read_i16: i16,
        read_i32: i32,
        read_i64: i64,
        read_f32: f32,
        read_f64: f64,
    }

    /// Reads a scalar of the given kind.
    ///
    /// # Errors
    ///
    /// Fails when the input is too short.
    pub fn read_scalar(&mut self, kind: ScalarKind) -> Result<Value, DecodeError> {
        Ok(match kind {
            ScalarKind::U8 => Value::U8(self.read_u8()?),
            ScalarKind::U16 => Value::U16(self.read_u16()?),
            ScalarKind::U32 => Value::U32(self.read_u32()?),
            ScalarKind::U64 => Value::U64(self.read_u64()?),
            ScalarKind::I8 => Value::I8(self.read_i8()?),
            ScalarKind::I16 => Value::I16(self.read_i16()?),
            ScalarKind::I32 => Value::I32(self.read_i32()?),
            ScalarKind::I64 => Value::I64(self.read_i64()?),
            ScalarKind::F32 => Value::F32(self.read_f32()?),
            ScalarKind::F64 => Value::F64(self.read_f64()?),
        })
    }
}

macro_rules! write_scalars {
    ($($method:ident => $write:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Writes a `", stringify!($ty), "` in the writer byte order.")]
            ///
            /// # Errors
            ///
            /// Fails when the output buffer is too small.
            pub fn $method(&mut self, value: $ty) -> Result<(), EncodeError> {
                let order = self.order;
                let bytes = self.reserve(size_of::<$ty>())?;
                match order {
                    ByteOrder::Little => LittleEndian::$write(bytes, value),
                    ByteOrder::Big => BigEndian::$write(bytes, value),
                }
                Ok(())
            }
        )*
    };
}

/// A cursor over an output buffer, encoding scalars in a chosen byte order.
#[derive(Debug)]
pub struct Writer<'a> {
    output: &'a mut [u8],
    position: usize,
    order: ByteOrder,
}

impl<'a> Writer<'a> {
    /// Creates a [`Writer`] encoding in the native byte order.
    #[must_use]
    pub const fn new(output: &'a mut [u8]) -> Self {
        Self::with_order(ByteOrder::NATIVE, output)
    }

    /// Creates a [`Writer`] encoding in `order`.
    #[must_use]
    pub const fn with_order(order: ByteOrder, output: &'a mut [u8]) -> Self {
        Self {
            output,
            position: 0,
            order,
        }
    }

    /// Returns the byte order.
    #[must_use]
    pub const fn order(&self) -> ByteOrder {
        self.order
    }

    /// Returns the number of bytes written.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Returns the number of bytes which can still be written.
    #[must_use]
    pub const fn remaining(&self) -> usize {
        self.output.len() - self.position
    }

    fn reserve(&mut self, count: usize) -> Result<&mut [u8], EncodeError> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(EncodeError::BufferFull {
                needed: count,
                remaining,
            });
        }
        let start = self.position;
        self.position += count;
        Ok(&mut self.output[start..start + count])
    }

    /// Writes raw bytes.
    ///
    /// # Errors
    ///
    /// Fails when the output buffer is too small.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.reserve(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Writes an `u8`.
    ///
    /// # Errors
    ///
    /// Fails when the output buffer is full.
    pub fn put_u8(&mut self, value: u8) -> Result<(), EncodeError> {
        self.put_bytes(&[value])
    }

    /// Writes an `i8`.
    ///
    /// # Errors
    ///
    /// Fails when the output buffer is full.
    pub fn put_i8(&mut self, value: i8) -> Result<(), EncodeError> {
        self.put_u8(value.cast_unsigned())
    }

    write_scalars! {
        put_u16 => write_u16: u16,
        put_u32 => write_u32: u32,
        put_u64 => write_u64: u64,
        put_i16 => write_i16: i16,
        put_i32 => write_i32: i32,
        put_i64 => write_i64: i64,
        put_f32 => write_f32: f32,
        put_f64 => write_f64: f64,
    }

    /// Overwrites the `u32` at `position` with `value`.
    ///
    /// Used to fill in a length once the data it counts has been written.
    ///
    /// # Errors
    ///
    /// Fails when `position` does not point to four written bytes.
    pub fn patch_u32(&mut self, position: usize, value: u32) -> Result<(), EncodeError> {
        let written = self.position;
        if position + 4 > written {
            return Err(EncodeError::BufferFull {
                needed: position + 4,
                remaining: written,
            });
        }
        let bytes = &mut self.output[position..position + 4];
        match self.order {
            ByteOrder::Little => LittleEndian::write_u32(bytes, value),
            ByteOrder::Big => BigEndian::write_u32(bytes, value),
        }
        Ok(())
    }

    /// Writes a scalar of the given kind.
    ///
    /// # Errors
    ///
    /// Fails when the value is not a scalar of that kind or when the output
    /// buffer is too small.
    pub fn put_scalar(&mut self, kind: ScalarKind, value: &Value) -> Result<(), EncodeError> {
        match (kind, value) {
            (ScalarKind::U8, Value::U8(v)) => self.put_u8(*v),
            (ScalarKind::U16, Value::U16(v)) => self.put_u16(*v),
            (ScalarKind::U32, Value::U32(v)) => self.put_u32(*v),
            (ScalarKind::U64, Value::U64(v)) => self.put_u64(*v),
            (ScalarKind::I8, Value::I8(v)) => self.put_i8(*v),
            (ScalarKind::I16, Value::I16(v)) => self.put_i16(*v),
            (ScalarKind::I32, Value::I32(v)) => self.put_i32(*v),
            (ScalarKind::I64, Value::I64(v)) => self.put_i64(*v),
            (ScalarKind::F32, Value::F32(v)) => self.put_f32(*v),
            (ScalarKind::F64, Value::F64(v)) => self.put_f64(*v),
            (kind, value) => Err(EncodeError::ValueMismatch {
                expected: kind.name(),
                found: value.kind_name(),
            }),
        }
    }
}

/// Encodes `value` in the native byte order and returns the number of bytes
/// written to `output`.
///
/// # Errors
///
/// Fails when the value does not match the descriptor or does not fit in
/// `output`.
pub fn encode(
    descriptor: &TypeDescriptor,
    value: &Value,
    output: &mut [u8],
) -> Result<usize, EncodeError> {
    let mut writer = Writer::new(output);
    encode_into(descriptor, value, &mut writer)?;
    Ok(writer.position())
}

/// Encodes `value` through an existing writer.
///
/// # Errors
///
/// Fails when the value does not match the descriptor or does not fit in
/// the writer.
pub fn encode_into(
    descriptor: &TypeDescriptor,
    value: &Value,
    writer: &mut Writer<'_>,
) -> Result<(), EncodeError> {
    encode_value(descriptor, value, None, writer)
}

/// Decodes a value written in `order`, returning it along with the number of
/// bytes read from `input`.
///
/// # Errors
///
/// Fails when the input is truncated, when a length exceeds the input, when
/// a discriminant selects no variant or when a custom codec fails.
pub fn decode(
    order: ByteOrder,
    descriptor: &TypeDescriptor,
    input: &[u8],
) -> Result<(Value, usize), DecodeError> {
    let mut reader = Reader::new(order, input);
    let value = decode_from(descriptor, &mut reader)?;
    Ok((value, reader.position()))
}

/// Decodes a value from an existing reader.
///
/// # Errors
///
/// Same as [`decode`].
pub fn decode_from(
    descriptor: &TypeDescriptor,
    reader: &mut Reader<'_>,
) -> Result<Value, DecodeError> {
    decode_value(descriptor, None, reader)
}

pub(crate) fn encode_fields(
    fields: &[Field],
    values: &Fields,
    writer: &mut Writer<'_>,
) -> Result<(), EncodeError> {
    for field in fields {
        let value = values
            .get(field.name())
            .ok_or(EncodeError::MissingField(field.name()))?;
        encode_value(field.descriptor(), value, Some(values), writer)?;
    }
    Ok(())
}

pub(crate) fn decode_fields(
    fields: &[Field],
    reader: &mut Reader<'_>,
) -> Result<Fields, DecodeError> {
    let mut values = Fields::with_capacity(fields.len());
    for field in fields {
        let value = decode_value(field.descriptor(), Some(&values), reader)?;
        values.insert(field.name(), value);
    }
    Ok(values)
}

fn encode_value(
    descriptor: &TypeDescriptor,
    value: &Value,
    scope: Option<&Fields>,
    writer: &mut Writer<'_>,
) -> Result<(), EncodeError> {
    match descriptor {
        TypeDescriptor::Scalar(kind) => writer.put_scalar(*kind, value),
        TypeDescriptor::FixedArray { element, count } => {
            encode_elements(element, value, *count, scope, writer)
        }
        TypeDescriptor::VarArray { element, length } => {
            let count = resolve(*length, scope).ok_or(EncodeError::UnresolvedField(length.name()))?;
            let count = usize::try_from(count).map_err(|_| EncodeError::UnresolvedField(length.name()))?;
            encode_elements(element, value, count, scope, writer)
        }
        TypeDescriptor::Struct(descriptor) => match value {
            Value::Struct(fields) => encode_fields(descriptor.fields(), fields, writer),
            other => Err(EncodeError::ValueMismatch {
                expected: "struct",
                found: other.kind_name(),
            }),
        },
        TypeDescriptor::TaggedUnion(descriptor) => {
            let discriminant = descriptor.discriminant();
            let tag = resolve(discriminant, scope)
                .ok_or(EncodeError::UnresolvedField(discriminant.name()))?;
            let variant = descriptor.get(tag).ok_or(EncodeError::UnknownVariant {
                discriminant: discriminant.name(),
                value: tag,
            })?;
            encode_value(variant, value, scope, writer)
        }
        TypeDescriptor::Custom(codec) => codec.encode(value, writer),
    }
}

fn encode_elements(
    element: &TypeDescriptor,
    value: &Value,
    count: usize,
    scope: Option<&Fields>,
    writer: &mut Writer<'_>,
) -> Result<(), EncodeError> {
    match value {
        Value::Bytes(bytes) if element.is_byte() => {
            check_count(count, bytes.len())?;
            writer.put_bytes(bytes)
        }
        Value::Array(items) => {
            check_count(count, items.len())?;
            items
                .iter()
                .try_for_each(|item| encode_value(element, item, scope, writer))
        }
        other => Err(EncodeError::ValueMismatch {
            expected: "array",
            found: other.kind_name(),
        }),
    }
}

const fn check_count(expected: usize, found: usize) -> Result<(), EncodeError> {
    if expected == found {
        Ok(())
    } else {
        Err(EncodeError::LengthMismatch { expected, found })
    }
}

fn decode_value(
    descriptor: &TypeDescriptor,
    scope: Option<&Fields>,
    reader: &mut Reader<'_>,
) -> Result<Value, DecodeError> {
    match descriptor {
        TypeDescriptor::Scalar(kind) => reader.read_scalar(*kind),
        TypeDescriptor::FixedArray { element, count } => {
            decode_elements(element, *count, scope, reader)
        }
        TypeDescriptor::VarArray { element, length } => {
            let count = resolve(*length, scope).ok_or(DecodeError::UnresolvedField(length.name()))?;
            let exceeds = || DecodeError::LengthExceedsBuffer {
                field: length.name(),
                length: count,
                remaining: reader.remaining(),
            };
            if let Some(size) = element.static_size()
                && count.saturating_mul(size as u64) > reader.remaining() as u64
            {
                return Err(exceeds());
            }
            let count = usize::try_from(count).map_err(|_| exceeds())?;
            decode_elements(element, count, scope, reader)
        }
        TypeDescriptor::Struct(descriptor) => {
            decode_fields(descriptor.fields(), reader).map(Value::Struct)
        }
        TypeDescriptor::TaggedUnion(descriptor) => {
            let discriminant = descriptor.discriminant();
            let tag = resolve(discriminant, scope)
                .ok_or(DecodeError::UnresolvedField(discriminant.name()))?;
            let variant = descriptor.get(tag).ok_or(DecodeError::UnknownVariant {
                discriminant: discriminant.name(),
                value: tag,
            })?;
            decode_value(variant, scope, reader)
        }
        TypeDescriptor::Custom(codec) => codec.decode(reader),
    }
}

fn decode_elements(
    element: &TypeDescriptor,
    count: usize,
    scope: Option<&Fields>,
    reader: &mut Reader<'_>,
) -> Result<Value, DecodeError> {
    if element.is_byte() {
        return reader.take(count).map(|bytes| Value::Bytes(bytes.to_vec()));
    }
    // A corrupted count must not drive the allocation.
    let mut items = Vec::with_capacity(count.min(reader.remaining()));
    for _ in 0..count {
        items.push(decode_value(element, scope, reader)?);
    }
    Ok(Value::Array(items))
}

fn resolve(reference: FieldRef, scope: Option<&Fields>) -> Option<u64> {
    scope?
        .get(reference.name())
        .and_then(Value::as_discriminant)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{ByteOrder, Reader, Writer, decode, encode};
    use crate::codec::encode_into;
    use crate::descriptor::{ScalarKind, StructDescriptor, TypeDescriptor, UnionDescriptor};
    use crate::error::{DecodeError, EncodeError};
    use crate::value::{Fields, Value};

    fn encode_in(order: ByteOrder, descriptor: &TypeDescriptor, value: &Value) -> Vec<u8> {
        let mut buffer = vec![0; 1024];
        let mut writer = Writer::with_order(order, &mut buffer);
        encode_into(descriptor, value, &mut writer).unwrap();
        let written = writer.position();
        buffer.truncate(written);
        buffer
    }

    fn text() -> TypeDescriptor {
        StructDescriptor::new()
            .u32("DataType")
            .u8("DataLength")
            .var_array("Data", ScalarKind::U8, "DataLength")
            .into()
    }

    fn reading() -> TypeDescriptor {
        StructDescriptor::new()
            .u8("IsSupported")
            .u32("Type")
            .field(
                "Value",
                UnionDescriptor::new("Type")
                    .variant(0, ScalarKind::I64)
                    .variant(1, ScalarKind::U64)
                    .variant(2, ScalarKind::F64)
                    .variant(3, TypeDescriptor::fixed_array(ScalarKind::U8.into(), 4)),
            )
            .into()
    }

    #[test]
    fn scalar_byte_orders() {
        let descriptor = TypeDescriptor::Scalar(ScalarKind::U32);
        let value = Value::U32(0x0102_0304);

        assert_eq!(encode_in(ByteOrder::Big, &descriptor, &value), [1, 2, 3, 4]);
        assert_eq!(
            encode_in(ByteOrder::Little, &descriptor, &value),
            [4, 3, 2, 1]
        );

        assert_eq!(
            decode(ByteOrder::Big, &descriptor, &[1, 2, 3, 4]).unwrap(),
            (value.clone(), 4)
        );
        assert_eq!(
            decode(ByteOrder::Little, &descriptor, &[4, 3, 2, 1, 0xFF]).unwrap(),
            (value, 4)
        );
    }

    #[test]
    fn native_encode() {
        let mut buffer = [0; 8];
        let written = encode(
            &TypeDescriptor::Scalar(ScalarKind::U16),
            &Value::U16(0xABCD),
            &mut buffer,
        )
        .unwrap();
        assert_eq!(written, 2);
        assert_eq!(buffer[..2], 0xABCDu16.to_ne_bytes());
    }

    #[test]
    fn var_array() {
        let value = Value::Struct(
            Fields::new()
                .with("DataType", 1u32)
                .with("DataLength", 3u8)
                .with("Data", vec![b'a', b'b', b'c']),
        );
        let bytes = encode_in(ByteOrder::Big, &text(), &value);
        assert_eq!(bytes, [0, 0, 0, 1, 3, b'a', b'b', b'c']);

        let (decoded, read) = decode(ByteOrder::Big, &text(), &bytes).unwrap();
        assert_eq!(read, bytes.len());
        assert_eq!(decoded, value);
    }

    #[test]
    fn var_array_length_beyond_buffer() {
        // The length claims 200 bytes but only 3 follow.
        let bytes = [0, 0, 0, 1, 200, b'a', b'b', b'c'];
        assert_eq!(
            decode(ByteOrder::Big, &text(), &bytes),
            Err(DecodeError::LengthExceedsBuffer {
                field: "DataLength",
                length: 200,
                remaining: 3,
            })
        );

        // Wide elements are checked against the remaining input too.
        let wide: TypeDescriptor = StructDescriptor::new()
            .u32("Count")
            .var_array("Items", ScalarKind::U64, "Count")
            .into();
        assert!(matches!(
            decode(ByteOrder::Little, &wide, &[0xFF, 0xFF, 0xFF, 0xFF, 0, 0]),
            Err(DecodeError::LengthExceedsBuffer { .. })
        ));
    }

    #[test]
    fn tagged_union() {
        let value = Value::Struct(
            Fields::new()
                .with("IsSupported", 1u8)
                .with("Type", 2u32)
                .with("Value", 21.5f64),
        );
        let bytes = encode_in(ByteOrder::Little, &reading(), &value);
        assert_eq!(bytes.len(), 1 + 4 + 8);
        assert_eq!(
            decode(ByteOrder::Little, &reading(), &bytes).unwrap(),
            (value, 13)
        );

        let buffer = Value::Struct(
            Fields::new()
                .with("IsSupported", 0u8)
                .with("Type", 3u32)
                .with("Value", vec![1u8, 2, 3, 4]),
        );
        let bytes = encode_in(ByteOrder::Big, &reading(), &buffer);
        assert_eq!(bytes, [0, 0, 0, 0, 3, 1, 2, 3, 4]);
    }

    #[test]
    fn tagged_union_unknown_variant() {
        let bytes = [1, 0, 0, 0, 9, 0, 0, 0, 0, 0, 0, 0, 0];
        assert_eq!(
            decode(ByteOrder::Big, &reading(), &bytes),
            Err(DecodeError::UnknownVariant {
                discriminant: "Type",
                value: 9
            })
        );

        let value = Value::Struct(
            Fields::new()
                .with("IsSupported", 1u8)
                .with("Type", 9u32)
                .with("Value", 0i64),
        );
        let mut buffer = [0; 32];
        assert_eq!(
            encode(&reading(), &value, &mut buffer),
            Err(EncodeError::UnknownVariant {
                discriminant: "Type",
                value: 9
            })
        );
    }

    #[test]
    fn truncated_input() {
        assert_eq!(
            decode(ByteOrder::Big, &reading(), &[1, 0, 0, 0, 1, 0, 0]),
            Err(DecodeError::Truncated {
                needed: 8,
                remaining: 2
            })
        );
    }

    #[test]
    fn encode_errors() {
        let mut small = [0; 6];
        let value = Value::Struct(
            Fields::new()
                .with("DataType", 1u32)
                .with("DataLength", 2u8)
                .with("Data", vec![1u8, 2]),
        );
        assert_eq!(
            encode(&text(), &value, &mut small),
            Err(EncodeError::BufferFull {
                needed: 2,
                remaining: 1
            })
        );

        let mut buffer = [0; 32];
        let missing = Value::Struct(Fields::new().with("DataType", 1u32));
        assert_eq!(
            encode(&text(), &missing, &mut buffer),
            Err(EncodeError::MissingField("DataLength"))
        );

        let mismatched = Value::Struct(
            Fields::new()
                .with("DataType", 1u32)
                .with("DataLength", 3u8)
                .with("Data", vec![1u8]),
        );
        assert_eq!(
            encode(&text(), &mismatched, &mut buffer),
            Err(EncodeError::LengthMismatch {
                expected: 3,
                found: 1
            })
        );

        assert_eq!(
            encode(
                &TypeDescriptor::Scalar(ScalarKind::U16),
                &Value::U32(1),
                &mut buffer
            ),
            Err(EncodeError::ValueMismatch {
                expected: "u16",
                found: "u32"
            })
        );
    }

    #[test]
    fn array_of_values_as_bytes() {
        // Bytes may be given element by element when encoding.
        let descriptor = TypeDescriptor::fixed_array(ScalarKind::U8.into(), 2);
        let mut buffer = [0; 2];
        let value = Value::Array(vec![Value::U8(7), Value::U8(8)]);
        assert_eq!(encode(&descriptor, &value, &mut buffer), Ok(2));
        assert_eq!(
            decode(ByteOrder::Big, &descriptor, &buffer).unwrap().0,
            Value::Bytes(vec![7, 8])
        );
    }

    #[test]
    fn patch_length() {
        let mut buffer = [0; 8];
        let mut writer = Writer::with_order(ByteOrder::Big, &mut buffer);
        writer.put_u32(0).unwrap();
        writer.put_u16(0xBEEF).unwrap();
        writer.patch_u32(0, 2).unwrap();
        assert!(writer.patch_u32(4, 0).is_err());
        assert_eq!(buffer[..6], [0, 0, 0, 2, 0xBE, 0xEF]);

        let mut reader = Reader::new(ByteOrder::Big, &buffer);
        assert_eq!(reader.read_u32(), Ok(2));
        assert_eq!(reader.remaining(), 4);
    }

    fn order() -> impl Strategy<Value = ByteOrder> {
        prop_oneof![Just(ByteOrder::Little), Just(ByteOrder::Big)]
    }

    fn sensor_reading() -> impl Strategy<Value = Value> {
        let union = prop_oneof![
            any::<i64>().prop_map(|v| (0u32, Value::I64(v))),
            any::<u64>().prop_map(|v| (1u32, Value::U64(v))),
            (-1.0e300..1.0e300f64).prop_map(|v| (2u32, Value::F64(v))),
            prop::array::uniform4(any::<u8>()).prop_map(|v| (3u32, Value::Bytes(v.to_vec()))),
        ];
        (any::<u8>(), union).prop_map(|(supported, (tag, value))| {
            Value::Struct(
                Fields::new()
                    .with("IsSupported", supported)
                    .with("Type", tag)
                    .with("Value", value),
            )
        })
    }

    proptest! {
        #[test]
        fn round_trip_text(order in order(), data_type in any::<u32>(), data in prop::collection::vec(any::<u8>(), 0..=255)) {
            let value = Value::Struct(
                Fields::new()
                    .with("DataType", data_type)
                    .with("DataLength", u8::try_from(data.len()).unwrap())
                    .with("Data", data),
            );
            let bytes = encode_in(order, &text(), &value);
            prop_assert_eq!(decode(order, &text(), &bytes).unwrap(), (value, bytes.len()));
        }

        #[test]
        fn round_trip_reading(order in order(), value in sensor_reading()) {
            let bytes = encode_in(order, &reading(), &value);
            prop_assert_eq!(decode(order, &reading(), &bytes).unwrap(), (value, bytes.len()));
        }

        #[test]
        fn swapped_order_reverses_scalars(value in any::<u64>()) {
            let descriptor = TypeDescriptor::Scalar(ScalarKind::U64);
            let mut bytes = encode_in(ByteOrder::Little, &descriptor, &Value::U64(value));
            bytes.reverse();
            prop_assert_eq!(
                decode(ByteOrder::Little.swapped(), &descriptor, &bytes).unwrap().0,
                Value::U64(value)
            );
        }
    }
}
