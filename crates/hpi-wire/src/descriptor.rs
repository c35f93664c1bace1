use std::fmt::Debug;
use std::sync::Arc;

use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;

use serde::Serialize;

use crate::codec::{Reader, Writer};
use crate::error::{DecodeError, DescriptorError, EncodeError};
use crate::value::Value;

/// Kind of a fixed-width scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ScalarKind {
    /// An unsigned 8-bit integer.
    U8,
    /// An unsigned 16-bit integer.
    U16,
    /// An unsigned 32-bit integer.
    U32,
    /// An unsigned 64-bit integer.
    U64,
    /// A signed 8-bit integer.
    I8,
    /// A signed 16-bit integer.
    I16,
    /// A signed 32-bit integer.
    I32,
    /// A signed 64-bit integer.
    I64,
    /// An IEEE 754 single precision float.
    F32,
    /// An IEEE 754 double precision float.
    F64,
}

impl ScalarKind {
    /// Returns the encoded width in bytes.
    #[must_use]
    pub const fn width(self) -> usize {
        match self {
            Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Returns the scalar kind name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Whether the scalar is an integer and can therefore drive a length or
    /// a union discriminant.
    #[must_use]
    pub const fn is_integer(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }
}

/// A reference to a sibling field, by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FieldRef(&'static str);

impl FieldRef {
    /// Creates a [`FieldRef`].
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(name)
    }

    /// Returns the name of the referenced field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        self.0
    }
}

/// A codec for shapes the descriptor vocabulary cannot express, such as
/// self-describing or recursive records.
///
/// A custom codec receives a cursor which already carries the byte order and
/// reports the amount of data it handled by advancing that cursor.
pub trait CustomCodec: Debug + Send + Sync {
    /// Codec name, used in error messages.
    fn name(&self) -> &'static str;

    /// Minimum number of bytes an encoded value occupies.
    fn min_size(&self) -> usize {
        0
    }

    /// Encodes a value.
    ///
    /// # Errors
    ///
    /// Fails when the value has not the shape the codec expects or when the
    /// writer runs out of space.
    fn encode(&self, value: &Value, writer: &mut Writer<'_>) -> Result<(), EncodeError>;

    /// Decodes a value.
    ///
    /// # Errors
    ///
    /// Fails when the input is truncated or malformed.
    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value, DecodeError>;
}

/// Encoded size of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EncodedSize {
    /// The size is known in advance.
    Fixed(usize),
    /// The size depends on the value, and is at least `min` bytes.
    Variable {
        /// Minimum size in bytes.
        min: usize,
    },
}

impl EncodedSize {
    /// Returns the minimum size in bytes.
    #[must_use]
    pub const fn min(self) -> usize {
        match self {
            Self::Fixed(size) => size,
            Self::Variable { min } => min,
        }
    }

    /// Returns the size when it is known in advance.
    #[must_use]
    pub const fn fixed(self) -> Option<usize> {
        match self {
            Self::Fixed(size) => Some(size),
            Self::Variable { .. } => None,
        }
    }

    const fn add(self, other: Self) -> Self {
        match (self, other) {
            (Self::Fixed(a), Self::Fixed(b)) => Self::Fixed(a + b),
            _ => Self::Variable {
                min: self.min() + other.min(),
            },
        }
    }

    const fn repeat(self, count: usize) -> Self {
        match self {
            Self::Fixed(size) => Self::Fixed(size * count),
            Self::Variable { min } => Self::Variable { min: min * count },
        }
    }
}

/// Describes how a single value is laid out on the wire.
#[derive(Debug, Clone)]
pub enum TypeDescriptor {
    /// A fixed-width scalar.
    Scalar(ScalarKind),
    /// Exactly `count` elements, without a length prefix.
    FixedArray {
        /// Element descriptor.
        element: Box<TypeDescriptor>,
        /// Number of elements.
        count: usize,
    },
    /// As many elements as the referenced sibling scalar says.
    VarArray {
        /// Element descriptor.
        element: Box<TypeDescriptor>,
        /// Field holding the number of elements.
        length: FieldRef,
    },
    /// An ordered list of named fields, without padding.
    Struct(StructDescriptor),
    /// The variant selected by a sibling discriminant.
    TaggedUnion(UnionDescriptor),
    /// A value handled by a custom codec.
    Custom(Arc<dyn CustomCodec>),
}

impl TypeDescriptor {
    /// Creates a [`TypeDescriptor::FixedArray`].
    #[must_use]
    pub fn fixed_array(element: Self, count: usize) -> Self {
        Self::FixedArray {
            element: Box::new(element),
            count,
        }
    }

    /// Creates a [`TypeDescriptor::VarArray`] whose length is held by the
    /// `length` sibling.
    #[must_use]
    pub fn var_array(element: Self, length: &'static str) -> Self {
        Self::VarArray {
            element: Box::new(element),
            length: FieldRef::new(length),
        }
    }

    /// Creates a [`TypeDescriptor::Custom`].
    #[must_use]
    pub fn custom(codec: impl CustomCodec + 'static) -> Self {
        Self::Custom(Arc::new(codec))
    }

    /// Returns the encoded size.
    #[must_use]
    pub fn encoded_size(&self) -> EncodedSize {
        match self {
            Self::Scalar(kind) => EncodedSize::Fixed(kind.width()),
            Self::FixedArray { element, count } => element.encoded_size().repeat(*count),
            Self::VarArray { .. } => EncodedSize::Variable { min: 0 },
            Self::Struct(descriptor) => descriptor.encoded_size(),
            Self::TaggedUnion(descriptor) => EncodedSize::Variable {
                min: descriptor
                    .variants
                    .values()
                    .map(|variant| variant.encoded_size().min())
                    .min()
                    .unwrap_or(0),
            },
            Self::Custom(codec) => EncodedSize::Variable {
                min: codec.min_size(),
            },
        }
    }

    /// Returns the encoded size when it does not depend on the value.
    #[must_use]
    pub fn static_size(&self) -> Option<usize> {
        self.encoded_size().fixed()
    }

    /// Checks that every sibling reference can be resolved.
    ///
    /// A bare variable array or union has no siblings, so it is rejected.
    ///
    /// # Errors
    ///
    /// Returns the first unresolved reference or duplicated field name.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        validate_descriptor("", self, None)
    }

    pub(crate) const fn is_byte(&self) -> bool {
        matches!(self, Self::Scalar(ScalarKind::U8))
    }
}

impl From<ScalarKind> for TypeDescriptor {
    fn from(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }
}

impl From<StructDescriptor> for TypeDescriptor {
    fn from(descriptor: StructDescriptor) -> Self {
        Self::Struct(descriptor)
    }
}

impl From<UnionDescriptor> for TypeDescriptor {
    fn from(descriptor: UnionDescriptor) -> Self {
        Self::TaggedUnion(descriptor)
    }
}

/// A named field of a struct.
#[derive(Debug, Clone)]
pub struct Field {
    name: &'static str,
    descriptor: TypeDescriptor,
}

impl Field {
    /// Creates a [`Field`].
    #[must_use]
    pub fn new(name: &'static str, descriptor: impl Into<TypeDescriptor>) -> Self {
        Self {
            name,
            descriptor: descriptor.into(),
        }
    }

    /// Returns the field name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the field descriptor.
    #[must_use]
    pub const fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}

macro_rules! scalar_field {
    ($($method:ident => $kind:ident),* $(,)?) => {
        $(
            #[doc = concat!("Appends a `", stringify!($method), "` field.")]
            #[must_use]
            #[inline]
            pub fn $method(self, name: &'static str) -> Self {
                self.field(name, ScalarKind::$kind)
            }
        )*
    };
}

/// An ordered list of named fields.
#[derive(Debug, Clone, Default)]
pub struct StructDescriptor(Vec<Field>);

impl StructDescriptor {
    /// Creates an empty [`StructDescriptor`].
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Creates a [`StructDescriptor`] from a list of fields.
    #[must_use]
    pub const fn from_fields(fields: Vec<Field>) -> Self {
        Self(fields)
    }

    scalar_field! {
        u8 => U8,
        u16 => U16,
        u32 => U32,
        u64 => U64,
        i8 => I8,
        i16 => I16,
        i32 => I32,
        i64 => I64,
        f32 => F32,
        f64 => F64,
    }

    /// Appends a field.
    #[must_use]
    #[inline]
    pub fn field(mut self, name: &'static str, descriptor: impl Into<TypeDescriptor>) -> Self {
        self.0.push(Field::new(name, descriptor));
        self
    }

    /// Appends a fixed array field.
    #[must_use]
    #[inline]
    pub fn array(self, name: &'static str, element: impl Into<TypeDescriptor>, count: usize) -> Self {
        self.field(name, TypeDescriptor::fixed_array(element.into(), count))
    }

    /// Appends a variable array field whose length is held by `length`.
    #[must_use]
    #[inline]
    pub fn var_array(
        self,
        name: &'static str,
        element: impl Into<TypeDescriptor>,
        length: &'static str,
    ) -> Self {
        self.field(name, TypeDescriptor::var_array(element.into(), length))
    }

    /// Returns the fields.
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.0
    }

    /// Returns the field called `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        self.0.iter().find(|field| field.name == name)
    }

    /// Returns the number of fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether the struct has no fields.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the encoded size of all fields.
    #[must_use]
    pub fn encoded_size(&self) -> EncodedSize {
        fields_size(&self.0)
    }

    /// Checks that field names are unique and that each sibling reference
    /// names an earlier integer field.
    ///
    /// # Errors
    ///
    /// Returns the first violation found, in declaration order.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        validate_fields(&self.0)
    }
}

/// Variants of a union, selected by a sibling discriminant.
#[derive(Debug, Clone)]
pub struct UnionDescriptor {
    discriminant: FieldRef,
    variants: IndexMap<u64, TypeDescriptor, DefaultHashBuilder>,
}

impl UnionDescriptor {
    /// Creates a [`UnionDescriptor`] without variants.
    #[must_use]
    pub fn new(discriminant: &'static str) -> Self {
        Self {
            discriminant: FieldRef::new(discriminant),
            variants: IndexMap::with_hasher(DefaultHashBuilder::default()),
        }
    }

    /// Adds the variant selected by `tag`.
    #[must_use]
    #[inline]
    pub fn variant(mut self, tag: u64, descriptor: impl Into<TypeDescriptor>) -> Self {
        self.variants.insert(tag, descriptor.into());
        self
    }

    /// Returns the discriminant reference.
    #[must_use]
    pub const fn discriminant(&self) -> FieldRef {
        self.discriminant
    }

    /// Returns the variant selected by `tag`.
    #[must_use]
    pub fn get(&self, tag: u64) -> Option<&TypeDescriptor> {
        self.variants.get(&tag)
    }

    /// Returns an iterator over the variants and their tags.
    pub fn variants(&self) -> impl Iterator<Item = (u64, &TypeDescriptor)> {
        self.variants.iter().map(|(tag, descriptor)| (*tag, descriptor))
    }
}

pub(crate) fn fields_size(fields: &[Field]) -> EncodedSize {
    fields
        .iter()
        .fold(EncodedSize::Fixed(0), |size, field| {
            size.add(field.descriptor.encoded_size())
        })
}

pub(crate) fn validate_fields(fields: &[Field]) -> Result<(), DescriptorError> {
    for (index, field) in fields.iter().enumerate() {
        let earlier = &fields[..index];
        if earlier.iter().any(|other| other.name == field.name) {
            return Err(DescriptorError::DuplicateField(field.name));
        }
        validate_descriptor(field.name, &field.descriptor, Some(earlier))?;
    }
    Ok(())
}

fn validate_descriptor(
    name: &'static str,
    descriptor: &TypeDescriptor,
    scope: Option<&[Field]>,
) -> Result<(), DescriptorError> {
    match descriptor {
        TypeDescriptor::Scalar(_) | TypeDescriptor::Custom(_) => Ok(()),
        TypeDescriptor::FixedArray { element, .. } => validate_descriptor(name, element, scope),
        TypeDescriptor::VarArray { element, length } => {
            resolve_reference(name, *length, scope)?;
            validate_descriptor(name, element, scope)
        }
        TypeDescriptor::Struct(descriptor) => descriptor.validate(),
        TypeDescriptor::TaggedUnion(descriptor) => {
            resolve_reference(name, descriptor.discriminant, scope)?;
            descriptor
                .variants
                .values()
                .try_for_each(|variant| validate_descriptor(name, variant, scope))
        }
    }
}

fn resolve_reference(
    name: &'static str,
    reference: FieldRef,
    scope: Option<&[Field]>,
) -> Result<(), DescriptorError> {
    let scope = scope.ok_or(DescriptorError::UnscopedReference(reference.name()))?;
    match scope.iter().find(|field| field.name == reference.name()) {
        Some(Field {
            descriptor: TypeDescriptor::Scalar(kind),
            ..
        }) if kind.is_integer() => Ok(()),
        _ => Err(DescriptorError::UnresolvedReference {
            field: name,
            reference: reference.name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{EncodedSize, ScalarKind, StructDescriptor, TypeDescriptor, UnionDescriptor};
    use crate::error::DescriptorError;

    fn text() -> StructDescriptor {
        StructDescriptor::new()
            .u32("DataType")
            .u8("DataLength")
            .var_array("Data", ScalarKind::U8, "DataLength")
    }

    #[test]
    fn encoded_sizes() {
        let fixed = StructDescriptor::new()
            .u8("A")
            .u16("B")
            .array("C", ScalarKind::U32, 4)
            .f64("D");
        assert_eq!(fixed.encoded_size(), EncodedSize::Fixed(1 + 2 + 16 + 8));

        assert_eq!(text().encoded_size(), EncodedSize::Variable { min: 5 });

        let nested = TypeDescriptor::fixed_array(text().into(), 3);
        assert_eq!(nested.encoded_size(), EncodedSize::Variable { min: 15 });
        assert_eq!(nested.static_size(), None);

        let union = StructDescriptor::new().u32("Type").field(
            "Value",
            UnionDescriptor::new("Type")
                .variant(0, ScalarKind::I64)
                .variant(1, ScalarKind::U8),
        );
        assert_eq!(union.encoded_size(), EncodedSize::Variable { min: 5 });
    }

    #[test]
    fn valid_references() {
        assert!(text().validate().is_ok());
        assert!(
            StructDescriptor::new()
                .u8("Count")
                .array("Items", TypeDescriptor::var_array(ScalarKind::U16.into(), "Count"), 2)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn invalid_references() {
        // Length declared after the array.
        let late = StructDescriptor::new()
            .var_array("Data", ScalarKind::U8, "DataLength")
            .u8("DataLength");
        assert_eq!(
            late.validate(),
            Err(DescriptorError::UnresolvedReference {
                field: "Data",
                reference: "DataLength"
            })
        );

        // Float discriminant.
        let float = StructDescriptor::new()
            .f32("Type")
            .field("Value", UnionDescriptor::new("Type").variant(0, ScalarKind::U8));
        assert!(matches!(
            float.validate(),
            Err(DescriptorError::UnresolvedReference { .. })
        ));

        // Siblings of an enclosing struct are not visible inside a nested one.
        let nested = StructDescriptor::new().u8("Length").field(
            "Inner",
            StructDescriptor::new().var_array("Data", ScalarKind::U8, "Length"),
        );
        assert!(nested.validate().is_err());

        assert_eq!(
            TypeDescriptor::var_array(ScalarKind::U8.into(), "Length").validate(),
            Err(DescriptorError::UnscopedReference("Length"))
        );
    }

    #[test]
    fn duplicate_fields() {
        assert_eq!(
            StructDescriptor::new().u8("A").u16("A").validate(),
            Err(DescriptorError::DuplicateField("A"))
        );
    }
}
