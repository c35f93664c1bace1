use hashbrown::DefaultHashBuilder;
use indexmap::IndexMap;
use indexmap::map::{IntoIter, Iter};

use serde::Serialize;

/// A dynamically typed value, shaped after a
/// [`TypeDescriptor`](crate::descriptor::TypeDescriptor).
///
/// A union is represented by the value of its selected variant, and arrays
/// of bytes are decoded as [`Value::Bytes`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// An `u8` value.
    U8(u8),
    /// An `u16` value.
    U16(u16),
    /// An `u32` value.
    U32(u32),
    /// An `u64` value.
    U64(u64),
    /// An `i8` value.
    I8(i8),
    /// An `i16` value.
    I16(i16),
    /// An `i32` value.
    I32(i32),
    /// An `i64` value.
    I64(i64),
    /// A `f32` value.
    F32(f32),
    /// A `f64` value.
    F64(f64),
    /// An array of bytes.
    Bytes(Vec<u8>),
    /// An array of values.
    Array(Vec<Value>),
    /// A struct.
    Struct(Fields),
}

macro_rules! value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

value_from! {
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
    Vec<u8> => Bytes,
    Vec<Value> => Array,
    Fields => Struct,
}

macro_rules! value_as {
    ($($method:ident => $variant:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Returns the `", stringify!($ty), "` held by the value.")]
            #[must_use]
            pub const fn $method(&self) -> Option<$ty> {
                match self {
                    Self::$variant(value) => Some(*value),
                    _ => None,
                }
            }
        )*
    };
}

impl Value {
    value_as! {
        as_u8 => U8: u8,
        as_u16 => U16: u16,
        as_u32 => U32: u32,
        as_u64 => U64: u64,
        as_i8 => I8: i8,
        as_i16 => I16: i16,
        as_i32 => I32: i32,
        as_i64 => I64: i64,
        as_f32 => F32: f32,
        as_f64 => F64: f64,
    }

    /// Returns the bytes held by the value.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Returns the elements held by the value.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(values) => Some(values),
            _ => None,
        }
    }

    /// Returns the fields held by the value.
    #[must_use]
    pub const fn as_struct(&self) -> Option<&Fields> {
        match self {
            Self::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Returns the value as a length or a discriminant.
    ///
    /// Signed integers are sign-extended, floats and aggregates have no
    /// discriminant.
    #[must_use]
    pub const fn as_discriminant(&self) -> Option<u64> {
        Some(match *self {
            Self::U8(v) => v as u64,
            Self::U16(v) => v as u64,
            Self::U32(v) => v as u64,
            Self::U64(v) => v,
            Self::I8(v) => (v as i64).cast_unsigned(),
            Self::I16(v) => (v as i64).cast_unsigned(),
            Self::I32(v) => (v as i64).cast_unsigned(),
            Self::I64(v) => v.cast_unsigned(),
            _ => return None,
        })
    }

    /// Returns the name of the value kind.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::U8(_) => "u8",
            Self::U16(_) => "u16",
            Self::U32(_) => "u32",
            Self::U64(_) => "u64",
            Self::I8(_) => "i8",
            Self::I16(_) => "i16",
            Self::I32(_) => "i32",
            Self::I64(_) => "i64",
            Self::F32(_) => "f32",
            Self::F64(_) => "f64",
            Self::Bytes(_) => "bytes",
            Self::Array(_) => "array",
            Self::Struct(_) => "struct",
        }
    }
}

macro_rules! fields_insert {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            #[doc = concat!("Inserts a `", stringify!($ty), "` value.")]
            #[inline]
            pub fn $method(&mut self, name: &'static str, value: $ty) -> &mut Self {
                self.insert(name, value)
            }
        )*
    };
}

/// Named values, in insertion order.
///
/// Decoding fills the map in declaration order; encoding looks values up by
/// field name, so the insertion order of hand-built values is irrelevant.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct Fields(IndexMap<&'static str, Value, DefaultHashBuilder>);

impl Fields {
    /// Creates an empty [`Fields`].
    #[must_use]
    pub fn new() -> Self {
        Self(IndexMap::with_hasher(DefaultHashBuilder::default()))
    }

    /// Creates an empty [`Fields`] with room for `capacity` values.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self(IndexMap::with_capacity_and_hasher(
            capacity,
            DefaultHashBuilder::default(),
        ))
    }

    fields_insert! {
        u8: u8,
        u16: u16,
        u32: u32,
        u64: u64,
        i8: i8,
        i16: i16,
        i32: i32,
        i64: i64,
        f32: f32,
        f64: f64,
        bytes: Vec<u8>,
        array: Vec<Value>,
        structure: Fields,
    }

    /// Inserts a value, replacing any previous value with the same name.
    #[inline]
    pub fn insert(&mut self, name: &'static str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(name, value.into());
        self
    }

    /// Inserts a value and returns the fields.
    #[must_use]
    #[inline]
    pub fn with(mut self, name: &'static str, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the value called `name`.
    #[must_use]
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Removes and returns the value called `name`.
    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.shift_remove(name)
    }

    /// Checks whether a value called `name` exists.
    #[must_use]
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    /// Returns the number of values.
    #[must_use]
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks whether there are no values.
    #[must_use]
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the names and values.
    #[inline]
    pub fn iter(&self) -> Iter<'_, &'static str, Value> {
        self.0.iter()
    }
}

impl IntoIterator for Fields {
    type Item = (&'static str, Value);
    type IntoIter = IntoIter<&'static str, Value>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Fields {
    type Item = (&'a &'static str, &'a Value);
    type IntoIter = Iter<'a, &'static str, Value>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(&'static str, Value)> for Fields {
    fn from_iter<T: IntoIterator<Item = (&'static str, Value)>>(iter: T) -> Self {
        let mut fields = Self::new();
        fields.0.extend(iter);
        fields
    }
}
