use std::borrow::Cow;
use std::fmt;

/// Errors produced while decoding a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The input ended before a value was complete.
    Truncated {
        /// Number of bytes required by the next read.
        needed: usize,
        /// Number of bytes left in the input.
        remaining: usize,
    },
    /// A discriminant holds a value without a matching union variant.
    UnknownVariant {
        /// Name of the discriminant field.
        discriminant: &'static str,
        /// The decoded discriminant value.
        value: u64,
    },
    /// A length field announces more elements than the input can hold.
    LengthExceedsBuffer {
        /// Name of the length field.
        field: &'static str,
        /// The decoded length.
        length: u64,
        /// Number of bytes left in the input.
        remaining: usize,
    },
    /// A field reference could not be resolved to a decoded integer.
    UnresolvedField(&'static str),
    /// A custom codec rejected its input.
    Custom {
        /// Name of the custom codec.
        codec: &'static str,
        /// Failure reason.
        reason: Cow<'static, str>,
    },
}

impl DecodeError {
    /// Creates a [`DecodeError::Custom`] error.
    #[must_use]
    pub fn custom(codec: &'static str, reason: impl Into<Cow<'static, str>>) -> Self {
        Self::Custom {
            codec,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, remaining } => write!(
                f,
                "Truncated input: {needed} bytes needed, {remaining} remaining"
            ),
            Self::UnknownVariant {
                discriminant,
                value,
            } => write!(f, "No variant for `{discriminant}` = {value}"),
            Self::LengthExceedsBuffer {
                field,
                length,
                remaining,
            } => write!(
                f,
                "Length `{field}` = {length} exceeds the {remaining} remaining bytes"
            ),
            Self::UnresolvedField(name) => write!(f, "Unresolved field reference `{name}`"),
            Self::Custom { codec, reason } => write!(f, "Custom codec `{codec}`: {reason}"),
        }
    }
}

impl std::error::Error for DecodeError {}

/// Errors produced while encoding a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The output buffer cannot hold the encoded value.
    BufferFull {
        /// Number of bytes required by the next write.
        needed: usize,
        /// Number of bytes left in the output buffer.
        remaining: usize,
    },
    /// A struct value lacks a field declared by its descriptor.
    MissingField(&'static str),
    /// A value does not have the shape its descriptor expects.
    ValueMismatch {
        /// Expected shape.
        expected: &'static str,
        /// Shape found in the value.
        found: &'static str,
    },
    /// An array holds a different number of elements than its count.
    LengthMismatch {
        /// Element count required by the descriptor.
        expected: usize,
        /// Element count found in the value.
        found: usize,
    },
    /// A discriminant holds a value without a matching union variant.
    UnknownVariant {
        /// Name of the discriminant field.
        discriminant: &'static str,
        /// The discriminant value.
        value: u64,
    },
    /// A field reference could not be resolved to an integer value.
    UnresolvedField(&'static str),
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BufferFull { needed, remaining } => write!(
                f,
                "Buffer full: {needed} bytes needed, {remaining} remaining"
            ),
            Self::MissingField(name) => write!(f, "Missing field `{name}`"),
            Self::ValueMismatch { expected, found } => {
                write!(f, "Found `{found}`, expected `{expected}`")
            }
            Self::LengthMismatch { expected, found } => {
                write!(f, "Found {found} elements, expected {expected}")
            }
            Self::UnknownVariant {
                discriminant,
                value,
            } => write!(f, "No variant for `{discriminant}` = {value}"),
            Self::UnresolvedField(name) => write!(f, "Unresolved field reference `{name}`"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Errors found while validating descriptors and call specifications.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// Two fields of the same struct share a name.
    DuplicateField(&'static str),
    /// A field references a sibling that is not an earlier integer scalar.
    UnresolvedReference {
        /// The referencing field.
        field: &'static str,
        /// The referenced sibling.
        reference: &'static str,
    },
    /// A variable array or union appears outside of any struct.
    UnscopedReference(&'static str),
    /// A reply field list does not start with a status scalar.
    InvalidStatus {
        /// Operation id.
        operation: u32,
    },
    /// The session field of a call does not exist or is not a `u32`.
    InvalidSessionField {
        /// Operation id.
        operation: u32,
        /// Field name.
        field: &'static str,
    },
    /// An operation id is declared twice.
    DuplicateOperation(u32),
    /// Operation id 0 is reserved.
    ReservedOperation,
}

impl fmt::Display for DescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateField(name) => write!(f, "Duplicate field `{name}`"),
            Self::UnresolvedReference { field, reference } => write!(
                f,
                "Field `{field}` references `{reference}`, which is not an earlier integer field"
            ),
            Self::UnscopedReference(reference) => {
                write!(f, "Reference to `{reference}` outside of a struct")
            }
            Self::InvalidStatus { operation } => write!(
                f,
                "Operation {operation} does not start its reply with a 32-bit status"
            ),
            Self::InvalidSessionField { operation, field } => write!(
                f,
                "Operation {operation} declares an invalid session field `{field}`"
            ),
            Self::DuplicateOperation(operation) => {
                write!(f, "Operation {operation} is declared twice")
            }
            Self::ReservedOperation => f.write_str("Operation 0 is reserved"),
        }
    }
}

impl std::error::Error for DescriptorError {}
