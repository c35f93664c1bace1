use bytes::Bytes;

use hashbrown::HashMap;

use log::{debug, warn};

use crate::calls::hpi_calls;
use crate::codec::{ByteOrder, Reader, Writer, decode_fields, encode_fields};
use crate::descriptor::{EncodedSize, FieldRef, ScalarKind, StructDescriptor, TypeDescriptor};
use crate::error::{DecodeError, DescriptorError, EncodeError};
use crate::frame::MAX_PAYLOAD_LENGTH;
use crate::status::Status;
use crate::value::Fields;

/// How a call affects the session owned by a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionRole {
    /// The call does not open nor close sessions.
    #[default]
    None,
    /// On success, the call opens the session named by this reply field.
    Opens(FieldRef),
    /// On success, the call closes the session named by this request field.
    Closes(FieldRef),
}

/// Typed request and reply field lists of an operation.
///
/// The first reply field is always the status: the other reply fields are
/// only transmitted when the status means success.
#[derive(Debug, Clone)]
pub struct CallSpec {
    operation_id: u32,
    name: &'static str,
    request: StructDescriptor,
    reply: StructDescriptor,
    session: SessionRole,
}

impl CallSpec {
    /// Creates a [`CallSpec`].
    #[must_use]
    pub const fn new(
        operation_id: u32,
        name: &'static str,
        request: StructDescriptor,
        reply: StructDescriptor,
    ) -> Self {
        Self {
            operation_id,
            name,
            request,
            reply,
            session: SessionRole::None,
        }
    }

    /// Marks the call as opening the session held by the `field` reply
    /// field.
    #[must_use]
    pub const fn opens_session(mut self, field: &'static str) -> Self {
        self.session = SessionRole::Opens(FieldRef::new(field));
        self
    }

    /// Marks the call as closing the session held by the `field` request
    /// field.
    #[must_use]
    pub const fn closes_session(mut self, field: &'static str) -> Self {
        self.session = SessionRole::Closes(FieldRef::new(field));
        self
    }

    /// Returns the operation id.
    #[must_use]
    pub const fn operation_id(&self) -> u32 {
        self.operation_id
    }

    /// Returns the operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Returns the request field list.
    #[must_use]
    pub const fn request(&self) -> &StructDescriptor {
        &self.request
    }

    /// Returns the reply field list, status included.
    #[must_use]
    pub const fn reply(&self) -> &StructDescriptor {
        &self.reply
    }

    /// Returns the session role.
    #[must_use]
    pub const fn session_role(&self) -> SessionRole {
        self.session
    }

    /// Returns the kind of the status scalar.
    #[must_use]
    pub fn status_kind(&self) -> Option<ScalarKind> {
        match self.reply.fields().first().map(|field| field.descriptor()) {
            Some(TypeDescriptor::Scalar(kind @ (ScalarKind::U32 | ScalarKind::I32))) => Some(*kind),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), DescriptorError> {
        if self.operation_id == 0 {
            return Err(DescriptorError::ReservedOperation);
        }
        self.request.validate()?;
        self.reply.validate()?;

        if self.status_kind().is_none() {
            return Err(DescriptorError::InvalidStatus {
                operation: self.operation_id,
            });
        }

        let (fields, field) = match self.session {
            SessionRole::None => return Ok(()),
            // The status itself cannot carry the session.
            SessionRole::Opens(field) => (&self.reply.fields()[1..], field),
            SessionRole::Closes(field) => (self.request.fields(), field),
        };
        match fields.iter().find(|candidate| candidate.name() == field.name()) {
            Some(candidate) if matches!(candidate.descriptor(), TypeDescriptor::Scalar(ScalarKind::U32)) => Ok(()),
            _ => Err(DescriptorError::InvalidSessionField {
                operation: self.operation_id,
                field: field.name(),
            }),
        }
    }
}

#[derive(Debug)]
struct Entry {
    spec: CallSpec,
    request_size: EncodedSize,
    reply_size: EncodedSize,
}

/// An immutable table of [`CallSpec`]s, indexed by operation id.
///
/// Every call specification is validated and sized when the registry is
/// built, so a registry can be shared read-only by any number of
/// connections.
#[derive(Debug)]
pub struct CallRegistry {
    entries: HashMap<u32, Entry>,
    max_payload: usize,
}

impl CallRegistry {
    /// Builds a [`CallRegistry`] out of call specifications.
    ///
    /// # Errors
    ///
    /// Fails when a specification is invalid or when two specifications
    /// share an operation id.
    pub fn new(specs: impl IntoIterator<Item = CallSpec>) -> Result<Self, DescriptorError> {
        let mut entries = HashMap::new();
        for spec in specs {
            spec.validate()?;
            let operation_id = spec.operation_id;
            let entry = Entry {
                request_size: spec.request.encoded_size(),
                reply_size: spec.reply.encoded_size(),
                spec,
            };
            if entries.insert(operation_id, entry).is_some() {
                return Err(DescriptorError::DuplicateOperation(operation_id));
            }
        }
        debug!("Registered {} calls", entries.len());

        Ok(Self {
            entries,
            max_payload: MAX_PAYLOAD_LENGTH,
        })
    }

    /// Builds the registry of every HPI call.
    ///
    /// # Errors
    ///
    /// Fails when an HPI call declaration is invalid.
    pub fn hpi() -> Result<Self, DescriptorError> {
        Self::new(hpi_calls())
    }

    /// Sets the maximum size of an encoded payload.
    ///
    /// The size is clamped to the protocol maximum.
    #[must_use]
    pub fn max_payload(mut self, max_payload: usize) -> Self {
        self.max_payload = max_payload.min(MAX_PAYLOAD_LENGTH);
        self
    }

    /// Returns the maximum size of an encoded payload.
    #[must_use]
    pub const fn payload_limit(&self) -> usize {
        self.max_payload
    }

    /// Finds the specification of an operation.
    #[must_use]
    pub fn find(&self, operation_id: u32) -> Option<&CallSpec> {
        self.entries.get(&operation_id).map(|entry| &entry.spec)
    }

    /// Returns the encoded size of the request of an operation.
    #[must_use]
    pub fn request_size(&self, operation_id: u32) -> Option<EncodedSize> {
        self.entries
            .get(&operation_id)
            .map(|entry| entry.request_size)
    }

    /// Returns the encoded size of the successful reply of an operation.
    #[must_use]
    pub fn reply_size(&self, operation_id: u32) -> Option<EncodedSize> {
        self.entries.get(&operation_id).map(|entry| entry.reply_size)
    }

    /// Returns the number of registered calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Checks whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns an iterator over the registered calls, in no particular
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = &CallSpec> {
        self.entries.values().map(|entry| &entry.spec)
    }

    /// Encodes request values in the native byte order.
    ///
    /// # Errors
    ///
    /// Fails when the values do not match the request field list or exceed
    /// the payload limit.
    pub fn encode_request(&self, spec: &CallSpec, values: &Fields) -> Result<Bytes, EncodeError> {
        self.encode_request_in(ByteOrder::NATIVE, spec, values)
    }

    /// Encodes request values in `order`.
    ///
    /// # Errors
    ///
    /// Same as [`CallRegistry::encode_request`].
    pub fn encode_request_in(
        &self,
        order: ByteOrder,
        spec: &CallSpec,
        values: &Fields,
    ) -> Result<Bytes, EncodeError> {
        let mut buffer = vec![0; self.capacity(self.request_size(spec.operation_id))];
        let mut writer = Writer::with_order(order, &mut buffer);
        encode_fields(spec.request.fields(), values, &mut writer)?;
        let written = writer.position();
        Ok(finish(buffer, written))
    }

    /// Decodes request values written in `order`.
    ///
    /// Bytes following the last request field are ignored.
    ///
    /// # Errors
    ///
    /// Fails when the payload does not hold a well-formed request.
    pub fn decode_request(
        &self,
        order: ByteOrder,
        spec: &CallSpec,
        bytes: &[u8],
    ) -> Result<Fields, DecodeError> {
        let mut reader = Reader::new(order, bytes);
        let values = decode_fields(spec.request.fields(), &mut reader)?;
        if reader.remaining() > 0 {
            debug!(
                "Ignoring {} trailing bytes of a {} request",
                reader.remaining(),
                spec.name
            );
        }
        Ok(values)
    }

    /// Encodes a reply in the native byte order.
    ///
    /// The status is always written. The other reply fields are written
    /// only when the status means success, in which case `values` must hold
    /// all of them.
    ///
    /// # Errors
    ///
    /// Fails when the values do not match the reply field list or exceed
    /// the payload limit.
    pub fn encode_reply(
        &self,
        spec: &CallSpec,
        status: Status,
        values: &Fields,
    ) -> Result<Bytes, EncodeError> {
        self.encode_reply_in(ByteOrder::NATIVE, spec, status, values)
    }

    /// Encodes a reply in `order`.
    ///
    /// # Errors
    ///
    /// Same as [`CallRegistry::encode_reply`].
    pub fn encode_reply_in(
        &self,
        order: ByteOrder,
        spec: &CallSpec,
        status: Status,
        values: &Fields,
    ) -> Result<Bytes, EncodeError> {
        let kind = spec.status_kind().ok_or(EncodeError::MissingField("Status"))?;
        let status_value = status.to_value(kind).ok_or(EncodeError::ValueMismatch {
            expected: kind.name(),
            found: "status",
        })?;

        let capacity = if status.is_ok() {
            self.capacity(self.reply_size(spec.operation_id))
        } else {
            kind.width()
        };
        let mut buffer = vec![0; capacity];
        let mut writer = Writer::with_order(order, &mut buffer);

        writer.put_scalar(kind, &status_value)?;
        if status.is_ok() {
            encode_fields(&spec.reply.fields()[1..], values, &mut writer)?;
        }
        let written = writer.position();
        Ok(finish(buffer, written))
    }

    /// Encodes a reply made of a sole 32-bit status, in `order`.
    ///
    /// This is the reply to operations missing from the registry.
    #[must_use]
    pub fn encode_status(order: ByteOrder, status: Status) -> Bytes {
        let code = status.code().cast_unsigned();
        let bytes = match order {
            ByteOrder::Little => code.to_le_bytes(),
            ByteOrder::Big => code.to_be_bytes(),
        };
        Bytes::copy_from_slice(&bytes)
    }

    /// Decodes a reply written in `order`.
    ///
    /// When the status does not mean success, the returned values are
    /// empty.
    ///
    /// # Errors
    ///
    /// Fails when the payload does not hold a well-formed reply.
    pub fn decode_reply(
        &self,
        order: ByteOrder,
        spec: &CallSpec,
        bytes: &[u8],
    ) -> Result<(Status, Fields), DecodeError> {
        let kind = spec
            .status_kind()
            .ok_or(DecodeError::UnresolvedField("Status"))?;

        let mut reader = Reader::new(order, bytes);
        let status_value = reader.read_scalar(kind)?;
        let status = Status::from_value(&status_value)
            .ok_or(DecodeError::UnresolvedField("Status"))?;
        if !status.is_ok() {
            if reader.remaining() > 0 {
                warn!(
                    "Ignoring {} bytes following the {} status of a {} reply",
                    reader.remaining(),
                    status,
                    spec.name
                );
            }
            return Ok((status, Fields::new()));
        }

        let values = decode_fields(&spec.reply.fields()[1..], &mut reader)?;
        Ok((status, values))
    }

    fn capacity(&self, size: Option<EncodedSize>) -> usize {
        match size {
            Some(EncodedSize::Fixed(size)) => size.min(self.max_payload),
            _ => self.max_payload,
        }
    }
}

fn finish(mut buffer: Vec<u8>, written: usize) -> Bytes {
    buffer.truncate(written);
    Bytes::from(buffer)
}
