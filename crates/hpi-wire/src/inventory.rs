//! Legacy inventory data.
//!
//! On the wire, inventory data is a validity word followed by a list of
//! self-describing records:
//!
//! ```text
//! Validity u32
//! { RecordType u32, DataLength u32, Body [u8; DataLength] } ...
//! 0xFFFF_FFFF
//! ```
//!
//! Records are read lazily through [`Records`], then collected into an
//! owned [`InventoryData`], whose text buffers live in a single arena and
//! are referenced from records by [`TextId`].

use std::iter::FusedIterator;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::codec::{ByteOrder, Reader, Writer};
use crate::descriptor::CustomCodec;
use crate::error::{DecodeError, EncodeError};
use crate::types::{MAX_TEXT_BUFFER_LENGTH, TextBuffer};
use crate::value::{Fields, Value};

/// Record type closing the record list.
pub const RECORD_TERMINATOR: u32 = 0xFFFF_FFFF;

// Slot value of the projection when a slot holds no text.
const NO_TEXT: u32 = u32::MAX;

const CODEC_NAME: &str = "InventoryData";

/// Inventory record types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(u32)]
pub enum RecordType {
    /// Internal use area.
    InternalUse = 0xB0,
    /// Chassis information area.
    ChassisInfo = 0xB1,
    /// Board information area.
    BoardInfo = 0xB2,
    /// Product information area.
    ProductInfo = 0xB3,
    /// OEM area.
    Oem = 0xC0,
}

/// Index of a text buffer in the [`InventoryData`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextId(usize);

impl TextId {
    /// Returns the arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Data shared by the chassis, board and product records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GeneralData {
    /// Manufacturing time.
    pub mfg_date_time: i64,
    /// Text slots, in wire order.
    pub slots: Vec<Option<TextId>>,
}

/// An inventory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InventoryRecord {
    /// Internal use data.
    InternalUse(Vec<u8>),
    /// Chassis information.
    ChassisInfo {
        /// Chassis type.
        chassis_type: u32,
        /// General data.
        general: GeneralData,
    },
    /// Board information.
    BoardInfo(GeneralData),
    /// Product information.
    ProductInfo(GeneralData),
    /// OEM data.
    Oem {
        /// Manufacturer identifier.
        manufacturer_id: u32,
        /// Data.
        data: Vec<u8>,
    },
}

impl InventoryRecord {
    /// Returns the record type.
    #[must_use]
    pub const fn record_type(&self) -> RecordType {
        match self {
            Self::InternalUse(_) => RecordType::InternalUse,
            Self::ChassisInfo { .. } => RecordType::ChassisInfo,
            Self::BoardInfo(_) => RecordType::BoardInfo,
            Self::ProductInfo(_) => RecordType::ProductInfo,
            Self::Oem { .. } => RecordType::Oem,
        }
    }
}

/// A record as found on the wire, with an undecoded body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawRecord<'a> {
    /// Record type.
    pub record_type: u32,
    /// Record body.
    pub body: &'a [u8],
}

/// A lazy iterator over the records of a record list.
///
/// The iterator stops at the terminator, or after yielding the first error.
/// A clone continues independently from the same position, so iteration can
/// be restarted from any point.
#[derive(Debug, Clone)]
pub struct Records<'a> {
    reader: Reader<'a>,
    terminated: bool,
    done: bool,
}

impl<'a> Records<'a> {
    /// Creates a [`Records`] iterator over a record list written in `order`.
    #[must_use]
    pub const fn new(order: ByteOrder, input: &'a [u8]) -> Self {
        Self {
            reader: Reader::new(order, input),
            terminated: false,
            done: false,
        }
    }

    /// Returns the number of bytes consumed so far, terminator included.
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.reader.position()
    }

    /// Checks whether the terminator has been reached.
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn read_record(&mut self) -> Result<Option<RawRecord<'a>>, DecodeError> {
        let record_type = self.reader.read_u32()?;
        if record_type == RECORD_TERMINATOR {
            return Ok(None);
        }
        let length = self.reader.read_u32()?;
        let remaining = self.reader.remaining();
        if u64::from(length) > remaining as u64 {
            return Err(DecodeError::LengthExceedsBuffer {
                field: "DataLength",
                length: length.into(),
                remaining,
            });
        }
        let body = self.reader.take(length as usize)?;
        Ok(Some(RawRecord { record_type, body }))
    }
}

impl<'a> Iterator for Records<'a> {
    type Item = Result<RawRecord<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_record() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.terminated = true;
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl FusedIterator for Records<'_> {}

/// Decoded inventory data.
///
/// Equality compares the texts that slots resolve to, not arena indexes: the
/// wire carries texts inline, so arena order, shared entries and unreferenced
/// entries do not survive an encoding.
#[derive(Debug, Clone, Default)]
pub struct InventoryData {
    validity: u32,
    records: Vec<InventoryRecord>,
    texts: Vec<TextBuffer>,
}

impl InventoryData {
    /// Creates an empty [`InventoryData`].
    #[must_use]
    pub const fn new(validity: u32) -> Self {
        Self {
            validity,
            records: Vec::new(),
            texts: Vec::new(),
        }
    }

    /// Returns the validity word.
    #[must_use]
    pub const fn validity(&self) -> u32 {
        self.validity
    }

    /// Returns the records.
    #[must_use]
    pub fn records(&self) -> &[InventoryRecord] {
        &self.records
    }

    /// Returns the text arena.
    #[must_use]
    pub fn texts(&self) -> &[TextBuffer] {
        &self.texts
    }

    /// Returns a text buffer of the arena.
    #[must_use]
    pub fn text(&self, id: TextId) -> Option<&TextBuffer> {
        self.texts.get(id.0)
    }

    /// Adds a text buffer to the arena.
    pub fn add_text(&mut self, text: TextBuffer) -> TextId {
        self.texts.push(text);
        TextId(self.texts.len() - 1)
    }

    /// Appends a record.
    pub fn push_record(&mut self, record: InventoryRecord) -> &mut Self {
        self.records.push(record);
        self
    }

    /// Decodes inventory data written in `order`, returning it along with
    /// the number of bytes read.
    ///
    /// # Errors
    ///
    /// Fails on truncated input, on a missing terminator and on unknown
    /// record types or malformed record bodies.
    pub fn decode(order: ByteOrder, input: &[u8]) -> Result<(Self, usize), DecodeError> {
        let mut reader = Reader::new(order, input);
        let mut data = Self::new(reader.read_u32()?);

        let mut records = Records::new(order, reader.remaining_bytes());
        for raw in records.by_ref() {
            let record = parse_record(order, raw?, &mut data.texts)?;
            data.records.push(record);
        }

        Ok((data, reader.position() + records.consumed()))
    }

    /// Encodes the inventory data.
    ///
    /// # Errors
    ///
    /// Fails when a slot references a text outside of the arena or when the
    /// writer runs out of space.
    pub fn encode(&self, writer: &mut Writer<'_>) -> Result<(), EncodeError> {
        writer.put_u32(self.validity)?;
        for record in &self.records {
            writer.put_u32(record.record_type().into())?;

            // The body length is known once the body is written.
            let length_position = writer.position();
            writer.put_u32(0)?;
            let start = writer.position();

            match record {
                InventoryRecord::InternalUse(data) => writer.put_bytes(data)?,
                InventoryRecord::ChassisInfo {
                    chassis_type,
                    general,
                } => {
                    writer.put_u32(*chassis_type)?;
                    self.write_general(general, writer)?;
                }
                InventoryRecord::BoardInfo(general) | InventoryRecord::ProductInfo(general) => {
                    self.write_general(general, writer)?;
                }
                InventoryRecord::Oem {
                    manufacturer_id,
                    data,
                } => {
                    writer.put_u32(*manufacturer_id)?;
                    writer.put_bytes(data)?;
                }
            }

            let length = writer.position() - start;
            writer.patch_u32(length_position, to_u32(length)?)?;
        }
        writer.put_u32(RECORD_TERMINATOR)
    }

    fn write_general(&self, general: &GeneralData, writer: &mut Writer<'_>) -> Result<(), EncodeError> {
        writer.put_i64(general.mfg_date_time)?;
        writer.put_u32(to_u32(general.slots.len())?)?;
        for slot in &general.slots {
            match slot {
                None => writer.put_u8(0)?,
                Some(id) => {
                    let text = self.text(*id).ok_or(EncodeError::UnresolvedField("Texts"))?;
                    writer.put_u8(1)?;
                    write_text(text, writer)?;
                }
            }
        }
        Ok(())
    }

    /// Converts the inventory data into its value projection.
    ///
    /// The projection is a struct with `Validity`, `Texts` and `Records`
    /// fields. Each record is a struct starting with its `RecordType`, and
    /// text slots hold arena indexes, `0xFFFF_FFFF` marking an empty slot.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let records = self.records.iter().map(record_value).collect::<Vec<_>>();
        let texts = self.texts.iter().map(TextBuffer::to_value).collect::<Vec<_>>();

        let mut fields = Fields::with_capacity(3);
        fields
            .u32("Validity", self.validity)
            .array("Texts", texts)
            .array("Records", records);
        Value::Struct(fields)
    }

    /// Builds inventory data out of its value projection.
    ///
    /// # Errors
    ///
    /// Fails when the value is not shaped as [`InventoryData::to_value`]
    /// produces it, or when a slot references a text outside of the arena.
    pub fn from_value(value: &Value) -> Result<Self, EncodeError> {
        let fields = as_struct(value)?;

        let texts = array_field(fields, "Texts")?
            .iter()
            .map(|text| {
                TextBuffer::from_value(text).ok_or(EncodeError::ValueMismatch {
                    expected: "text buffer",
                    found: text.kind_name(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut data = Self {
            validity: u32_field(fields, "Validity")?,
            records: Vec::new(),
            texts,
        };
        for record in array_field(fields, "Records")? {
            let record = data.record_from_value(record)?;
            data.records.push(record);
        }
        Ok(data)
    }

    fn record_from_value(&self, value: &Value) -> Result<InventoryRecord, EncodeError> {
        let fields = as_struct(value)?;
        let record_type = u32_field(fields, "RecordType")?;
        let record_type =
            RecordType::try_from(record_type).map_err(|_| EncodeError::UnknownVariant {
                discriminant: "RecordType",
                value: record_type.into(),
            })?;

        Ok(match record_type {
            RecordType::InternalUse => InventoryRecord::InternalUse(bytes_field(fields, "Data")?),
            RecordType::ChassisInfo => InventoryRecord::ChassisInfo {
                chassis_type: u32_field(fields, "ChassisType")?,
                general: self.general_from_fields(fields)?,
            },
            RecordType::BoardInfo => InventoryRecord::BoardInfo(self.general_from_fields(fields)?),
            RecordType::ProductInfo => {
                InventoryRecord::ProductInfo(self.general_from_fields(fields)?)
            }
            RecordType::Oem => InventoryRecord::Oem {
                manufacturer_id: u32_field(fields, "MId")?,
                data: bytes_field(fields, "Data")?,
            },
        })
    }

    fn general_from_fields(&self, fields: &Fields) -> Result<GeneralData, EncodeError> {
        let mfg_date_time = field(fields, "MfgDateTime")?;
        let mfg_date_time = mfg_date_time.as_i64().ok_or(mismatch("i64", mfg_date_time))?;

        let slots = array_field(fields, "Slots")?
            .iter()
            .map(|slot| match slot.as_u32() {
                Some(NO_TEXT) => Ok(None),
                Some(index) if (index as usize) < self.texts.len() => {
                    Ok(Some(TextId(index as usize)))
                }
                Some(_) => Err(EncodeError::UnresolvedField("Texts")),
                None => Err(mismatch("u32", slot)),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(GeneralData {
            mfg_date_time,
            slots,
        })
    }
}

impl PartialEq for InventoryData {
    fn eq(&self, other: &Self) -> bool {
        self.validity == other.validity
            && self.records.len() == other.records.len()
            && self
                .records
                .iter()
                .zip(&other.records)
                .all(|(left, right)| self.same_record(left, other, right))
    }
}

impl Eq for InventoryData {}

impl InventoryData {
    fn same_record(&self, left: &InventoryRecord, other: &Self, right: &InventoryRecord) -> bool {
        match (left, right) {
            (
                InventoryRecord::ChassisInfo {
                    chassis_type: left_type,
                    general: left,
                },
                InventoryRecord::ChassisInfo {
                    chassis_type: right_type,
                    general: right,
                },
            ) => left_type == right_type && self.same_general(left, other, right),
            (InventoryRecord::BoardInfo(left), InventoryRecord::BoardInfo(right))
            | (InventoryRecord::ProductInfo(left), InventoryRecord::ProductInfo(right)) => {
                self.same_general(left, other, right)
            }
            _ => left == right,
        }
    }

    fn same_general(&self, left: &GeneralData, other: &Self, right: &GeneralData) -> bool {
        left.mfg_date_time == right.mfg_date_time
            && left.slots.len() == right.slots.len()
            && left
                .slots
                .iter()
                .zip(&right.slots)
                .all(|(left, right)| match (left, right) {
                    (None, None) => true,
                    (Some(left), Some(right)) => self.text(*left) == other.text(*right),
                    _ => false,
                })
    }
}

/// Custom codec of [`InventoryData`], working on its value projection.
#[derive(Debug, Clone, Copy, Default)]
pub struct InventoryCodec;

impl CustomCodec for InventoryCodec {
    fn name(&self) -> &'static str {
        CODEC_NAME
    }

    fn min_size(&self) -> usize {
        // Validity and terminator.
        8
    }

    fn encode(&self, value: &Value, writer: &mut Writer<'_>) -> Result<(), EncodeError> {
        InventoryData::from_value(value)?.encode(writer)
    }

    fn decode(&self, reader: &mut Reader<'_>) -> Result<Value, DecodeError> {
        let (data, consumed) = InventoryData::decode(reader.order(), reader.remaining_bytes())?;
        reader.skip(consumed)?;
        Ok(data.to_value())
    }
}

fn parse_record(
    order: ByteOrder,
    raw: RawRecord<'_>,
    texts: &mut Vec<TextBuffer>,
) -> Result<InventoryRecord, DecodeError> {
    let record_type = RecordType::try_from(raw.record_type).map_err(|_| {
        DecodeError::custom(
            CODEC_NAME,
            format!("unknown record type {:#x}", raw.record_type),
        )
    })?;

    let mut reader = Reader::new(order, raw.body);
    let record = match record_type {
        RecordType::InternalUse => {
            InventoryRecord::InternalUse(reader.take(raw.body.len())?.to_vec())
        }
        RecordType::ChassisInfo => InventoryRecord::ChassisInfo {
            chassis_type: reader.read_u32()?,
            general: read_general(&mut reader, texts)?,
        },
        RecordType::BoardInfo => InventoryRecord::BoardInfo(read_general(&mut reader, texts)?),
        RecordType::ProductInfo => InventoryRecord::ProductInfo(read_general(&mut reader, texts)?),
        RecordType::Oem => InventoryRecord::Oem {
            manufacturer_id: reader.read_u32()?,
            data: reader.take(reader.remaining())?.to_vec(),
        },
    };

    if reader.remaining() > 0 {
        return Err(DecodeError::custom(
            CODEC_NAME,
            format!(
                "{} trailing bytes in a {record_type:?} record",
                reader.remaining()
            ),
        ));
    }
    Ok(record)
}

fn read_general(
    reader: &mut Reader<'_>,
    texts: &mut Vec<TextBuffer>,
) -> Result<GeneralData, DecodeError> {
    let mfg_date_time = reader.read_i64()?;
    let count = reader.read_u32()?;
    // Each slot takes at least its presence byte.
    if u64::from(count) > reader.remaining() as u64 {
        return Err(DecodeError::LengthExceedsBuffer {
            field: "SlotCount",
            length: count.into(),
            remaining: reader.remaining(),
        });
    }

    let mut slots = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let slot = if reader.read_u8()? == 0 {
            None
        } else {
            texts.push(read_text(reader)?);
            Some(TextId(texts.len() - 1))
        };
        slots.push(slot);
    }
    Ok(GeneralData {
        mfg_date_time,
        slots,
    })
}

fn read_text(reader: &mut Reader<'_>) -> Result<TextBuffer, DecodeError> {
    let data_type = reader.read_u32()?;
    let language = reader.read_u32()?;
    let length = reader.read_u8()?;
    Ok(TextBuffer {
        data_type,
        language,
        data: reader.take(length.into())?.to_vec(),
    })
}

fn write_text(text: &TextBuffer, writer: &mut Writer<'_>) -> Result<(), EncodeError> {
    let length = u8::try_from(text.data.len())
        .ok()
        .filter(|length| usize::from(*length) <= MAX_TEXT_BUFFER_LENGTH)
        .ok_or(EncodeError::LengthMismatch {
            expected: MAX_TEXT_BUFFER_LENGTH,
            found: text.data.len(),
        })?;
    writer.put_u32(text.data_type)?;
    writer.put_u32(text.language)?;
    writer.put_u8(length)?;
    writer.put_bytes(&text.data)
}

fn record_value(record: &InventoryRecord) -> Value {
    let mut fields = Fields::new();
    fields.u32("RecordType", record.record_type().into());
    match record {
        InventoryRecord::InternalUse(data) => {
            fields.bytes("Data", data.clone());
        }
        InventoryRecord::ChassisInfo {
            chassis_type,
            general,
        } => {
            fields.u32("ChassisType", *chassis_type);
            general_value(general, &mut fields);
        }
        InventoryRecord::BoardInfo(general) | InventoryRecord::ProductInfo(general) => {
            general_value(general, &mut fields);
        }
        InventoryRecord::Oem {
            manufacturer_id,
            data,
        } => {
            fields.u32("MId", *manufacturer_id).bytes("Data", data.clone());
        }
    }
    Value::Struct(fields)
}

fn general_value(general: &GeneralData, fields: &mut Fields) {
    let slots = general
        .slots
        .iter()
        .map(|slot| Value::U32(slot.map_or(NO_TEXT, |id| id.0 as u32)))
        .collect();
    fields
        .i64("MfgDateTime", general.mfg_date_time)
        .array("Slots", slots);
}

fn to_u32(length: usize) -> Result<u32, EncodeError> {
    u32::try_from(length).map_err(|_| EncodeError::LengthMismatch {
        expected: u32::MAX as usize,
        found: length,
    })
}

fn mismatch(expected: &'static str, found: &Value) -> EncodeError {
    EncodeError::ValueMismatch {
        expected,
        found: found.kind_name(),
    }
}

fn as_struct(value: &Value) -> Result<&Fields, EncodeError> {
    value.as_struct().ok_or(mismatch("struct", value))
}

fn field<'v>(fields: &'v Fields, name: &'static str) -> Result<&'v Value, EncodeError> {
    fields.get(name).ok_or(EncodeError::MissingField(name))
}

fn u32_field(fields: &Fields, name: &'static str) -> Result<u32, EncodeError> {
    let value = field(fields, name)?;
    value.as_u32().ok_or(mismatch("u32", value))
}

fn array_field<'v>(fields: &'v Fields, name: &'static str) -> Result<&'v [Value], EncodeError> {
    let value = field(fields, name)?;
    value.as_array().ok_or(mismatch("array", value))
}

fn bytes_field(fields: &Fields, name: &'static str) -> Result<Vec<u8>, EncodeError> {
    let value = field(fields, name)?;
    value
        .as_bytes()
        .map(<[u8]>::to_vec)
        .ok_or(mismatch("bytes", value))
}
