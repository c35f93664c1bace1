//! Descriptors of the HPI data structures.
//!
//! Each function returns the descriptor of one HPI structure, with the field
//! names used on the wire. Unions are keyed on the discriminant values
//! exposed by the constant modules below.

use crate::descriptor::ScalarKind::{self, F64, I32, I64, U8, U16, U32, U64};
use crate::descriptor::{StructDescriptor, TypeDescriptor};
use crate::inventory::InventoryCodec;
use crate::value::{Fields, Value};

/// Boolean flag.
pub const BOOL: ScalarKind = U8;
/// Bit mask of event states.
pub const EVENT_STATE: ScalarKind = U16;
/// Time in nanoseconds.
pub const TIME: ScalarKind = I64;
/// Timeout in nanoseconds.
pub const TIMEOUT: ScalarKind = I64;
/// Status code.
pub const STATUS: ScalarKind = U32;

/// Number of entries of an entity path.
pub const MAX_ENTITY_PATH: usize = 16;
/// Maximum length of the data of a text buffer.
pub const MAX_TEXT_BUFFER_LENGTH: usize = 255;
/// Length of a sensor buffer reading.
pub const SENSOR_BUFFER_LENGTH: usize = 32;
/// Length of a stream control state.
pub const CTRL_MAX_STREAM_LENGTH: usize = 4;
/// Length of the body of an OEM control state.
pub const CTRL_MAX_OEM_BODY_LENGTH: usize = 255;
/// Length of the configuration data of an OEM control.
pub const CTRL_OEM_CONFIG_LENGTH: usize = 10;
/// Length of a GUID.
pub const GUID_LENGTH: usize = 16;
/// Length of the value of a name.
pub const MAX_NAME_LENGTH: usize = 256;

/// Sensor reading types.
pub mod reading_type {
    /// Signed 64-bit reading.
    pub const INT64: u32 = 0;
    /// Unsigned 64-bit reading.
    pub const UINT64: u32 = 1;
    /// Floating point reading.
    pub const FLOAT64: u32 = 2;
    /// Raw buffer reading.
    pub const BUFFER: u32 = 3;
}

/// Control types.
pub mod control_type {
    /// Digital control.
    pub const DIGITAL: u32 = 0;
    /// Discrete control.
    pub const DISCRETE: u32 = 1;
    /// Analog control.
    pub const ANALOG: u32 = 2;
    /// Stream control.
    pub const STREAM: u32 = 3;
    /// Text control.
    pub const TEXT: u32 = 4;
    /// OEM control.
    pub const OEM: u32 = 0xC0;
}

/// Resource data record types.
pub mod rdr_type {
    /// Empty record.
    pub const NO_RECORD: u32 = 0;
    /// Control record.
    pub const CONTROL: u32 = 1;
    /// Sensor record.
    pub const SENSOR: u32 = 2;
    /// Inventory record.
    pub const INVENTORY: u32 = 3;
    /// Watchdog record.
    pub const WATCHDOG: u32 = 4;
    /// Annunciator record.
    pub const ANNUNCIATOR: u32 = 5;
}

/// Event types.
pub mod event_type {
    /// Resource event.
    pub const RESOURCE: u32 = 0;
    /// Domain event.
    pub const DOMAIN: u32 = 1;
    /// Sensor event.
    pub const SENSOR: u32 = 2;
    /// Sensor enable change event.
    pub const SENSOR_ENABLE_CHANGE: u32 = 3;
    /// Hot swap event.
    pub const HOT_SWAP: u32 = 4;
    /// Watchdog event.
    pub const WATCHDOG: u32 = 5;
    /// Software event.
    pub const HPI_SW: u32 = 6;
    /// OEM event.
    pub const OEM: u32 = 7;
    /// User event.
    pub const USER: u32 = 8;
}

/// Text buffer data types.
pub mod text_type {
    /// Unicode text.
    pub const UNICODE: u32 = 0;
    /// BCD plus text.
    pub const BCD_PLUS: u32 = 1;
    /// Packed 6-bit ASCII text.
    pub const ASCII6: u32 = 2;
    /// 8-bit text.
    pub const TEXT: u32 = 3;
    /// Binary data.
    pub const BINARY: u32 = 4;
}

/// English language code.
pub const LANGUAGE_ENGLISH: u32 = 25;

fn bytes(count: usize) -> TypeDescriptor {
    TypeDescriptor::fixed_array(U8.into(), count)
}

/// Text buffer, whose data length is given by `DataLength`.
#[must_use]
pub fn text_buffer() -> StructDescriptor {
    fields! {
        "DataType": U32,
        "Language": U32,
        "DataLength": U8,
        "Data": TypeDescriptor::var_array(U8.into(), "DataLength"),
    }
}

/// Name.
#[must_use]
pub fn name() -> StructDescriptor {
    fields! {
        "Length": U16,
        "Value": bytes(MAX_NAME_LENGTH),
    }
}

/// Entity.
#[must_use]
pub fn entity() -> StructDescriptor {
    fields! {
        "EntityType": U32,
        "EntityLocation": U32,
    }
}

/// Entity path.
#[must_use]
pub fn entity_path() -> StructDescriptor {
    fields! {
        "Entry": TypeDescriptor::fixed_array(entity().into(), MAX_ENTITY_PATH),
    }
}

/// Sensor reading, whose value depends on its `Type`.
#[must_use]
pub fn sensor_reading() -> StructDescriptor {
    fields! {
        "IsSupported": BOOL,
        "Type": U32,
        "Value": union!("Type" {
            reading_type::INT64 => I64,
            reading_type::UINT64 => U64,
            reading_type::FLOAT64 => F64,
            reading_type::BUFFER => bytes(SENSOR_BUFFER_LENGTH),
        }),
    }
}

/// Sensor thresholds.
#[must_use]
pub fn sensor_thresholds() -> StructDescriptor {
    fields! {
        "LowCritical": sensor_reading(),
        "LowMajor": sensor_reading(),
        "LowMinor": sensor_reading(),
        "UpCritical": sensor_reading(),
        "UpMajor": sensor_reading(),
        "UpMinor": sensor_reading(),
        "PosThdHysteresis": sensor_reading(),
        "NegThdHysteresis": sensor_reading(),
    }
}

/// Sensor range.
#[must_use]
pub fn sensor_range() -> StructDescriptor {
    fields! {
        "Flags": U8,
        "Max": sensor_reading(),
        "Min": sensor_reading(),
        "Nominal": sensor_reading(),
        "NormalMax": sensor_reading(),
        "NormalMin": sensor_reading(),
    }
}

/// Sensor data format.
#[must_use]
pub fn sensor_data_format() -> StructDescriptor {
    fields! {
        "IsSupported": BOOL,
        "ReadingType": U32,
        "BaseUnits": U32,
        "ModifierUnits": U32,
        "ModifierUse": U32,
        "Percentage": BOOL,
        "Range": sensor_range(),
        "AccuracyFactor": F64,
    }
}

/// Sensor threshold definition.
#[must_use]
pub fn sensor_thd_defn() -> StructDescriptor {
    fields! {
        "IsAccessible": BOOL,
        "ReadThold": U8,
        "WriteThold": U8,
        "Nonlinear": BOOL,
    }
}

/// Sensor record.
#[must_use]
pub fn sensor_rec() -> StructDescriptor {
    fields! {
        "Num": U32,
        "Type": U32,
        "Category": U8,
        "EnableCtrl": BOOL,
        "EventCtrl": U32,
        "Events": EVENT_STATE,
        "DataFormat": sensor_data_format(),
        "ThresholdDefn": sensor_thd_defn(),
        "Oem": U32,
    }
}

/// Stream control state.
#[must_use]
pub fn ctrl_state_stream() -> StructDescriptor {
    fields! {
        "Repeat": BOOL,
        "StreamLength": U32,
        "Stream": bytes(CTRL_MAX_STREAM_LENGTH),
    }
}

/// Text control state.
#[must_use]
pub fn ctrl_state_text() -> StructDescriptor {
    fields! {
        "Line": U8,
        "Text": text_buffer(),
    }
}

/// OEM control state.
#[must_use]
pub fn ctrl_state_oem() -> StructDescriptor {
    fields! {
        "MId": U32,
        "BodyLength": U8,
        "Body": bytes(CTRL_MAX_OEM_BODY_LENGTH),
    }
}

/// Control state, whose value depends on its `Type`.
#[must_use]
pub fn ctrl_state() -> StructDescriptor {
    fields! {
        "Type": U32,
        "StateUnion": union!("Type" {
            control_type::DIGITAL => U32,
            control_type::DISCRETE => U32,
            control_type::ANALOG => I32,
            control_type::STREAM => ctrl_state_stream(),
            control_type::TEXT => ctrl_state_text(),
            control_type::OEM => ctrl_state_oem(),
        }),
    }
}

/// Digital control record.
#[must_use]
pub fn ctrl_rec_digital() -> StructDescriptor {
    fields! { "Default": U32 }
}

/// Discrete control record.
#[must_use]
pub fn ctrl_rec_discrete() -> StructDescriptor {
    fields! { "Default": U32 }
}

/// Analog control record.
#[must_use]
pub fn ctrl_rec_analog() -> StructDescriptor {
    fields! {
        "Min": I32,
        "Max": I32,
        "Default": I32,
    }
}

/// Stream control record.
#[must_use]
pub fn ctrl_rec_stream() -> StructDescriptor {
    fields! { "Default": ctrl_state_stream() }
}

/// Text control record.
#[must_use]
pub fn ctrl_rec_text() -> StructDescriptor {
    fields! {
        "MaxChars": U8,
        "MaxLines": U8,
        "Language": U32,
        "DataType": U32,
        "Default": ctrl_state_text(),
    }
}

/// OEM control record.
#[must_use]
pub fn ctrl_rec_oem() -> StructDescriptor {
    fields! {
        "MId": U32,
        "ConfigData": bytes(CTRL_OEM_CONFIG_LENGTH),
        "Default": ctrl_state_oem(),
    }
}

/// Default mode of a control.
#[must_use]
pub fn ctrl_default_mode() -> StructDescriptor {
    fields! {
        "Mode": U32,
        "ReadOnly": BOOL,
    }
}

/// Control record, whose specific part depends on its `Type`.
#[must_use]
pub fn ctrl_rec() -> StructDescriptor {
    fields! {
        "Num": U32,
        "OutputType": U32,
        "Type": U32,
        "TypeUnion": union!("Type" {
            control_type::DIGITAL => ctrl_rec_digital(),
            control_type::DISCRETE => ctrl_rec_discrete(),
            control_type::ANALOG => ctrl_rec_analog(),
            control_type::STREAM => ctrl_rec_stream(),
            control_type::TEXT => ctrl_rec_text(),
            control_type::OEM => ctrl_rec_oem(),
        }),
        "DefaultMode": ctrl_default_mode(),
        "WriteOnly": BOOL,
        "Oem": U32,
    }
}

/// Watchdog timer.
#[must_use]
pub fn watchdog() -> StructDescriptor {
    fields! {
        "Log": BOOL,
        "Running": BOOL,
        "TimerUse": U32,
        "TimerAction": U32,
        "PretimerInterrupt": U32,
        "PreTimeoutInterval": U32,
        "TimerUseExpFlags": U8,
        "InitialCount": U32,
        "PresentCount": U32,
    }
}

/// Watchdog record.
#[must_use]
pub fn watchdog_rec() -> StructDescriptor {
    fields! {
        "WatchdogNum": U32,
        "Oem": U32,
    }
}

/// Annunciator record.
#[must_use]
pub fn annunciator_rec() -> StructDescriptor {
    fields! {
        "AnnunciatorNum": U32,
        "AnnunciatorType": U32,
        "ModeReadOnly": BOOL,
        "MaxConditions": U32,
        "Oem": U32,
    }
}

/// Inventory record.
#[must_use]
pub fn inventory_rec() -> StructDescriptor {
    fields! {
        "IdrId": U32,
        "Persistent": BOOL,
        "Oem": U32,
    }
}

/// Condition of an alarm or an announcement.
#[must_use]
pub fn condition() -> StructDescriptor {
    fields! {
        "Type": U32,
        "Entity": entity_path(),
        "DomainId": U32,
        "ResourceId": U32,
        "SensorNum": U32,
        "EventState": EVENT_STATE,
        "Name": name(),
        "Mid": U32,
        "Data": text_buffer(),
    }
}

/// Announcement.
#[must_use]
pub fn announcement() -> StructDescriptor {
    fields! {
        "EntryId": U32,
        "Timestamp": TIME,
        "AddedByUser": BOOL,
        "Severity": U32,
        "Acknowledged": BOOL,
        "StatusCond": condition(),
    }
}

/// Alarm.
#[must_use]
pub fn alarm() -> StructDescriptor {
    fields! {
        "AlarmId": U32,
        "Timestamp": TIME,
        "Severity": U32,
        "Acknowledged": BOOL,
        "AlarmCond": condition(),
    }
}

/// Resource data record, whose specific part depends on its `RdrType`.
#[must_use]
pub fn rdr() -> StructDescriptor {
    fields! {
        "RecordId": U32,
        "RdrType": U32,
        "Entity": entity_path(),
        "IsFru": BOOL,
        "RdrTypeUnion": union!("RdrType" {
            rdr_type::NO_RECORD => U8,
            rdr_type::CONTROL => ctrl_rec(),
            rdr_type::SENSOR => sensor_rec(),
            rdr_type::INVENTORY => inventory_rec(),
            rdr_type::WATCHDOG => watchdog_rec(),
            rdr_type::ANNUNCIATOR => annunciator_rec(),
        }),
        "IdString": text_buffer(),
    }
}

/// Resource event.
#[must_use]
pub fn resource_event() -> StructDescriptor {
    fields! { "ResourceEventType": U32 }
}

/// Domain event.
#[must_use]
pub fn domain_event() -> StructDescriptor {
    fields! {
        "Type": U32,
        "DomainId": U32,
    }
}

/// Sensor event.
#[must_use]
pub fn sensor_event() -> StructDescriptor {
    fields! {
        "SensorNum": U32,
        "SensorType": U32,
        "EventCategory": U8,
        "Assertion": BOOL,
        "EventState": EVENT_STATE,
        "OptionalDataPresent": U8,
        "TriggerReading": sensor_reading(),
        "TriggerThreshold": sensor_reading(),
        "PreviousState": EVENT_STATE,
        "Oem": U32,
        "SensorSpecific": U32,
    }
}

/// Sensor enable change event.
#[must_use]
pub fn sensor_enable_change_event() -> StructDescriptor {
    fields! {
        "SensorNum": U32,
        "SensorType": U32,
        "EventCategory": U8,
        "SensorEnable": BOOL,
        "SensorEventEnable": BOOL,
        "AssertEventMask": EVENT_STATE,
        "DeassertEventMask": EVENT_STATE,
        "OptionalDataPresent": U8,
        "CurrentState": EVENT_STATE,
    }
}

/// Hot swap event.
#[must_use]
pub fn hot_swap_event() -> StructDescriptor {
    fields! {
        "HotSwapState": U32,
        "PreviousHotSwapState": U32,
    }
}

/// Watchdog event.
#[must_use]
pub fn watchdog_event() -> StructDescriptor {
    fields! {
        "WatchdogNum": U32,
        "WatchdogAction": U32,
        "WatchdogPreTimerAction": U32,
        "WatchdogUse": U32,
    }
}

/// Software event.
#[must_use]
pub fn hpi_sw_event() -> StructDescriptor {
    fields! {
        "MId": U32,
        "Type": U32,
        "EventData": text_buffer(),
    }
}

/// OEM event.
#[must_use]
pub fn oem_event() -> StructDescriptor {
    fields! {
        "MId": U32,
        "OemEventData": text_buffer(),
    }
}

/// User event.
#[must_use]
pub fn user_event() -> StructDescriptor {
    fields! { "UserEventData": text_buffer() }
}

/// Event, whose data depends on its `EventType`.
#[must_use]
pub fn event() -> StructDescriptor {
    fields! {
        "Source": U32,
        "EventType": U32,
        "Timestamp": TIME,
        "Severity": U32,
        "EventDataUnion": union!("EventType" {
            event_type::RESOURCE => resource_event(),
            event_type::DOMAIN => domain_event(),
            event_type::SENSOR => sensor_event(),
            event_type::SENSOR_ENABLE_CHANGE => sensor_enable_change_event(),
            event_type::HOT_SWAP => hot_swap_event(),
            event_type::WATCHDOG => watchdog_event(),
            event_type::HPI_SW => hpi_sw_event(),
            event_type::OEM => oem_event(),
            event_type::USER => user_event(),
        }),
    }
}

/// Resource information.
#[must_use]
pub fn resource_info() -> StructDescriptor {
    fields! {
        "ResourceRev": U8,
        "SpecificVer": U8,
        "DeviceSupport": U8,
        "ManufacturerId": U32,
        "ProductId": U16,
        "FirmwareMajorRev": U8,
        "FirmwareMinorRev": U8,
        "AuxFirmwareRev": U8,
        "Guid": bytes(GUID_LENGTH),
    }
}

/// Resource presence table entry.
#[must_use]
pub fn rpt_entry() -> StructDescriptor {
    fields! {
        "EntryId": U32,
        "ResourceId": U32,
        "ResourceInfo": resource_info(),
        "ResourceEntity": entity_path(),
        "ResourceCapabilities": U32,
        "HotSwapCapabilities": U32,
        "ResourceSeverity": U32,
        "ResourceFailed": BOOL,
        "ResourceTag": text_buffer(),
    }
}

/// Domain information.
#[must_use]
pub fn domain_info() -> StructDescriptor {
    fields! {
        "DomainId": U32,
        "DomainCapabilities": U32,
        "IsPeer": BOOL,
        "DomainTag": text_buffer(),
        "DrtUpdateCount": U32,
        "DrtUpdateTimestamp": TIME,
        "RptUpdateCount": U32,
        "RptUpdateTimestamp": TIME,
        "DatUpdateCount": U32,
        "DatUpdateTimestamp": TIME,
        "ActiveAlarms": U32,
        "CriticalAlarms": U32,
        "MajorAlarms": U32,
        "MinorAlarms": U32,
        "DatUserAlarmLimit": U32,
        "DatOverflow": BOOL,
        "Guid": bytes(GUID_LENGTH),
    }
}

/// Domain reference table entry.
#[must_use]
pub fn drt_entry() -> StructDescriptor {
    fields! {
        "EntryId": U32,
        "DomainId": U32,
        "IsPeer": BOOL,
    }
}

/// Event log information.
#[must_use]
pub fn event_log_info() -> StructDescriptor {
    fields! {
        "Entries": U32,
        "Size": U32,
        "UserEventMaxSize": U32,
        "UpdateTimestamp": TIME,
        "CurrentTime": TIME,
        "Enabled": BOOL,
        "OverflowFlag": BOOL,
        "OverflowResetable": BOOL,
        "OverflowAction": U32,
    }
}

/// Event log entry.
#[must_use]
pub fn event_log_entry() -> StructDescriptor {
    fields! {
        "EntryId": U32,
        "Timestamp": TIME,
        "Event": event(),
    }
}

/// Inventory data repository information.
#[must_use]
pub fn idr_info() -> StructDescriptor {
    fields! {
        "IdrId": U32,
        "UpdateCount": U32,
        "ReadOnly": BOOL,
        "NumAreas": U32,
    }
}

/// Inventory data repository area header.
#[must_use]
pub fn idr_area_header() -> StructDescriptor {
    fields! {
        "AreaId": U32,
        "Type": U32,
        "ReadOnly": BOOL,
        "NumFields": U32,
    }
}

/// Inventory data repository field.
#[must_use]
pub fn idr_field() -> StructDescriptor {
    fields! {
        "AreaId": U32,
        "FieldId": U32,
        "Type": U32,
        "ReadOnly": BOOL,
        "Field": text_buffer(),
    }
}

/// Plugin information.
#[must_use]
pub fn plugin_info() -> StructDescriptor {
    fields! { "RefCount": I32 }
}

/// Legacy inventory data, handled by [`InventoryCodec`].
#[must_use]
pub fn inventory_data() -> TypeDescriptor {
    TypeDescriptor::custom(InventoryCodec)
}

/// A text buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    /// Data type, see [`text_type`].
    pub data_type: u32,
    /// Language code.
    pub language: u32,
    /// Data, at most [`MAX_TEXT_BUFFER_LENGTH`] bytes long.
    pub data: Vec<u8>,
}

impl TextBuffer {
    /// Creates an English text buffer.
    ///
    /// The text is cut to [`MAX_TEXT_BUFFER_LENGTH`] bytes.
    #[must_use]
    pub fn text(text: &str) -> Self {
        let bytes = text.as_bytes();
        Self {
            data_type: text_type::TEXT,
            language: LANGUAGE_ENGLISH,
            data: bytes[..bytes.len().min(MAX_TEXT_BUFFER_LENGTH)].to_vec(),
        }
    }

    /// Returns the data as a string slice, when it is valid UTF-8.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.data).ok()
    }

    /// Converts the text buffer into a value shaped after [`text_buffer`].
    ///
    /// The data is cut to [`MAX_TEXT_BUFFER_LENGTH`] bytes.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let data = &self.data[..self.data.len().min(MAX_TEXT_BUFFER_LENGTH)];
        let mut fields = Fields::with_capacity(4);
        fields
            .u32("DataType", self.data_type)
            .u32("Language", self.language)
            .u8("DataLength", data.len() as u8)
            .bytes("Data", data.to_vec());
        Value::Struct(fields)
    }

    /// Extracts a text buffer from a value shaped after [`text_buffer`].
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let fields = value.as_struct()?;
        Some(Self {
            data_type: fields.get("DataType")?.as_u32()?,
            language: fields.get("Language")?.as_u32()?,
            data: match fields.get("Data")? {
                Value::Bytes(bytes) => bytes.clone(),
                Value::Array(items) => items.iter().map(Value::as_u8).collect::<Option<_>>()?,
                _ => return None,
            },
        })
    }
}

impl From<&str> for TextBuffer {
    fn from(text: &str) -> Self {
        Self::text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        TextBuffer, condition, ctrl_rec, ctrl_state, event, event_log_entry, event_type,
        reading_type, rdr, rdr_type, rpt_entry, sensor_reading, sensor_thresholds, text_buffer,
    };
    use crate::codec::{ByteOrder, Reader, Writer, decode, encode_into};
    use crate::descriptor::{EncodedSize, TypeDescriptor};
    use crate::value::{Fields, Value};

    fn round_trip(order: ByteOrder, descriptor: &TypeDescriptor, value: &Value) -> usize {
        let mut buffer = vec![0; 4096];
        let mut writer = Writer::with_order(order, &mut buffer);
        encode_into(descriptor, value, &mut writer).unwrap();
        let written = writer.position();
        let (decoded, read) = decode(order, descriptor, &buffer[..written]).unwrap();
        assert_eq!(&decoded, value);
        assert_eq!(read, written);
        written
    }

    fn reading(value: f64) -> Value {
        Value::Struct(
            Fields::new()
                .with("IsSupported", 1u8)
                .with("Type", reading_type::FLOAT64)
                .with("Value", value),
        )
    }

    fn entity_path() -> Value {
        let entity = Value::Struct(
            Fields::new()
                .with("EntityType", 23u32)
                .with("EntityLocation", 1u32),
        );
        Value::Struct(Fields::new().with("Entry", vec![entity; 16]))
    }

    #[test]
    fn catalog_is_valid() {
        for descriptor in [
            text_buffer(),
            sensor_thresholds(),
            ctrl_state(),
            ctrl_rec(),
            rdr(),
            event(),
            rpt_entry(),
            condition(),
            event_log_entry(),
        ] {
            descriptor.validate().unwrap();
        }
    }

    #[test]
    fn fixed_sizes() {
        // Eight readings of at least 1 + 4 + 8 bytes.
        assert_eq!(
            sensor_thresholds().encoded_size(),
            EncodedSize::Variable { min: 8 * 13 }
        );
        assert_eq!(
            super::entity_path().encoded_size(),
            EncodedSize::Fixed(16 * 8)
        );
        assert_eq!(super::name().encoded_size(), EncodedSize::Fixed(258));
    }

    #[test]
    fn sensor_thresholds_round_trip() {
        let mut fields = Fields::new();
        for (index, name) in [
            "LowCritical",
            "LowMajor",
            "LowMinor",
            "UpCritical",
            "UpMajor",
            "UpMinor",
            "PosThdHysteresis",
            "NegThdHysteresis",
        ]
        .into_iter()
        .enumerate()
        {
            fields.insert(name, reading(index as f64));
        }
        let value = Value::Struct(fields);
        let size = round_trip(ByteOrder::Big, &sensor_thresholds().into(), &value);
        assert_eq!(size, 8 * 13);
    }

    #[test]
    fn rdr_with_sensor_record() {
        let mut data_format = Fields::new();
        data_format
            .u8("IsSupported", 1)
            .u32("ReadingType", reading_type::FLOAT64)
            .u32("BaseUnits", 1)
            .u32("ModifierUnits", 0)
            .u32("ModifierUse", 0)
            .u8("Percentage", 0)
            .structure(
                "Range",
                Fields::new()
                    .with("Flags", 0u8)
                    .with("Max", reading(100.0))
                    .with("Min", reading(-40.0))
                    .with("Nominal", reading(25.0))
                    .with("NormalMax", reading(80.0))
                    .with("NormalMin", reading(0.0)),
            )
            .f64("AccuracyFactor", 0.5);

        let mut sensor = Fields::new();
        sensor
            .u32("Num", 7)
            .u32("Type", 1)
            .u8("Category", 1)
            .u8("EnableCtrl", 1)
            .u32("EventCtrl", 0)
            .u16("Events", 0x3F)
            .structure("DataFormat", data_format)
            .structure(
                "ThresholdDefn",
                Fields::new()
                    .with("IsAccessible", 1u8)
                    .with("ReadThold", 0x3Fu8)
                    .with("WriteThold", 0u8)
                    .with("Nonlinear", 0u8),
            )
            .u32("Oem", 0);

        let mut rdr_fields = Fields::new();
        rdr_fields
            .u32("RecordId", 2)
            .u32("RdrType", rdr_type::SENSOR)
            .insert("Entity", entity_path())
            .u8("IsFru", 0)
            .structure("RdrTypeUnion", sensor)
            .insert("IdString", TextBuffer::text("CPU temperature").to_value());

        for order in [ByteOrder::Little, ByteOrder::Big] {
            round_trip(order, &rdr().into(), &Value::Struct(rdr_fields.clone()));
        }
    }

    #[test]
    fn user_event_round_trip() {
        let mut fields = Fields::new();
        fields
            .u32("Source", 1)
            .u32("EventType", event_type::USER)
            .i64("Timestamp", 1_000_000)
            .u32("Severity", 2)
            .structure(
                "EventDataUnion",
                Fields::new().with("UserEventData", TextBuffer::text("hello").to_value()),
            );
        let size = round_trip(ByteOrder::Little, &event().into(), &Value::Struct(fields));
        assert_eq!(size, 4 + 4 + 8 + 4 + (4 + 4 + 1 + 5));
    }

    #[test]
    fn unknown_event_type() {
        let mut bytes = vec![0; 4 + 4 + 8 + 4];
        bytes[7] = 42;
        let mut reader = Reader::new(ByteOrder::Big, &bytes);
        assert!(crate::codec::decode_from(&event().into(), &mut reader).is_err());
    }

    #[test]
    fn text_buffer_conversions() {
        let text = TextBuffer::text("plugin");
        let value = text.to_value();
        assert_eq!(TextBuffer::from_value(&value), Some(text.clone()));
        assert_eq!(text.as_str(), Some("plugin"));

        let long = TextBuffer::text(&"x".repeat(300));
        assert_eq!(long.data.len(), 255);
        round_trip(ByteOrder::Big, &text_buffer().into(), &long.to_value());
    }

    #[test]
    fn sensor_reading_buffer() {
        let value = Value::Struct(
            Fields::new()
                .with("IsSupported", 1u8)
                .with("Type", reading_type::BUFFER)
                .with("Value", vec![9u8; 32]),
        );
        assert_eq!(
            round_trip(ByteOrder::Big, &sensor_reading().into(), &value),
            1 + 4 + 32
        );
    }
}
