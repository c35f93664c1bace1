//! Request and reply field lists of every HPI operation.
//!
//! Every reply starts with a `Status` field, except the `VersionGet` reply
//! whose single `Version` field stands in for the status.

use crate::descriptor::ScalarKind::{U8, U32};
use crate::descriptor::StructDescriptor;
use crate::operation::Operation as Op;
use crate::registry::CallSpec;
use crate::types::{
    BOOL, EVENT_STATE, STATUS, TIME, TIMEOUT, alarm, announcement, ctrl_state, domain_info,
    drt_entry, event, event_log_entry, event_log_info, idr_area_header, idr_field, idr_info,
    plugin_info, rdr, rpt_entry, sensor_reading, sensor_thresholds, text_buffer, watchdog,
};

fn call(operation: Op, request: StructDescriptor, reply: StructDescriptor) -> CallSpec {
    CallSpec::new(operation.id(), operation.name(), request, reply)
}

/// Returns the specifications of every HPI call.
#[must_use]
#[allow(clippy::too_many_lines)]
pub fn hpi_calls() -> Vec<CallSpec> {
    vec![
        call(Op::VersionGet, fields! {}, fields! { "Version": U32 }),
        call(
            Op::SessionOpen,
            fields! { "DomainId": U32 },
            fields! { "Status": STATUS, "SessionId": U32 },
        )
        .opens_session("SessionId"),
        call(
            Op::SessionClose,
            fields! { "SessionId": U32 },
            fields! { "Status": STATUS },
        )
        .closes_session("SessionId"),
        call(
            Op::Discover,
            fields! { "SessionId": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::DomainInfoGet,
            fields! { "SessionId": U32 },
            fields! { "Status": STATUS, "DomainInfo": domain_info() },
        ),
        call(
            Op::DrtEntryGet,
            fields! { "SessionId": U32, "EntryId": U32 },
            fields! { "Status": STATUS, "NextEntryId": U32, "DrtEntry": drt_entry() },
        ),
        call(
            Op::DomainTagSet,
            fields! { "SessionId": U32, "DomainTag": text_buffer() },
            fields! { "Status": STATUS },
        ),
        call(
            Op::RptEntryGet,
            fields! { "SessionId": U32, "EntryId": U32 },
            fields! { "Status": STATUS, "NextEntryId": U32, "RptEntry": rpt_entry() },
        ),
        call(
            Op::RptEntryGetByResourceId,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "RptEntry": rpt_entry() },
        ),
        call(
            Op::ResourceSeveritySet,
            fields! { "SessionId": U32, "ResourceId": U32, "Severity": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::ResourceTagSet,
            fields! { "SessionId": U32, "ResourceId": U32, "ResourceTag": text_buffer() },
            fields! { "Status": STATUS },
        ),
        call(
            Op::ResourceIdGet,
            fields! { "SessionId": U32 },
            fields! { "Status": STATUS, "ResourceId": U32 },
        ),
        call(
            Op::EventLogInfoGet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "Info": event_log_info() },
        ),
        call(
            Op::EventLogEntryGet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "EntryId": U32,
                "Rdr": rdr(),
                "RptEntry": rpt_entry(),
            },
            fields! {
                "Status": STATUS,
                "PrevEntryId": U32,
                "NextEntryId": U32,
                "EventLogEntry": event_log_entry(),
                "Rdr": rdr(),
                "RptEntry": rpt_entry(),
            },
        ),
        call(
            Op::EventLogEntryAdd,
            fields! { "SessionId": U32, "ResourceId": U32, "EvtEntry": event() },
            fields! { "Status": STATUS },
        ),
        call(
            Op::EventLogClear,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::EventLogTimeGet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "Time": TIME },
        ),
        call(
            Op::EventLogTimeSet,
            fields! { "SessionId": U32, "ResourceId": U32, "Time": TIME },
            fields! { "Status": STATUS },
        ),
        call(
            Op::EventLogStateGet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "Enable": BOOL },
        ),
        call(
            Op::EventLogStateSet,
            fields! { "SessionId": U32, "ResourceId": U32, "Enable": BOOL },
            fields! { "Status": STATUS },
        ),
        call(
            Op::EventLogOverflowReset,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::Subscribe,
            fields! { "SessionId": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::Unsubscribe,
            fields! { "SessionId": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::EventGet,
            fields! {
                "SessionId": U32,
                "Timeout": TIMEOUT,
                "Rdr": rdr(),
                "RptEntry": rpt_entry(),
                "EventQueueStatus": U32,
            },
            fields! {
                "Status": STATUS,
                "Event": event(),
                "Rdr": rdr(),
                "RptEntry": rpt_entry(),
                "EventQueueStatus": U32,
            },
        ),
        call(
            Op::EventAdd,
            fields! { "SessionId": U32, "EvtEntry": event() },
            fields! { "Status": STATUS },
        ),
        call(
            Op::AlarmGetNext,
            fields! {
                "SessionId": U32,
                "Severity": U32,
                "UnacknowledgedOnly": BOOL,
                "Alarm": alarm(),
            },
            fields! { "Status": STATUS, "Alarm": alarm() },
        ),
        call(
            Op::AlarmGet,
            fields! { "SessionId": U32, "AlarmId": U32 },
            fields! { "Status": STATUS, "Alarm": alarm() },
        ),
        call(
            Op::AlarmAcknowledge,
            fields! { "SessionId": U32, "AlarmId": U32, "Severity": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::AlarmAdd,
            fields! { "SessionId": U32, "Alarm": alarm() },
            fields! { "Status": STATUS, "Alarm": alarm() },
        ),
        call(
            Op::AlarmDelete,
            fields! { "SessionId": U32, "AlarmId": U32, "Severity": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::RdrGet,
            fields! { "SessionId": U32, "ResourceId": U32, "EntryId": U32 },
            fields! { "Status": STATUS, "NextEntryId": U32, "Rdr": rdr() },
        ),
        call(
            Op::RdrGetByInstrumentId,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "RdrType": U32,
                "InstrumentId": U32,
            },
            fields! { "Status": STATUS, "Rdr": rdr() },
        ),
        call(
            Op::SensorReadingGet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "SensorNum": U32,
                "Reading": sensor_reading(),
                "EventState": EVENT_STATE,
            },
            fields! {
                "Status": STATUS,
                "Reading": sensor_reading(),
                "EventState": EVENT_STATE,
            },
        ),
        call(
            Op::SensorThresholdsGet,
            fields! { "SessionId": U32, "ResourceId": U32, "SensorNum": U32 },
            fields! { "Status": STATUS, "Thresholds": sensor_thresholds() },
        ),
        call(
            Op::SensorThresholdsSet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "SensorNum": U32,
                "Thresholds": sensor_thresholds(),
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::SensorTypeGet,
            fields! { "SessionId": U32, "ResourceId": U32, "SensorNum": U32 },
            fields! { "Status": STATUS, "Type": U32, "Category": U8 },
        ),
        call(
            Op::SensorEnableGet,
            fields! { "SessionId": U32, "ResourceId": U32, "SensorNum": U32 },
            fields! { "Status": STATUS, "Enabled": BOOL },
        ),
        call(
            Op::SensorEnableSet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "SensorNum": U32,
                "Enabled": BOOL,
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::SensorEventEnableGet,
            fields! { "SessionId": U32, "ResourceId": U32, "SensorNum": U32 },
            fields! { "Status": STATUS, "Enabled": BOOL },
        ),
        call(
            Op::SensorEventEnableSet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "SensorNum": U32,
                "Enabled": BOOL,
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::SensorEventMasksGet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "SensorNum": U32,
                "AssertEventMask": EVENT_STATE,
                "DeassertEventMask": EVENT_STATE,
            },
            fields! {
                "Status": STATUS,
                "AssertEventMask": EVENT_STATE,
                "DeassertEventMask": EVENT_STATE,
            },
        ),
        call(
            Op::SensorEventMasksSet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "SensorNum": U32,
                "Action": U32,
                "AssertEventMask": EVENT_STATE,
                "DeassertEventMask": EVENT_STATE,
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::ControlTypeGet,
            fields! { "SessionId": U32, "ResourceId": U32, "CtrlNum": U32 },
            fields! { "Status": STATUS, "Type": U32 },
        ),
        call(
            Op::ControlGet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "CtrlNum": U32,
                "State": ctrl_state(),
            },
            fields! { "Status": STATUS, "Mode": U32, "State": ctrl_state() },
        ),
        call(
            Op::ControlSet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "CtrlNum": U32,
                "Mode": U32,
                "State": ctrl_state(),
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::IdrInfoGet,
            fields! { "SessionId": U32, "ResourceId": U32, "IdrId": U32 },
            fields! { "Status": STATUS, "IdrInfo": idr_info() },
        ),
        call(
            Op::IdrAreaHeaderGet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "IdrId": U32,
                "AreaType": U32,
                "AreaId": U32,
            },
            fields! {
                "Status": STATUS,
                "NextAreaId": U32,
                "Header": idr_area_header(),
            },
        ),
        call(
            Op::IdrAreaAdd,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "IdrId": U32,
                "AreaType": U32,
            },
            fields! { "Status": STATUS, "AreaId": U32 },
        ),
        call(
            Op::IdrAreaDelete,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "IdrId": U32,
                "AreaId": U32,
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::IdrFieldGet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "IdrId": U32,
                "AreaId": U32,
                "FieldType": U32,
                "FieldId": U32,
            },
            fields! {
                "Status": STATUS,
                "NextFieldId": U32,
                "Field": idr_field(),
            },
        ),
        call(
            Op::IdrFieldAdd,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "IdrId": U32,
                "Field": idr_field(),
            },
            fields! { "Status": STATUS, "Field": idr_field() },
        ),
        call(
            Op::IdrFieldSet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "IdrId": U32,
                "Field": idr_field(),
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::IdrFieldDelete,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "IdrId": U32,
                "AreaId": U32,
                "FieldId": U32,
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::WatchdogTimerGet,
            fields! { "SessionId": U32, "ResourceId": U32, "WatchdogNum": U32 },
            fields! { "Status": STATUS, "Watchdog": watchdog() },
        ),
        call(
            Op::WatchdogTimerSet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "WatchdogNum": U32,
                "Watchdog": watchdog(),
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::WatchdogTimerReset,
            fields! { "SessionId": U32, "ResourceId": U32, "WatchdogNum": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::AnnunciatorGetNext,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "AnnunciatorNum": U32,
                "Severity": U32,
                "UnacknowledgedOnly": BOOL,
                "Announcement": announcement(),
            },
            fields! { "Status": STATUS, "Announcement": announcement() },
        ),
        call(
            Op::AnnunciatorGet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "AnnunciatorNum": U32,
                "EntryId": U32,
            },
            fields! { "Status": STATUS, "Announcement": announcement() },
        ),
        call(
            Op::AnnunciatorAcknowledge,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "AnnunciatorNum": U32,
                "EntryId": U32,
                "Severity": U32,
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::AnnunciatorAdd,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "AnnunciatorNum": U32,
                "Announcement": announcement(),
            },
            fields! { "Status": STATUS, "Announcement": announcement() },
        ),
        call(
            Op::AnnunciatorDelete,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "AnnunciatorNum": U32,
                "EntryId": U32,
                "Severity": U32,
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::AnnunciatorModeGet,
            fields! { "SessionId": U32, "ResourceId": U32, "AnnunciatorNum": U32 },
            fields! { "Status": STATUS, "Mode": U32 },
        ),
        call(
            Op::AnnunciatorModeSet,
            fields! {
                "SessionId": U32,
                "ResourceId": U32,
                "AnnunciatorNum": U32,
                "Mode": U32,
            },
            fields! { "Status": STATUS },
        ),
        call(
            Op::HotSwapPolicyCancel,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::ResourceActiveSet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::ResourceInactiveSet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::AutoInsertTimeoutGet,
            fields! { "SessionId": U32 },
            fields! { "Status": STATUS, "Timeout": TIMEOUT },
        ),
        call(
            Op::AutoInsertTimeoutSet,
            fields! { "SessionId": U32, "Timeout": TIMEOUT },
            fields! { "Status": STATUS },
        ),
        call(
            Op::AutoExtractTimeoutGet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "Timeout": TIMEOUT },
        ),
        call(
            Op::AutoExtractTimeoutSet,
            fields! { "SessionId": U32, "ResourceId": U32, "Timeout": TIMEOUT },
            fields! { "Status": STATUS },
        ),
        call(
            Op::HotSwapStateGet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "State": U32 },
        ),
        call(
            Op::HotSwapActionRequest,
            fields! { "SessionId": U32, "ResourceId": U32, "Action": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::HotSwapIndicatorStateGet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "State": U32 },
        ),
        call(
            Op::HotSwapIndicatorStateSet,
            fields! { "SessionId": U32, "ResourceId": U32, "State": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::ParmControl,
            fields! { "SessionId": U32, "ResourceId": U32, "Action": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::ResourceResetStateGet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "ResetAction": U32 },
        ),
        call(
            Op::ResourceResetStateSet,
            fields! { "SessionId": U32, "ResourceId": U32, "ResetAction": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::ResourcePowerStateGet,
            fields! { "SessionId": U32, "ResourceId": U32 },
            fields! { "Status": STATUS, "State": U32 },
        ),
        call(
            Op::ResourcePowerStateSet,
            fields! { "SessionId": U32, "ResourceId": U32, "State": U32 },
            fields! { "Status": STATUS },
        ),
        call(
            Op::PluginLoad,
            fields! { "Name": text_buffer() },
            fields! { "Status": STATUS },
        ),
        call(
            Op::PluginUnload,
            fields! { "Name": text_buffer() },
            fields! { "Status": STATUS },
        ),
        call(
            Op::PluginInfo,
            fields! { "Name": text_buffer() },
            fields! { "Status": STATUS, "Info": plugin_info() },
        ),
        call(
            Op::PluginGetNext,
            fields! { "Name": text_buffer() },
            fields! { "Status": STATUS, "NextName": text_buffer() },
        ),
    ]
}
