use num_enum::{IntoPrimitive, TryFromPrimitive};

use serde::{Deserialize, Serialize};

macro_rules! operations {
    ($($name:ident = $id:literal),* $(,)?) => {
        /// HPI operations, by wire identifier.
        ///
        /// Identifier 0 is reserved and never names an operation.
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            IntoPrimitive,
            TryFromPrimitive,
            Serialize,
            Deserialize,
        )]
        #[repr(u32)]
        #[allow(missing_docs)]
        pub enum Operation {
            $($name = $id,)*
        }

        impl Operation {
            /// All operations, in identifier order.
            pub const ALL: &[Self] = &[$(Self::$name,)*];

            /// Returns the operation name.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$name => stringify!($name),)*
                }
            }
        }
    };
}

operations! {
    VersionGet = 1,
    SessionOpen = 2,
    SessionClose = 3,
    Discover = 4,
    DomainInfoGet = 5,
    DrtEntryGet = 6,
    DomainTagSet = 7,
    RptEntryGet = 8,
    RptEntryGetByResourceId = 9,
    ResourceSeveritySet = 10,
    ResourceTagSet = 11,
    ResourceIdGet = 12,
    EventLogInfoGet = 13,
    EventLogEntryGet = 14,
    EventLogEntryAdd = 15,
    EventLogClear = 16,
    EventLogTimeGet = 17,
    EventLogTimeSet = 18,
    EventLogStateGet = 19,
    EventLogStateSet = 20,
    EventLogOverflowReset = 21,
    Subscribe = 22,
    Unsubscribe = 23,
    EventGet = 24,
    EventAdd = 25,
    AlarmGetNext = 26,
    AlarmGet = 27,
    AlarmAcknowledge = 28,
    AlarmAdd = 29,
    AlarmDelete = 30,
    RdrGet = 31,
    RdrGetByInstrumentId = 32,
    SensorReadingGet = 33,
    SensorThresholdsGet = 34,
    SensorThresholdsSet = 35,
    SensorTypeGet = 36,
    SensorEnableGet = 37,
    SensorEnableSet = 38,
    SensorEventEnableGet = 39,
    SensorEventEnableSet = 40,
    SensorEventMasksGet = 41,
    SensorEventMasksSet = 42,
    ControlTypeGet = 43,
    ControlGet = 44,
    ControlSet = 45,
    IdrInfoGet = 46,
    IdrAreaHeaderGet = 47,
    IdrAreaAdd = 48,
    IdrAreaDelete = 49,
    IdrFieldGet = 50,
    IdrFieldAdd = 51,
    IdrFieldSet = 52,
    IdrFieldDelete = 53,
    WatchdogTimerGet = 54,
    WatchdogTimerSet = 55,
    WatchdogTimerReset = 56,
    AnnunciatorGetNext = 57,
    AnnunciatorGet = 58,
    AnnunciatorAcknowledge = 59,
    AnnunciatorAdd = 60,
    AnnunciatorDelete = 61,
    AnnunciatorModeGet = 62,
    AnnunciatorModeSet = 63,
    HotSwapPolicyCancel = 64,
    ResourceActiveSet = 65,
    ResourceInactiveSet = 66,
    AutoInsertTimeoutGet = 67,
    AutoInsertTimeoutSet = 68,
    AutoExtractTimeoutGet = 69,
    AutoExtractTimeoutSet = 70,
    HotSwapStateGet = 71,
    HotSwapActionRequest = 72,
    HotSwapIndicatorStateGet = 73,
    HotSwapIndicatorStateSet = 74,
    ParmControl = 75,
    ResourceResetStateGet = 76,
    ResourceResetStateSet = 77,
    ResourcePowerStateGet = 78,
    ResourcePowerStateSet = 79,
    PluginLoad = 80,
    PluginUnload = 81,
    PluginInfo = 82,
    PluginGetNext = 83,
}

impl Operation {
    /// Returns the wire identifier.
    #[must_use]
    pub const fn id(self) -> u32 {
        self as u32
    }

    /// Returns the operation with the given wire identifier.
    #[must_use]
    pub fn from_id(id: u32) -> Option<Self> {
        Self::try_from(id).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::Operation;

    #[test]
    fn identifiers() {
        assert_eq!(Operation::ALL.len(), 83);
        for (index, operation) in Operation::ALL.iter().enumerate() {
            assert_eq!(operation.id() as usize, index + 1);
            assert_eq!(Operation::from_id(operation.id()), Some(*operation));
        }

        assert_eq!(Operation::from_id(0), None);
        assert_eq!(Operation::from_id(84), None);
        assert_eq!(u32::from(Operation::ResourcePowerStateSet), 79);
        assert_eq!(Operation::SensorReadingGet.name(), "SensorReadingGet");
    }
}
