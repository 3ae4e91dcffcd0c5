//! DPLL (digital phase-locked loop) generic netlink family.
//!
//! The kernel exposes clock-synchronization devices and their pins through
//! the `dpll` family. This module holds the wire vocabulary and the codec
//! layered on top of it:
//!
//! - [`table`]: static attribute tables describing every attribute's wire type
//!   and multiplicity
//! - [`record`]: table-driven TLV decoder producing a [`Record`]
//! - [`compile`]: command-line token compiler producing a [`Request`]
//! - [`DpllConnection`]: family resolution, requests and notifications
//!
//! # Example
//!
//! ```rust,no_run
//! use dplink::netlink::genl::dpll::{DpllConnection, Object, Verb, compile, decode, DEVICE};
//!
//! # async fn example() -> dplink::Result<()> {
//! let conn = DpllConnection::new().await?;
//! let request = compile(Object::Device, Verb::Show, &["id", "0"])?;
//! for reply in conn.execute(&request).await? {
//!     let record = decode(&DEVICE, &reply.attrs)?;
//!     println!("{:?}", record.u32(1));
//! }
//! # Ok(())
//! # }
//! ```

pub mod compile;
mod connection;
pub mod record;
pub mod table;
pub mod types;

pub use compile::{CompileError, Object, Request, Verb, compile};
pub use connection::{Action, DpllConnection, Notification};
pub use record::{DecodeError, Record, Value, decode};
pub use table::{AttrDesc, AttrKind, AttrTable, DEVICE, Multiplicity, PIN};

/// Generic netlink family name.
pub const FAMILY_NAME: &str = "dpll";

/// Family version spoken by this crate.
pub const FAMILY_VERSION: u8 = 1;

/// Multicast group carrying create/change/delete notifications.
pub const MONITOR_GROUP: &str = "monitor";

/// DPLL commands.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpllCmd {
    DeviceIdGet = 1,
    DeviceGet = 2,
    DeviceSet = 3,
    DeviceCreateNtf = 4,
    DeviceDeleteNtf = 5,
    DeviceChangeNtf = 6,
    PinIdGet = 7,
    PinGet = 8,
    PinSet = 9,
    PinCreateNtf = 10,
    PinDeleteNtf = 11,
    PinChangeNtf = 12,
}

impl DpllCmd {
    /// Map a wire command code back to the enum.
    pub fn from_u8(cmd: u8) -> Option<Self> {
        Some(match cmd {
            1 => Self::DeviceIdGet,
            2 => Self::DeviceGet,
            3 => Self::DeviceSet,
            4 => Self::DeviceCreateNtf,
            5 => Self::DeviceDeleteNtf,
            6 => Self::DeviceChangeNtf,
            7 => Self::PinIdGet,
            8 => Self::PinGet,
            9 => Self::PinSet,
            10 => Self::PinCreateNtf,
            11 => Self::PinDeleteNtf,
            12 => Self::PinChangeNtf,
            _ => return None,
        })
    }
}

/// Device attributes (`DPLL_A_*`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpllAttr {
    Id = 1,
    ModuleName = 2,
    Pad = 3,
    ClockId = 4,
    Mode = 5,
    ModeSupported = 6,
    LockStatus = 7,
    Temp = 8,
    Type = 9,
    LockStatusError = 10,
    ClockQualityLevel = 11,
    PhaseOffsetMonitor = 12,
    PhaseOffsetAvgFactor = 13,
}

/// Pin attributes (`DPLL_A_PIN_*`).
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DpllPinAttr {
    Id = 1,
    ParentId = 2,
    ModuleName = 3,
    Pad = 4,
    ClockId = 5,
    BoardLabel = 6,
    PanelLabel = 7,
    PackageLabel = 8,
    Type = 9,
    Direction = 10,
    Frequency = 11,
    FrequencySupported = 12,
    FrequencyMin = 13,
    FrequencyMax = 14,
    Prio = 15,
    State = 16,
    Capabilities = 17,
    ParentDevice = 18,
    ParentPin = 19,
    PhaseAdjustMin = 20,
    PhaseAdjustMax = 21,
    PhaseAdjust = 22,
    PhaseOffset = 23,
    FractionalFrequencyOffset = 24,
    EsyncFrequency = 25,
    EsyncFrequencySupported = 26,
    EsyncPulse = 27,
    ReferenceSync = 28,
    PhaseAdjustGran = 29,
}
