//! Static attribute tables for DPLL objects.
//!
//! Every attribute the client understands is listed here with its wire type
//! and multiplicity. The decoder, the command compiler and the renderer are
//! all driven from these tables; nothing else hardcodes attribute widths.

use super::{DpllAttr as D, DpllPinAttr as P};

/// Wire type of an attribute payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    U8,
    U32,
    U64,
    S32,
    S64,
    /// Signed integer sent as 4 or 8 bytes (`NLA_SINT`).
    Sint,
    /// NUL-terminated string.
    Text,
    /// Nested attribute set described by a smaller table.
    Nested(&'static AttrTable),
}

/// Whether an attribute may occur more than once in one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Multiplicity {
    /// At most one value; a repeated occurrence replaces the earlier one.
    Single,
    /// Every occurrence is kept, in wire order.
    Repeated,
}

/// Description of one attribute type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttrDesc {
    pub id: u16,
    pub name: &'static str,
    pub kind: AttrKind,
    pub multiplicity: Multiplicity,
}

impl AttrDesc {
    pub fn is_repeated(&self) -> bool {
        self.multiplicity == Multiplicity::Repeated
    }
}

/// Attribute table for one object kind or nested group.
#[derive(Debug, PartialEq, Eq)]
pub struct AttrTable {
    pub name: &'static str,
    /// Highest attribute type of the attribute space; larger types are ignored.
    pub max: u16,
    pub attrs: &'static [AttrDesc],
}

impl AttrTable {
    /// Look up an attribute type. Unknown and out-of-range types yield `None`.
    pub fn get(&self, id: u16) -> Option<&AttrDesc> {
        if id == 0 || id > self.max {
            return None;
        }
        self.attrs.iter().find(|desc| desc.id == id)
    }
}

const fn one(id: u16, name: &'static str, kind: AttrKind) -> AttrDesc {
    AttrDesc {
        id,
        name,
        kind,
        multiplicity: Multiplicity::Single,
    }
}

const fn many(id: u16, name: &'static str, kind: AttrKind) -> AttrDesc {
    AttrDesc {
        id,
        name,
        kind,
        multiplicity: Multiplicity::Repeated,
    }
}

/// DPLL device attributes.
pub static DEVICE: AttrTable = AttrTable {
    name: "device",
    max: D::PhaseOffsetAvgFactor as u16,
    attrs: &[
        one(D::Id as u16, "id", AttrKind::U32),
        one(D::ModuleName as u16, "module-name", AttrKind::Text),
        one(D::ClockId as u16, "clock-id", AttrKind::U64),
        one(D::Mode as u16, "mode", AttrKind::U32),
        many(D::ModeSupported as u16, "mode-supported", AttrKind::U32),
        one(D::LockStatus as u16, "lock-status", AttrKind::U32),
        one(D::Temp as u16, "temp", AttrKind::S32),
        one(D::Type as u16, "type", AttrKind::U32),
        one(D::LockStatusError as u16, "lock-status-error", AttrKind::U32),
        many(
            D::ClockQualityLevel as u16,
            "clock-quality-level",
            AttrKind::U32,
        ),
        one(
            D::PhaseOffsetMonitor as u16,
            "phase-offset-monitor",
            AttrKind::U32,
        ),
        one(
            D::PhaseOffsetAvgFactor as u16,
            "phase-offset-avg-factor",
            AttrKind::U32,
        ),
    ],
};

/// `{frequency-min, frequency-max}` range nested in frequency lists.
pub static FREQUENCY_RANGE: AttrTable = AttrTable {
    name: "frequency-range",
    max: P::PhaseAdjustGran as u16,
    attrs: &[
        one(P::FrequencyMin as u16, "frequency-min", AttrKind::U64),
        one(P::FrequencyMax as u16, "frequency-max", AttrKind::U64),
    ],
};

/// Binding of a pin to a parent device.
pub static PIN_PARENT_DEVICE: AttrTable = AttrTable {
    name: "parent-device",
    max: P::PhaseAdjustGran as u16,
    attrs: &[
        one(P::ParentId as u16, "parent-id", AttrKind::U32),
        one(P::Direction as u16, "direction", AttrKind::U32),
        one(P::Prio as u16, "prio", AttrKind::U32),
        one(P::State as u16, "state", AttrKind::U32),
        one(P::PhaseOffset as u16, "phase-offset", AttrKind::S64),
    ],
};

/// Binding of a pin to a parent (mux) pin.
pub static PIN_PARENT_PIN: AttrTable = AttrTable {
    name: "parent-pin",
    max: P::PhaseAdjustGran as u16,
    attrs: &[
        one(P::ParentId as u16, "parent-id", AttrKind::U32),
        one(P::State as u16, "state", AttrKind::U32),
    ],
};

/// Reference-sync pairing with another pin.
pub static PIN_REFERENCE_SYNC: AttrTable = AttrTable {
    name: "reference-sync",
    max: P::PhaseAdjustGran as u16,
    attrs: &[
        one(P::Id as u16, "id", AttrKind::U32),
        one(P::State as u16, "state", AttrKind::U32),
    ],
};

/// DPLL pin attributes.
pub static PIN: AttrTable = AttrTable {
    name: "pin",
    max: P::PhaseAdjustGran as u16,
    attrs: &[
        one(P::Id as u16, "id", AttrKind::U32),
        one(P::ParentId as u16, "parent-id", AttrKind::U32),
        one(P::ModuleName as u16, "module-name", AttrKind::Text),
        one(P::ClockId as u16, "clock-id", AttrKind::U64),
        one(P::BoardLabel as u16, "board-label", AttrKind::Text),
        one(P::PanelLabel as u16, "panel-label", AttrKind::Text),
        one(P::PackageLabel as u16, "package-label", AttrKind::Text),
        one(P::Type as u16, "type", AttrKind::U32),
        one(P::Direction as u16, "direction", AttrKind::U32),
        one(P::Frequency as u16, "frequency", AttrKind::U64),
        many(
            P::FrequencySupported as u16,
            "frequency-supported",
            AttrKind::Nested(&FREQUENCY_RANGE),
        ),
        one(P::FrequencyMin as u16, "frequency-min", AttrKind::U64),
        one(P::FrequencyMax as u16, "frequency-max", AttrKind::U64),
        one(P::Prio as u16, "prio", AttrKind::U32),
        one(P::State as u16, "state", AttrKind::U32),
        one(P::Capabilities as u16, "capabilities", AttrKind::U32),
        many(
            P::ParentDevice as u16,
            "parent-device",
            AttrKind::Nested(&PIN_PARENT_DEVICE),
        ),
        many(
            P::ParentPin as u16,
            "parent-pin",
            AttrKind::Nested(&PIN_PARENT_PIN),
        ),
        one(P::PhaseAdjustMin as u16, "phase-adjust-min", AttrKind::S32),
        one(P::PhaseAdjustMax as u16, "phase-adjust-max", AttrKind::S32),
        one(P::PhaseAdjust as u16, "phase-adjust", AttrKind::S32),
        one(P::PhaseOffset as u16, "phase-offset", AttrKind::S64),
        one(
            P::FractionalFrequencyOffset as u16,
            "fractional-frequency-offset",
            AttrKind::Sint,
        ),
        one(P::EsyncFrequency as u16, "esync-frequency", AttrKind::U64),
        many(
            P::EsyncFrequencySupported as u16,
            "esync-frequency-supported",
            AttrKind::Nested(&FREQUENCY_RANGE),
        ),
        one(P::EsyncPulse as u16, "esync-pulse", AttrKind::U32),
        many(
            P::ReferenceSync as u16,
            "reference-sync",
            AttrKind::Nested(&PIN_REFERENCE_SYNC),
        ),
        one(P::PhaseAdjustGran as u16, "phase-adjust-gran", AttrKind::U32),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    fn check_table(table: &AttrTable) {
        let mut ids: Vec<u16> = table.attrs.iter().map(|d| d.id).collect();
        let len = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), len, "duplicate id in {}", table.name);
        assert!(ids.iter().all(|&id| id > 0 && id <= table.max));

        for desc in table.attrs {
            if let AttrKind::Nested(sub) = desc.kind {
                check_table(sub);
            }
        }
    }

    #[test]
    fn test_ids_unique_and_bounded() {
        check_table(&DEVICE);
        check_table(&PIN);
    }

    #[test]
    fn test_lookup() {
        let desc = PIN.get(P::ParentDevice as u16).unwrap();
        assert!(desc.is_repeated());
        assert_eq!(desc.kind, AttrKind::Nested(&PIN_PARENT_DEVICE));

        assert_eq!(DEVICE.get(D::Temp as u16).unwrap().kind, AttrKind::S32);
        assert!(DEVICE.get(0).is_none());
        assert!(DEVICE.get(D::Pad as u16).is_none());
        assert!(DEVICE.get(200).is_none());
    }

    #[test]
    fn test_repeated_device_attrs() {
        let repeated: Vec<&str> = DEVICE
            .attrs
            .iter()
            .filter(|d| d.is_repeated())
            .map(|d| d.name)
            .collect();
        assert_eq!(repeated, vec!["mode-supported", "clock-quality-level"]);
    }
}
