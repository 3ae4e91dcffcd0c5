//! Closed vocabularies for enum-valued DPLL attributes.
//!
//! Each [`Vocab`] maps wire values to the tokens accepted on the command line
//! and printed on output. Values the kernel sends that are not listed here
//! render as `unknown`.

/// A closed set of named wire values.
#[derive(Debug, PartialEq, Eq)]
pub struct Vocab {
    /// `(wire value, token)` pairs in display order.
    pub entries: &'static [(u32, &'static str)],
}

impl Vocab {
    /// Token for a wire value, or `unknown`.
    pub fn name(&self, value: u32) -> &'static str {
        self.entries
            .iter()
            .find(|(v, _)| *v == value)
            .map_or("unknown", |(_, name)| name)
    }

    /// Wire value for a token.
    pub fn value(&self, token: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|(_, name)| *name == token)
            .map(|(v, _)| *v)
    }

    /// Names of every bit set in `bits`, treating entries as bit masks.
    pub fn flags(&self, bits: u32) -> Vec<&'static str> {
        self.entries
            .iter()
            .filter(|(mask, _)| bits & mask != 0)
            .map(|(_, name)| *name)
            .collect()
    }

    /// Accepted tokens joined with `/`, as shown in error messages.
    pub fn expected(&self) -> String {
        self.entries
            .iter()
            .map(|(_, name)| *name)
            .collect::<Vec<_>>()
            .join("/")
    }
}

pub static MODE: Vocab = Vocab {
    entries: &[(1, "manual"), (2, "automatic")],
};

pub static LOCK_STATUS: Vocab = Vocab {
    entries: &[
        (1, "unlocked"),
        (2, "locked"),
        (3, "locked-ho-acq"),
        (4, "holdover"),
    ],
};

pub static LOCK_STATUS_ERROR: Vocab = Vocab {
    entries: &[
        (1, "none"),
        (2, "undefined"),
        (3, "media-down"),
        (4, "ffo-too-high"),
    ],
};

pub static DEVICE_TYPE: Vocab = Vocab {
    entries: &[(1, "pps"), (2, "eec")],
};

pub static CLOCK_QUALITY_LEVEL: Vocab = Vocab {
    entries: &[
        (1, "itu-opt1-prc"),
        (2, "itu-opt1-ssu-a"),
        (3, "itu-opt1-ssu-b"),
        (4, "itu-opt1-eec1"),
        (5, "itu-opt1-prtc"),
        (6, "itu-opt1-eprtc"),
        (7, "itu-opt1-eeec"),
        (8, "itu-opt1-eprc"),
    ],
};

/// `phase-offset-monitor` on/off.
pub static FEATURE_STATE: Vocab = Vocab {
    entries: &[(0, "disable"), (1, "enable")],
};

pub static PIN_TYPE: Vocab = Vocab {
    entries: &[
        (1, "mux"),
        (2, "ext"),
        (3, "synce-eth-port"),
        (4, "int-oscillator"),
        (5, "gnss"),
    ],
};

pub static PIN_DIRECTION: Vocab = Vocab {
    entries: &[(1, "input"), (2, "output")],
};

pub static PIN_STATE: Vocab = Vocab {
    entries: &[(1, "connected"), (2, "disconnected"), (3, "selectable")],
};

/// Bit masks of `DPLL_A_PIN_CAPABILITIES`, in print order.
pub static PIN_CAPABILITIES: Vocab = Vocab {
    entries: &[
        (4, "state-can-change"),
        (2, "priority-can-change"),
        (1, "direction-can-change"),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_and_value() {
        assert_eq!(PIN_STATE.name(3), "selectable");
        assert_eq!(PIN_STATE.value("disconnected"), Some(2));
        assert_eq!(PIN_STATE.name(42), "unknown");
        assert_eq!(PIN_STATE.value("Connected"), None);
    }

    #[test]
    fn test_flags() {
        assert_eq!(
            PIN_CAPABILITIES.flags(0x5),
            vec!["state-can-change", "direction-can-change"]
        );
        assert_eq!(
            PIN_CAPABILITIES.flags(0x7),
            vec!["state-can-change", "priority-can-change", "direction-can-change"]
        );
        assert!(PIN_CAPABILITIES.flags(0).is_empty());
    }

    #[test]
    fn test_expected() {
        assert_eq!(PIN_DIRECTION.expected(), "input/output");
        assert_eq!(DEVICE_TYPE.expected(), "pps/eec");
    }
}
