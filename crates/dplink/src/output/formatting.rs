//! Value formatting shared by the text and JSON writers.
//!
//! # Example
//!
//! ```
//! use dplink::output::formatting::{format_millidegrees, format_range};
//!
//! assert_eq!(format_millidegrees(23456), "23.456 C");
//! assert_eq!(format_range(Some(10_000_000), Some(10_000_000)), "10000000 Hz");
//! assert_eq!(format_range(Some(1_000_000), Some(2_000_000)), "1000000-2000000 Hz");
//! ```

use crate::netlink::genl::dpll::types::Vocab;

/// Format a millidegree Celsius reading as `<int>.<3 digits> C`.
///
/// The sign is kept for readings between -1 and 0 degrees.
///
/// ```
/// use dplink::output::formatting::format_millidegrees;
///
/// assert_eq!(format_millidegrees(-500), "-0.500 C");
/// assert_eq!(format_millidegrees(-12005), "-12.005 C");
/// assert_eq!(format_millidegrees(0), "0.000 C");
/// ```
pub fn format_millidegrees(milli: i64) -> String {
    let sign = if milli < 0 { "-" } else { "" };
    let abs = milli.unsigned_abs();
    format!("{}{}.{:03} C", sign, abs / 1000, abs % 1000)
}

/// Millidegrees as a floating point degree value.
pub fn millidegrees_to_f64(milli: i64) -> f64 {
    milli as f64 / 1000.0
}

/// Format a supported-frequency range.
///
/// A range whose bounds are equal collapses to a single value. A range with
/// only one bound prints that bound.
pub fn format_range(min: Option<u64>, max: Option<u64>) -> String {
    match (min, max) {
        (Some(lo), Some(hi)) if lo == hi => format!("{} Hz", lo),
        (Some(lo), Some(hi)) => format!("{}-{} Hz", lo, hi),
        (Some(v), None) | (None, Some(v)) => format!("{} Hz", v),
        (None, None) => "- Hz".to_string(),
    }
}

/// Format a bitmask as hex followed by the names of the set bits.
///
/// ```
/// use dplink::netlink::genl::dpll::types::PIN_CAPABILITIES;
/// use dplink::output::formatting::format_flags;
///
/// assert_eq!(
///     format_flags(&PIN_CAPABILITIES, 0x6),
///     "0x6 state-can-change priority-can-change"
/// );
/// assert_eq!(format_flags(&PIN_CAPABILITIES, 0), "0x0");
/// ```
pub fn format_flags(vocab: &Vocab, bits: u32) -> String {
    let mut out = format!("0x{:x}", bits);
    for name in vocab.flags(bits) {
        out.push(' ');
        out.push_str(name);
    }
    out
}

/// Token for an enum value; values outside `u32` are `unknown`.
pub fn vocab_name(vocab: &Vocab, value: u64) -> &'static str {
    u32::try_from(value).map_or("unknown", |v| vocab.name(v))
}
