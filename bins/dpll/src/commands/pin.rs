//! dpll pin - show and configure DPLL pins.
//!
//! `pin show device ID` narrows a dump to the pins of one device; with an
//! explicit pin id the device filter is not sent.

use anyhow::Result;
use dplink::netlink::genl::dpll::Object;
use dplink::output::{OutputFormat, OutputOptions};

const USAGE: &str = "\
Usage: dpll pin show [ id PIN_ID ] [ device DEVICE_ID ]
       dpll pin set id PIN_ID [ frequency FREQ ]
                               [ direction { input | output } ]
                               [ prio PRIO ]
                               [ state { connected | disconnected | selectable } ]
                               [ parent-device DEVICE_ID [ direction DIR ]
                                                          [ prio PRIO ]
                                                          [ state STATE ] ]
                               [ parent-pin PIN_ID [ state STATE ] ]
                               [ phase-adjust ADJUST ]
                               [ esync-frequency FREQ ]
                               [ reference-sync PIN_ID [ state STATE ] ]
       dpll pin id-get [ module-name NAME ] [ clock-id ID ]
                        [ board-label LABEL ] [ panel-label LABEL ]
                        [ package-label LABEL ] [ type TYPE ]
";

pub async fn run(args: &[String], format: OutputFormat, opts: &OutputOptions) -> Result<()> {
    super::dispatch(Object::Pin, USAGE, args, format, opts).await
}
