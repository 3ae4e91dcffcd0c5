//! dpll device - show and configure DPLL devices.

use anyhow::Result;
use dplink::netlink::genl::dpll::Object;
use dplink::output::{OutputFormat, OutputOptions};

const USAGE: &str = "\
Usage: dpll device show [ id DEVICE_ID ]
       dpll device set id DEVICE_ID [ phase-offset-monitor BOOL ]
                                      [ phase-offset-avg-factor NUM ]
       dpll device id-get [ module-name NAME ] [ clock-id ID ] [ type TYPE ]
";

pub async fn run(args: &[String], format: OutputFormat, opts: &OutputOptions) -> Result<()> {
    super::dispatch(Object::Device, USAGE, args, format, opts).await
}
