//! dpll monitor - watch device and pin notifications.
//!
//! Runs until SIGINT or SIGTERM. The stream is polled with a one second
//! timeout so the stop flag is seen even when the kernel stays quiet.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Result, bail};
use dplink::netlink::genl::dpll::{DpllConnection, decode};
use dplink::output::{
    MonitorConfig, NotificationEvent, OutputFormat, OutputOptions, print_event, render,
};
use tokio::signal::unix::{SignalKind, signal};
use tokio_stream::StreamExt;

const TICK: Duration = Duration::from_secs(1);

pub async fn run(args: &[String], format: OutputFormat, opts: &OutputOptions) -> Result<()> {
    if let Some(arg) = args.first() {
        bail!("Command \"{}\" not found", arg);
    }

    let config = MonitorConfig::new().with_format(format).with_opts(*opts);

    let mut conn = DpllConnection::new().await?;
    conn.subscribe()?;

    let stop = Arc::new(AtomicBool::new(false));
    watch_signals(stop.clone())?;

    let mut stdout = std::io::stdout().lock();
    let mut events = std::pin::pin!(conn.events().timeout(TICK));

    while !stop.load(Ordering::Relaxed) {
        let ntf = match events.next().await {
            Some(Ok(item)) => item?,
            // Idle tick
            Some(Err(_)) => continue,
            None => break,
        };

        let record = decode(ntf.object.table(), &ntf.attrs)?;
        let event = NotificationEvent {
            action: ntf.action,
            object: ntf.object,
            record: render(&record, ntf.object.script())?,
        };
        print_event(&mut stdout, &event, &config)?;
    }

    tracing::debug!("monitor stopped");
    Ok(())
}

/// Set `stop` on the first SIGINT or SIGTERM.
fn watch_signals(stop: Arc<AtomicBool>) -> std::io::Result<()> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::spawn(async move {
        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
        stop.store(true, Ordering::Relaxed);
    });
    Ok(())
}
