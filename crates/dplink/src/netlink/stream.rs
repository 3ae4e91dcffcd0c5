//! Stream-based notification monitoring for generic netlink families.
//!
//! After joining a family's multicast group (see
//! [`GenlConnection::subscribe`](super::genl::GenlConnection::subscribe)), the
//! kernel pushes unsolicited messages with sequence number zero. [`GenlEvents`]
//! turns them into a [`Stream`] of [`GenlMessage`]s.
//!
//! One datagram may carry several messages; they are buffered and handed out
//! in delivery order before the socket is polled again.
//!
//! # Example
//!
//! ```ignore
//! use tokio_stream::StreamExt;
//!
//! let mut genl = GenlConnection::new()?;
//! let family = genl.get_family("dpll").await?;
//! genl.subscribe(&family, "monitor")?;
//!
//! let mut events = genl.events(family.id);
//! while let Some(msg) = events.try_next().await? {
//!     println!("cmd {}", msg.cmd);
//! }
//! ```

use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio_stream::Stream;

use super::error::{Error, Result};
use super::genl::GenlMessage;
use super::message::MessageIter;
use super::socket::NetlinkSocket;

/// A stream of notifications that borrows the underlying socket.
pub struct GenlEvents<'a> {
    socket: &'a NetlinkSocket,
    family_id: u16,
    pending: VecDeque<GenlMessage>,
}

impl<'a> GenlEvents<'a> {
    pub(crate) fn new(socket: &'a NetlinkSocket, family_id: u16) -> Self {
        Self {
            socket,
            family_id,
            pending: VecDeque::new(),
        }
    }
}

/// Extract the family's messages from one datagram.
fn parse_batch(data: &[u8], family_id: u16, out: &mut VecDeque<GenlMessage>) -> Result<()> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;
        if header.nlmsg_type != family_id {
            continue;
        }
        out.push_back(GenlMessage::parse(payload)?);
    }
    Ok(())
}

impl Stream for GenlEvents<'_> {
    type Item = Result<GenlMessage>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        // Drain what the last datagram delivered first
        if let Some(msg) = this.pending.pop_front() {
            return Poll::Ready(Some(Ok(msg)));
        }

        loop {
            match this.socket.poll_recv(cx) {
                Poll::Ready(Ok(data)) => {
                    if let Err(e) = parse_batch(&data, this.family_id, &mut this.pending) {
                        return Poll::Ready(Some(Err(e)));
                    }
                    if let Some(msg) = this.pending.pop_front() {
                        return Poll::Ready(Some(Ok(msg)));
                    }
                    // Nothing for this family in the batch, keep polling
                }
                Poll::Ready(Err(Error::Io(e))) if e.raw_os_error() == Some(libc::ENOBUFS) => {
                    tracing::warn!("notification queue overrun, some events were lost");
                }
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(e))),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::MessageBuilder;
    use crate::netlink::genl::GenlMsgHdr;

    fn ntf(family: u16, cmd: u8) -> Vec<u8> {
        let mut b = MessageBuilder::new(family, 0);
        b.append(&GenlMsgHdr::new(cmd, 1));
        b.finish()
    }

    #[test]
    fn test_parse_batch_filters_family() {
        let mut data = ntf(0x22, 6);
        data.extend(ntf(0x30, 1));
        data.extend(ntf(0x22, 12));

        let mut out = VecDeque::new();
        parse_batch(&data, 0x22, &mut out).unwrap();
        let cmds: Vec<u8> = out.iter().map(|m| m.cmd).collect();
        assert_eq!(cmds, vec![6, 12]);
    }
}
