//! DPLL connection: request execution and notifications.

use tokio_stream::{Stream, StreamExt};

use super::compile::{Object, Request, Verb};
use super::{DpllCmd, FAMILY_NAME, FAMILY_VERSION, MONITOR_GROUP};
use crate::netlink::error::{Error, Result};
use crate::netlink::genl::{FamilyInfo, GenlConnection, GenlMessage};

/// Kind of change a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Change,
    Delete,
}

impl Action {
    pub fn name(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Change => "change",
            Self::Delete => "delete",
        }
    }
}

/// An unsolicited create/change/delete message from the `monitor` group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub object: Object,
    pub action: Action,
    /// TLV attributes of the affected object.
    pub attrs: Vec<u8>,
}

impl Notification {
    /// Classify a message by its command code.
    ///
    /// Returns `None` for codes that are not notifications.
    pub fn from_message(msg: GenlMessage) -> Option<Self> {
        let (object, action) = match DpllCmd::from_u8(msg.cmd)? {
            DpllCmd::DeviceCreateNtf => (Object::Device, Action::Create),
            DpllCmd::DeviceChangeNtf => (Object::Device, Action::Change),
            DpllCmd::DeviceDeleteNtf => (Object::Device, Action::Delete),
            DpllCmd::PinCreateNtf => (Object::Pin, Action::Create),
            DpllCmd::PinChangeNtf => (Object::Pin, Action::Change),
            DpllCmd::PinDeleteNtf => (Object::Pin, Action::Delete),
            _ => return None,
        };
        Some(Self {
            object,
            action,
            attrs: msg.attrs,
        })
    }
}

/// Connection to the `dpll` generic netlink family.
///
/// # Example
///
/// ```ignore
/// let mut conn = DpllConnection::new().await?;
/// conn.subscribe()?;
/// let mut events = std::pin::pin!(conn.events());
/// while let Some(ntf) = events.try_next().await? {
///     println!("{} {}", ntf.action.name(), ntf.object);
/// }
/// ```
pub struct DpllConnection {
    genl: GenlConnection,
    family: FamilyInfo,
}

impl DpllConnection {
    /// Open a socket and resolve the `dpll` family.
    pub async fn new() -> Result<Self> {
        let genl = GenlConnection::new()?;
        let family = genl.get_family(FAMILY_NAME).await?;
        if family.version < FAMILY_VERSION {
            tracing::warn!(
                kernel = family.version,
                client = FAMILY_VERSION,
                "kernel dpll family is older than this client"
            );
        }
        Ok(Self { genl, family })
    }

    /// Send a compiled request and collect its replies in delivery order.
    ///
    /// A targeted `show` or an `id-get` that yields nothing is reported as
    /// [`Error::NotFound`]; `set` replies are empty on success.
    pub async fn execute(&self, request: &Request) -> Result<Vec<GenlMessage>> {
        let cmd = request.cmd as u8;
        let attrs = request.attrs.as_slice();
        tracing::trace!(
            cmd,
            dump = request.dump,
            len = attrs.len(),
            "sending dpll request"
        );

        let replies = if request.dump {
            self.genl
                .dump_command(self.family.id, cmd, FAMILY_VERSION, |b| {
                    b.append_bytes(attrs);
                    Ok(())
                })
                .await?
        } else {
            self.genl
                .command(self.family.id, cmd, FAMILY_VERSION, |b| {
                    b.append_bytes(attrs);
                    Ok(())
                })
                .await?
        };

        if replies.is_empty() && !request.dump && request.verb != Verb::Set {
            let what = match request.target {
                Some(id) => format!("{} {}", request.object, id),
                None => format!("matching {}", request.object),
            };
            return Err(Error::NotFound { what });
        }
        Ok(replies)
    }

    /// Join the `monitor` multicast group.
    pub fn subscribe(&mut self) -> Result<()> {
        self.genl.subscribe(&self.family, MONITOR_GROUP)
    }

    /// Stream of notifications on joined groups.
    ///
    /// Messages with command codes that are not notifications are logged and
    /// skipped.
    pub fn events(&self) -> impl Stream<Item = Result<Notification>> + '_ {
        self.genl
            .events(self.family.id)
            .filter_map(|item| match item {
                Ok(msg) => {
                    let cmd = msg.cmd;
                    let ntf = Notification::from_message(msg);
                    if ntf.is_none() {
                        tracing::warn!(cmd, "ignoring unexpected dpll message");
                    }
                    ntf.map(Ok)
                }
                Err(e) => Some(Err(e)),
            })
    }
}
