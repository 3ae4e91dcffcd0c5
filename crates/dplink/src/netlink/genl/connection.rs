//! Generic Netlink connection with family resolution.

use std::collections::HashMap;
use std::sync::RwLock;

use super::header::{GENL_HDRLEN, GenlMsgHdr};
use super::{CtrlAttr, CtrlAttrMcastGrp, CtrlCmd, GENL_ID_CTRL};
use crate::netlink::attr::{AttrIter, get};
use crate::netlink::builder::MessageBuilder;
use crate::netlink::error::{Error, Result};
use crate::netlink::message::{
    MessageIter, NLM_F_ACK, NLM_F_DUMP, NLM_F_DUMP_INTR, NLM_F_REQUEST, NlMsgError,
};
use crate::netlink::socket::NetlinkSocket;
use crate::netlink::stream::GenlEvents;

/// Information about a Generic Netlink family.
#[derive(Debug, Clone)]
pub struct FamilyInfo {
    /// Family name as registered by the kernel.
    pub name: String,
    /// Dynamically assigned family ID (used as nlmsg_type).
    pub id: u16,
    /// Family version.
    pub version: u8,
    /// Header size (additional bytes after genlmsghdr).
    pub hdr_size: u32,
    /// Maximum attribute number.
    pub max_attr: u32,
    /// Multicast groups: name -> group ID.
    pub mcast_groups: HashMap<String, u32>,
}

/// One generic netlink message: command, version and attribute payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenlMessage {
    /// Family-specific command code.
    pub cmd: u8,
    /// Family version the sender used.
    pub version: u8,
    /// TLV attributes following the GENL header.
    pub attrs: Vec<u8>,
}

impl GenlMessage {
    /// Split a netlink payload into GENL header and attributes.
    pub fn parse(payload: &[u8]) -> Result<Self> {
        let hdr = GenlMsgHdr::from_bytes(payload)
            .ok_or_else(|| Error::InvalidMessage("GENL header too short".into()))?;
        Ok(Self {
            cmd: hdr.cmd,
            version: hdr.version,
            attrs: payload[GENL_HDRLEN..].to_vec(),
        })
    }
}

/// Generic Netlink connection.
///
/// Provides family ID resolution and high-level GENL operations.
/// Family IDs are cached to avoid repeated kernel queries.
pub struct GenlConnection {
    socket: NetlinkSocket,
    cache: RwLock<HashMap<String, FamilyInfo>>,
}

impl GenlConnection {
    /// Create a new Generic Netlink connection.
    pub fn new() -> Result<Self> {
        Ok(Self {
            socket: NetlinkSocket::new()?,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// Get information about a Generic Netlink family.
    ///
    /// The result is cached, so subsequent calls for the same family
    /// do not require kernel communication.
    pub async fn get_family(&self, name: &str) -> Result<FamilyInfo> {
        if let Some(info) = self
            .cache
            .read()
            .ok()
            .and_then(|cache| cache.get(name).cloned())
        {
            return Ok(info);
        }

        let info = self.query_family(name).await?;
        tracing::debug!(
            family = name,
            id = info.id,
            version = info.version,
            groups = info.mcast_groups.len(),
            "resolved generic netlink family"
        );

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(name.to_string(), info.clone());
        }

        Ok(info)
    }

    /// Query the kernel for family information.
    async fn query_family(&self, name: &str) -> Result<FamilyInfo> {
        let replies = self
            .command(GENL_ID_CTRL, CtrlCmd::GetFamily as u8, 1, |builder| {
                builder.append_attr_str(CtrlAttr::FamilyName as u16, name)
            })
            .await
            .map_err(|e| {
                if e.errno() == Some(libc::ENOENT) {
                    Error::FamilyNotFound {
                        name: name.to_string(),
                    }
                } else {
                    e
                }
            })?;

        let reply = replies.first().ok_or_else(|| Error::FamilyNotFound {
            name: name.to_string(),
        })?;
        parse_family_attrs(name, &reply.attrs)
    }

    /// Join a multicast group of a resolved family.
    pub fn subscribe(&mut self, family: &FamilyInfo, group: &str) -> Result<()> {
        let id = *family
            .mcast_groups
            .get(group)
            .ok_or_else(|| Error::GroupNotFound {
                family: family.name.clone(),
                group: group.to_string(),
            })?;
        tracing::debug!(family = %family.name, group, id, "joining multicast group");
        self.socket.add_membership(id)
    }

    /// Stream of unsolicited messages for `family_id` on joined groups.
    pub fn events(&self, family_id: u16) -> GenlEvents<'_> {
        GenlEvents::new(&self.socket, family_id)
    }

    /// Send a GENL command and collect every reply up to the kernel's ACK.
    ///
    /// This is a low-level method for sending arbitrary GENL commands.
    /// Family-specific wrappers (like DpllConnection) should use this.
    pub async fn command(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder) -> Result<()>,
    ) -> Result<Vec<GenlMessage>> {
        self.exchange(family_id, NLM_F_REQUEST | NLM_F_ACK, cmd, version, build_attrs)
            .await
    }

    /// Send a GENL dump command and collect all responses until DONE.
    pub async fn dump_command(
        &self,
        family_id: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder) -> Result<()>,
    ) -> Result<Vec<GenlMessage>> {
        self.exchange(family_id, NLM_F_REQUEST | NLM_F_DUMP, cmd, version, build_attrs)
            .await
    }

    async fn exchange(
        &self,
        family_id: u16,
        flags: u16,
        cmd: u8,
        version: u8,
        build_attrs: impl FnOnce(&mut MessageBuilder) -> Result<()>,
    ) -> Result<Vec<GenlMessage>> {
        let mut builder = MessageBuilder::new(family_id, flags);

        // Append GENL header
        builder.append(&GenlMsgHdr::new(cmd, version));

        // Let caller append attributes
        build_attrs(&mut builder)?;

        let seq = self.socket.next_seq();
        builder.set_seq(seq);
        builder.set_pid(self.socket.pid());

        let msg = builder.finish();
        self.socket.send(&msg).await?;

        let mut replies = Vec::new();
        loop {
            let data = self.socket.recv_msg().await?;
            if collect_replies(&data, seq, &mut replies)? {
                return Ok(replies);
            }
        }
    }
}

/// Fold one received datagram into `replies`.
///
/// Returns `true` once the terminating ACK or DONE for `seq` was seen.
fn collect_replies(data: &[u8], seq: u32, replies: &mut Vec<GenlMessage>) -> Result<bool> {
    for result in MessageIter::new(data) {
        let (header, payload) = result?;

        if header.nlmsg_seq != seq {
            tracing::trace!(seq = header.nlmsg_seq, "skipping unrelated message");
            continue;
        }

        if header.is_error() {
            let err = NlMsgError::from_bytes(payload)?;
            return match err.into_error(payload, header.nlmsg_flags) {
                Some(e) => Err(e),
                None => Ok(true),
            };
        }

        if header.is_done() {
            // DONE carries the dump's final status
            if let Ok(status) = get::i32_ne(payload)
                && status < 0
            {
                return Err(Error::from_errno(status));
            }
            return Ok(true);
        }

        if header.is_noop() {
            continue;
        }

        if header.nlmsg_flags & NLM_F_DUMP_INTR != 0 {
            tracing::warn!("dump was interrupted by a concurrent change, output may be inconsistent");
        }

        replies.push(GenlMessage::parse(payload)?);
    }
    Ok(false)
}

/// Parse family attributes from a CTRL_CMD_GETFAMILY response.
fn parse_family_attrs(name: &str, data: &[u8]) -> Result<FamilyInfo> {
    let mut id: Option<u16> = None;
    let mut version: u8 = 0;
    let mut hdr_size: u32 = 0;
    let mut max_attr: u32 = 0;
    let mut mcast_groups = HashMap::new();

    for (attr_type, payload) in AttrIter::new(data) {
        match attr_type {
            t if t == CtrlAttr::FamilyId as u16 => {
                id = Some(get::u16_ne(payload)?);
            }
            t if t == CtrlAttr::Version as u16 => {
                version = get::u32_ne(payload)? as u8;
            }
            t if t == CtrlAttr::HdrSize as u16 => {
                hdr_size = get::u32_ne(payload)?;
            }
            t if t == CtrlAttr::MaxAttr as u16 => {
                max_attr = get::u32_ne(payload)?;
            }
            t if t == CtrlAttr::McastGroups as u16 => {
                mcast_groups = parse_mcast_groups(payload)?;
            }
            _ => {}
        }
    }

    let id = id.ok_or_else(|| Error::InvalidMessage("missing family ID".into()))?;

    Ok(FamilyInfo {
        name: name.to_string(),
        id,
        version,
        hdr_size,
        max_attr,
        mcast_groups,
    })
}

/// Parse multicast groups from CTRL_ATTR_MCAST_GROUPS.
fn parse_mcast_groups(data: &[u8]) -> Result<HashMap<String, u32>> {
    let mut groups = HashMap::new();

    // The mcast_groups attribute contains nested arrays
    for (_group_idx, group_payload) in AttrIter::new(data) {
        let mut name: Option<String> = None;
        let mut grp_id: Option<u32> = None;

        for (attr_type, payload) in AttrIter::new(group_payload) {
            match attr_type {
                t if t == CtrlAttrMcastGrp::Name as u16 => {
                    name = Some(get::string(payload)?.to_string());
                }
                t if t == CtrlAttrMcastGrp::Id as u16 => {
                    grp_id = Some(get::u32_ne(payload)?);
                }
                _ => {}
            }
        }

        if let (Some(name), Some(id)) = (name, grp_id) {
            groups.insert(name, id);
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::builder::AttrBuilder;
    use crate::netlink::message::{NLM_F_CAPPED, NLM_F_MULTI, NlMsgHdr, NlMsgType};

    fn genl_msg(msg_type: u16, flags: u16, seq: u32, cmd: u8, attrs: &[u8]) -> Vec<u8> {
        let mut b = MessageBuilder::new(msg_type, flags);
        b.append(&GenlMsgHdr::new(cmd, 1));
        b.append_bytes(attrs);
        b.set_seq(seq);
        b.finish()
    }

    fn ack(seq: u32, errno: i32) -> Vec<u8> {
        let mut b = MessageBuilder::new(NlMsgType::ERROR, NLM_F_CAPPED);
        b.append_bytes(&errno.to_ne_bytes());
        b.append(&NlMsgHdr::new(0x1c, NLM_F_REQUEST));
        b.set_seq(seq);
        b.finish()
    }

    fn done(seq: u32) -> Vec<u8> {
        let mut b = MessageBuilder::new(NlMsgType::DONE, NLM_F_MULTI);
        b.append_bytes(&0i32.to_ne_bytes());
        b.set_seq(seq);
        b.finish()
    }

    #[test]
    fn test_reply_then_ack() {
        let mut replies = Vec::new();
        let reply = genl_msg(0x1c, 0, 7, 2, &[]);
        assert!(!collect_replies(&reply, 7, &mut replies).unwrap());
        assert!(collect_replies(&ack(7, 0), 7, &mut replies).unwrap());
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].cmd, 2);
    }

    #[test]
    fn test_dump_preserves_order() {
        let mut data = genl_msg(0x1c, NLM_F_MULTI, 3, 8, &[1, 0, 0, 0]);
        data.extend(genl_msg(0x1c, NLM_F_MULTI, 3, 8, &[2, 0, 0, 0]));
        data.extend(done(3));

        let mut replies = Vec::new();
        assert!(collect_replies(&data, 3, &mut replies).unwrap());
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0].attrs, vec![1, 0, 0, 0]);
        assert_eq!(replies[1].attrs, vec![2, 0, 0, 0]);
    }

    #[test]
    fn test_skips_other_sequence() {
        let mut data = genl_msg(0x1c, 0, 99, 2, &[]);
        data.extend(ack(5, 0));
        let mut replies = Vec::new();
        assert!(collect_replies(&data, 5, &mut replies).unwrap());
        assert!(replies.is_empty());
    }

    #[test]
    fn test_kernel_error() {
        let mut replies = Vec::new();
        let err = collect_replies(&ack(1, -libc::ENODEV), 1, &mut replies).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_parse_family_attrs() {
        let mut groups = AttrBuilder::new();
        let grp = groups.nest_start(1);
        groups
            .append_attr_str(CtrlAttrMcastGrp::Name as u16, "monitor")
            .unwrap();
        groups.append_attr_u32(CtrlAttrMcastGrp::Id as u16, 12);
        groups.nest_end(grp).unwrap();

        let mut attrs = AttrBuilder::new();
        attrs
            .append_attr(CtrlAttr::FamilyId as u16, &0x22u16.to_ne_bytes())
            .unwrap();
        attrs.append_attr_u32(CtrlAttr::Version as u16, 1);
        attrs.append_attr_u32(CtrlAttr::MaxAttr as u16, 29);
        attrs
            .append_attr(CtrlAttr::McastGroups as u16, groups.as_bytes())
            .unwrap();

        let info = parse_family_attrs("dpll", &attrs.finish()).unwrap();
        assert_eq!(info.id, 0x22);
        assert_eq!(info.version, 1);
        assert_eq!(info.max_attr, 29);
        assert_eq!(info.mcast_groups.get("monitor"), Some(&12));
    }

    #[test]
    fn test_missing_family_id() {
        let mut attrs = AttrBuilder::new();
        attrs.append_attr_u32(CtrlAttr::Version as u16, 1);
        assert!(parse_family_attrs("dpll", &attrs.finish()).is_err());
    }
}
