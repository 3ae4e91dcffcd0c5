//! Builders for netlink messages and attribute buffers.
//!
//! [`AttrBuilder`] produces a bare TLV buffer (what the command compiler
//! emits); [`MessageBuilder`] wraps such a buffer in a netlink header.

use zerocopy::{Immutable, IntoBytes};

use super::attr::{NLA_F_NESTED, NLA_HDRLEN, NlAttr, nla_align};
use super::error::{Error, Result};
use super::message::{NLMSG_HDRLEN, NlMsgHdr, nlmsg_align};

/// Token returned when starting a nested attribute.
///
/// Consumed by [`AttrBuilder::nest_end`], so a nest can only be closed once.
#[derive(Debug)]
#[must_use = "a nested attribute must be closed with nest_end"]
pub struct NestToken {
    /// Offset of the nested attribute header in the buffer.
    offset: usize,
}

/// Largest payload a single attribute can carry.
pub const MAX_ATTR_PAYLOAD: usize = u16::MAX as usize - NLA_HDRLEN;

fn oversized(attr_type: u16, len: usize) -> Error {
    Error::InvalidAttribute(format!(
        "attribute {} payload of {} bytes exceeds {} bytes",
        attr_type & !NLA_F_NESTED,
        len,
        MAX_ATTR_PAYLOAD
    ))
}

/// Append one attribute. Nothing is written if the payload does not fit.
fn put_attr(buf: &mut Vec<u8>, attr_type: u16, data: &[u8]) -> Result<()> {
    let attr =
        NlAttr::new(attr_type, data.len()).ok_or_else(|| oversized(attr_type, data.len()))?;
    buf.extend_from_slice(attr.as_bytes());
    buf.extend_from_slice(data);
    // Pad to alignment
    let aligned = nla_align(buf.len());
    buf.resize(aligned, 0);
    Ok(())
}

fn str_payload(value: &str) -> Vec<u8> {
    let mut data = Vec::with_capacity(value.len() + 1);
    data.extend_from_slice(value.as_bytes());
    data.push(0); // null terminator
    data
}

/// Builder for a flat TLV attribute buffer.
#[derive(Debug, Clone, Default)]
pub struct AttrBuilder {
    buf: Vec<u8>,
    open: usize,
}

impl AttrBuilder {
    /// Create an empty attribute buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an attribute with the given type and data.
    ///
    /// # Errors
    ///
    /// Fails without touching the buffer if `data` is longer than
    /// [`MAX_ATTR_PAYLOAD`].
    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) -> Result<()> {
        put_attr(&mut self.buf, attr_type, data)
    }

    fn append_fixed<const N: usize>(&mut self, attr_type: u16, data: [u8; N]) {
        // Scalar payloads are at most 8 bytes
        let attr = NlAttr {
            nla_len: (NLA_HDRLEN + N) as u16,
            nla_type: attr_type,
        };
        self.buf.extend_from_slice(attr.as_bytes());
        self.buf.extend_from_slice(&data);
        let aligned = nla_align(self.buf.len());
        self.buf.resize(aligned, 0);
    }

    /// Append a u8 attribute.
    pub fn append_attr_u8(&mut self, attr_type: u16, value: u8) {
        self.append_fixed(attr_type, [value]);
    }

    /// Append a u32 attribute (native endian).
    pub fn append_attr_u32(&mut self, attr_type: u16, value: u32) {
        self.append_fixed(attr_type, value.to_ne_bytes());
    }

    /// Append a u64 attribute (native endian).
    pub fn append_attr_u64(&mut self, attr_type: u16, value: u64) {
        self.append_fixed(attr_type, value.to_ne_bytes());
    }

    /// Append an s32 attribute (native endian).
    pub fn append_attr_s32(&mut self, attr_type: u16, value: i32) {
        self.append_fixed(attr_type, value.to_ne_bytes());
    }

    /// Append an s64 attribute (native endian).
    pub fn append_attr_s64(&mut self, attr_type: u16, value: i64) {
        self.append_fixed(attr_type, value.to_ne_bytes());
    }

    /// Append a null-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) -> Result<()> {
        self.append_attr(attr_type, &str_payload(value))
    }

    /// Start a nested attribute. Returns a token to finalize it.
    pub fn nest_start(&mut self, attr_type: u16) -> NestToken {
        let offset = self.buf.len();
        // Placeholder header, length patched by nest_end
        let attr = NlAttr {
            nla_len: NLA_HDRLEN as u16,
            nla_type: attr_type | NLA_F_NESTED,
        };
        self.buf.extend_from_slice(attr.as_bytes());
        self.open += 1;
        NestToken { offset }
    }

    /// End a nested attribute started with `nest_start`.
    ///
    /// # Errors
    ///
    /// If the nest grew past what `nla_len` can describe, the whole nest is
    /// removed from the buffer and an error is returned.
    pub fn nest_end(&mut self, token: NestToken) -> Result<()> {
        self.open -= 1;
        let len = self.buf.len() - token.offset;
        let Ok(len) = u16::try_from(len) else {
            let attr_type =
                u16::from_ne_bytes([self.buf[token.offset + 2], self.buf[token.offset + 3]]);
            self.buf.truncate(token.offset);
            return Err(oversized(attr_type, len - NLA_HDRLEN));
        };
        self.buf[token.offset..token.offset + 2].copy_from_slice(&len.to_ne_bytes());
        // Ensure alignment
        let aligned = nla_align(self.buf.len());
        self.buf.resize(aligned, 0);
        Ok(())
    }

    /// Number of nests started but not yet closed.
    pub fn open_nests(&self) -> usize {
        self.open
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Finalize and return the attribute bytes.
    pub fn finish(self) -> Vec<u8> {
        debug_assert_eq!(self.open, 0, "unclosed nested attribute");
        self.buf
    }
}

/// Builder for constructing netlink messages.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    buf: Vec<u8>,
}

impl MessageBuilder {
    /// Create a new message builder with the given type and flags.
    pub fn new(msg_type: u16, flags: u16) -> Self {
        let header = NlMsgHdr::new(msg_type, flags);
        let mut buf = vec![0u8; NLMSG_HDRLEN];
        buf[..std::mem::size_of::<NlMsgHdr>()].copy_from_slice(header.as_bytes());
        Self { buf }
    }

    /// Get the current message length.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// Check if the message is empty (header only).
    pub fn is_empty(&self) -> bool {
        self.buf.len() == NLMSG_HDRLEN
    }

    /// Append raw bytes to the message (with alignment padding).
    pub fn append_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
        // Pad to alignment
        let aligned = nlmsg_align(self.buf.len());
        self.buf.resize(aligned, 0);
    }

    /// Append a fixed-layout header struct to the message.
    pub fn append<T: IntoBytes + Immutable>(&mut self, data: &T) {
        self.append_bytes(data.as_bytes());
    }

    /// Append an attribute with the given type and data.
    pub fn append_attr(&mut self, attr_type: u16, data: &[u8]) -> Result<()> {
        put_attr(&mut self.buf, attr_type, data)
    }

    /// Append a null-terminated string attribute.
    pub fn append_attr_str(&mut self, attr_type: u16, value: &str) -> Result<()> {
        self.append_attr(attr_type, &str_payload(value))
    }

    /// Set the sequence number.
    pub fn set_seq(&mut self, seq: u32) {
        let bytes = seq.to_ne_bytes();
        self.buf[8..12].copy_from_slice(&bytes);
    }

    /// Set the port ID.
    pub fn set_pid(&mut self, pid: u32) {
        let bytes = pid.to_ne_bytes();
        self.buf[12..16].copy_from_slice(&bytes);
    }

    /// Finalize and return the message bytes.
    pub fn finish(mut self) -> Vec<u8> {
        // Update message length in header
        let len = self.buf.len() as u32;
        let len_bytes = len.to_ne_bytes();
        self.buf[0..4].copy_from_slice(&len_bytes);
        self.buf
    }

    /// Get the current buffer for inspection.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::attr::{AttrIter, NLA_HDRLEN, get};
    use crate::netlink::message::NLM_F_REQUEST;

    #[test]
    fn test_simple_message() {
        let msg = MessageBuilder::new(16, NLM_F_REQUEST).finish();
        assert_eq!(msg.len(), NLMSG_HDRLEN);

        let header = NlMsgHdr::from_bytes(&msg).unwrap();
        assert_eq!(header.nlmsg_len as usize, NLMSG_HDRLEN);
        assert_eq!(header.nlmsg_type, 16);
        assert_eq!(header.nlmsg_flags, NLM_F_REQUEST);
    }

    #[test]
    fn test_attribute() {
        let mut builder = MessageBuilder::new(16, NLM_F_REQUEST);
        builder.append_attr(1, &0x12345678u32.to_ne_bytes()).unwrap();
        let msg = builder.finish();

        assert_eq!(msg.len(), NLMSG_HDRLEN + NLA_HDRLEN + 4);
    }

    #[test]
    fn test_string_attribute_padding() {
        let mut attrs = AttrBuilder::new();
        attrs.append_attr_str(3, "ice").unwrap();
        let buf = attrs.finish();
        // 4 header + "ice\0" = 8, already aligned
        assert_eq!(buf.len(), 8);
        assert_eq!(&buf[4..], b"ice\0");
    }

    #[test]
    fn test_nested_attribute() {
        let mut attrs = AttrBuilder::new();
        let nest = attrs.nest_start(18);
        attrs.append_attr_u32(2, 100);
        assert_eq!(attrs.open_nests(), 1);
        attrs.nest_end(nest).unwrap();
        assert_eq!(attrs.open_nests(), 0);
        let buf = attrs.finish();

        let (kind, inner) = AttrIter::new(&buf).next().unwrap();
        assert_eq!(kind, 18);
        assert_eq!(buf[3] & 0x80, 0x80);
        let (inner_kind, value) = AttrIter::new(inner).next().unwrap();
        assert_eq!(inner_kind, 2);
        assert_eq!(get::u32_ne(value).unwrap(), 100);
    }

    #[test]
    fn test_signed_attributes() {
        let mut attrs = AttrBuilder::new();
        attrs.append_attr_s32(22, -1500);
        attrs.append_attr_s64(23, -7);
        let buf = attrs.finish();
        let mut it = AttrIter::new(&buf);
        assert_eq!(get::i32_ne(it.next().unwrap().1).unwrap(), -1500);
        assert_eq!(get::i64_ne(it.next().unwrap().1).unwrap(), -7);
    }

    #[test]
    fn test_oversized_attribute_rejected() {
        let mut attrs = AttrBuilder::new();
        attrs.append_attr_u32(1, 7);
        let before = attrs.as_bytes().to_vec();

        let big = vec![0u8; MAX_ATTR_PAYLOAD + 1];
        assert!(attrs.append_attr(2, &big).is_err());
        assert!(attrs.append_attr(2, &big[..MAX_ATTR_PAYLOAD]).is_ok());

        let mut attrs = AttrBuilder::new();
        attrs.append_attr_u32(1, 7);
        let label = "a".repeat(MAX_ATTR_PAYLOAD);
        // The terminating NUL pushes this one byte over
        assert!(attrs.append_attr_str(3, &label).is_err());
        assert_eq!(attrs.finish(), before);
    }

    #[test]
    fn test_oversized_nest_removed() {
        let mut attrs = AttrBuilder::new();
        attrs.append_attr_u32(1, 7);
        let before = attrs.as_bytes().to_vec();

        let nest = attrs.nest_start(18);
        let chunk = vec![0u8; MAX_ATTR_PAYLOAD / 2];
        attrs.append_attr(2, &chunk).unwrap();
        attrs.append_attr(2, &chunk).unwrap();
        assert!(attrs.nest_end(nest).is_err());
        assert_eq!(attrs.open_nests(), 0);
        assert_eq!(attrs.finish(), before);
    }
}
