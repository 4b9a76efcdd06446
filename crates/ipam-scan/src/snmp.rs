//! SNMP v2c sysName lookups.
//!
//! Implements just enough BER to send one GetRequest for
//! `1.3.6.1.2.1.1.5.0` and read the matching GetResponse. Anything that is
//! not a well-formed, matching, error-free response is treated as
//! unresolved.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use ipam_core::ProbeConfig;
use tokio::net::UdpSocket;

use crate::probe::HostnameResolver;

/// sysName.0 from SNMPv2-MIB.
pub const SYS_NAME_OID: &[u32] = &[1, 3, 6, 1, 2, 1, 1, 5, 0];

const SNMP_VERSION_2C: i64 = 1;

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_NULL: u8 = 0x05;
const TAG_OID: u8 = 0x06;
const TAG_SEQUENCE: u8 = 0x30;
const TAG_GET_REQUEST: u8 = 0xA0;
const TAG_GET_RESPONSE: u8 = 0xA2;
const TAG_NO_SUCH_OBJECT: u8 = 0x80;
const TAG_NO_SUCH_INSTANCE: u8 = 0x81;
const TAG_END_OF_MIB_VIEW: u8 = 0x82;

const MAX_DATAGRAM: usize = 2048;

// ── Encoding ──────────────────────────────────────────────────────

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

fn encode_tlv(tag: u8, value: &[u8], out: &mut Vec<u8>) {
    out.push(tag);
    encode_length(value.len(), out);
    out.extend_from_slice(value);
}

/// Minimal two's-complement content octets.
fn encode_integer(value: i64) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xFF && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    bytes[start..].to_vec()
}

fn encode_oid(arcs: &[u32]) -> Vec<u8> {
    let mut out = Vec::new();
    match arcs {
        [] => return out,
        [first] => out.push((first * 40) as u8),
        [first, second, ..] => encode_base128(first * 40 + second, &mut out),
    }
    for arc in arcs.iter().skip(2) {
        encode_base128(*arc, &mut out);
    }
    out
}

fn encode_base128(mut value: u32, out: &mut Vec<u8>) {
    let mut groups = vec![(value & 0x7F) as u8];
    value >>= 7;
    while value > 0 {
        groups.push(0x80 | (value & 0x7F) as u8);
        value >>= 7;
    }
    out.extend(groups.into_iter().rev());
}

/// Build a complete SNMP v2c GetRequest message for a single OID.
pub fn encode_get_request(community: &str, request_id: i32, oid: &[u32]) -> Vec<u8> {
    let mut varbind = Vec::new();
    encode_tlv(TAG_OID, &encode_oid(oid), &mut varbind);
    encode_tlv(TAG_NULL, &[], &mut varbind);

    let mut varbind_list = Vec::new();
    encode_tlv(TAG_SEQUENCE, &varbind, &mut varbind_list);

    let mut pdu = Vec::new();
    encode_tlv(TAG_INTEGER, &encode_integer(request_id.into()), &mut pdu);
    encode_tlv(TAG_INTEGER, &encode_integer(0), &mut pdu);
    encode_tlv(TAG_INTEGER, &encode_integer(0), &mut pdu);
    encode_tlv(TAG_SEQUENCE, &varbind_list, &mut pdu);

    let mut message = Vec::new();
    encode_tlv(TAG_INTEGER, &encode_integer(SNMP_VERSION_2C), &mut message);
    encode_tlv(TAG_OCTET_STRING, community.as_bytes(), &mut message);
    encode_tlv(TAG_GET_REQUEST, &pdu, &mut message);

    let mut out = Vec::new();
    encode_tlv(TAG_SEQUENCE, &message, &mut out);
    out
}

// ── Decoding ──────────────────────────────────────────────────────

/// Split one TLV off the front of `buf`, returning `(tag, value, rest)`.
fn read_tlv(buf: &[u8]) -> Option<(u8, &[u8], &[u8])> {
    let (&tag, rest) = buf.split_first()?;
    let (&first, rest) = rest.split_first()?;

    let (len, rest) = if first < 0x80 {
        (usize::from(first), rest)
    } else {
        let n = usize::from(first & 0x7F);
        if n == 0 || n > 4 || rest.len() < n {
            return None;
        }
        let len = rest[..n]
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | usize::from(*b));
        (len, &rest[n..])
    };

    if rest.len() < len {
        return None;
    }
    Some((tag, &rest[..len], &rest[len..]))
}

fn expect_tlv(buf: &[u8], tag: u8) -> Option<(&[u8], &[u8])> {
    let (found, value, rest) = read_tlv(buf)?;
    (found == tag).then_some((value, rest))
}

fn decode_integer(bytes: &[u8]) -> Option<i64> {
    if bytes.is_empty() || bytes.len() > 8 {
        return None;
    }
    let init: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    Some(
        bytes
            .iter()
            .fold(init, |acc, b| (acc << 8) | i64::from(*b)),
    )
}

/// Value carried by the single varbind of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VarValue {
    OctetString(Vec<u8>),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    Other(u8),
}

/// The fields of a GetResponse the resolver cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResponse {
    pub community: Vec<u8>,
    pub request_id: i64,
    pub error_status: i64,
    pub oid: Vec<u8>,
    pub value: VarValue,
}

/// Decode an SNMP v2c GetResponse carrying at least one varbind.
pub fn decode_get_response(packet: &[u8]) -> Option<GetResponse> {
    let (message, _) = expect_tlv(packet, TAG_SEQUENCE)?;

    let (version, rest) = expect_tlv(message, TAG_INTEGER)?;
    if decode_integer(version)? != SNMP_VERSION_2C {
        return None;
    }
    let (community, rest) = expect_tlv(rest, TAG_OCTET_STRING)?;
    let (pdu, _) = expect_tlv(rest, TAG_GET_RESPONSE)?;

    let (request_id, rest) = expect_tlv(pdu, TAG_INTEGER)?;
    let (error_status, rest) = expect_tlv(rest, TAG_INTEGER)?;
    let (_error_index, rest) = expect_tlv(rest, TAG_INTEGER)?;
    let (varbind_list, _) = expect_tlv(rest, TAG_SEQUENCE)?;
    let (varbind, _) = expect_tlv(varbind_list, TAG_SEQUENCE)?;
    let (oid, rest) = expect_tlv(varbind, TAG_OID)?;
    let (tag, value, _) = read_tlv(rest)?;

    let value = match tag {
        TAG_OCTET_STRING => VarValue::OctetString(value.to_vec()),
        TAG_NO_SUCH_OBJECT => VarValue::NoSuchObject,
        TAG_NO_SUCH_INSTANCE => VarValue::NoSuchInstance,
        TAG_END_OF_MIB_VIEW => VarValue::EndOfMibView,
        other => VarValue::Other(other),
    };

    Some(GetResponse {
        community: community.to_vec(),
        request_id: decode_integer(request_id)?,
        error_status: decode_integer(error_status)?,
        oid: oid.to_vec(),
        value,
    })
}

// ── Resolver ──────────────────────────────────────────────────────

/// Resolves hostnames by asking the host's SNMP agent for sysName.
///
/// One request, no retries, bounded by the probe timeout.
#[derive(Debug)]
pub struct SnmpResolver {
    next_request_id: AtomicI32,
}

impl SnmpResolver {
    pub fn new() -> Self {
        Self {
            next_request_id: AtomicI32::new(1),
        }
    }

    async fn query(
        &self,
        addr: IpAddr,
        config: &ProbeConfig,
        request_id: i32,
    ) -> std::io::Result<Option<String>> {
        let local: SocketAddr = match addr {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(SocketAddr::new(addr, config.snmp_port)).await?;

        let request = encode_get_request(&config.snmp_community, request_id, SYS_NAME_OID);
        socket.send(&request).await?;

        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let len = socket.recv(&mut buf).await?;
            match decode_get_response(&buf[..len]) {
                Some(response) if response.request_id == i64::from(request_id) => {
                    return Ok(hostname_from(&response, &config.snmp_community));
                }
                _ => {
                    tracing::debug!(address = %addr, "Ignoring unexpected SNMP datagram");
                }
            }
        }
    }
}

impl Default for SnmpResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostnameResolver for SnmpResolver {
    async fn resolve(&self, addr: IpAddr, config: &ProbeConfig) -> Option<String> {
        let request_id = self.next_request_id.fetch_add(1, Ordering::Relaxed) & i32::MAX;

        match tokio::time::timeout(config.timeout, self.query(addr, config, request_id)).await {
            Ok(Ok(name)) => name,
            Ok(Err(e)) => {
                tracing::debug!(address = %addr, error = %e, "SNMP query failed");
                None
            }
            Err(_) => None,
        }
    }
}

fn hostname_from(response: &GetResponse, community: &str) -> Option<String> {
    if response.community != community.as_bytes()
        || response.error_status != 0
        || response.oid != encode_oid(SYS_NAME_OID)
    {
        return None;
    }
    match &response.value {
        VarValue::OctetString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn response_packet(
        community: &str,
        request_id: i64,
        error_status: i64,
        oid: &[u32],
        value_tag: u8,
        value: &[u8],
    ) -> Vec<u8> {
        let mut varbind = Vec::new();
        encode_tlv(TAG_OID, &encode_oid(oid), &mut varbind);
        encode_tlv(value_tag, value, &mut varbind);
        let mut list = Vec::new();
        encode_tlv(TAG_SEQUENCE, &varbind, &mut list);

        let mut pdu = Vec::new();
        encode_tlv(TAG_INTEGER, &encode_integer(request_id), &mut pdu);
        encode_tlv(TAG_INTEGER, &encode_integer(error_status), &mut pdu);
        encode_tlv(TAG_INTEGER, &encode_integer(0), &mut pdu);
        encode_tlv(TAG_SEQUENCE, &list, &mut pdu);

        let mut message = Vec::new();
        encode_tlv(TAG_INTEGER, &encode_integer(SNMP_VERSION_2C), &mut message);
        encode_tlv(TAG_OCTET_STRING, community.as_bytes(), &mut message);
        encode_tlv(TAG_GET_RESPONSE, &pdu, &mut message);

        let mut out = Vec::new();
        encode_tlv(TAG_SEQUENCE, &message, &mut out);
        out
    }

    /// Pull the request id out of a GetRequest, as an agent would.
    fn request_id_of(packet: &[u8]) -> i64 {
        let (message, _) = expect_tlv(packet, TAG_SEQUENCE).unwrap();
        let (_, rest) = expect_tlv(message, TAG_INTEGER).unwrap();
        let (_, rest) = expect_tlv(rest, TAG_OCTET_STRING).unwrap();
        let (pdu, _) = expect_tlv(rest, TAG_GET_REQUEST).unwrap();
        let (id, _) = expect_tlv(pdu, TAG_INTEGER).unwrap();
        decode_integer(id).unwrap()
    }

    /// Spawn a one-shot agent that answers with `community` and `name`.
    async fn spawn_agent(community: &'static str, name: &'static str) -> u16 {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (len, peer) = socket.recv_from(&mut buf).await.unwrap();
            let id = request_id_of(&buf[..len]);
            let reply = response_packet(
                community,
                id,
                0,
                SYS_NAME_OID,
                TAG_OCTET_STRING,
                name.as_bytes(),
            );
            socket.send_to(&reply, peer).await.unwrap();
        });
        port
    }

    fn config_for(port: u16, timeout: Duration) -> ProbeConfig {
        ProbeConfig {
            snmp_port: port,
            timeout,
            ..ProbeConfig::default()
        }
    }

    #[test]
    fn test_encode_matches_known_packet() {
        // GetRequest for sysDescr.0 with community "public".
        let expected: [u8; 43] = [
            0x30, 0x29, 0x02, 0x01, 0x01, 0x04, 0x06, 0x70, 0x75, 0x62, 0x6c, 0x69, 0x63, 0xA0,
            0x1C, 0x02, 0x04, 0x12, 0x34, 0x56, 0x78, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30,
            0x0E, 0x30, 0x0C, 0x06, 0x08, 0x2B, 0x06, 0x01, 0x02, 0x01, 0x01, 0x01, 0x00, 0x05,
            0x00,
        ];
        let packet = encode_get_request("public", 0x1234_5678, &[1, 3, 6, 1, 2, 1, 1, 1, 0]);
        assert_eq!(packet, expected);
    }

    #[test]
    fn test_encode_integer_minimal() {
        assert_eq!(encode_integer(0), vec![0x00]);
        assert_eq!(encode_integer(127), vec![0x7F]);
        assert_eq!(encode_integer(128), vec![0x00, 0x80]);
        assert_eq!(encode_integer(-1), vec![0xFF]);
        assert_eq!(encode_integer(-129), vec![0xFF, 0x7F]);
    }

    #[test]
    fn test_decode_integer_sign() {
        assert_eq!(decode_integer(&[0xFF]), Some(-1));
        assert_eq!(decode_integer(&[0x00, 0x80]), Some(128));
        assert_eq!(decode_integer(&[]), None);
    }

    #[test]
    fn test_encode_oid_multibyte_arc() {
        assert_eq!(
            encode_oid(&[1, 3, 6, 1, 4, 1, 2021]),
            vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0x8F, 0x65]
        );
    }

    #[test]
    fn test_long_form_length() {
        let community = "c".repeat(200);
        let packet = encode_get_request(&community, 1, SYS_NAME_OID);
        // Outer sequence exceeds 127 bytes, so it needs the long form.
        assert_eq!(packet[1], 0x81);
        let (tag, value, rest) = read_tlv(&packet).unwrap();
        assert_eq!(tag, TAG_SEQUENCE);
        assert_eq!(value.len(), usize::from(packet[2]));
        assert!(rest.is_empty());
    }

    #[test]
    fn test_decode_response_fields() {
        let packet = response_packet("dvcadmin", 42, 0, SYS_NAME_OID, TAG_OCTET_STRING, b"sw-01");
        let response = decode_get_response(&packet).unwrap();

        assert_eq!(response.community, b"dvcadmin");
        assert_eq!(response.request_id, 42);
        assert_eq!(response.error_status, 0);
        assert_eq!(response.value, VarValue::OctetString(b"sw-01".to_vec()));
        assert_eq!(hostname_from(&response, "dvcadmin").as_deref(), Some("sw-01"));
    }

    #[test]
    fn test_exception_values_are_unresolved() {
        for tag in [TAG_NO_SUCH_OBJECT, TAG_NO_SUCH_INSTANCE, TAG_END_OF_MIB_VIEW] {
            let packet = response_packet("dvcadmin", 7, 0, SYS_NAME_OID, tag, &[]);
            let response = decode_get_response(&packet).unwrap();
            assert_eq!(hostname_from(&response, "dvcadmin"), None);
        }
    }

    #[test]
    fn test_error_status_and_community_mismatch_are_unresolved() {
        let packet = response_packet("dvcadmin", 7, 2, SYS_NAME_OID, TAG_OCTET_STRING, b"x");
        let response = decode_get_response(&packet).unwrap();
        assert_eq!(hostname_from(&response, "dvcadmin"), None);

        let packet = response_packet("public", 7, 0, SYS_NAME_OID, TAG_OCTET_STRING, b"x");
        let response = decode_get_response(&packet).unwrap();
        assert_eq!(hostname_from(&response, "dvcadmin"), None);

        let sys_descr = [1, 3, 6, 1, 2, 1, 1, 1, 0];
        let packet = response_packet("dvcadmin", 7, 0, &sys_descr, TAG_OCTET_STRING, b"x");
        let response = decode_get_response(&packet).unwrap();
        assert_eq!(hostname_from(&response, "dvcadmin"), None);
    }

    #[test]
    fn test_truncated_packet_rejected() {
        let packet = response_packet("dvcadmin", 7, 0, SYS_NAME_OID, TAG_OCTET_STRING, b"host");
        assert!(decode_get_response(&packet[..packet.len() - 3]).is_none());
        assert!(decode_get_response(&[]).is_none());
        assert!(decode_get_response(&encode_get_request("dvcadmin", 1, SYS_NAME_OID)).is_none());
    }

    #[tokio::test]
    async fn test_resolver_against_loopback_agent() {
        let port = spawn_agent("dvcadmin", "core-sw-01").await;
        let resolver = SnmpResolver::new();

        let name = resolver
            .resolve(
                "127.0.0.1".parse().unwrap(),
                &config_for(port, Duration::from_secs(1)),
            )
            .await;
        assert_eq!(name.as_deref(), Some("core-sw-01"));
    }

    #[tokio::test]
    async fn test_resolver_rejects_foreign_community() {
        let port = spawn_agent("public", "core-sw-01").await;
        let resolver = SnmpResolver::new();

        let name = resolver
            .resolve(
                "127.0.0.1".parse().unwrap(),
                &config_for(port, Duration::from_secs(1)),
            )
            .await;
        assert_eq!(name, None);
    }

    #[tokio::test]
    async fn test_resolver_times_out_on_silent_agent() {
        let silent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = silent.local_addr().unwrap().port();
        let resolver = SnmpResolver::new();

        let started = std::time::Instant::now();
        let name = resolver
            .resolve(
                "127.0.0.1".parse().unwrap(),
                &config_for(port, Duration::from_millis(200)),
            )
            .await;

        assert_eq!(name, None);
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(silent);
    }
}
