//! DNS callback listener.
//!
//! A minimal RFC 1035 responder: parses just enough of an inbound query to
//! recover the question's QNAME/QTYPE, extracts a correlation token from the
//! first label, records the callback, and answers with a deterministic
//! A-record (or an empty NOERROR reply for any other QTYPE) regardless of
//! whether the token was recognized. Socket lifetime is a single
//! `tokio::net::UdpSocket` with one `tokio::spawn`ed task per datagram —
//! the async equivalent of `ricochet_listener::http`'s per-connection-task
//! bootstrap, adapted for a connectionless transport.

use ricochet_store::Store;
use ricochet_types::Token;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::UdpSocket;

use crate::error::{ListenerError, Result};

const HEADER_LEN: usize = 12;
const MAX_COMPRESSION_HOPS: usize = 16;
const QTYPE_A: u16 = 1;

/// One parsed DNS question: its name, type, class, and where its encoding
/// ends in the original message (used to copy the question section
/// verbatim into the response).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Question {
    qname: String,
    qtype: u16,
    #[allow(dead_code)]
    qclass: u16,
    question_end: usize,
}

/// Serves the DNS callback listener on `addr` (UDP) until `shutdown`
/// resolves.
///
/// # Errors
///
/// Returns [`ListenerError::Bind`] if `addr` cannot be bound.
pub async fn serve(
    addr: SocketAddr,
    store: Store,
    shutdown: impl Future<Output = ()> + Send,
) -> Result<()> {
    let socket = Arc::new(UdpSocket::bind(addr).await.map_err(|source| {
        ListenerError::Bind {
            addr: addr.to_string(),
            source,
        }
    })?);

    tracing::info!(%addr, "DNS callback listener started");

    let mut buf = [0u8; 512];
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => {
                tracing::info!("DNS callback listener shutting down");
                return Ok(());
            }
            result = socket.recv_from(&mut buf) => {
                let (len, src) = match result {
                    Ok(pair) => pair,
                    Err(e) => {
                        tracing::warn!(error = %e, "DNS recv_from failed");
                        continue;
                    }
                };
                let datagram = buf[..len].to_vec();
                let socket = Arc::clone(&socket);
                let store = store.clone();
                tokio::spawn(async move {
                    handle_datagram(&socket, &store, &datagram, src).await;
                });
            }
        }
    }
}

async fn handle_datagram(socket: &UdpSocket, store: &Store, datagram: &[u8], src: SocketAddr) {
    let Some((id, question)) = parse_query(datagram) else {
        tracing::debug!(%src, "malformed DNS query, dropping silently");
        return;
    };

    if let Some(token) = extract_token(&question.qname) {
        match store
            .record_callback(
                &token,
                &src.ip().to_string(),
                &format!("DNS:{}", question.qname),
                &format!(r#"{{"qtype":{}}}"#, question.qtype),
                None,
                now_seconds(),
                None,
            )
            .await
        {
            Ok(true) => tracing::info!(token = token.as_str(), qname = %question.qname, "DNS callback recorded"),
            Ok(false) => tracing::warn!(token = token.as_str(), qname = %question.qname, "DNS callback for unknown token, dropping"),
            Err(e) => tracing::error!(error = %e, "failed to record DNS callback"),
        }
    } else {
        tracing::debug!(qname = %question.qname, "no valid token in QNAME, not storing");
    }

    let response = build_response(id, datagram, &question);
    if let Err(e) = socket.send_to(&response, src).await {
        tracing::warn!(error = %e, %src, "failed to send DNS response");
    }
}

/// Parses the transaction ID and first question out of `datagram`.
///
/// Returns `None` on any structural problem (too short, truncated name,
/// missing QTYPE/QCLASS). A malformed query is silently dropped, never
/// answered with an error response.
fn parse_query(datagram: &[u8]) -> Option<(u16, Question)> {
    if datagram.len() < HEADER_LEN {
        return None;
    }
    let id = u16::from_be_bytes([datagram[0], datagram[1]]);
    let qdcount = u16::from_be_bytes([datagram[4], datagram[5]]);
    if qdcount == 0 {
        return None;
    }

    let question = parse_question(datagram, HEADER_LEN)?;
    Some((id, question))
}

fn parse_question(buf: &[u8], start: usize) -> Option<Question> {
    let (qname, after_name) = parse_name(buf, start)?;
    if after_name + 4 > buf.len() {
        return None;
    }
    let qtype = u16::from_be_bytes([buf[after_name], buf[after_name + 1]]);
    let qclass = u16::from_be_bytes([buf[after_name + 2], buf[after_name + 3]]);
    Some(Question {
        qname,
        qtype,
        qclass,
        question_end: after_name + 4,
    })
}

/// Parses a length-prefixed DNS name starting at `start`, honoring
/// compression pointers.
///
/// Returns the dotted name and the offset immediately after the name *as it
/// was encoded at `start`* — i.e. after the two-byte pointer if one was
/// followed, not after the pointer target's own terminator.
fn parse_name(buf: &[u8], start: usize) -> Option<(String, usize)> {
    let mut labels = Vec::new();
    let mut pos = start;
    let mut end_of_original: Option<usize> = None;
    let mut hops = 0;

    loop {
        let len = *buf.get(pos)?;
        if len == 0 {
            if end_of_original.is_none() {
                end_of_original = Some(pos + 1);
            }
            break;
        }
        if len & 0xC0 == 0xC0 {
            hops += 1;
            if hops > MAX_COMPRESSION_HOPS {
                return None;
            }
            let second = *buf.get(pos + 1)?;
            if end_of_original.is_none() {
                end_of_original = Some(pos + 2);
            }
            pos = ((u16::from(len & 0x3F) << 8) | u16::from(second)) as usize;
            continue;
        }
        let len = len as usize;
        let label_start = pos + 1;
        let label_end = label_start + len;
        let label = buf.get(label_start..label_end)?;
        labels.push(String::from_utf8_lossy(label).to_string());
        pos = label_end;
    }

    Some((labels.join("."), end_of_original?))
}

/// Lowercases the first label of `qname` and validates it as a token.
fn extract_token(qname: &str) -> Option<Token> {
    let first_label = qname.split('.').next()?;
    Token::parse(&first_label.to_ascii_lowercase()).ok()
}

/// Builds the fixed-answer response for `question`, echoing the
/// transaction ID and the question section verbatim.
fn build_response(id: u16, original: &[u8], question: &Question) -> Vec<u8> {
    let answer_present = question.qtype == QTYPE_A;

    let mut out = Vec::with_capacity(question.question_end + 16);
    out.extend_from_slice(&id.to_be_bytes());
    // QR=1, Opcode=0, AA=1, TC=0, RD=0, RA=1, Z=0, RCODE=0
    out.extend_from_slice(&0x8580u16.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // QDCOUNT
    out.extend_from_slice(&(u16::from(answer_present as u8)).to_be_bytes()); // ANCOUNT
    out.extend_from_slice(&0u16.to_be_bytes()); // NSCOUNT
    out.extend_from_slice(&0u16.to_be_bytes()); // ARCOUNT

    out.extend_from_slice(&original[HEADER_LEN..question.question_end]);

    if answer_present {
        out.extend_from_slice(&0xC00Cu16.to_be_bytes()); // pointer to question name
        out.extend_from_slice(&QTYPE_A.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes()); // CLASS IN
        out.extend_from_slice(&60u32.to_be_bytes()); // TTL
        out.extend_from_slice(&4u16.to_be_bytes()); // RDLENGTH
        out.extend_from_slice(&[127, 0, 0, 1]); // RDATA
    }

    out
}

fn now_seconds() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Builds a minimal query datagram for tests: header + one question.
#[cfg(test)]
fn encode_query(id: u16, qname: &str, qtype: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&id.to_be_bytes());
    out.extend_from_slice(&0x0100u16.to_be_bytes()); // RD=1
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    for label in qname.split('.') {
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    out.extend_from_slice(&qtype.to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes()); // IN
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_test_support::TestStore;
    use std::time::Duration;

    #[test]
    fn parses_simple_uncompressed_name() {
        let datagram = encode_query(0x1234, "bbbbbbbbbbbbbbbb.oast.example", 1);
        let (id, question) = parse_query(&datagram).unwrap();
        assert_eq!(id, 0x1234);
        assert_eq!(question.qname, "bbbbbbbbbbbbbbbb.oast.example");
        assert_eq!(question.qtype, 1);
        assert_eq!(question.question_end, datagram.len());
    }

    #[test]
    fn rejects_truncated_header() {
        assert!(parse_query(&[0u8; 4]).is_none());
    }

    #[test]
    fn extracts_lowercased_first_label_token() {
        let token = extract_token("AAAAAAAAAAAAAAAA.oast.example").unwrap();
        assert_eq!(token.as_str(), "aaaaaaaaaaaaaaaa");
        assert!(extract_token("short.oast.example").is_none());
    }

    #[test]
    fn a_record_response_has_one_answer_with_fixed_rdata() {
        let datagram = encode_query(7, "aaaaaaaaaaaaaaaa.oast.example", 1);
        let (id, question) = parse_query(&datagram).unwrap();
        let response = build_response(id, &datagram, &question);

        assert_eq!(u16::from_be_bytes([response[0], response[1]]), 7);
        let ancount = u16::from_be_bytes([response[6], response[7]]);
        assert_eq!(ancount, 1);
        assert_eq!(&response[response.len() - 4..], &[127, 0, 0, 1]);
    }

    #[test]
    fn non_a_qtype_gets_zero_answers_noerror() {
        let datagram = encode_query(7, "aaaaaaaaaaaaaaaa.oast.example", 28); // AAAA
        let (id, question) = parse_query(&datagram).unwrap();
        let response = build_response(id, &datagram, &question);

        let ancount = u16::from_be_bytes([response[6], response[7]]);
        assert_eq!(ancount, 0);
        let flags = u16::from_be_bytes([response[2], response[3]]);
        assert_eq!(flags & 0x000F, 0); // RCODE
    }

    #[tokio::test]
    async fn end_to_end_sqli_callback_is_recorded_with_high_severity_context() {
        let test_store = TestStore::new().await.unwrap();
        let store = test_store.store().clone();
        store
            .record_injection(ricochet_types::Injection {
                token: Token::from_trusted("bbbbbbbbbbbbbbbb".to_string()),
                target_url: "https://victim.example/a".into(),
                parameter: "id".into(),
                payload: "bbbbbbbbbbbbbbbb.oast.example".into(),
                context: "sqli:mssql".into(),
                injected_at: 1000.0,
            })
            .await
            .unwrap();

        let port = ricochet_test_support::free_udp_port().unwrap();
        let addr: SocketAddr = format!("127.0.0.1:{port}").parse().unwrap();
        let (tx, rx) = tokio::sync::oneshot::channel();
        let shutdown = async {
            let _ = rx.await;
        };
        tokio::spawn(serve(addr, store.clone(), shutdown));
        tokio::time::sleep(Duration::from_millis(100)).await;

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let query = encode_query(99, "bbbbbbbbbbbbbbbb.oast.example", 1);
        client.send_to(&query, addr).await.unwrap();

        let mut buf = [0u8; 512];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), client.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[len - 4..len], &[127, 0, 0, 1]);

        let _ = tx.send(());
        tokio::time::sleep(Duration::from_millis(50)).await;

        let callbacks = store
            .get_callbacks_for_injection(&Token::from_trusted("bbbbbbbbbbbbbbbb".to_string()))
            .await
            .unwrap();
        assert_eq!(callbacks.len(), 1);
        assert_eq!(callbacks[0].request_path, "DNS:bbbbbbbbbbbbbbbb.oast.example");

        let findings = store.get_findings(None, None).await.unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity, ricochet_types::Severity::High);
    }
}
