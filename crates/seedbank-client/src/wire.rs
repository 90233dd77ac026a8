//! Request framing and payload codecs for the seed bank exchanges.

use std::io::{self, Read, Write};

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{ExchangeError, ExchangeResult};

pub const AUTHENTICATE_PATH: &str = "/credentials/authenticate";
pub const CATEGORIES_PATH: &str = "/filtered/get_categories";
pub const SUBMIT_PATH: &str = "/filtered/submit";

/// Name of the single form part carried by a submit request.
pub const SUBMIT_PART: &str = "payload";

/// One HTTP/1.0-shaped request, written verbatim to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: &'static str,
    target: String,
    host: String,
    body: Option<Body>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Body {
    content_type: String,
    bytes: Vec<u8>,
}

impl Request {
    pub fn authenticate(host: &str, api_key: &str) -> Self {
        Self {
            method: "GET",
            target: format!(
                "{AUTHENTICATE_PATH}?src_api_key={}",
                urlencoding::encode(api_key)
            ),
            host: host.to_string(),
            body: None,
        }
    }

    pub fn categories(host: &str) -> Self {
        Self {
            method: "GET",
            target: CATEGORIES_PATH.to_string(),
            host: host.to_string(),
            body: None,
        }
    }

    /// Multipart POST with one JSON part, delimited by `boundary`.
    pub fn submit(host: &str, payload: &SubmitPayload<'_>, boundary: &str) -> Self {
        let json = payload.to_json();
        let mut bytes = Vec::with_capacity(json.len() + 2 * boundary.len() + 128);
        bytes.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
        bytes.extend_from_slice(
            format!("Content-Disposition: form-data; name=\"{SUBMIT_PART}\"\r\n").as_bytes(),
        );
        bytes.extend_from_slice(b"Content-Type: application/json\r\n\r\n");
        bytes.extend_from_slice(json.as_bytes());
        bytes.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Self {
            method: "POST",
            target: SUBMIT_PATH.to_string(),
            host: host.to_string(),
            body: Some(Body {
                content_type: format!("multipart/form-data; boundary={boundary}"),
                bytes,
            }),
        }
    }

    pub fn method(&self) -> &str {
        self.method
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = format!(
            "{} {} HTTP/1.0\r\nHost: {}\r\n",
            self.method, self.target, self.host
        )
        .into_bytes();
        match &self.body {
            Some(body) => {
                out.extend_from_slice(format!("Content-Type: {}\r\n", body.content_type).as_bytes());
                out.extend_from_slice(format!("Content-Length: {}\r\n\r\n", body.bytes.len()).as_bytes());
                out.extend_from_slice(&body.bytes);
            }
            None => out.extend_from_slice(b"\r\n"),
        }
        out
    }
}

/// JSON carried in the submit form part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitPayload<'a> {
    pub user_token: &'a str,
    pub settings_hash: &'a str,
    pub seed: String,
}

impl<'a> SubmitPayload<'a> {
    pub fn new(user_token: &'a str, settings_hash: &'a str, seed: i64) -> Self {
        Self {
            user_token,
            settings_hash,
            seed: encode_seed(seed),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::json!({
            "user_token": self.user_token,
            "settings_hash": self.settings_hash,
            "seed": self.seed,
        })
        .to_string()
    }
}

/// Eight big-endian bytes, standard base64 with padding.
pub fn encode_seed(seed: i64) -> String {
    STANDARD.encode(seed.to_be_bytes())
}

pub fn decode_seed(encoded: &str) -> Option<i64> {
    let bytes = STANDARD.decode(encoded.trim()).ok()?;
    let bytes: [u8; 8] = bytes.try_into().ok()?;
    Some(i64::from_be_bytes(bytes))
}

/// Write `request`, then read until end-of-stream and decode it as the payload.
pub fn exchange<C>(channel: &mut C, request: &Request) -> ExchangeResult<String>
where
    C: Read + Write + ?Sized,
{
    channel
        .write_all(&request.encode())
        .and_then(|_| channel.flush())
        .map_err(ExchangeError::channel)?;
    read_payload(channel)
}

/// Drain `reader` to end-of-stream. Invalid UTF-8 is replaced, not rejected.
pub fn read_payload<R>(reader: &mut R) -> ExchangeResult<String>
where
    R: Read + ?Sized,
{
    let mut raw = Vec::new();
    match reader.read_to_end(&mut raw) {
        Ok(_) => {}
        // TLS peers commonly close the socket without sending close_notify.
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof && !raw.is_empty() => {
            tracing::debug!(target: "seedbank::wire", bytes = raw.len(), "peer closed without close_notify");
        }
        Err(err) => return Err(ExchangeError::channel(err)),
    }
    if raw.is_empty() {
        return Err(ExchangeError::EmptyResponse);
    }
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn get_requests_are_bare_http10() {
        let request = Request::categories("bank.example.net");
        assert_eq!(
            request.encode(),
            b"GET /filtered/get_categories HTTP/1.0\r\nHost: bank.example.net\r\n\r\n"
        );
    }

    #[test]
    fn api_key_is_percent_encoded() {
        let request = Request::authenticate("bank.example.net", "k&y=1 2");
        assert_eq!(
            request.target(),
            "/credentials/authenticate?src_api_key=k%26y%3D1%202"
        );
    }

    #[test]
    fn submit_request_frames_a_single_json_part() {
        let payload = SubmitPayload::new("tok", "flat", 1);
        let request = Request::submit("bank.example.net", &payload, "XYZ");
        let text = String::from_utf8(request.encode()).expect("ascii request");

        let (head, body) = text.split_once("\r\n\r\n").expect("header terminator");
        assert!(head.starts_with("POST /filtered/submit HTTP/1.0\r\nHost: bank.example.net\r\n"));
        assert!(head.contains("Content-Type: multipart/form-data; boundary=XYZ"));
        assert!(head.contains(&format!("Content-Length: {}", body.len())));
        assert!(body.starts_with("--XYZ\r\nContent-Disposition: form-data; name=\"payload\"\r\n"));
        assert!(body.ends_with("\r\n--XYZ--\r\n"));

        let json_start = body.find('{').expect("json part");
        let json_end = body.rfind('}').expect("json part end");
        let value: serde_json::Value =
            serde_json::from_str(&body[json_start..=json_end]).expect("valid json");
        assert_eq!(value["user_token"], "tok");
        assert_eq!(value["settings_hash"], "flat");
        assert_eq!(value["seed"], "AAAAAAAAAAE=");
    }

    #[test]
    fn submit_payload_escapes_every_field() {
        let payload = SubmitPayload::new("a\"b", "line\nbreak\\", -2);
        let value: serde_json::Value =
            serde_json::from_str(&payload.to_json()).expect("valid json");
        assert_eq!(value["user_token"], "a\"b");
        assert_eq!(value["settings_hash"], "line\nbreak\\");
        assert_eq!(value["seed"], "//////////4=");
        assert_eq!(value.as_object().map(|fields| fields.len()), Some(3));
    }

    #[test]
    fn seeds_encode_as_big_endian_base64() {
        assert_eq!(encode_seed(0), "AAAAAAAAAAA=");
        assert_eq!(encode_seed(1), "AAAAAAAAAAE=");
        assert_eq!(encode_seed(-1), "//////////8=");
        assert_eq!(encode_seed(0x0102_0304_0506_0708), "AQIDBAUGBwg=");
    }

    #[test]
    fn seed_codec_preserves_extremes_and_negatives() {
        for seed in [i64::MIN, -8_675_309, -1, 0, 42, i64::MAX] {
            assert_eq!(decode_seed(&encode_seed(seed)), Some(seed));
        }
    }

    #[test]
    fn decode_rejects_wrong_width() {
        assert_eq!(decode_seed("AAAA"), None);
        assert_eq!(decode_seed("not base64!"), None);
    }

    #[test]
    fn whole_stream_is_the_payload() {
        let mut reader = Cursor::new(b"HTTP/1.0 200 OK\r\n\r\nflat".to_vec());
        let payload = read_payload(&mut reader).expect("payload");
        assert_eq!(payload, "HTTP/1.0 200 OK\r\n\r\nflat");
    }

    #[test]
    fn empty_stream_is_an_error() {
        let mut reader = Cursor::new(Vec::new());
        let err = read_payload(&mut reader).expect_err("empty");
        assert!(matches!(err, ExchangeError::EmptyResponse));
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut reader = Cursor::new(vec![b'o', b'k', 0xff]);
        assert_eq!(read_payload(&mut reader).expect("payload"), "ok\u{fffd}");
    }
}
