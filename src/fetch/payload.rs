//! Decoding of remote fetch payloads: base64 text inside an XML envelope,
//! compressed with whichever scheme the upstream service chose that day.

use std::io::Read;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::{DeflateDecoder, GzDecoder};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FieldError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];
const ZIP_MAGIC: [u8; 4] = [b'P', b'K', 0x03, 0x04];

/// Extracts the base64 text content from an XML envelope and inflates it.
///
/// With `zipped` false the decoded bytes are returned as-is. With `zipped`
/// true the compression scheme is sniffed from the magic bytes: gzip, a
/// single-entry zip archive, or a raw deflate stream.
pub fn decode(envelope: &[u8], zipped: bool) -> Result<Vec<u8>, FieldError> {
    let encoded = extract_text(envelope)?;
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| FieldError::Payload(format!("invalid base64: {e}")))?;
    if !zipped {
        return Ok(raw);
    }
    inflate(&raw)
}

/// Concatenated text content of the envelope, tags stripped.
fn extract_text(envelope: &[u8]) -> Result<String, FieldError> {
    let mut reader = Reader::from_reader(envelope);
    reader.config_mut().trim_text(true);
    let mut out = String::new();
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| FieldError::Payload(format!("bad envelope text: {e}")))?;
                out.push_str(&text);
            }
            Ok(Event::CData(c)) => {
                out.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(FieldError::Payload(format!("malformed envelope: {e}"))),
        }
        buf.clear();
    }
    if out.is_empty() {
        return Err(FieldError::Payload("envelope carries no payload text".into()));
    }
    Ok(out)
}

fn inflate(raw: &[u8]) -> Result<Vec<u8>, FieldError> {
    if raw.starts_with(&GZIP_MAGIC) {
        let mut out = Vec::new();
        GzDecoder::new(raw)
            .read_to_end(&mut out)
            .map_err(|e| FieldError::Payload(format!("gzip decode failed: {e}")))?;
        return Ok(out);
    }
    if raw.starts_with(&ZIP_MAGIC) {
        return unzip_first_entry(raw);
    }
    // No recognizable container: treat as a raw deflate stream.
    let mut out = Vec::new();
    DeflateDecoder::new(raw)
        .read_to_end(&mut out)
        .map_err(|e| FieldError::Payload(format!("deflate decode failed: {e}")))?;
    Ok(out)
}

/// Minimal zip reader for the single-file archives the upstream produces:
/// parses the first local file header and inflates (or copies) its data.
fn unzip_first_entry(raw: &[u8]) -> Result<Vec<u8>, FieldError> {
    if raw.len() < 30 {
        return Err(FieldError::Payload("zip payload truncated".into()));
    }
    let method = u16::from_le_bytes([raw[8], raw[9]]);
    let flags = u16::from_le_bytes([raw[6], raw[7]]);
    let compressed_len = u32::from_le_bytes([raw[18], raw[19], raw[20], raw[21]]) as usize;
    let name_len = u16::from_le_bytes([raw[26], raw[27]]) as usize;
    let extra_len = u16::from_le_bytes([raw[28], raw[29]]) as usize;
    let data_start = 30 + name_len + extra_len;
    if data_start > raw.len() {
        return Err(FieldError::Payload("zip header overruns payload".into()));
    }
    let data = &raw[data_start..];

    match method {
        0 => {
            if compressed_len > data.len() {
                return Err(FieldError::Payload("zip entry overruns payload".into()));
            }
            Ok(data[..compressed_len].to_vec())
        }
        8 => {
            // With a streaming data descriptor (bit 3) the header sizes are
            // zero; the deflate stream self-terminates either way.
            let end = if flags & 0x08 == 0 && compressed_len <= data.len() {
                compressed_len
            } else {
                data.len()
            };
            let mut out = Vec::new();
            DeflateDecoder::new(&data[..end])
                .read_to_end(&mut out)
                .map_err(|e| FieldError::Payload(format!("zip inflate failed: {e}")))?;
            Ok(out)
        }
        other => Err(FieldError::Payload(format!(
            "unsupported zip compression method {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::{DeflateEncoder, GzEncoder};
    use flate2::Compression;
    use std::io::Write;

    const BODY: &[u8] = b"time,u,v\n0,1.0,0.5\n3600,1.2,0.4\n";

    fn envelope(payload: &[u8]) -> Vec<u8> {
        let b64 = STANDARD.encode(payload);
        format!("<response><data>{b64}</data></response>").into_bytes()
    }

    fn gzipped(body: &[u8]) -> Vec<u8> {
        let mut enc = GzEncoder::new(Vec::new(), Compression::default());
        enc.write_all(body).unwrap();
        enc.finish().unwrap()
    }

    fn deflated(body: &[u8]) -> Vec<u8> {
        let mut enc = DeflateEncoder::new(Vec::new(), Compression::default());
        enc.write_all(body).unwrap();
        enc.finish().unwrap()
    }

    fn zip_archive(body: &[u8]) -> Vec<u8> {
        let compressed = deflated(body);
        let name = b"data.csv";
        let mut out = Vec::new();
        out.extend_from_slice(&ZIP_MAGIC);
        out.extend_from_slice(&[20, 0]); // version needed
        out.extend_from_slice(&[0, 0]); // flags
        out.extend_from_slice(&[8, 0]); // method: deflate
        out.extend_from_slice(&[0, 0, 0, 0]); // mod time/date
        out.extend_from_slice(&[0, 0, 0, 0]); // crc32 (unchecked)
        out.extend_from_slice(&(compressed.len() as u32).to_le_bytes());
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&(name.len() as u16).to_le_bytes());
        out.extend_from_slice(&[0, 0]); // extra length
        out.extend_from_slice(name);
        out.extend_from_slice(&compressed);
        out
    }

    #[test]
    fn plain_payload_passes_through() {
        let env = envelope(BODY);
        assert_eq!(decode(&env, false).unwrap(), BODY);
    }

    #[test]
    fn gzip_payload_inflates() {
        let env = envelope(&gzipped(BODY));
        assert_eq!(decode(&env, true).unwrap(), BODY);
    }

    #[test]
    fn zip_payload_inflates() {
        let env = envelope(&zip_archive(BODY));
        assert_eq!(decode(&env, true).unwrap(), BODY);
    }

    #[test]
    fn bare_deflate_payload_inflates() {
        let env = envelope(&deflated(BODY));
        assert_eq!(decode(&env, true).unwrap(), BODY);
    }

    #[test]
    fn text_split_across_elements_is_joined() {
        let b64 = STANDARD.encode(BODY);
        let (head, tail) = b64.split_at(b64.len() / 2);
        let env = format!("<r><a>{head}</a><b>{tail}</b></r>");
        assert_eq!(decode(env.as_bytes(), false).unwrap(), BODY);
    }

    #[test]
    fn garbage_base64_is_an_error() {
        let env = b"<r>not-base64!!</r>";
        assert!(matches!(decode(env, false), Err(FieldError::Payload(_))));
    }

    #[test]
    fn empty_envelope_is_an_error() {
        assert!(decode(b"<r></r>", false).is_err());
    }
}
