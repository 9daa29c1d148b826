use thiserror::Error;

pub const UPLOAD_PREFIX: &str = "uploads";
pub const ROOT_PREFIX_LABEL: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyDecodeError {
    #[error("malformed escape sequence at byte {0}")]
    MalformedEscape(usize),
    #[error("decoded key is not valid UTF-8")]
    InvalidUtf8,
}

/// Key for a client upload: `uploads/{epoch_millis}-{file_name}`.
pub fn upload_object_key(file_name: &str, epoch_millis: i64) -> String {
    let file_name = file_name.trim().trim_start_matches('/');
    format!("{UPLOAD_PREFIX}/{epoch_millis}-{file_name}")
}

/// Keys in storage notifications are form-encoded: `+` is a space and the
/// rest is percent-encoded.
pub fn decode_event_key(raw: &str) -> Result<String, KeyDecodeError> {
    percent_decode(&raw.replace('+', " "))
}

pub fn percent_decode(raw: &str) -> Result<String, KeyDecodeError> {
    let bytes = raw.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut index = 0usize;

    while index < bytes.len() {
        if bytes[index] != b'%' {
            decoded.push(bytes[index]);
            index += 1;
            continue;
        }

        let high = bytes.get(index + 1).and_then(|byte| hex_value(*byte));
        let low = bytes.get(index + 2).and_then(|byte| hex_value(*byte));
        match (high, low) {
            (Some(high), Some(low)) => decoded.push((high << 4) | low),
            _ => return Err(KeyDecodeError::MalformedEscape(index)),
        }
        index += 3;
    }

    String::from_utf8(decoded).map_err(|_| KeyDecodeError::InvalidUtf8)
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

pub fn is_json_key(key: &str) -> bool {
    key.ends_with(".json")
}

pub fn prefix_label(prefix: Option<&str>) -> &str {
    prefix.unwrap_or(ROOT_PREFIX_LABEL)
}
