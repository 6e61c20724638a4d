use super::{joined, BuiltinRegistry};
use crate::error::ShellError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use std::fmt::Write as _;

/// Everything but unreserved URL characters (RFC 3986) is encoded.
const URL_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register(
        "base64",
        "Base64 decode when valid, otherwise encode",
        "base64 TEXT",
        |a: &[String]| {
            let input = joined(a);
            let decoded = STANDARD
                .decode(input.as_bytes())
                .ok()
                .and_then(|bytes| String::from_utf8(bytes).ok());
            Ok(decoded.unwrap_or_else(|| STANDARD.encode(input.as_bytes())))
        },
    );
    r.register(
        "hex",
        "Hex decode when valid, otherwise encode",
        "hex TEXT",
        |a: &[String]| {
            let input = joined(a);
            Ok(hex_decode(&input).unwrap_or_else(|| hex_encode(input.as_bytes())))
        },
    );
    r.register("urlencode", "Percent-encode for URLs", "urlencode TEXT", |a: &[String]| {
        Ok(url_encode(&joined(a)))
    });
    r.register("url", "Percent-encode for URLs", "url TEXT", |a: &[String]| {
        Ok(url_encode(&joined(a)))
    });
    r.register("urldecode", "Decode percent-encoding", "urldecode TEXT", |a: &[String]| {
        let input = joined(a).replace('+', " ");
        percent_decode_str(&input)
            .decode_utf8()
            .map(|decoded| decoded.into_owned())
            .map_err(|e| ShellError::invalid(format!("decoded text is not UTF-8: {e}")))
    });
    r.register("json", "Pretty-print JSON", "json TEXT", |a: &[String]| {
        let value: serde_json::Value = serde_json::from_str(&joined(a))
            .map_err(|e| ShellError::invalid(format!("invalid JSON: {e}")))?;
        serde_json::to_string_pretty(&value).map_err(|e| ShellError::invalid(e.to_string()))
    });
}

fn url_encode(text: &str) -> String {
    utf8_percent_encode(text, URL_ENCODE_SET).to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

fn hex_decode(input: &str) -> Option<String> {
    if input.is_empty() || input.len() % 2 != 0 || !input.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let bytes = (0..input.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&input[i..i + 2], 16))
        .collect::<Result<Vec<u8>, _>>()
        .ok()?;
    String::from_utf8(bytes).ok()
}

#[cfg(test)]
mod tests {
    use crate::builtins::{args, BuiltinRegistry};

    fn run(name: &str, values: &[&str]) -> String {
        BuiltinRegistry::with_defaults()
            .execute(name, &args(values))
            .unwrap()
    }

    #[test]
    fn base64_toggles() {
        assert_eq!(run("base64", &["hello"]), "aGVsbG8=");
        assert_eq!(run("base64", &["aGVsbG8="]), "hello");
    }

    #[test]
    fn hex_toggles() {
        assert_eq!(run("hex", &["hi"]), "6869");
        assert_eq!(run("hex", &["6869"]), "hi");
    }

    #[test]
    fn url_encoding() {
        assert_eq!(run("urlencode", &["a b&c=d/é"]), "a%20b%26c%3Dd%2F%C3%A9");
        assert_eq!(run("url", &["safe-_.~"]), "safe-_.~");
        assert_eq!(run("urldecode", &["a%20b+c%26"]), "a b c&");
        assert!(BuiltinRegistry::with_defaults()
            .execute("urldecode", &args(&["%ff"]))
            .is_err());
    }

    #[test]
    fn json_pretty_prints() {
        assert_eq!(run("json", &[r#"{"a":1}"#]), "{\n  \"a\": 1\n}");
        assert!(BuiltinRegistry::with_defaults()
            .execute("json", &args(&["{nope"]))
            .is_err());
    }
}
