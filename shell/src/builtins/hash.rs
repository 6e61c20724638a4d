use super::{joined, require, BuiltinRegistry};
use crate::error::{ShellError, ShellResult};
use sha1::Sha1;
use sha2::{Digest, Sha256, Sha512};

/// Algorithms `hash` and `checksum` accept by name.
const ALGORITHMS: [&str; 4] = ["md5", "sha1", "sha256", "sha512"];
const DEFAULT_ALGORITHM: &str = "sha256";
const MAX_CHECKSUM_BYTES: u64 = 1 << 30;

/// Lowercase hex digest of `input`, or `None` for an unknown algorithm.
fn digest(algorithm: &str, input: &[u8]) -> Option<String> {
    let hex = match algorithm {
        "md5" => format!("{:x}", md5::compute(input)),
        "sha1" => format!("{:x}", Sha1::digest(input)),
        "sha256" => format!("{:x}", Sha256::digest(input)),
        "sha512" => format!("{:x}", Sha512::digest(input)),
        _ => return None,
    };
    Some(hex)
}

fn known(algorithm: &str) -> ShellResult<&str> {
    if ALGORITHMS.contains(&algorithm) {
        Ok(algorithm)
    } else {
        Err(ShellError::invalid(format!(
            "unknown algorithm '{algorithm}', expected one of {}",
            ALGORITHMS.join(", ")
        )))
    }
}

fn register_digest(r: &mut BuiltinRegistry, algorithm: &'static str, description: &str) {
    r.register(algorithm, description, &format!("{algorithm} TEXT"), move |a: &[String]| {
        digest(algorithm, joined(a).as_bytes())
            .ok_or_else(|| ShellError::invalid(format!("unknown algorithm '{algorithm}'")))
    });
}

pub(super) fn register(r: &mut BuiltinRegistry) {
    register_digest(r, "md5", "MD5 digest as hex");
    register_digest(r, "sha1", "SHA-1 digest as hex");
    register_digest(r, "sha256", "SHA-256 digest as hex");
    register_digest(r, "sha512", "SHA-512 digest as hex");

    r.register(
        "hash",
        "Digest with a named algorithm (default sha256)",
        "hash [md5|sha1|sha256|sha512] TEXT",
        |a: &[String]| {
            // A leading algorithm name only counts when text follows it.
            let (algorithm, text) = match a.split_first() {
                Some((algo, rest)) if !rest.is_empty() && ALGORITHMS.contains(&algo.as_str()) => {
                    (algo.as_str(), joined(rest))
                }
                _ => (DEFAULT_ALGORITHM, joined(a)),
            };
            digest(algorithm, text.as_bytes())
                .ok_or_else(|| ShellError::invalid(format!("unknown algorithm '{algorithm}'")))
        },
    );
    r.register(
        "checksum",
        "Digest of a file's contents (default sha256)",
        "checksum FILE [ALGORITHM]",
        |a: &[String]| {
            require(a, 1, "checksum FILE [ALGORITHM]")?;
            let algorithm = known(a.get(1).map_or(DEFAULT_ALGORITHM, String::as_str))?;
            if std::fs::metadata(&a[0])?.len() > MAX_CHECKSUM_BYTES {
                return Err(ShellError::invalid(format!("'{}' is too large to hash", a[0])));
            }
            let content = std::fs::read(&a[0])?;
            digest(algorithm, &content)
                .ok_or_else(|| ShellError::invalid(format!("unknown algorithm '{algorithm}'")))
        },
    );
}
