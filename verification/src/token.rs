//! The proof token a linked resource must contain.

use keylink_types::Fingerprint;

const TOKEN_PREFIX: &str = "[Verifying my OpenPGP key: openpgp4fpr:";

/// The exact token expected for `fingerprint`.
pub fn expected_token(fingerprint: &Fingerprint) -> String {
    format!("{TOKEN_PREFIX}{}]", fingerprint.to_hex())
}

/// Find the proof token for `fingerprint` in `text`.
///
/// The fingerprint part is matched case-insensitively. Returns the line the
/// token was found on.
pub fn find_token<'a>(text: &'a str, fingerprint: &Fingerprint) -> Option<&'a str> {
    let wanted = expected_token(fingerprint).to_ascii_lowercase();
    text.lines()
        .find(|line| line.to_ascii_lowercase().contains(&wanted))
        .map(str::trim)
}
