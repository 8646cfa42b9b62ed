//! Cookie-string parsing, used to pull the CSRF token out of the session
//! cookies the embedder hands us.

/// Returns the decoded value of the first `name=` entry in a
/// semicolon-delimited cookie string. `None` when no entry matches or the
/// string is empty. Pure function of its inputs.
pub fn read_cookie(cookie_string: &str, name: &str) -> Option<String> {
    cookie_string
        .split(';')
        .map(str::trim)
        .find_map(|entry| {
            entry
                .strip_prefix(name)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(percent_decode)
}

/// Decodes `%XX` escapes. Invalid escapes and byte sequences that don't form
/// utf-8 are passed through unchanged rather than rejected, the value is an
/// opaque credential either way.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let escape = (bytes[i] == b'%')
            .then(|| bytes.get(i + 1..i + 3))
            .flatten()
            .and_then(|hex| std::str::from_utf8(hex).ok())
            .and_then(|hex| u8::from_str_radix(hex, 16).ok());
        match escape {
            Some(byte) => {
                decoded.push(byte);
                i += 3;
            }
            None => {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
    }
    String::from_utf8(decoded).unwrap_or_else(|_| value.to_owned())
}
