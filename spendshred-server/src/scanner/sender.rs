//! Service name derivation from `From` headers

/// Display name of a `From` header value.
///
/// `"Netflix" <billing@netflix.com>` becomes `Netflix`. A header with no
/// display name (`<noreply@x.com>`) yields an empty string, which callers
/// treat as "skip this message". A bare address without angle brackets is
/// returned as-is.
pub fn derive_sender_name(from: &str) -> String {
    let display = from.split('<').next().unwrap_or_default();
    display.trim().replace('"', "").trim().to_string()
}
