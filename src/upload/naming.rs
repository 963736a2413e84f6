//! Public filename generation and human-readable sizes.

use rand::Rng;

const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a fresh letters-only name of `length` characters, with
/// `.extension` appended when one is given.
///
/// Collisions are unlikely, not impossible.
pub fn random_filename(length: usize, extension: Option<&str>) -> String {
    let mut rng = rand::rng();
    let mut name: String = (0..length)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();

    if let Some(ext) = extension.filter(|ext| !ext.is_empty()) {
        name.push('.');
        name.push_str(ext);
    }
    name
}

/// Formats a byte count as bytes/KB/MB/GB using 1024-byte steps.
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b < KB => format!("{b} bytes"),
        b if b < MB => format!("{:.2} KB", b as f64 / KB as f64),
        b if b < GB => format!("{:.2} MB", b as f64 / MB as f64),
        b => format!("{:.2} GB", b as f64 / GB as f64),
    }
}
