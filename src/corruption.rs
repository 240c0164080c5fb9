//! Test-mode corruption injector. With probability 0.3, substitutes exactly
//! one character of an outbound data packet's message before it is sent, so
//! the NAK/retry path can be exercised end-to-end.

use rand::Rng;

const CORRUPTION_PROBABILITY: f64 = 0.3;

/// Substitutes the character at `pos`: next ASCII code point, or a space if
/// the original is ASCII 126.
fn substitute_at(message: &str, pos: usize) -> String {
    let mut chars: Vec<char> = message.chars().collect();
    let original = chars[pos];
    chars[pos] = if (original as u32) < 126 {
        char::from_u32(original as u32 + 1).unwrap_or(' ')
    } else {
        ' '
    };
    chars.into_iter().collect()
}

/// Possibly corrupts `message` in place. Returns true if a substitution was
/// made (useful for logging).
pub fn maybe_corrupt(message: &mut String, rng: &mut impl Rng) -> bool {
    if message.is_empty() || !rng.gen_bool(CORRUPTION_PROBABILITY) {
        return false;
    }

    let pos = rng.gen_range(0..message.chars().count());
    *message = substitute_at(message, pos);
    true
}
