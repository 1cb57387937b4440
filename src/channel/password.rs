//! Random password generation for channels registered without one.

use rand::rngs::OsRng;
use rand::Rng;

/// Length of generated passwords.
pub const GENERATED_PASSWORD_LEN: usize = 12;

const PASSWORD_ALPHABET: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789!@#$%^&*()_+";

/// Draw a password uniformly from [`PASSWORD_ALPHABET`] using the OS CSPRNG.
pub fn generate_password() -> String {
    let mut rng = OsRng;
    (0..GENERATED_PASSWORD_LEN)
        .map(|_| PASSWORD_ALPHABET[rng.gen_range(0..PASSWORD_ALPHABET.len())] as char)
        .collect()
}
