use rand::Rng;

/// Characters a generated payload is drawn from.
pub const PAYLOAD_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Length of every generated payload.
pub const PAYLOAD_LEN: usize = 20;

/// Random lowercase alphanumeric payload of `PAYLOAD_LEN` characters.
pub fn random_payload<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..PAYLOAD_LEN)
        .map(|_| PAYLOAD_ALPHABET[rng.gen_range(0..PAYLOAD_ALPHABET.len())] as char)
        .collect()
}
