use num::bigint::BigUint;
use rand::Rng;

use rabin27::alphabet::ALPHABET;
use rabin27::keygen::KeyPair;

// p = 3 (mod 4) and 5 (mod 8) primes in every combination
#[allow(dead_code)]
pub const FIXED_PRIMES: [(u32, u32); 5] = [(23, 37), (43, 59), (53, 101), (131, 149), (29, 31)];

// install a subscriber printing debug events, output is captured per test
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

#[allow(dead_code)]
pub fn fixed_keys() -> Vec<KeyPair> {
    FIXED_PRIMES
        .iter()
        .map(|&(p, q)| KeyPair::new(BigUint::from(p), BigUint::from(q)).unwrap())
        .collect()
}

// random text over the alphabet, including spaces
#[allow(dead_code)]
pub fn random_text<R: Rng>(rng: &mut R, max_len: usize) -> String {
    let len = rng.gen_range::<usize, usize, usize>(0, max_len + 1);
    (0..len)
        .map(|_| ALPHABET[rng.gen_range::<usize, usize, usize>(0, ALPHABET.len())])
        .collect()
}

// independent primality check by plain trial division
#[allow(dead_code)]
pub fn naive_is_prime(x: u64) -> bool {
    x >= 2 && (2..x).take_while(|d| d * d <= x).all(|d| x % d != 0)
}
