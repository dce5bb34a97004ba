/// Adler32-style rolling hash over a fixed-size window.
///
/// Two 16-bit sums (a, b) combined into a 32-bit digest. Sliding the window
/// by one byte is O(1).
const MOD_ADLER: u32 = 65521;

pub struct RollingHash {
    a: u32,
    b: u32,
    window_size: u32,
}

impl RollingHash {
    /// Hash the initial window.
    pub fn new(window: &[u8]) -> Self {
        // Accumulate in u64 and reduce once at the end.
        let mut a: u64 = 1;
        let mut b: u64 = 0;
        for &byte in window {
            a += byte as u64;
            b += a;
        }
        Self {
            a: (a % MOD_ADLER as u64) as u32,
            b: (b % MOD_ADLER as u64) as u32,
            window_size: window.len() as u32,
        }
    }

    /// Slide the window: drop `out` from the front, append `incoming` at the back.
    pub fn roll(&mut self, out: u8, incoming: u8) {
        let out = out as u32;
        let incoming = incoming as u32;

        self.a = (self.a + MOD_ADLER - out + incoming) % MOD_ADLER;
        self.b = (self.b + MOD_ADLER - 1 + self.a - (out * self.window_size) % MOD_ADLER)
            % MOD_ADLER;
    }

    pub fn digest(&self) -> u32 {
        (self.b << 16) | self.a
    }
}

/// Digest of `window` without keeping the rolling state.
pub fn hash_window(window: &[u8]) -> u32 {
    RollingHash::new(window).digest()
}
