//! Sound pressure estimate with adaptive DC-bias removal.
//!
//! MEMS microphones sit on a slowly drifting offset. The bias is tracked with
//! an exponential moving average of block means and subtracted from the block
//! peak, so only transient loudness counts towards the reading.

/// Converts raw S16LE blocks into pressure readings.
#[derive(Debug, Clone)]
pub struct LevelEstimator {
    bias: i32,
    alpha: f32,
    clamp: i32,
    expected_samples: usize,
}

impl LevelEstimator {
    /// * `expected_samples` - samples in a full block (block bytes / 2)
    /// * `alpha`            - smoothing factor, 0.98 keeps the bias slow
    /// * `clamp`            - bias stays within `[-clamp, clamp]`
    pub fn new(expected_samples: usize, alpha: f32, clamp: i32) -> Self {
        Self {
            bias: 0,
            alpha,
            clamp: clamp.abs(),
            expected_samples,
        }
    }

    pub fn bias(&self) -> i32 {
        self.bias
    }

    /// Whether a block of `bytes` bytes is long enough to be measured.
    /// Blocks holding fewer than half the expected samples are not.
    pub fn accepts(&self, bytes: usize) -> bool {
        let samples = bytes / 2;
        samples > 0 && samples * 2 >= self.expected_samples
    }

    /// Consume one block and return `peak - bias`.
    ///
    /// Blocks that are not `accepts`-ed (short reads, timeouts) leave the
    /// bias alone and read as 0.
    pub fn update(&mut self, block: &[u8]) -> i32 {
        if !self.accepts(block.len()) {
            return 0;
        }
        let samples = block.len() / 2;

        let mut sum: i64 = 0;
        let mut peak: i16 = 0;
        for pair in block.chunks_exact(2) {
            let sample = i16::from_le_bytes([pair[0], pair[1]]);
            sum += i64::from(sample);
            peak = peak.max(sample);
        }

        let mean = sum as f32 / samples as f32;
        let smoothed = self.bias as f32 * self.alpha + mean * (1.0 - self.alpha);
        // `as` truncates toward zero, which lets a silent input settle on 0.
        self.bias = (smoothed as i32).clamp(-self.clamp, self.clamp);

        i32::from(peak) - self.bias
    }
}
