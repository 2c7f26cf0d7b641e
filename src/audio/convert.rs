//! Sample format helpers for the playback path: channel mixing, sample-rate
//! conversion and output gain.

/// Mix interleaved multi-channel PCM down to mono by averaging channels.
pub fn downmix_to_mono(pcm: &[i16], channels: usize) -> Vec<i16> {
    if channels <= 1 {
        return pcm.to_vec();
    }
    pcm.chunks_exact(channels)
        .map(|frame| {
            let sum: i32 = frame.iter().map(|&s| i32::from(s)).sum();
            (sum / channels as i32) as i16
        })
        .collect()
}

/// Scale samples by `gain`, saturating at the i16 range.
pub fn apply_gain(pcm: &[i16], gain: f32) -> Vec<i16> {
    pcm.iter()
        .map(|&s| (f32::from(s) * gain).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16)
        .collect()
}

/// Streaming linear-interpolation resampler for mono PCM.
///
/// Keeps the last input sample and the fractional read position between calls
/// so consecutive frames join without clicks.
#[derive(Debug, Clone)]
pub struct LinearResampler {
    step: f64,
    pos: f64,
    prev: i16,
    passthrough: bool,
}

impl LinearResampler {
    pub fn new(input_rate: u32, output_rate: u32) -> Self {
        let passthrough = input_rate == output_rate || input_rate == 0 || output_rate == 0;
        Self {
            step: if passthrough {
                1.0
            } else {
                f64::from(input_rate) / f64::from(output_rate)
            },
            pos: 0.0,
            prev: 0,
            passthrough,
        }
    }

    pub fn process(&mut self, input: &[i16]) -> Vec<i16> {
        if self.passthrough {
            return input.to_vec();
        }
        let Some(&last) = input.last() else {
            return Vec::new();
        };

        // Position 0 is `prev`, position k is input[k - 1].
        let len = input.len() as f64;
        let mut out = Vec::with_capacity((len / self.step).ceil() as usize + 1);
        while self.pos < len {
            let i = self.pos.floor() as usize;
            let frac = self.pos - i as f64;
            let a = if i == 0 { self.prev } else { input[i - 1] };
            let b = input[i];
            let v = f64::from(a) + (f64::from(b) - f64::from(a)) * frac;
            out.push(v.round() as i16);
            self.pos += self.step;
        }
        self.pos -= len;
        self.prev = last;
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downmix_averages_stereo() {
        assert_eq!(downmix_to_mono(&[100, 300, -10, 10], 2), vec![200, 0]);
    }

    #[test]
    fn downmix_keeps_mono() {
        assert_eq!(downmix_to_mono(&[1, 2, 3], 1), vec![1, 2, 3]);
    }

    #[test]
    fn gain_scales_and_saturates() {
        assert_eq!(apply_gain(&[1000, -1000], 0.8), vec![800, -800]);
        assert_eq!(apply_gain(&[i16::MAX], 2.0), vec![i16::MAX]);
    }

    #[test]
    fn same_rate_is_passthrough() {
        let mut rs = LinearResampler::new(16000, 16000);
        assert_eq!(rs.process(&[5, 6, 7]), vec![5, 6, 7]);
    }

    #[test]
    fn halving_rate_halves_length() {
        let mut rs = LinearResampler::new(32000, 16000);
        let input: Vec<i16> = (0..1000).map(|i| i as i16).collect();
        let out = rs.process(&input);
        assert_eq!(out.len(), 500);
        // interpolation stays monotonic on a ramp
        assert!(out.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn length_is_preserved_across_chunks() {
        let mut rs = LinearResampler::new(44100, 16000);
        let chunk = vec![1000i16; 1152];
        let total: usize = (0..100).map(|_| rs.process(&chunk).len()).sum();
        let expected = 115200.0 * 16000.0 / 44100.0;
        assert!((total as f64 - expected).abs() <= 2.0, "got {}", total);
    }

    #[test]
    fn empty_input_yields_nothing() {
        let mut rs = LinearResampler::new(48000, 16000);
        assert!(rs.process(&[]).is_empty());
    }
}
