//! Device gamma ramps

/// Entries per color channel
pub const GAMMA_RAMP_SIZE: usize = 256;

/// Per-channel 16-bit lookup tables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GammaRamp {
    /// Red channel
    pub red: [u16; GAMMA_RAMP_SIZE],
    /// Green channel
    pub green: [u16; GAMMA_RAMP_SIZE],
    /// Blue channel
    pub blue: [u16; GAMMA_RAMP_SIZE],
}

impl Default for GammaRamp {
    fn default() -> Self {
        Self::linear()
    }
}

impl GammaRamp {
    /// Identity ramp
    pub fn linear() -> Self {
        Self::from_gamma(1.0)
    }

    /// Ramp following `x^gamma` on every channel
    pub fn from_gamma(gamma: f64) -> Self {
        let mut channel = [0u16; GAMMA_RAMP_SIZE];
        for (i, entry) in channel.iter_mut().enumerate() {
            let x = i as f64 / (GAMMA_RAMP_SIZE - 1) as f64;
            *entry = (x.powf(gamma) * f64::from(u16::MAX)).round() as u16;
        }
        Self {
            red: channel,
            green: channel,
            blue: channel,
        }
    }

    /// The three channels in red, green, blue order
    pub fn channels(&self) -> [&[u16; GAMMA_RAMP_SIZE]; 3] {
        [&self.red, &self.green, &self.blue]
    }
}

/// Largest spread between per-entry gamma estimates accepted in one channel
const MAX_GAMMA_SPREAD: f64 = 12.8;

/// Smallest average gamma accepted; lower values wash the display out
const MIN_AVERAGE_GAMMA: f64 = 0.2;

fn check_channel(ramp: &[u16; GAMMA_RAMP_SIZE]) -> bool {
    let first = u32::from(ramp[0]);
    let last = u32::from(ramp[GAMMA_RAMP_SIZE - 1]);
    if first >= last {
        log::trace!("Inverted or flat gamma ramp ({first}->{last}), rejected");
        return false;
    }
    let range = f64::from(last - first);

    let mut min = 0.0;
    let mut max = 0.0;
    let mut sum = 0.0;
    let mut samples = 0u32;
    for (i, &value) in ramp.iter().enumerate().take(GAMMA_RAMP_SIZE - 1).skip(1) {
        let value = u32::from(value);
        if value < first || value > last {
            log::trace!("Gamma ramp entry {i}={value} outside {first}->{last}, rejected");
            return false;
        }
        let offset = value - first;
        if offset == 0 {
            continue;
        }

        let log_x = (i as f64 / 255.0).ln();
        let log_y = (f64::from(offset) / range).ln();
        let gamma = log_y / log_x;
        // table-based logarithms in some callers magnify the error by 128
        let error = -log_x * 128.0 / (f64::from(offset) * log_x * log_x);

        if samples == 0 || min > gamma + error {
            min = gamma + error;
        }
        if samples == 0 || max < gamma - error {
            max = gamma - error;
        }
        sum += gamma;
        samples += 1;
    }

    if samples == 0 {
        return false;
    }
    let average = sum / f64::from(samples);
    if max - min > MAX_GAMMA_SPREAD {
        log::trace!("Gamma ramp not uniform (max={max}, min={min}), rejected");
        return false;
    }
    if average < MIN_AVERAGE_GAMMA {
        log::trace!("Gamma {average:.3} too bright, rejected");
        return false;
    }
    true
}

/// Whether every channel of `ramp` is a plausible gamma curve
pub fn check_gamma_ramp(ramp: &GammaRamp) -> bool {
    ramp.channels().into_iter().all(check_channel)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plausible_ramps_accepted() {
        assert!(check_gamma_ramp(&GammaRamp::linear()));
        assert!(check_gamma_ramp(&GammaRamp::from_gamma(2.2)));
        assert!(check_gamma_ramp(&GammaRamp::from_gamma(0.5)));
    }

    #[test]
    fn test_flat_and_inverted_rejected() {
        let mut flat = GammaRamp::linear();
        flat.green = [0x8000; GAMMA_RAMP_SIZE];
        assert!(!check_gamma_ramp(&flat));

        let mut inverted = GammaRamp::linear();
        inverted.blue.reverse();
        assert!(!check_gamma_ramp(&inverted));
    }

    #[test]
    fn test_out_of_range_entry_rejected() {
        let mut ramp = GammaRamp::linear();
        ramp.red[GAMMA_RAMP_SIZE - 1] = 0x8000;
        ramp.red[200] = 0x9000;
        assert!(!check_gamma_ramp(&ramp));
    }

    #[test]
    fn test_too_bright_rejected() {
        assert!(!check_gamma_ramp(&GammaRamp::from_gamma(0.1)));
    }
}
