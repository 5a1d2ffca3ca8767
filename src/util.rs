/// Linear congruential generator used wherever the layout needs a tie-breaker.
///
/// Seeded identically for every simulation so layouts are reproducible.
#[derive(Clone, Debug)]
pub struct Lcg {
    state: u64,
}

const LCG_MULTIPLIER: u64 = 1_664_525;
const LCG_INCREMENT: u64 = 1_013_904_223;
const LCG_MODULUS: u64 = 1 << 32;

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % LCG_MODULUS,
        }
    }

    pub fn next_unit(&mut self) -> f32 {
        self.state = (LCG_MULTIPLIER * self.state + LCG_INCREMENT) % LCG_MODULUS;
        (self.state as f64 / LCG_MODULUS as f64) as f32
    }

    /// Tiny offset used to separate exactly coincident points.
    pub fn jiggle(&mut self) -> f32 {
        (self.next_unit() - 0.5) * 1e-6
    }
}

impl Default for Lcg {
    fn default() -> Self {
        Self::new(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_reproducible() {
        let mut first = Lcg::default();
        let mut second = Lcg::default();
        for _ in 0..16 {
            let value = first.next_unit();
            assert_eq!(value, second.next_unit());
            assert!((0.0..1.0).contains(&value));
        }
    }

    #[test]
    fn jiggle_is_tiny_and_nonzero() {
        let mut lcg = Lcg::default();
        let value = lcg.jiggle();
        assert!(value != 0.0);
        assert!(value.abs() <= 0.5e-6);
    }
}
