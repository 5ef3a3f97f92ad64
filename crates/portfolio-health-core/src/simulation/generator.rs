/// Deterministic normal-variate generator for the simulation analyses.
///
/// A Lehmer linear-congruential generator drives a polar Box–Muller
/// transform. The generator is a plain value: seeding it with the same
/// constant always reproduces the same draw sequence, and each analysis
/// owns its own instance, so concurrent runs never share state. The polar
/// transform produces normals in pairs; the second draw is cached in
/// `spare` and handed out on the next call.
#[derive(Debug, Clone)]
pub struct PathGenerator {
    state: u64,
    spare: Option<f64>,
}

/// Lehmer ("minimal standard") LCG constants.
const MULTIPLIER: u64 = 48_271;
const MODULUS: u64 = 2_147_483_647; // 2^31 - 1

impl PathGenerator {
    /// Seed the generator. Any seed is accepted; it is folded into the
    /// multiplicative group's valid range [1, modulus - 1].
    pub fn new(seed: u64) -> Self {
        Self {
            state: seed % (MODULUS - 1) + 1,
            spare: None,
        }
    }

    /// Next uniform draw in (0, 1).
    fn next_uniform(&mut self) -> f64 {
        self.state = self.state * MULTIPLIER % MODULUS;
        self.state as f64 / MODULUS as f64
    }

    /// Next standard-normal draw via the polar Box–Muller transform.
    pub fn next_standard_normal(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        loop {
            let u = 2.0 * self.next_uniform() - 1.0;
            let v = 2.0 * self.next_uniform() - 1.0;
            let s = u * u + v * v;
            if s > 0.0 && s < 1.0 {
                let factor = (-2.0 * s.ln() / s).sqrt();
                self.spare = Some(v * factor);
                return u * factor;
            }
        }
    }
}
