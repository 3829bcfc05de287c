use rand::Rng;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub base_ms: u64,
    pub max_ms: u64,
    pub jitter_pct: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_ms: 1_000,
            max_ms: 30_000,
            jitter_pct: 0.20,
        }
    }
}

/// base * 2^(attempt-1), capped, with +/- jitter_pct jitter.
pub fn next_delay_ms(attempt_no: u32, cfg: &RetryConfig, rng: &mut impl Rng) -> u64 {
    let exp = attempt_no.max(1) - 1;

    // If the shift overflows, let the cap handle it.
    let pow2 = 1_u64.checked_shl(exp).unwrap_or(u64::MAX);
    let delay = cfg.base_ms.saturating_mul(pow2).min(cfg.max_ms);

    let jitter_range = (delay as f64) * cfg.jitter_pct;
    if jitter_range <= 0.0 {
        return delay;
    }
    let jitter = rng.gen_range(-jitter_range..=jitter_range);

    ((delay as f64 + jitter).round().max(0.0) as u64).min(cfg.max_ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn delay_doubles_then_caps() {
        let cfg = RetryConfig {
            base_ms: 100,
            max_ms: 1_000,
            jitter_pct: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(7);

        let delays: Vec<u64> = (1..=6).map(|n| next_delay_ms(n, &cfg, &mut rng)).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1_000, 1_000]);
        assert_eq!(next_delay_ms(200, &cfg, &mut rng), 1_000);
    }

    #[test]
    fn jitter_stays_in_range() {
        let cfg = RetryConfig::default();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..200 {
            let d = next_delay_ms(1, &cfg, &mut rng);
            assert!((800..=1_200).contains(&d), "delay out of range: {d}");
        }
    }
}
