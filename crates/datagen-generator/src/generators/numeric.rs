//! Numeric value generators.

use rand::Rng;

/// Generate a random integer in the given range (inclusive).
pub fn generate_int_range<R: Rng>(rng: &mut R, min: i64, max: i64) -> i64 {
    rng.gen_range(min..=max)
}

/// Generate a random float in the given range (inclusive).
pub fn generate_float_range<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    rng.gen_range(min..=max)
}

/// Generate a monetary amount rounded to 2 decimal places.
pub fn generate_money<R: Rng>(rng: &mut R, min: f64, max: f64) -> f64 {
    (rng.gen_range(min..=max) * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_int_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = generate_int_range(&mut rng, 10, 20);
            assert!((10..=20).contains(&v));
        }
    }

    #[test]
    fn test_generate_float_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = generate_float_range(&mut rng, 0.0, 100.0);
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn test_generate_money() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let v = generate_money(&mut rng, 1.0, 500.0);
            assert!((1.0..=500.0).contains(&v));
            let cents = v * 100.0;
            assert!((cents - cents.round()).abs() < 1e-6);
        }
    }
}
