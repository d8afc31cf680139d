//! Selection from fixed value lists.

use rand::Rng;

/// Pick one item from the slice, or `None` if it is empty.
pub fn pick<'a, T, R: Rng>(rng: &mut R, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        None
    } else {
        Some(&items[rng.gen_range(0..items.len())])
    }
}

/// Pick one string from a non-empty static list.
pub fn pick_str<R: Rng>(rng: &mut R, items: &[&'static str]) -> &'static str {
    pick(rng, items).copied().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_pick_from_list() {
        let mut rng = StdRng::seed_from_u64(42);
        let items = ["a", "b", "c"];
        for _ in 0..20 {
            assert!(items.contains(pick(&mut rng, &items).unwrap()));
        }
    }

    #[test]
    fn test_pick_empty() {
        let mut rng = StdRng::seed_from_u64(42);
        let items: [u8; 0] = [];
        assert!(pick(&mut rng, &items).is_none());
        assert_eq!(pick_str(&mut rng, &[]), "");
    }
}
