//! crates/comic_courier_core/src/selector.rs
//!
//! The range-bounded random selector: given the latest comic number and a
//! user's configured range size, draws one comic number uniformly from the
//! most recent `range` comics.

use rand::Rng;

use crate::ports::{PortError, PortResult};

/// Draws a comic number uniformly from the inclusive interval
/// `[max(1, latest - range + 1), latest]`.
///
/// `range` is the number of most-recent comics eligible for selection. When
/// `latest < range` the lower bound collapses to 1 and the effective range
/// widens to `[1, latest]`; that is expected for young archives, not an
/// error. A selected number can never exceed `latest`, so a comic that does
/// not yet exist is never selected.
///
/// The generator is supplied by the caller, so tests can seed a
/// [`rand::rngs::StdRng`] and production code can pass [`rand::thread_rng`].
pub fn select_comic_number<R: Rng + ?Sized>(
    rng: &mut R,
    latest: i32,
    range: i32,
) -> PortResult<i32> {
    if range < 1 {
        return Err(PortError::InvalidRange(format!(
            "range size must be at least 1, got {range}"
        )));
    }
    if latest < 1 {
        return Err(PortError::InvalidRange(format!(
            "latest comic number must be at least 1, got {latest}"
        )));
    }

    let lower = (latest - range + 1).max(1);
    Ok(rng.gen_range(lower..=latest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_selection_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for &(latest, range) in &[(1, 1), (2, 1), (100, 1), (150, 100), (3000, 100), (10, 10)] {
            let lower = (latest - range + 1).max(1);
            for _ in 0..500 {
                let n = select_comic_number(&mut rng, latest, range).unwrap();
                assert!(
                    (lower..=latest).contains(&n),
                    "selected {n} outside [{lower}, {latest}] for range {range}"
                );
            }
        }
    }

    #[test]
    fn test_latest_150_range_100_selects_51_through_150() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen_lower = false;
        let mut seen_upper = false;
        for _ in 0..10_000 {
            let n = select_comic_number(&mut rng, 150, 100).unwrap();
            assert!((51..=150).contains(&n), "selected {n} outside [51, 150]");
            seen_lower |= n == 51;
            seen_upper |= n == 150;
        }
        assert!(seen_lower, "lower bound 51 never selected in 10k draws");
        assert!(seen_upper, "upper bound 150 never selected in 10k draws");
    }

    #[test]
    fn test_range_wider_than_archive_collapses_to_one() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen_first = false;
        for _ in 0..10_000 {
            let n = select_comic_number(&mut rng, 50, 100).unwrap();
            assert!((1..=50).contains(&n), "selected {n} outside [1, 50]");
            seen_first |= n == 1;
        }
        assert!(seen_first, "collapsed lower bound 1 never selected");
    }

    #[test]
    fn test_single_comic_archive_always_selects_it() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            assert_eq!(select_comic_number(&mut rng, 1, 1).unwrap(), 1);
            assert_eq!(select_comic_number(&mut rng, 1, 500).unwrap(), 1);
        }
    }

    #[test]
    fn test_non_positive_range_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        for bad in [0, -1, -100] {
            match select_comic_number(&mut rng, 100, bad) {
                Err(PortError::InvalidRange(msg)) => {
                    assert!(msg.contains(&bad.to_string()), "message should name {bad}: {msg}")
                }
                other => panic!("expected InvalidRange for range {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_non_positive_latest_is_rejected() {
        let mut rng = StdRng::seed_from_u64(1);
        for bad in [0, -3] {
            assert!(matches!(
                select_comic_number(&mut rng, bad, 100),
                Err(PortError::InvalidRange(_))
            ));
        }
    }

    #[test]
    fn test_deterministic_under_a_fixed_seed() {
        let mut a = StdRng::seed_from_u64(1234);
        let mut b = StdRng::seed_from_u64(1234);
        for _ in 0..100 {
            assert_eq!(
                select_comic_number(&mut a, 3000, 100).unwrap(),
                select_comic_number(&mut b, 3000, 100).unwrap()
            );
        }
    }
}
