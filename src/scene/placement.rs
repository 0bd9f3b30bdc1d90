//! Bounded rejection sampling of spawn positions
//!
//! Candidates are drawn uniformly from the horizontal square
//! `[-half_extent, half_extent)` and the band `[min_height, max_height)`.
//! A candidate closer than `min_separation` to an accepted position is
//! rejected. Each entity gets `max_attempts_per_entity` tries per square
//! size; when they run out the square grows by `widen_factor`. After
//! `max_widenings` growths the last candidate is accepted as is.

use cgmath::{MetricSpace, Vector3};
use log::{debug, warn};
use rand::Rng;

use crate::config::SpawnConfig;

/// Samples `count` positions pairwise separated by `config.min_separation`
/// whenever the space allows it
pub fn sample_positions<R: Rng + ?Sized>(
    count: usize,
    config: &SpawnConfig,
    rng: &mut R,
) -> Vec<Vector3<f32>> {
    let mut accepted: Vec<Vector3<f32>> = Vec::with_capacity(count);
    let mut half_extent = config.half_extent.max(f32::EPSILON);
    let min_distance2 = config.min_separation * config.min_separation;
    let attempts = config.max_attempts_per_entity.max(1);

    for index in 0..count {
        let mut widenings = 0;
        let position = loop {
            let mut candidate = sample_one(half_extent, config, rng);
            let mut found = is_separated(&candidate, &accepted, min_distance2);

            for _ in 1..attempts {
                if found {
                    break;
                }
                candidate = sample_one(half_extent, config, rng);
                found = is_separated(&candidate, &accepted, min_distance2);
            }

            if found {
                break candidate;
            }

            if widenings >= config.max_widenings {
                warn!(
                    "Placement of entity {index} gave up after {widenings} widenings; accepting a position closer than {}",
                    config.min_separation
                );
                break candidate;
            }

            widenings += 1;
            half_extent *= config.widen_factor.max(1.0 + f32::EPSILON);
            debug!("Widening placement square to half extent {half_extent:.2}");
        };

        accepted.push(position);
    }

    accepted
}

fn sample_one<R: Rng + ?Sized>(half_extent: f32, config: &SpawnConfig, rng: &mut R) -> Vector3<f32> {
    let y = if config.max_height > config.min_height {
        rng.random_range(config.min_height..config.max_height)
    } else {
        config.min_height
    };
    Vector3::new(
        rng.random_range(-half_extent..half_extent),
        y,
        rng.random_range(-half_extent..half_extent),
    )
}

fn is_separated(candidate: &Vector3<f32>, accepted: &[Vector3<f32>], min_distance2: f32) -> bool {
    accepted
        .iter()
        .all(|p| p.distance2(*candidate) >= min_distance2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DioramaConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn default_batch_is_separated_and_in_bounds() {
        let config = DioramaConfig::default().spawn;
        let mut rng = StdRng::seed_from_u64(42);
        let positions = sample_positions(config.count, &config, &mut rng);

        assert_eq!(positions.len(), 80);
        for (i, a) in positions.iter().enumerate() {
            assert!(a.x >= -15.0 && a.x < 15.0);
            assert!(a.z >= -15.0 && a.z < 15.0);
            assert!(a.y >= 1.0 && a.y < 5.0);
            for b in &positions[i + 1..] {
                assert!(a.distance(*b) >= 1.5);
            }
        }
    }

    #[test]
    fn widening_makes_room() {
        let mut config = DioramaConfig::default().spawn;
        config.half_extent = 1.0;
        config.max_attempts_per_entity = 50;
        let mut rng = StdRng::seed_from_u64(9);
        let positions = sample_positions(20, &config, &mut rng);

        assert_eq!(positions.len(), 20);
        for (i, a) in positions.iter().enumerate() {
            for b in &positions[i + 1..] {
                assert!(a.distance(*b) >= 1.5);
            }
        }
    }

    #[test]
    fn impossible_density_still_terminates() {
        let mut config = DioramaConfig::default().spawn;
        config.half_extent = 0.1;
        config.min_separation = 1000.0;
        config.max_attempts_per_entity = 10;
        config.max_widenings = 3;
        let mut rng = StdRng::seed_from_u64(1);

        let positions = sample_positions(5, &config, &mut rng);
        assert_eq!(positions.len(), 5);
    }

    #[test]
    fn zero_count_is_empty() {
        let config = DioramaConfig::default().spawn;
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_positions(0, &config, &mut rng).is_empty());
    }
}
