//! Move selection from root visit counts.
//!
//! After a search, the root's per-child visit counts are turned into the
//! move actually played (arg-max or sampled) and into the visit distribution
//! recorded as a training target.

use engine_core::Action;
use rand::Rng;

/// How to pick a move from the root's visit counts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionMode {
    /// Most-visited child; the earliest child wins ties.
    Greedy,
    /// Sample with probability proportional to `visits^(1/temperature)`.
    Proportional { temperature: f32 },
    /// Sample from `softmax(visits / temperature)`.
    Softmax { temperature: f32 },
}

impl SelectionMode {
    /// Proportional sampling at `temperature`, or greedy when it is ~0.
    pub fn from_temperature(temperature: f32) -> Self {
        if temperature < 1e-6 {
            Self::Greedy
        } else {
            Self::Proportional { temperature }
        }
    }
}

/// Index of the first maximum in `visits`.
pub fn argmax(visits: &[u32]) -> Option<usize> {
    let mut best: Option<(usize, u32)> = None;
    for (i, &v) in visits.iter().enumerate() {
        match best {
            Some((_, best_v)) if v <= best_v => {}
            _ => best = Some((i, v)),
        }
    }
    best.map(|(i, _)| i)
}

/// Temperature-scaled weights `v^(1/T)`, normalized to sum to 1.
///
/// Returns all zeros if every count is zero.
pub fn power_weights(visits: &[u32], temperature: f32) -> Vec<f32> {
    let inv_t = 1.0 / temperature;
    let weights: Vec<f32> = visits
        .iter()
        .map(|&v| {
            let v = v as f32;
            if temperature == 1.0 {
                v
            } else {
                v.powf(inv_t)
            }
        })
        .collect();
    normalize(weights)
}

/// `softmax(v / T)` over visit counts, shifted by the max for stability.
pub fn softmax_weights(visits: &[u32], temperature: f32) -> Vec<f32> {
    let max = visits.iter().copied().max().unwrap_or(0) as f32;
    let weights = visits
        .iter()
        .map(|&v| ((v as f32 - max) / temperature).exp())
        .collect();
    normalize(weights)
}

fn normalize(mut weights: Vec<f32>) -> Vec<f32> {
    let total: f32 = weights.iter().sum();
    if total > 0.0 && total.is_finite() {
        for w in &mut weights {
            *w /= total;
        }
    } else {
        weights.iter_mut().for_each(|w| *w = 0.0);
    }
    weights
}

/// Sample an index from a probability distribution.
///
/// Returns `None` when no entry has positive mass.
pub fn sample_index<R: Rng + ?Sized>(probs: &[f32], rng: &mut R) -> Option<usize> {
    let r: f32 = rng.gen();
    let mut cumsum = 0.0;

    for (i, &p) in probs.iter().enumerate() {
        cumsum += p;
        if p > 0.0 && r < cumsum {
            return Some(i);
        }
    }

    // Fallback to last non-zero entry (handles floating point issues)
    probs.iter().rposition(|&p| p > 0.0)
}

/// Pick an index into `visits` according to `mode`.
pub fn select_index<R: Rng + ?Sized>(
    visits: &[u32],
    mode: SelectionMode,
    rng: &mut R,
) -> Option<usize> {
    let weights = match mode {
        SelectionMode::Greedy => return argmax(visits),
        SelectionMode::Proportional { temperature } if temperature > 1e-6 => {
            power_weights(visits, temperature)
        }
        SelectionMode::Softmax { temperature } if temperature > 1e-6 => {
            softmax_weights(visits, temperature)
        }
        _ => return argmax(visits),
    };
    sample_index(&weights, rng).or_else(|| argmax(visits))
}

/// Visit distribution over the full action space: `visits / root_visits` at
/// each child's action, zero elsewhere.
pub fn visit_distribution(
    visit_counts: &[(Action, u32)],
    root_visits: u32,
    num_actions: usize,
) -> Vec<f32> {
    let mut dist = vec![0.0; num_actions];
    if root_visits == 0 {
        return dist;
    }
    for &(action, visits) in visit_counts {
        if let Some(slot) = dist.get_mut(action as usize) {
            *slot = visits as f32 / root_visits as f32;
        }
    }
    dist
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn test_argmax_first_wins_ties() {
        assert_eq!(argmax(&[]), None);
        assert_eq!(argmax(&[3, 7, 7, 1]), Some(1));
        assert_eq!(argmax(&[0, 0, 0]), Some(0));
    }

    #[test]
    fn test_power_weights() {
        let w = power_weights(&[30, 70], 1.0);
        assert!((w[0] - 0.3).abs() < 1e-6);
        assert!((w[1] - 0.7).abs() < 1e-6);

        // Lower temperature sharpens the distribution
        let sharp = power_weights(&[30, 70], 0.5);
        assert!(sharp[1] > 0.8);

        assert_eq!(power_weights(&[0, 0], 1.0), vec![0.0, 0.0]);
    }

    #[test]
    fn test_softmax_weights() {
        let w = softmax_weights(&[1, 1, 1, 1], 1.0);
        for p in &w {
            assert!((p - 0.25).abs() < 1e-6);
        }

        // Large counts must not overflow
        let w = softmax_weights(&[10_000, 9_990], 1.0);
        assert!(w[0] > 0.99);
        assert!(w.iter().all(|p| p.is_finite()));
    }

    #[test]
    fn test_sample_index() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        let policy = vec![0.0, 0.5, 0.3, 0.2, 0.0];

        // Sample many times and check distribution
        let mut counts = [0u32; 5];
        for _ in 0..1000 {
            let i = sample_index(&policy, &mut rng).unwrap();
            counts[i] += 1;
        }

        // Index 0 and 4 should never be selected
        assert_eq!(counts[0], 0);
        assert_eq!(counts[4], 0);

        // Index 1 should be most common (~500), index 2 (~300), index 3 (~200)
        assert!(counts[1] > counts[2]);
        assert!(counts[2] > counts[3]);

        assert_eq!(sample_index(&[0.0, 0.0], &mut rng), None);
    }

    #[test]
    fn test_select_index_modes() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let visits = [2, 9, 9, 0];

        assert_eq!(select_index(&visits, SelectionMode::Greedy, &mut rng), Some(1));
        // Zero temperature degrades to greedy
        assert_eq!(
            select_index(&visits, SelectionMode::Softmax { temperature: 0.0 }, &mut rng),
            Some(1)
        );

        for _ in 0..200 {
            let i = select_index(
                &visits,
                SelectionMode::Proportional { temperature: 1.0 },
                &mut rng,
            )
            .unwrap();
            assert_ne!(i, 3, "unvisited child must never be sampled");
        }
    }

    #[test]
    fn test_from_temperature() {
        assert_eq!(SelectionMode::from_temperature(0.0), SelectionMode::Greedy);
        assert_eq!(
            SelectionMode::from_temperature(1.0),
            SelectionMode::Proportional { temperature: 1.0 }
        );
    }

    #[test]
    fn test_visit_distribution() {
        let dist = visit_distribution(&[(0, 3), (4, 6)], 10, 9);
        assert_eq!(dist.len(), 9);
        assert!((dist[0] - 0.3).abs() < 1e-6);
        assert!((dist[4] - 0.6).abs() < 1e-6);
        assert_eq!(dist[1], 0.0);

        assert_eq!(visit_distribution(&[(0, 3)], 0, 2), vec![0.0, 0.0]);
    }
}
