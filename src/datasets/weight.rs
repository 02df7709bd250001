/// Per-pixel class-balancing weights of one label mask.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightMap {
    /// weight of every class id in `0..=max(label)`
    pub class_weights: Vec<f32>,
    /// same layout as the label
    pub values: Vec<f32>,
}

/// Each pixel of class `c` gets `1 - count(c) / total`.
///
/// A mask holding a single class maps to all zeros.
pub fn class_balanced_weights(label: &[u8]) -> WeightMap {
    let Some(&max) = label.iter().max() else {
        return WeightMap {
            class_weights: Vec::new(),
            values: Vec::new(),
        };
    };
    let mut counts = vec![0usize; max as usize + 1];
    for &c in label {
        counts[c as usize] += 1;
    }
    let total = label.len() as f64;
    let class_weights: Vec<f32> = counts
        .iter()
        .map(|&n| (1.0 - n as f64 / total) as f32)
        .collect();
    let values = label.iter().map(|&c| class_weights[c as usize]).collect();
    WeightMap {
        class_weights,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirty_seventy_split() {
        let mut label = vec![0u8; 70];
        label.extend(vec![1u8; 30]);
        let w = class_balanced_weights(&label);
        assert_eq!(w.class_weights.len(), 2);
        assert!((w.class_weights[0] - 0.3).abs() < 1e-6);
        assert!((w.class_weights[1] - 0.7).abs() < 1e-6);
        assert!((w.values[0] - 0.3).abs() < 1e-6);
        assert!((w.values[99] - 0.7).abs() < 1e-6);
    }

    #[test]
    fn weighted_mass_matches_class_count() {
        let label: Vec<u8> = (0..1000u32).map(|i| u8::from(i % 7 == 0)).collect();
        let w = class_balanced_weights(&label);
        // sum_c n_c * (1 - n_c / N) over two classes
        let n1 = label.iter().filter(|&&c| c == 1).count() as f64;
        let n0 = 1000.0 - n1;
        let expected = n0 * (1.0 - n0 / 1000.0) + n1 * (1.0 - n1 / 1000.0);
        let got: f64 = w.values.iter().map(|&v| v as f64).sum();
        assert!((got - expected).abs() < 1e-2);
        assert!(w.values.iter().all(|&v| (0.0..1.0).contains(&v)));
    }

    #[test]
    fn background_only_is_all_zero() {
        let w = class_balanced_weights(&[0u8; 64]);
        assert_eq!(w.class_weights, vec![0.0]);
        assert!(w.values.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn absent_class_ids_still_get_a_weight() {
        let w = class_balanced_weights(&[0, 0, 2, 2]);
        assert_eq!(w.class_weights, vec![0.5, 1.0, 0.5]);
        assert_eq!(w.values, vec![0.5, 0.5, 0.5, 0.5]);
    }

    #[test]
    fn empty_label() {
        let w = class_balanced_weights(&[]);
        assert!(w.class_weights.is_empty());
        assert!(w.values.is_empty());
    }
}
