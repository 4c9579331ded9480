use super::features::{FeatureVector, NUM_FEATURES};

/// Min-max scales every feature to [0, 1] over one query's candidates.
///
/// Only documents that have a feature take part in its range. A feature with
/// the same value everywhere normalizes to 0.
pub fn normalize(vectors: &mut [FeatureVector]) {
    for feature in 1..=NUM_FEATURES {
        let (min, max) = vectors
            .iter()
            .filter_map(|vector| vector.get(feature))
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| (min.min(value), max.max(value)));

        if min > max {
            continue;
        }

        for vector in vectors.iter_mut() {
            if let Some(value) = vector.get(feature) {
                let normalized = if max > min { (value - min) / (max - min) } else { 0.0 };
                vector.set(feature, normalized);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::normalize;
    use crate::letor::FeatureVector;

    fn vector(values: &[(usize, f64)]) -> FeatureVector {
        let mut vector = FeatureVector::default();
        for &(feature, value) in values {
            vector.set(feature, value);
        }
        vector
    }

    #[test]
    fn test_min_max() {
        let mut vectors = vec![vector(&[(1, 2.0), (2, 5.0)]), vector(&[(1, 6.0), (2, 5.0)])];
        normalize(&mut vectors);

        assert_eq!(vectors[0].iter().collect::<Vec<_>>(), vec![(1, 0.0), (2, 0.0)]);
        assert_eq!(vectors[1].iter().collect::<Vec<_>>(), vec![(1, 1.0), (2, 0.0)]);
    }

    #[test]
    fn test_missing_values_stay_missing() {
        let mut vectors = vec![
            vector(&[(4, 1.0)]),
            vector(&[(6, 3.0)]),
            vector(&[(4, 3.0), (6, 1.0)]),
            vector(&[(4, 2.0)]),
        ];
        normalize(&mut vectors);

        assert_eq!(vectors[0].iter().collect::<Vec<_>>(), vec![(4, 0.0)]);
        assert_eq!(vectors[1].iter().collect::<Vec<_>>(), vec![(6, 1.0)]);
        assert_eq!(vectors[2].iter().collect::<Vec<_>>(), vec![(4, 1.0), (6, 0.0)]);
        assert_eq!(vectors[3].iter().collect::<Vec<_>>(), vec![(4, 0.5)]);
    }

    #[test]
    fn test_single_candidate() {
        let mut vectors = vec![vector(&[(3, 7.0)])];
        normalize(&mut vectors);

        assert_eq!(vectors[0].get(3), Some(0.0));
    }
}
