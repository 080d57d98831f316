// tests/prop_statistics.rs

use proptest::prelude::*;
use qmfield::measurement::{MeasurementSeries, aggregate};
use qmfield::selection::{label_to_parameters, select_configuration};
use qmfield::{Counts, ParticleMeasurement, Vec3};

fn measurement(values: (f64, f64, f64, f64)) -> ParticleMeasurement {
    let (p, m, s, i) = values;
    ParticleMeasurement {
        position: Vec3::new(p, -p, 0.5 * p),
        momentum: Vec3::new(m, 0.0, m),
        spin: Vec3::new(0.0, 0.0, s),
        interaction_strength: i,
        timestamp: 0.0,
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * (1.0 + a.abs().max(b.abs()))
}

proptest! {
    #[test]
    fn aggregation_ignores_order(
        values in prop::collection::vec((-1e3..1e3f64, -1e3..1e3f64, -1.0..1.0f64, 0.0..=1.0f64), 1..32)
    ) {
        let forward: MeasurementSeries = values.iter().copied().map(measurement).collect();
        let backward: MeasurementSeries = values.iter().rev().copied().map(measurement).collect();
        let a = aggregate(&forward).unwrap();
        let b = aggregate(&backward).unwrap();

        prop_assert_eq!(a.count, values.len());
        prop_assert!(close(a.position_mean.x, b.position_mean.x));
        prop_assert!(close(a.position_std.y, b.position_std.y));
        prop_assert!(close(a.momentum_mean.z, b.momentum_mean.z));
        prop_assert!(close(a.spin_z_std, b.spin_z_std));
        prop_assert!(close(a.interaction_strength_mean, b.interaction_strength_mean));
        prop_assert!(a.position_std.x >= 0.0 && a.interaction_strength_std >= 0.0);
    }

    #[test]
    fn selected_probability_is_a_frequency(counts in prop::collection::btree_map(0u64..16, 1u64..500, 1..16)) {
        let counts: Counts = counts.into_iter().map(|(s, c)| (format!("{:04b}", s), c)).collect();
        let total: u64 = counts.values().sum();
        let configuration = select_configuration(&counts, 4).unwrap();

        let best = counts.values().copied().max().unwrap();
        prop_assert_eq!(counts[&configuration.optimal_state], best);
        prop_assert!(close(configuration.probability, best as f64 / total as f64));
        let params = label_to_parameters(&configuration.optimal_state, 4).unwrap();
        prop_assert!((0.0..=100.0).contains(&params.field_strength));
    }
}
