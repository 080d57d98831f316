// src/measurement/series.rs

use super::ParticleMeasurement;
use crate::core::Vec3;
use serde::{Deserialize, Serialize};

/// Append-only ordered history of measurements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementSeries {
    measurements: Vec<ParticleMeasurement>,
}

impl MeasurementSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, measurement: ParticleMeasurement) {
        self.measurements.push(measurement);
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    pub fn last(&self) -> Option<&ParticleMeasurement> {
        self.measurements.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParticleMeasurement> {
        self.measurements.iter()
    }
}

impl FromIterator<ParticleMeasurement> for MeasurementSeries {
    fn from_iter<I: IntoIterator<Item = ParticleMeasurement>>(iter: I) -> Self {
        Self { measurements: iter.into_iter().collect() }
    }
}

/// Summary statistics over a whole series (population standard deviation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub count: usize,
    pub position_mean: Vec3,
    pub position_std: Vec3,
    pub momentum_mean: Vec3,
    pub momentum_std: Vec3,
    pub spin_mean: Vec3,
    pub spin_z_std: f64,
    pub interaction_strength_mean: f64,
    pub interaction_strength_std: f64,
}

/// Two-pass mean and population standard deviation.
fn mean_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}

fn axis_stats<F>(series: &MeasurementSeries, pick: F) -> (Vec3, Vec3)
where
    F: Fn(&ParticleMeasurement) -> Vec3,
{
    let vectors: Vec<Vec3> = series.iter().map(pick).collect();
    let xs: Vec<f64> = vectors.iter().map(|v| v.x).collect();
    let ys: Vec<f64> = vectors.iter().map(|v| v.y).collect();
    let zs: Vec<f64> = vectors.iter().map(|v| v.z).collect();
    let (mx, sx) = mean_std(&xs);
    let (my, sy) = mean_std(&ys);
    let (mz, sz) = mean_std(&zs);
    (Vec3::new(mx, my, mz), Vec3::new(sx, sy, sz))
}

/// Per-axis statistics over the full series, `None` when it is empty.
pub fn aggregate(series: &MeasurementSeries) -> Option<SeriesStatistics> {
    if series.is_empty() {
        return None;
    }
    let (position_mean, position_std) = axis_stats(series, |m| m.position);
    let (momentum_mean, momentum_std) = axis_stats(series, |m| m.momentum);
    let (spin_mean, spin_std) = axis_stats(series, |m| m.spin);
    let strengths: Vec<f64> = series.iter().map(|m| m.interaction_strength).collect();
    let (interaction_strength_mean, interaction_strength_std) = mean_std(&strengths);

    Some(SeriesStatistics {
        count: series.len(),
        position_mean,
        position_std,
        momentum_mean,
        momentum_std,
        spin_mean,
        spin_z_std: spin_std.z,
        interaction_strength_mean,
        interaction_strength_std,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn measurement(p: [f64; 3], m: [f64; 3], spin_z: f64, strength: f64, t: f64) -> ParticleMeasurement {
        ParticleMeasurement {
            position: p.into(),
            momentum: m.into(),
            spin: Vec3::new(0.0, 0.0, spin_z),
            interaction_strength: strength,
            timestamp: t,
        }
    }

    #[test]
    fn test_empty_series_has_no_statistics() {
        assert!(aggregate(&MeasurementSeries::new()).is_none());
    }

    #[test]
    fn test_single_measurement_has_zero_std() {
        let series: MeasurementSeries =
            std::iter::once(measurement([1.0, 2.0, 3.0], [4.0, 5.0, 6.0], 7.0, 1.0, 0.0)).collect();
        let stats = aggregate(&series).unwrap();
        assert_eq!(stats.count, 1);
        assert_eq!(stats.position_mean, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(stats.position_std, Vec3::ZERO);
        assert_eq!(stats.momentum_std, Vec3::ZERO);
        assert_eq!(stats.spin_z_std, 0.0);
        assert_eq!(stats.interaction_strength_std, 0.0);
    }

    #[test]
    fn test_population_std() {
        let series: MeasurementSeries = vec![
            measurement([1.0, 0.0, 0.0], [0.0; 3], 1.0, 1.0, 0.0),
            measurement([3.0, 0.0, 0.0], [0.0; 3], 3.0, 0.0, 1.0),
        ]
        .into_iter()
        .collect();
        let stats = aggregate(&series).unwrap();
        assert_relative_eq!(stats.position_mean.x, 2.0);
        assert_relative_eq!(stats.position_std.x, 1.0);
        assert_relative_eq!(stats.spin_mean.z, 2.0);
        assert_relative_eq!(stats.spin_z_std, 1.0);
        assert_relative_eq!(stats.interaction_strength_mean, 0.5);
        assert_relative_eq!(stats.interaction_strength_std, 0.5);
    }
}
