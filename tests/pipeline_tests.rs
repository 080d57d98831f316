// tests/pipeline_tests.rs

use qmfield::acquisition::{FieldAcquisition, StaticFieldSource};
use qmfield::selection::FixedCountsSampler;
use qmfield::service::run_session;
use qmfield::{
    Config, FieldOptimizer, FieldReading, MeasurementSystem, Pipeline, PipelineParams, PipelineReport, QmError, Vec3,
};
use serde_json::Value;

fn offline_config(seed: u64) -> Config {
    Config {
        offline: true,
        seed: Some(seed),
        shots: 200,
        ..Config::default()
    }
}

#[test]
fn test_offline_run_uses_fallback_field() -> Result<(), QmError> {
    let mut pipeline = Pipeline::from_config(&offline_config(1))?;
    let params = PipelineParams {
        latitude: 40.0,
        longitude: -105.0,
        ..PipelineParams::default()
    };

    match pipeline.run(Some(params)) {
        PipelineReport::Success {
            field_data,
            optimized_configuration,
            measurements,
            ..
        } => {
            assert_eq!(field_data.field_strength, 45.7);
            assert_eq!(field_data.field_direction, Vec3::new(0.707, 0.0, 0.707));
            let location = field_data.location.expect("fallback carries the location");
            assert_eq!(location.latitude, 40.0);
            assert_eq!(optimized_configuration.optimal_state.len(), 4);
            assert!(optimized_configuration.probability > 0.0);
            let stats = measurements.expect("measurement should succeed");
            assert_eq!(stats.count, 1);
            assert_eq!(stats.interaction_strength_mean, 1.0);
        }
        other => panic!("expected success, got {:?}", other),
    }
    Ok(())
}

#[test]
fn test_same_seed_same_outcome() -> Result<(), QmError> {
    let mut a = Pipeline::from_config(&offline_config(17))?;
    let mut b = Pipeline::from_config(&offline_config(17))?;

    let (PipelineReport::Success { optimized_configuration: ca, measurements: ma, .. },
         PipelineReport::Success { optimized_configuration: cb, measurements: mb, .. }) = (a.run(None), b.run(None))
    else {
        panic!("offline runs should succeed");
    };
    assert_eq!(ca, cb);
    assert_eq!(ma, mb);
    Ok(())
}

#[test]
fn test_live_readings_are_weighted() -> Result<(), QmError> {
    let space = FieldReading::new("s", Vec3::new(10.0, 0.0, 0.0), 10.0, "NOAA SWPC");
    let ground = FieldReading::new("g", Vec3::new(0.0, 0.0, 1.0), 20.0, "USGS BOU");
    let mut pipeline = Pipeline::new(
        FieldAcquisition::new(Box::new(StaticFieldSource::new(Some(space), Some(ground))), "BOU"),
        FieldOptimizer::new(2, 10, Box::new(FixedCountsSampler::from_pairs([("01", 6), ("10", 4)]))),
        MeasurementSystem::with_seed(0.001, 0.0, 0)?,
    )
    .with_fallback(false);

    let PipelineReport::Success { field_data, optimized_configuration, .. } = pipeline.run(None) else {
        panic!("combined field should be available");
    };
    // 0.4·‖(10, 0, 0)‖ + 0.6·20
    assert!((field_data.field_strength - 16.0).abs() < 1e-12);
    assert!((field_data.field_direction.norm() - 1.0).abs() < 1e-9);
    assert!(field_data.location.is_none());
    assert_eq!(optimized_configuration.optimal_state, "01");
    assert!((optimized_configuration.probability - 0.6).abs() < 1e-12);
    assert!((optimized_configuration.field_parameters.normalized_parameters - 1.0 / 3.0).abs() < 1e-12);
    Ok(())
}

#[test]
fn test_sampler_failure_yields_zero_configuration() -> Result<(), QmError> {
    let mut pipeline = Pipeline::new(
        FieldAcquisition::new(Box::new(StaticFieldSource::empty()), "BOU"),
        FieldOptimizer::new(4, 10, Box::new(FixedCountsSampler::failing("backend offline"))),
        MeasurementSystem::with_seed(0.001, 0.01, 0)?,
    );
    let PipelineReport::Success { optimized_configuration, .. } = pipeline.run(None) else {
        panic!("sampler failures must not escalate");
    };
    assert_eq!(optimized_configuration.optimal_state, "0000");
    assert_eq!(optimized_configuration.probability, 0.0);
    assert_eq!(optimized_configuration.field_parameters.field_strength, 0.0);
    Ok(())
}

#[test]
fn test_session_over_offline_pipeline() -> Result<(), Box<dyn std::error::Error>> {
    let mut pipeline = Pipeline::from_config(&offline_config(3))?;
    let input = concat!(
        r#"{"event": "optimize", "params": {"altitude": 1200.0}}"#,
        "\n",
        r#"{"event": "optimize", "params": {"particle_properties": {"mass": -1.0}}}"#,
        "\n",
        "garbage\n",
    );
    let mut output = Vec::new();
    assert_eq!(run_session(&mut pipeline, input.as_bytes(), &mut output)?, 3);

    let replies: Vec<Value> = String::from_utf8(output)?
        .lines()
        .map(serde_json::from_str)
        .collect::<Result<_, _>>()?;
    assert_eq!(replies[0]["type"], "results");
    assert_eq!(replies[0]["data"]["field_data"]["location"]["altitude"], 1200.0);
    assert_eq!(replies[0]["data"]["measurements"]["count"], 1);
    // An invalid particle degrades the measurement stage only.
    assert_eq!(replies[1]["data"]["status"], "success");
    assert!(replies[1]["data"]["measurements"].is_null());
    assert_eq!(replies[2]["type"], "error");
    Ok(())
}
