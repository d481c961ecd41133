//! Run configuration parsing, validation and end-to-end runs from disk.

use std::fs;
use std::path::Path;

use albedo_common::Sensor;
use pipeline::{
    DateStatus, DirectoryFrameSource, FrameSource, Pipeline, PipelineError, RunConfig,
    SourceConfig, SourceError,
};
use quality_mask::TierName;
use test_utils::{
    boundaries, date, frame_store, melt_date, scenario_grid, temp_test_dir, write_frame,
    FrameBuilder,
};
use tokio_util::sync::CancellationToken;

fn base_yaml(frames_dir: &Path) -> String {
    format!(
        r#"
start_date: 2023-07-14
end_date: 2023-07-16
boundary: glacier.wkt
quality_tier: balanced
min_overlap_fraction: 0.10
min_count: 1
max_concurrency: 2
retry:
  max_attempts: 2
  initial_delay_ms: 1
  max_delay_ms: 2
source:
  type: directory
  path: {}
"#,
        frames_dir.display()
    )
}

fn parse(yaml: &str) -> RunConfig {
    RunConfig::from_yaml(yaml, Path::new("/tmp")).unwrap()
}

fn configuration_error(yaml: &str) -> String {
    match parse(yaml).validate() {
        Err(PipelineError::Configuration(msg)) => msg,
        other => panic!("expected a configuration error, got {:?}", other),
    }
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn test_standard_is_balanced() {
    let yaml = base_yaml(Path::new("/frames")).replace("quality_tier: balanced", "quality_tier: standard");
    let tier = parse(&yaml).resolve_tier().unwrap();
    assert_eq!(tier.name(), TierName::Balanced);
}

#[test]
fn test_screen_optional_override() {
    let yaml = format!("{}screen_optional: true\n", base_yaml(Path::new("/frames")));
    let tier = parse(&yaml).resolve_tier().unwrap();
    assert!(tier.screens_optional());
    assert!(tier.is_stricter_or_equal(&quality_mask::QualityTier::balanced()));
}

#[test]
fn test_custom_tier() {
    let yaml = base_yaml(Path::new("/frames")).replace(
        "quality_tier: balanced",
        "quality_tier: custom\ncustom:\n  basic_qa_max: 0\n  flags: [probable_cloud, inland_water]",
    );
    let config = parse(&yaml);
    assert!(config.validate().is_ok());

    let tier = config.resolve_tier().unwrap();
    assert_eq!(tier.name(), TierName::Custom);
    assert_eq!(tier.basic_qa_max(), 0);
    assert_eq!(tier.effective_flags().len(), 2);
}

#[test]
fn test_invalid_configurations() {
    let base = base_yaml(Path::new("/frames"));

    let msg = configuration_error(&base.replace("quality_tier: balanced", "quality_tier: paranoid"));
    assert!(msg.contains("paranoid"));

    configuration_error(&base.replace("quality_tier: balanced", "quality_tier: custom"));
    configuration_error(&base.replace(
        "quality_tier: balanced",
        "quality_tier: custom\ncustom:\n  flags: [no_such_flag]",
    ));
    configuration_error(&base.replace("start_date: 2023-07-14", "start_date: 2023-08-01"));
    configuration_error(&base.replace("min_overlap_fraction: 0.10", "min_overlap_fraction: 1.5"));
    configuration_error(&format!("{}min_overlap_area: -1.0\n", base));
    configuration_error(&base.replace("max_concurrency: 2", "max_concurrency: 0"));
    configuration_error(&base.replace("max_attempts: 2", "max_attempts: 0"));
}

#[test]
fn test_http_source_config() {
    let yaml = r#"
start_date: 2023-07-01
end_date: 2023-07-01
boundary: /data/glacier.geojson
source:
  type: http
  base_url: https://frames.example.org/api
"#;
    let config = parse(yaml);
    assert!(config.validate().is_ok());
    match &config.source {
        SourceConfig::Http {
            base_url,
            timeout_secs,
        } => {
            assert_eq!(base_url, "https://frames.example.org/api");
            assert_eq!(*timeout_secs, 60);
        }
        other => panic!("unexpected source {:?}", other),
    }
    assert!(config.build_source().is_ok());
}

// ============================================================================
// Directory source
// ============================================================================

#[tokio::test]
async fn test_directory_source_reads_both_sensors() {
    let terra = FrameBuilder::new(Sensor::Terra, melt_date(), scenario_grid()).build();
    let aqua = FrameBuilder::new(Sensor::Aqua, melt_date(), scenario_grid()).build();
    let store = frame_store(&[terra.clone(), aqua.clone()]);
    let source = DirectoryFrameSource::new(store.path());
    let region = scenario_grid().bbox();

    let frames = source.get_frames(melt_date(), &region).await.unwrap();
    assert_eq!(frames, vec![terra, aqua]);

    let missing = source.get_frames(date(2023, 7, 1), &region).await;
    assert_eq!(missing.unwrap_err(), SourceError::NoData);
}

#[tokio::test]
async fn test_directory_source_drops_frames_outside_region() {
    let store = frame_store(&[FrameBuilder::new(Sensor::Terra, melt_date(), scenario_grid()).build()]);
    let source = DirectoryFrameSource::new(store.path());
    let far_away = albedo_common::BoundingBox::new(50_000.0, 50_000.0, 51_000.0, 51_000.0);

    let result = source.get_frames(melt_date(), &far_away).await;
    assert_eq!(result.unwrap_err(), SourceError::NoData);
}

#[tokio::test]
async fn test_directory_source_corrupt_file_is_invalid() {
    let store = temp_test_dir();
    let dir = store.path().join("terra");
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("2023-07-15.json"), b"{ not a frame").unwrap();

    let source = DirectoryFrameSource::new(store.path());
    let result = source.get_frames(melt_date(), &scenario_grid().bbox()).await;
    assert!(matches!(result, Err(SourceError::Invalid(_))));
}

// ============================================================================
// Runs from a config file
// ============================================================================

#[tokio::test]
async fn test_run_from_config_file() {
    let workdir = temp_test_dir();
    let frames_dir = workdir.path().join("frames");
    write_frame(
        &frames_dir,
        &FrameBuilder::new(Sensor::Terra, melt_date(), scenario_grid())
            .code(64)
            .build(),
    );
    write_frame(
        &frames_dir,
        &FrameBuilder::new(Sensor::Terra, date(2023, 7, 16), scenario_grid())
            .all_invalid()
            .build(),
    );
    fs::write(workdir.path().join("glacier.wkt"), boundaries::FOUR_CELL_L).unwrap();

    let config_path = workdir.path().join("run.yaml");
    fs::write(&config_path, base_yaml(Path::new("frames"))).unwrap();

    let config = RunConfig::load(&config_path).unwrap();
    assert_eq!(config.boundary, workdir.path().join("glacier.wkt"));

    let pipeline = Pipeline::from_config(&config).unwrap();
    let report = pipeline
        .run(&config.date_range().unwrap(), &CancellationToken::new())
        .await;

    assert_eq!(report.status(date(2023, 7, 14)), Some(&DateStatus::NoData));
    assert_eq!(report.status(melt_date()), Some(&DateStatus::Ok { count: 4 }));
    assert_eq!(
        report.status(date(2023, 7, 16)),
        Some(&DateStatus::Degenerate { count: 0 })
    );
    assert_eq!(report.observations.len(), 1);

    let json: serde_json::Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
    assert_eq!(json["summary"]["ok"], 1);
    assert_eq!(json["summary"]["no_data"], 1);
    assert_eq!(json["summary"]["degenerate"], 1);
    assert_eq!(json["outcomes"]["2023-07-16"]["status"], "degenerate");
}

#[test]
fn test_malformed_boundary_is_fatal() {
    let workdir = tempfile::tempdir().unwrap();
    fs::create_dir_all(workdir.path().join("frames")).unwrap();
    fs::write(workdir.path().join("glacier.wkt"), boundaries::BOW_TIE).unwrap();

    let config = RunConfig::from_yaml(&base_yaml(Path::new("frames")), workdir.path()).unwrap();
    assert!(matches!(
        Pipeline::from_config(&config),
        Err(PipelineError::Boundary(_))
    ));
}

#[test]
fn test_missing_frame_directory_is_fatal() {
    let workdir = temp_test_dir();
    fs::write(workdir.path().join("glacier.wkt"), boundaries::FOUR_CELL_L).unwrap();

    let config = RunConfig::from_yaml(&base_yaml(Path::new("frames")), workdir.path()).unwrap();
    assert!(matches!(
        Pipeline::from_config(&config),
        Err(PipelineError::SourceSetup(_))
    ));
}
