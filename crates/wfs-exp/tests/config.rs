use std::fs;
use std::time::Duration;

use wfs_chart::AxisDomain;
use wfs_core::WfsError;
use wfs_exp::{ExperimentConfig, ProviderConfig};

const GITHUB_YAML: &str = r#"
provider:
  kind: github
  owner: octo
  repo: timings
  workflow: unfair-test-workflow
branch: experiment
runs: 4
polling:
  poll_interval_ms: 500
  max_wait_secs: 900
chart:
  fixed_domain:
    max_seconds: 100
    tick_seconds: 15
"#;

#[test]
fn github_config_fills_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("experiment.yaml");
    fs::write(&path, GITHUB_YAML).unwrap();
    let config = ExperimentConfig::load(&path).unwrap();

    assert_eq!(config.branch, "experiment");
    assert_eq!(config.runs, 4);
    assert_eq!(config.provider.workflow_file(), "unfair-test-workflow.yml");
    assert_eq!(config.provider.expected_run_name(), "unfair-test-workflow.yml");
    assert!(!config.aggregate.include_unsuccessful);
    assert_eq!(config.analysis.log_marker, "wait (120)");
    assert_eq!(config.chart.legend_columns, 3);

    let policy = config.polling.policy();
    assert_eq!(policy.poll_interval, Duration::from_millis(500));
    assert_eq!(policy.locate_interval, Duration::from_secs(10));
    assert_eq!(policy.max_wait, Some(Duration::from_secs(900)));

    assert!(config
        .layout()
        .experiment_dir(2)
        .ends_with("experiments/github/unfair-test-workflow/experiment_2"));
}

#[test]
fn gitlab_config_uses_pipeline_name() {
    let yaml = "provider:\n  kind: gitlab\n  base_url: https://gitlab.example.com\n  project_id: \"42\"\n";
    let config: ExperimentConfig = serde_yaml::from_str(yaml).unwrap();
    assert!(matches!(config.provider, ProviderConfig::Gitlab { .. }));
    assert_eq!(config.provider.platform(), "gitlab");
    assert_eq!(config.provider.workflow_name(), "pipeline");
    assert_eq!(config.runs, 15);
    config.validate().unwrap();

    let renamed: ExperimentConfig =
        serde_yaml::from_str(&format!("{yaml}experiment_name: limited-runners\n")).unwrap();
    assert!(renamed
        .layout()
        .workflow_dir()
        .ends_with("gitlab/limited-runners"));
}

#[test]
fn invalid_values_are_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.yaml");
    fs::write(&path, "provider:\n  kind: bitbucket\n").unwrap();
    assert!(matches!(ExperimentConfig::load(&path), Err(WfsError::Config(_))));

    fs::write(&path, format!("{GITHUB_YAML}\naggregate:\n  include_unsuccessful: true\n")).unwrap();
    let mut config = ExperimentConfig::load(&path).unwrap();
    assert!(config.aggregate.include_unsuccessful);
    config.polling.locate_attempts = 0;
    let err = config.validate().unwrap_err();
    assert_eq!(err.info().code, "config-locate-attempts");

    config.polling.locate_attempts = 1;
    config.chart.fixed_domain = Some(AxisDomain {
        max_seconds: f64::NAN,
        tick_seconds: 15.0,
    });
    let err = config.validate().unwrap_err();
    assert_eq!(err.info().code, "axis-domain");
    config.chart.fixed_domain = Some(AxisDomain {
        max_seconds: 0.0,
        tick_seconds: 15.0,
    });
    assert!(matches!(config.validate(), Err(WfsError::Config(_))));
}

#[test]
fn missing_file_is_an_io_error() {
    let err = ExperimentConfig::load(std::path::Path::new("/nonexistent/wfs.yaml")).unwrap_err();
    assert!(matches!(err, WfsError::Io(_)));
}
