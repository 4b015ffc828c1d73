use std::path::PathBuf;

use canary_config::{load_validator, SpecLocation};
use canary_types::ProbeHandler;

fn bundled(name: &str) -> SpecLocation {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../validators")
        .join(name);
    SpecLocation::Path(path)
}

#[tokio::test]
async fn kubeflow_validator_loads() {
    let validator = load_validator(&bundled("kubeflow.yaml")).await.unwrap();

    assert_eq!(validator.name, "kubeflow");
    assert_eq!(validator.description, "Kubeflow notebooks");
    assert_eq!(validator.checks.len(), 6);
    assert_eq!(validator.ports[0].port, 8888);
    assert_eq!(validator.env[0].name, "NB_PREFIX");

    let user = &validator.checks[0];
    assert_eq!(user.name, "user");
    assert_eq!(user.description, "👩 User is jovyan");
    assert_eq!(user.probe.initial_delay_seconds, 0);
    assert!(matches!(user.handler(), Ok(ProbeHandler::Exec(_))));

    let origin = &validator.checks[5];
    assert_eq!(origin.name, "allow-origin-all");
    assert_eq!(origin.description, "🔓 Sets 'Access-Control-Allow-Origin: *' header");
    let http = origin.probe.http_get.as_ref().unwrap();
    assert_eq!(http.path, "/");
    assert_eq!(http.port, 8888);
    assert_eq!(http.http_headers[0].name, "User-Agent");
    assert_eq!(http.response_http_headers[0].name, "Access-Control-Allow-Origin");
    assert_eq!(http.response_http_headers[0].value, "*");
    assert_eq!(origin.probe.timeout_seconds, 60);
}

#[tokio::test]
async fn every_bundled_check_has_one_probe() {
    let validator = load_validator(&bundled("kubeflow.yaml")).await.unwrap();
    for check in &validator.checks {
        assert!(check.handler().is_ok(), "{} has no single probe", check.name);
    }
}
