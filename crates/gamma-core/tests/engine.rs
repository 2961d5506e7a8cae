//! Engine initialization from seed and prompt files on disk.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use gamma_core::fakes::StubTransport;
use gamma_core::{
    AssessmentBundle, Engine, EnginePaths, EngineSettings, Credential, GammaError,
    InvokerOptions, SeedConfig,
};
use tempfile::TempDir;

const SEED: &str = r#"{
  "architecture": "Gamma Finance",
  "version": "2.1.0",
  "operators": {
    "modes": [
      {"n": 1, "name": "Risk Classification", "phi_factor": 0.5, "weight": 0.4},
      {"n": 2, "name": "Business Summary", "phi_factor": 1.0, "weight": 0.3}
    ]
  },
  "models": {"default": "flash", "routes": {"Business Summary": "pro"}},
  "stages": [
    {"key": "risk_classification", "operator": "Risk Classification", "section": "section_1A"},
    {"key": "business_summary", "operator": "Business Summary", "section": "section_1"}
  ]
}"#;

fn write_prompts(dir: &Path, names: &[(&str, &str)]) {
    fs::create_dir_all(dir).unwrap();
    for (file, body) in names {
        fs::write(dir.join(file), body).unwrap();
    }
}

#[tokio::test]
async fn test_from_seed_dir_loads_templates_by_normalized_name() {
    let tmp = TempDir::new().unwrap();
    let prompts = tmp.path().join("prompts");
    write_prompts(
        &prompts,
        &[
            ("risk_classification.txt", "Risks in: {input_text}"),
            ("business_summary.txt", "Summarize: {input_text}"),
        ],
    );

    let stub = Arc::new(StubTransport::always("ok"));
    let orchestrator = Engine::from_seed_dir(
        SeedConfig::from_json_str(SEED).unwrap(),
        &prompts,
        stub.clone(),
        InvokerOptions::default(),
    )
    .unwrap();

    assert_eq!(orchestrator.plan().len(), 2);
    assert_eq!(orchestrator.labels().version, "2.1.0");

    let bundle = AssessmentBundle::new()
        .with_section("section_1A", "rates")
        .with_section("section_1", "widgets");
    let result = orchestrator.assess(&bundle).await;

    assert_eq!(result.results.len(), 2);
    let prompts: Vec<String> = stub.requests().into_iter().map(|r| r.prompt).collect();
    assert_eq!(prompts, vec!["Risks in: rates", "Summarize: widgets"]);
}

#[test]
fn test_missing_template_fails_at_startup() {
    let tmp = TempDir::new().unwrap();
    let prompts = tmp.path().join("prompts");
    write_prompts(&prompts, &[("risk_classification.txt", "{input_text}")]);

    let err = Engine::from_seed_dir(
        SeedConfig::from_json_str(SEED).unwrap(),
        &prompts,
        Arc::new(StubTransport::always("ok")),
        InvokerOptions::default(),
    )
    .err()
    .unwrap();

    assert!(matches!(err, GammaError::TemplateNotFound(name) if name == "Business Summary"));
}

#[test]
fn test_stage_with_unknown_operator_fails_at_startup() {
    let mut seed = SeedConfig::from_json_str(SEED).unwrap();
    seed.stages[1].operator = "Market Sizing".to_string();

    let tmp = TempDir::new().unwrap();
    let prompts = tmp.path().join("prompts");
    write_prompts(
        &prompts,
        &[
            ("risk_classification.txt", "{input_text}"),
            ("business_summary.txt", "{input_text}"),
        ],
    );

    let err = Engine::from_seed_dir(
        seed,
        &prompts,
        Arc::new(StubTransport::always("ok")),
        InvokerOptions::default(),
    )
    .err()
    .unwrap();

    assert!(matches!(err, GammaError::OperatorNotFound(name) if name == "Market Sizing"));
}

#[test]
fn test_load_reads_seed_file_and_builds_gemini_transport() {
    let tmp = TempDir::new().unwrap();
    let seed_path = tmp.path().join("seed.json");
    fs::write(&seed_path, SEED).unwrap();
    let prompts = tmp.path().join("prompts");
    write_prompts(
        &prompts,
        &[
            ("risk_classification.txt", "{input_text}"),
            ("business_summary.txt", "{input_text}"),
        ],
    );

    let paths = EnginePaths {
        seed: seed_path,
        prompts,
    };
    let settings = EngineSettings::new(Credential::new("k").unwrap());
    let orchestrator = Engine::load(&paths, &settings).unwrap();

    assert_eq!(orchestrator.registry().len(), 2);
    assert_eq!(orchestrator.invoker().models().model_for("Business Summary"), "pro");
}

#[test]
fn test_load_missing_seed_is_io_error() {
    let tmp = TempDir::new().unwrap();
    let paths = EnginePaths {
        seed: tmp.path().join("absent.json"),
        prompts: tmp.path().to_path_buf(),
    };
    let settings = EngineSettings::new(Credential::new("k").unwrap());

    let err = Engine::load(&paths, &settings).err().unwrap();
    assert!(matches!(err, GammaError::Io(_)));
}

#[test]
fn test_shipped_seed_and_prompts_validate() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("../..");
    let seed = SeedConfig::load(&root.join(".gamma/seed.json")).unwrap();

    let orchestrator = Engine::from_seed_dir(
        seed,
        &root.join("src/prompts"),
        Arc::new(StubTransport::always("ok")),
        InvokerOptions::default(),
    )
    .unwrap();

    assert_eq!(orchestrator.registry().len(), 3);
    assert_eq!(orchestrator.plan().len(), 3);
    assert!((orchestrator.plan().max_score() - 1.0).abs() < 1e-9);
}
