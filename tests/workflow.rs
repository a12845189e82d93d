use std::path::Path;

use anyhow::Result;
use rusty_automl::automl::PredictOptions;
use rusty_automl::automl::estimators::ModelKind;
use rusty_automl::config;
use rusty_automl::data::loader::load_file;
use rusty_automl::session::SessionKey;
use rusty_automl::workflow::{Request, Response, Workflow};
use rusty_automl::{ErrorKind, WorkflowError};
use tempfile::TempDir;

/// `rows` passengers with an id, five features and a binary target that the
/// first two features mostly decide.
fn passengers_csv(rows: usize, with_target: bool) -> String {
    let mut out = String::from("id,age,distance,comfort,delay,class");
    if with_target {
        out.push_str(",satisfaction");
    }
    out.push('\n');
    for i in 0..rows {
        let comfort = (i * 7) % 5 + 1;
        let business = i % 3 != 0;
        let age = 20 + (i * 13) % 50;
        let distance = 300.0 + ((i * 37) % 97) as f64 * 12.5;
        let delay = ((i * 11) % 17) as f64;
        out.push_str(&format!(
            "{i},{age},{distance},{comfort},{delay},{}",
            if business { "Business" } else { "Eco" }
        ));
        if with_target {
            let satisfied = comfort as f64 + if business { 1.5 } else { 0.0 } > 3.5;
            out.push_str(if satisfied { ",satisfied" } else { ",dissatisfied" });
        }
        out.push('\n');
    }
    out
}

fn open(dir: &Path) -> Result<Workflow> {
    Ok(Workflow::open(dir, SessionKey::default())?)
}

fn write(dir: &Path, name: &str, contents: &str) -> Result<std::path::PathBuf> {
    let path = dir.join(name);
    std::fs::write(&path, contents)?;
    Ok(path)
}

#[test]
fn upload_round_trips_through_the_store() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    let uploaded = wf.upload_reader(passengers_csv(12, true).as_bytes())?;

    let stored = wf.current_dataset()?.expect("dataset stored");
    assert_eq!(stored.columns(), uploaded.columns());
    assert_eq!(stored.len(), 12);
    assert!(wf.session().dataset_store().exists());
    Ok(())
}

#[test]
fn stored_text_column_keeps_numeric_looking_codes() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    wf.upload_reader("code,y\n007,a\nabc,b\n1.50,a\n".as_bytes())?;

    let stored = wf.current_dataset()?.expect("dataset stored");
    let code: Vec<String> = stored.column(0).map(|c| c.to_csv_field()).collect();
    assert_eq!(code, ["007", "abc", "1.50"]);
    let on_disk = std::fs::read_to_string(wf.session().dir().join(config::DATASET_FILE))?;
    assert!(on_disk.contains("007"));
    Ok(())
}

#[test]
fn upload_accepts_json_records() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    let path = write(
        dir.path(),
        "upload.json",
        r#"[{"a": 1, "b": "x"}, {"a": 2.5, "b": null}]"#,
    )?;
    match wf.handle(Request::Upload(path))? {
        Response::Uploaded(table) => {
            assert_eq!(table.columns(), ["a".to_string(), "b".to_string()]);
            assert_eq!(table.len(), 2);
        }
        other => panic!("unexpected response {other:?}"),
    }
    Ok(())
}

#[test]
fn identifier_stripping_is_idempotent() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    wf.upload_reader(passengers_csv(8, true).as_bytes())?;

    let once = wf.modelling_table()?;
    let twice = once.drop_columns(config::IDENTIFIER_COLUMNS);
    assert_eq!(once, twice);
    assert!(!once.has_column("id"));
    Ok(())
}

#[test]
fn predicting_without_a_model_touches_nothing() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    let test_file = write(dir.path(), "test.csv", &passengers_csv(10, false))?;

    let err = wf
        .predict_path(&test_file, &PredictOptions::default())
        .unwrap_err();
    assert!(matches!(err, WorkflowError::MissingModel));
    assert_eq!(err.kind(), ErrorKind::Precondition);
    assert!(!wf.session().predictions_path().exists());
    assert!(!wf.session().model_path().exists());
    assert_eq!(std::fs::read_dir(wf.session().dir())?.count(), 0);
    Ok(())
}

#[test]
fn missing_test_columns_fail_as_inference_error() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    let mut train = String::from("A,B,C,target\n");
    for i in 0..30 {
        let class = i % 2;
        train.push_str(&format!("{},{},{},{}\n", i + class * 40, (i * 3) % 7, class, class));
    }
    wf.upload_reader(train.as_bytes())?;
    wf.train("target")?;

    let test_file = write(dir.path(), "test.csv", "A,B\n1,2\n3,4\n")?;
    let err = wf
        .predict_path(&test_file, &PredictOptions::default())
        .unwrap_err();
    assert!(matches!(err, WorkflowError::Inference(_)), "got {err:?}");
    assert_eq!(err.hint(), Some(config::INFERENCE_HINT));
    assert!(err.to_string().contains('C'));
    assert!(!wf.session().predictions_path().exists());
    Ok(())
}

#[test]
fn end_to_end_train_predict_download() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    wf.upload_reader(passengers_csv(100, true).as_bytes())?;

    let outcome = wf.train("satisfaction")?;
    assert!(outcome.model_path.is_file());
    assert_eq!(outcome.comparison.rows.len(), ModelKind::ALL.len());
    assert_eq!(outcome.summary.get("Session id"), Some("123"));
    assert_eq!(outcome.summary.get("Fold number"), Some("10"));
    assert!(outcome.holdout.accuracy > 0.8);

    let test_file = write(dir.path(), "test.csv", &passengers_csv(100, false))?;
    let inference = wf.predict_path(&test_file, &PredictOptions::default())?;
    assert_eq!(inference.predictions.len(), 100);
    assert_eq!(inference.predictions.width(), inference.input.width() + 1);
    assert!(inference.predictions.has_column(config::PREDICTION_LABEL_COLUMN));
    assert!(inference.scores.is_none());
    assert!(!inference.dataset_changed);

    let saved = load_file(&wf.session().predictions_path())?;
    assert_eq!(saved.len(), 100);
    assert_eq!(saved.columns(), inference.predictions.columns());

    let export = wf.export_model()?;
    assert_eq!(export.file_name, config::MODEL_FILE);
    assert_eq!(export.bytes, std::fs::read(wf.session().model_path())?);
    Ok(())
}

#[test]
fn test_file_with_target_is_scored() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    wf.upload_reader(passengers_csv(60, true).as_bytes())?;
    wf.train("satisfaction")?;

    let test_file = write(dir.path(), "test.csv", &passengers_csv(30, true))?;
    let inference = wf.predict_path(&test_file, &PredictOptions { include_score: true })?;
    let scores = inference.scores.expect("target present");
    assert!(scores.accuracy > 0.7);
    assert!(inference.predictions.has_column(config::PREDICTION_SCORE_COLUMN));
    Ok(())
}

#[test]
fn training_is_deterministic() -> Result<()> {
    let run = || -> Result<_> {
        let dir = TempDir::new()?;
        let wf = open(dir.path())?;
        wf.upload_reader(passengers_csv(80, true).as_bytes())?;
        Ok(wf.train("satisfaction")?)
    };
    let a = run()?;
    let b = run()?;
    assert_eq!(a.comparison.rows[0].kind, b.comparison.rows[0].kind);
    let scores = |o: &rusty_automl::workflow::TrainingOutcome| {
        o.comparison.rows.iter().map(|r| (r.kind, r.scores)).collect::<Vec<_>>()
    };
    assert_eq!(scores(&a), scores(&b));
    assert_eq!(a.holdout, b.holdout);
    Ok(())
}

#[test]
fn failed_save_keeps_the_comparison() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    wf.upload_reader(passengers_csv(40, true).as_bytes())?;
    // a directory where the model file should go makes the write fail
    std::fs::create_dir(wf.session().model_path())?;

    let err = wf.train("satisfaction").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Persistence);
    let comparison = err.comparison().expect("comparison kept");
    assert_eq!(comparison.rows.len(), ModelKind::ALL.len());
    Ok(())
}

#[test]
fn model_trained_on_an_older_upload_is_flagged() -> Result<()> {
    let dir = TempDir::new()?;
    let wf = open(dir.path())?;
    wf.upload_reader(passengers_csv(40, true).as_bytes())?;
    wf.train("satisfaction")?;
    wf.upload_reader(passengers_csv(50, true).as_bytes())?;

    let test_file = write(dir.path(), "test.csv", &passengers_csv(5, false))?;
    let inference = wf.predict_path(&test_file, &PredictOptions::default())?;
    assert!(inference.dataset_changed);

    let info = wf.model_info()?.expect("model present");
    assert_eq!(info.target, "satisfaction");
    assert!(info.dataset.is_some());
    Ok(())
}
