use rust_dataset_iterator::IteratorError;
use rust_dataset_iterator::database::DatabaseDescription;
use rust_dataset_iterator::keys::EXAMPLE_ID;
use rust_dataset_iterator::types::Value;
use rust_dataset_iterator::view::DatasetView;

#[test]
fn description_from_path_keeps_dataset_and_example_order() {
    let db = DatabaseDescription::from_path("tests/fixtures/database.json").unwrap();
    assert_eq!(db.dataset_names(), vec!["train", "dev"]);

    let train = db.example_source("train").unwrap();
    assert_eq!(train.keys().unwrap(), vec!["001", "002", "003"]);
    let ex = train.get_by_key("002").unwrap();
    assert_eq!(ex[EXAMPLE_ID], Value::from("002"));
    assert_eq!(
        ex["num_samples"].as_map().unwrap()["speech_source"],
        Value::Int64(1840)
    );
}

#[test]
fn get_examples_concatenates_named_datasets() {
    let db = DatabaseDescription::from_path("tests/fixtures/database.json").unwrap();
    let view = db.get_examples(&["dev", "train"]).unwrap();
    assert_eq!(view.len().unwrap(), 4);
    assert_eq!(view.keys().unwrap(), vec!["101", "001", "002", "003"]);
    assert_eq!(
        view.get_by_position(1).unwrap()[EXAMPLE_ID],
        Value::from("001")
    );
}

#[test]
fn missing_file_is_an_io_error() {
    let err = DatabaseDescription::from_path("tests/fixtures/does_not_exist.json").unwrap_err();
    assert!(matches!(err, IteratorError::Io(_)));
    assert!(err.to_string().contains("io error"));
}

#[test]
fn glob_merges_matching_files() {
    let db = DatabaseDescription::from_glob("tests/fixtures/split/*.json").unwrap();
    assert_eq!(db.dataset_names(), vec!["clean", "noisy"]);
    let all = db.get_examples(&["clean", "noisy"]).unwrap();
    assert_eq!(all.keys().unwrap(), vec!["c1", "c2", "n1"]);
}

#[test]
fn glob_rejects_duplicate_datasets_and_empty_matches() {
    match DatabaseDescription::from_glob("tests/fixtures/split/*") {
        Err(IteratorError::DuplicateKey { keys }) => assert_eq!(keys, vec!["clean"]),
        other => panic!("expected DuplicateKey, got {other:?}"),
    }
    assert!(matches!(
        DatabaseDescription::from_glob("tests/fixtures/split/*.nothing"),
        Err(IteratorError::Configuration { .. })
    ));
}
