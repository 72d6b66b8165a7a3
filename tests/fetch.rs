use std::fs;

use loanfetch::fetch::{fetch_dataset, FetchOptions};
use loanfetch::manifest::SuffixFilter;
use loanfetch::{DatasetRef, FetchError};

mod common;

use common::{write_files, FailingClient, StaticClient};

fn options(destination: std::path::PathBuf) -> FetchOptions {
    FetchOptions {
        destination,
        verbose: false,
        ..FetchOptions::default()
    }
}

#[test]
fn creates_missing_destination_with_parents() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    write_files(source.path(), &[("loan.csv", b"id\n1\n")]);

    let dest = work.path().join("data").join("raw");
    assert!(!dest.exists());

    let report = fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options(dest.clone()),
    )
    .expect("fetch");

    assert!(dest.is_dir());
    assert_eq!(report.destination, dest);
}

#[test]
fn loan_csv_scenario() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    let content = b"id,loan_amnt,term\n1077501,5000,36 months\n";
    write_files(source.path(), &[("loan.csv", content)]);

    let dest = work.path().join("data/raw");
    let report = fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options(dest.clone()),
    )
    .expect("fetch");

    assert_eq!(report.destination, dest);
    assert_eq!(report.copied_count(), 1);
    assert_eq!(report.copied[0].name, "loan.csv");
    assert_eq!(fs::read(dest.join("loan.csv")).expect("read"), content);
}

#[test]
fn empty_manifest_is_not_an_error() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    write_files(source.path(), &[("README.md", b"# loans\n")]);

    let dest = work.path().join("data/raw");
    let report = fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options(dest.clone()),
    )
    .expect("empty manifest");

    assert!(report.is_empty());
    assert_eq!(report.destination, dest);
    assert!(dest.is_dir());
    assert_eq!(fs::read_dir(&dest).expect("read dir").count(), 0);
}

#[test]
fn every_manifest_file_is_copied_byte_for_byte() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    let files: &[(&str, &[u8])] = &[
        ("loan.csv", b"id\n1\n2\n"),
        ("payments.csv", b"id,amount\n1,12.5\n"),
        ("binary.csv", &[0, 159, 146, 150, 255, b'\n']),
        ("notes.txt", b"ignored"),
    ];
    write_files(source.path(), files);

    let dest = work.path().join("raw");
    let report = fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options(dest.clone()),
    )
    .expect("fetch");

    assert_eq!(report.copied_count(), 3);
    for (name, content) in files.iter().filter(|(name, _)| name.ends_with(".csv")) {
        assert_eq!(&fs::read(dest.join(name)).expect("read copy"), content);
    }
    assert!(!dest.join("notes.txt").exists());

    let names: Vec<&str> = report.copied.iter().map(|file| file.name.as_str()).collect();
    assert_eq!(names, vec!["binary.csv", "loan.csv", "payments.csv"]);
}

#[test]
fn running_twice_is_safe() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    write_files(source.path(), &[("loan.csv", b"id\n1\n")]);

    let client = StaticClient::new(source.path());
    let dest = work.path().join("data/raw");
    let first = fetch_dataset(&client, &DatasetRef::default(), &options(dest.clone()))
        .expect("first run");
    let second = fetch_dataset(&client, &DatasetRef::default(), &options(dest.clone()))
        .expect("second run");

    assert_eq!(client.calls(), 2);
    assert_eq!(first.copied, second.copied);
    assert_eq!(fs::read(dest.join("loan.csv")).expect("read"), b"id\n1\n");
}

#[test]
fn second_run_overwrites_stale_content() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    write_files(source.path(), &[("loan.csv", b"id\n1\n")]);
    let dest = work.path().join("raw");
    write_files(&dest, &[("loan.csv", b"stale content that is longer\n")]);

    fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options(dest.clone()),
    )
    .expect("fetch");

    assert_eq!(fs::read(dest.join("loan.csv")).expect("read"), b"id\n1\n");
}

#[test]
fn download_failure_propagates_before_touching_destination() {
    let work = tempfile::tempdir().expect("tempdir");
    let dest = work.path().join("data/raw");

    let err = fetch_dataset(&FailingClient, &DatasetRef::default(), &options(dest.clone()))
        .expect_err("download fails");

    assert!(matches!(err, FetchError::Unauthorized { .. }));
    assert!(!dest.exists());
}

#[test]
fn custom_suffixes_and_summary() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    write_files(
        source.path(),
        &[
            ("loan.csv", b"id,amount\n1,10\n2,20\n"),
            ("loan.tsv", b"id\tamount\n1\t10\n"),
        ],
    );

    let options = FetchOptions {
        filter: SuffixFilter::new([".csv"]),
        summarize: true,
        ..options(work.path().join("raw"))
    };
    let report = fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options,
    )
    .expect("fetch");

    assert_eq!(report.copied_count(), 1);
    assert_eq!(report.summaries.len(), 1);
    assert_eq!(report.summaries[0].records, 2);
    assert_eq!(report.summaries[0].columns, vec!["id", "amount"]);
}

#[test]
fn report_serializes_to_json() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    write_files(source.path(), &[("loan.csv", b"id\n1\n")]);

    let report = fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options(work.path().join("raw")),
    )
    .expect("fetch");

    let value = serde_json::to_value(&report).expect("serialize");
    assert_eq!(value["dataset"], "adarshsng/lending-club-loan-data-csv");
    assert_eq!(value["provider"], "kaggle");
    assert_eq!(value["copied"][0]["name"], "loan.csv");
    assert_eq!(value["copied"][0]["bytes"], 5);
    assert!(value.get("summaries").is_none());
}

#[test]
fn hard_linked_destination_is_skipped_not_truncated() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    let content = b"id,loan_amnt\n1,5000\n";
    write_files(source.path(), &[("loan.csv", content)]);

    let dest = work.path().join("raw");
    fs::create_dir_all(&dest).expect("create dest");
    fs::hard_link(source.path().join("loan.csv"), dest.join("loan.csv")).expect("hard link");

    let report = fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options(dest.clone()),
    )
    .expect("fetch");

    assert!(report.copied.is_empty());
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].name, "loan.csv");
    assert_eq!(fs::read(source.path().join("loan.csv")).expect("read source"), content);
    assert_eq!(fs::read(dest.join("loan.csv")).expect("read dest"), content);
}

#[test]
fn dotfile_csvs_are_staged() {
    let source = tempfile::tempdir().expect("tempdir");
    let work = tempfile::tempdir().expect("tempdir");
    write_files(source.path(), &[(".loan.csv", b"id\n1\n"), ("a.csv", b"id\n2\n")]);

    let dest = work.path().join("raw");
    let report = fetch_dataset(
        &StaticClient::new(source.path()),
        &DatasetRef::default(),
        &options(dest.clone()),
    )
    .expect("fetch");

    let names: Vec<&str> = report.copied.iter().map(|file| file.name.as_str()).collect();
    assert_eq!(names, vec![".loan.csv", "a.csv"]);
    assert_eq!(fs::read(dest.join(".loan.csv")).expect("read"), b"id\n1\n");
}
