// End-to-end runs of the preprocess and inspect use cases on a tiny
// Quora-style corpus written to a temporary directory.

use burn::backend::NdArray;
use burn::data::dataloader::batcher::Batcher;
use burn::data::dataset::Dataset;
use std::{fs, path::Path};

use nli_preprocess::application::{
    config::PreprocessConfig,
    inspect_use_case::InspectUseCase,
    preprocess_use_case::PreprocessUseCase,
};
use nli_preprocess::data::{batcher::PairBatcher, dataset::PairDataset};
use nli_preprocess::infra::artifact_store::ArtifactStore;
use nli_preprocess::{PreprocessError, Split};

const TRAIN: &str = "1\tThe cat sat\tA cat sat down\t1\n0\tDogs bark\tThe cat sat\t2\n";
const DEV:   &str = "1\tThe cat ran\tA dog ran\t3\n";
const TEST:  &str = "hidden\tthe cat\tthe dog\t4\n";
const VECTORS: &str = "the 0.1 0.2 0.3\ncat 0.4 0.5 0.6\nsat 1.0 1.0 1.0\n";

/// Lay out data/, vectors.txt and a config file under `root`.
fn write_corpus(root: &Path, dev: &str, extra_keys: &str) -> PreprocessConfig {
    let data = root.join("data");
    fs::create_dir_all(&data).unwrap();
    fs::write(data.join("train.tsv"), TRAIN).unwrap();
    fs::write(data.join("dev.tsv"), dev).unwrap();
    fs::write(data.join("test.tsv"), TEST).unwrap();
    fs::write(root.join("vectors.txt"), VECTORS).unwrap();

    let config = format!(
        r#"{{
            "data_dir": "data",
            "embeddings_file": "vectors.txt",
            "target_dir": "out",
            "lowercase": true,
            "ignore_punctuation": false,
            "num_words": null,
            "stopwords": [],
            "bos": null,
            "eos": null{extra_keys}
        }}"#
    );
    let path = root.join("config.json");
    fs::write(&path, config).unwrap();
    PreprocessConfig::from_file(&path).unwrap()
}

#[test]
fn test_full_run_writes_aligned_artifacts() {
    let dir    = tempfile::tempdir().unwrap();
    let config = write_corpus(dir.path(), DEV, r#", "export_tokenizer": true"#);
    let out    = config.target_dir.clone();

    let summary = PreprocessUseCase::new(config).execute().unwrap();

    // _PAD_, _OOV_ + cat, sat, the, dogs, bark, a, down
    assert_eq!(summary.vocabulary_size, 9);
    assert_eq!(summary.labels, vec!["1", "0"]);
    assert_eq!(summary.embedding.matched, 3);
    assert_eq!(summary.embedding.missed, 5);
    assert_eq!(summary.embedding_dim, 3);

    let store = ArtifactStore::open(&out).unwrap();
    let dicts = store.load_dictionaries().unwrap();
    assert_eq!(dicts.words.get("cat"), Some(2));
    assert_eq!(dicts.words.get("sat"), Some(3));
    assert_eq!(dicts.words.get("the"), Some(4));

    let train = store.load_split(Split::Train).unwrap();
    assert_eq!(train[0].premise_indices, vec![4, 2, 3]);
    assert_eq!(train[0].label_index, 0);
    assert_eq!(train[1].label_index, 1);

    let dev = store.load_split(Split::Dev).unwrap();
    assert_eq!(dev[0].premise_indices, vec![4, 2, 1]);

    let test = store.load_split(Split::Test).unwrap();
    assert_eq!(test[0].label_index, -1);

    let matrix = store.load_embeddings().unwrap();
    assert_eq!(matrix.shape(), [9, 3]);
    assert!(matrix.row(0).iter().all(|&v| v == 0.0));
    assert_eq!(matrix.row(2), &[0.4, 0.5, 0.6]);

    assert!(out.join("preprocess_config.json").is_file());
    assert!(out.join("tokenizer.json").is_file());
    let report = fs::read_to_string(out.join("report.csv")).unwrap();
    assert_eq!(report.lines().count(), 4);
}

#[test]
fn test_inspect_decodes_a_stored_record() {
    let dir    = tempfile::tempdir().unwrap();
    let config = write_corpus(dir.path(), DEV, "");
    let out    = config.target_dir.clone();
    PreprocessUseCase::new(config).execute().unwrap();

    let inspect = InspectUseCase::open(&out).unwrap();
    let summary = inspect.summarize().unwrap();
    assert_eq!(summary.embedding_shape, [9, 3]);
    assert_eq!(summary.splits.len(), 3);
    assert_eq!(summary.splits[2].labelled, 0);

    let record = inspect.decode(Split::Dev, 0).unwrap();
    assert_eq!(record.id, "3");
    assert_eq!(record.premise, vec!["the", "cat", "_OOV_"]);
    assert_eq!(record.label.as_deref(), Some("1"));

    assert!(inspect.decode(Split::Dev, 5).is_err());
    assert_eq!(inspect.decode(Split::Test, 0).unwrap().label, None);
}

#[test]
fn test_runs_are_reproducible() {
    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    for dir in [&a, &b] {
        let config = write_corpus(dir.path(), DEV, "");
        PreprocessUseCase::new(config).execute().unwrap();
    }

    for file in ["worddict.json", "train_data.json", "embeddings.json"] {
        let left  = fs::read(a.path().join("out").join(file)).unwrap();
        let right = fs::read(b.path().join("out").join(file)).unwrap();
        assert_eq!(left, right, "{file} differs between runs");
    }
}

#[test]
fn test_unknown_dev_label_fails_the_run() {
    let dir    = tempfile::tempdir().unwrap();
    let config = write_corpus(dir.path(), "2\tThe cat ran\tA dog ran\t3\n", "");

    let err = PreprocessUseCase::new(config).execute().unwrap_err();
    let root = err.root_cause().downcast_ref::<PreprocessError>();
    assert!(matches!(root, Some(PreprocessError::UnknownLabel { .. })), "{err:#}");
}

#[test]
fn test_missing_test_file_writes_nothing() {
    let dir    = tempfile::tempdir().unwrap();
    let config = write_corpus(dir.path(), DEV, "");
    fs::remove_file(dir.path().join("data/test.tsv")).unwrap();
    let out = config.target_dir.clone();

    assert!(PreprocessUseCase::new(config).execute().is_err());
    assert!(!out.join("worddict.json").exists());
}

#[test]
fn test_stored_split_feeds_the_batcher() {
    let dir    = tempfile::tempdir().unwrap();
    let config = write_corpus(dir.path(), DEV, "");
    let out    = config.target_dir.clone();
    PreprocessUseCase::new(config).execute().unwrap();

    let records = ArtifactStore::open(&out).unwrap().load_split(Split::Train).unwrap();
    let dataset = PairDataset::new(records);
    let items: Vec<_> = (0..dataset.len()).filter_map(|i| dataset.get(i)).collect();

    let batch = PairBatcher::<NdArray>::new(Default::default()).batch(items);
    assert_eq!(batch.premises.dims(), [2, 3]);
    assert_eq!(batch.hypotheses.dims(), [2, 4]);
}

#[test]
fn test_failed_rerun_keeps_previous_artifacts() {
    let dir    = tempfile::tempdir().unwrap();
    let config = write_corpus(dir.path(), DEV, r#", "export_tokenizer": true"#);
    let out    = config.target_dir.clone();
    PreprocessUseCase::new(config.clone()).execute().unwrap();

    // Second run sees a different vocabulary and a ragged vectors file
    fs::write(dir.path().join("data/train.tsv"), "1\tZebras graze\tA zebra grazes\t1\n").unwrap();
    fs::write(dir.path().join("vectors.txt"), "the 0.1 0.2 0.3\ncat 0.4\n").unwrap();

    let err  = PreprocessUseCase::new(config).execute().unwrap_err();
    let root = err.root_cause().downcast_ref::<PreprocessError>();
    assert!(matches!(root, Some(PreprocessError::DimensionMismatch { .. })), "{err:#}");

    // out/ still holds the first run, and it is still consistent
    let store = ArtifactStore::open(&out).unwrap();
    let dicts = store.load_dictionaries().unwrap();
    assert_eq!(dicts.words.get("cat"), Some(2));
    assert_eq!(dicts.words.get("zebras"), None);
    assert_eq!(store.load_embeddings().unwrap().row(2), &[0.4, 0.5, 0.6]);
    assert!(out.join("tokenizer.json").is_file());

    let inspect = InspectUseCase::open(&out).unwrap();
    assert_eq!(inspect.summarize().unwrap().vocabulary_size, 9);
}

#[test]
fn test_rerun_drops_artifacts_it_no_longer_writes() {
    let dir    = tempfile::tempdir().unwrap();
    let config = write_corpus(dir.path(), DEV, r#", "export_tokenizer": true"#);
    let out    = config.target_dir.clone();
    PreprocessUseCase::new(config).execute().unwrap();
    assert!(out.join("tokenizer.json").is_file());

    let config = write_corpus(dir.path(), DEV, "");
    let summary = PreprocessUseCase::new(config).execute().unwrap();
    assert_eq!(summary.target_dir, out);
    assert!(!out.join("tokenizer.json").exists());
    assert!(out.join("preprocess_config.json").is_file());
    assert!(!dir.path().join("out.partial").exists());
}

#[test]
fn test_inspect_refuses_an_incomplete_run() {
    let dir    = tempfile::tempdir().unwrap();
    let config = write_corpus(dir.path(), DEV, "");
    let out    = config.target_dir.clone();
    PreprocessUseCase::new(config).execute().unwrap();

    fs::remove_file(out.join("preprocess_config.json")).unwrap();
    let err = InspectUseCase::open(&out).err().unwrap();
    assert!(matches!(
        err.downcast_ref::<PreprocessError>(),
        Some(PreprocessError::InvalidArtifact(_))
    ), "{err:#}");
}
