//! Warnings emitted for recoverable data problems.

use std::sync::{Mutex, OnceLock};
use std::thread::{self, ThreadId};

use log::{Level, LevelFilter, Log, Metadata, Record};
use ndarray::{array, Array2};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tempfile::TempDir;

use sdf_io::{save_archive, subsample, SampleStore, SdfSamples, SplitSpec};

/// Keeps every record together with the thread that logged it, so tests
/// running in parallel only look at their own output.
struct CaptureLogger {
    records: Mutex<Vec<(ThreadId, Level, String)>>,
}

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        if let Ok(mut records) = self.records.lock() {
            records.push((thread::current().id(), record.level(), record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

fn logger() -> &'static CaptureLogger {
    static LOGGER: OnceLock<&'static CaptureLogger> = OnceLock::new();
    *LOGGER.get_or_init(|| {
        let logger: &'static CaptureLogger = Box::leak(Box::new(CaptureLogger {
            records: Mutex::new(Vec::new()),
        }));
        log::set_logger(logger).unwrap();
        log::set_max_level(LevelFilter::Trace);
        logger
    })
}

fn warnings_of_this_thread() -> Vec<String> {
    let id = thread::current().id();
    logger()
        .records
        .lock()
        .unwrap()
        .iter()
        .filter(|(thread, level, _)| *thread == id && *level == Level::Warn)
        .map(|(_, _, message)| message.clone())
        .collect()
}

#[test]
fn test_missing_archive_warns_once() {
    logger();
    let temp = TempDir::new().unwrap();
    let store = SampleStore::new(temp.path());
    let samples = SdfSamples::new(array![[0.1, 0.0, 0.0, 0.2]], array![[0.0, 0.0, 0.0, -0.1]]);
    for instance in ["a", "b"] {
        let relative = format!("ShapeNetV2/chair/{}.npz", instance);
        save_archive(&store.archive_path(relative.as_ref()), &samples).unwrap();
    }

    let split = SplitSpec::new().with_instances("ShapeNetV2", "chair", ["a", "missing", "b"]);
    let entries = store.resolve(&split).unwrap();
    assert_eq!(entries.len(), 2);

    let warnings = warnings_of_this_thread();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("ShapeNetV2/chair/missing.npz"));
}

#[test]
fn test_empty_group_subsample_warns() {
    logger();
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let positive = array![[0.1, 0.2, 0.3, 0.05], [0.2, 0.1, 0.0, 0.01]];
    let negative = Array2::<f32>::zeros((0, 4));

    let rows = subsample(&positive, &negative, 6, &mut rng).unwrap();
    assert_eq!(rows.nrows(), 3);

    let warnings = warnings_of_this_thread();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("neg"));
}

#[test]
fn test_complete_split_is_silent() {
    logger();
    let temp = TempDir::new().unwrap();
    let store = SampleStore::new(temp.path());
    let samples = SdfSamples::new(array![[0.1, 0.0, 0.0, 0.2]], array![[0.0, 0.0, 0.0, -0.1]]);
    save_archive(&store.archive_path("Set/lamp/x.npz".as_ref()), &samples).unwrap();

    let split = SplitSpec::new().with_instances("Set", "lamp", ["x"]);
    assert_eq!(store.resolve(&split).unwrap().len(), 1);
    assert!(warnings_of_this_thread().is_empty());
}
