use std::fs;

use lp_store::*;
use proptest::prelude::*;

#[test]
fn load_file_and_open() {
    let dir = std::env::temp_dir().join("lp_store_smoke");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("Engine.csv");
    fs::write(&path, "time,rpm,temp\n0.0,800,20.5\n0.1,850,20.7\n0.2,900,21.0\n").unwrap();

    let table = DelimitedTextLoader::new().load(&path).unwrap();
    assert_eq!(table.source_id.as_str(), "Engine.csv");

    let mut store = SignalStore::new();
    let model = store.open(table).unwrap();
    assert_eq!(model.variable_names().collect::<Vec<_>>(), ["rpm", "temp"]);
    assert_eq!(model.tick_max(), Some(2));

    let rpm = store.get("Engine.csv", "rpm").unwrap();
    assert!(rpm.data().is_integer());
    assert_eq!(rpm.len(), 3);

    let payload = DragPayload::new("Engine.csv", "temp");
    let temp = DragPayload::decode(&payload.encode())
        .unwrap()
        .resolve(&store)
        .unwrap();
    assert_eq!(temp.data().get(2), Some(21.0));

    fs::remove_file(&path).ok();
}

#[test]
fn missing_file_is_io_error() {
    let path = std::env::temp_dir().join("lp_store_smoke_missing").join("nope.csv");
    assert!(matches!(
        DelimitedTextLoader::new().load(&path),
        Err(StoreError::Io(_))
    ));
}

#[test]
fn close_lets_observers_read_then_releases() {
    let mut store = SignalStore::new();
    store
        .open(RawTable::new("Trans.log", vec![0.0, 1.0]).with_column("gear", vec![1_i64, 2]))
        .unwrap();
    let seen = std::rc::Rc::new(std::cell::Cell::new(None));
    let sink = seen.clone();
    store.subscribe(EventKind::Closed, move |event| {
        if let StoreEvent::Closed { model, .. } = event {
            sink.set(model.value_at("gear", 1));
        }
    });
    store.close("Trans.log").unwrap();
    assert_eq!(seen.get(), Some(2.0));
    assert!(matches!(
        store.close("Trans.log"),
        Err(StoreError::SourceMissing { .. })
    ));
}

proptest! {
    #[test]
    fn offset_shifts_time_not_data(
        offset in -1e3_f64..1e3,
        x in prop::collection::vec(-1e3_f64..1e3, 1..40),
    ) {
        let time: Vec<f64> = (0..x.len()).map(|i| i as f64 * 0.5).collect();
        let mut store = SignalStore::new();
        store
            .open(RawTable::new("s", time.clone()).with_column("x", x.clone()))
            .unwrap();
        let before = store.get("s", "x").unwrap();
        store.set_time_offset("s", offset).unwrap();
        let after = store.get("s", "x").unwrap();
        prop_assert_eq!(before.data(), after.data());
        for (t0, t1) in before.time().iter().zip(after.time()) {
            prop_assert_eq!(t1, t0 + offset);
        }
    }
}
