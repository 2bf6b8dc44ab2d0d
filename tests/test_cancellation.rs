use std::thread;
use std::time::Duration;

use ext_merge_sort::{Driver, SortError};

mod common;

#[test]
fn cancelling_mid_run_aborts_with_cancelled_error() -> Result<(), anyhow::Error> {
    let dir = common::setup();
    let input = dir.join("input.txt");
    let lines = common::generate_lines(500_000, 7);
    common::write_lines(&input, &lines);
    let output = dir.join("output.txt");

    let mut driver = Driver::new(input, output);
    driver.with_temp_dir(dir.join("temp")).with_chunk_size_mb(1).with_sorter_count(2);
    let cancel = driver.cancel_handle();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        cancel.cancel();
    });

    let result = driver.run();
    canceller.join().unwrap();

    let err = result.unwrap_err();
    assert!(matches!(err.root_cause().downcast_ref::<SortError>(), Some(SortError::Cancelled)));
    Ok(())
}
