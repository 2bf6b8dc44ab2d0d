use ext_merge_sort::Driver;

mod common;

#[test]
fn cascades_through_several_passes_and_leaves_no_debris() -> Result<(), anyhow::Error> {
    let dir = common::setup();
    let input = dir.join("input.txt");
    // Large enough, at chunk_size_mb=1, to produce well over max_fan_in chunks
    // and force the cascade through multiple merge passes.
    let lines = common::generate_lines(150_000, 42);
    common::write_lines(&input, &lines);
    let output = dir.join("output.txt");
    let temp_dir = dir.join("temp");

    let mut driver = Driver::new(input, output.clone());
    driver
        .with_temp_dir(temp_dir.clone())
        .with_chunk_size_mb(1)
        .with_sorter_count(3)
        .with_max_fan_in(2);
    driver.run()?;

    let mut sorted_output = common::read_lines(&output);
    assert_eq!(sorted_output.len(), lines.len());
    let mut expected = sorted_output.clone();
    expected.sort();
    assert_eq!(sorted_output, expected);

    // conservation: same multiset in and out
    let mut input_sorted = lines.clone();
    input_sorted.sort();
    sorted_output.sort();
    assert_eq!(sorted_output, input_sorted);

    assert!(!temp_dir.exists(), "driver must remove its temp directory on success");
    Ok(())
}
