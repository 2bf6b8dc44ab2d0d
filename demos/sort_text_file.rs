use std::path::{Path, PathBuf};

use ext_merge_sort::Driver;

use tikv_jemallocator::Jemalloc;
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn sort_with_defaults(input_path: &Path, output_path: &Path, temp_dir: &Path) -> anyhow::Result<()> {
    let mut driver = Driver::new(input_path.to_path_buf(), output_path.to_path_buf());
    driver.with_temp_dir(temp_dir.to_path_buf());
    driver.run()?;
    Ok(())
}

fn sort_tuned_for_ssd(input_path: &Path, output_path: &Path, temp_dir: &Path) -> anyhow::Result<()> {
    let mut driver = Driver::new(input_path.to_path_buf(), output_path.to_path_buf());
    driver
        .with_temp_dir(temp_dir.to_path_buf())
        .with_hdd_mode(false)
        .with_chunk_size_mb(64)
        .with_sorter_count(num_cpus::get().saturating_sub(1).max(1));
    driver.run()?;
    Ok(())
}

// cargo run -r --example sort_text_file
pub fn main() -> anyhow::Result<()> {
    let input_path = PathBuf::from("./tests/fixtures/sorted-1000.dat");
    let default_output = PathBuf::from("./target/default-sorted-1000.dat");
    let ssd_output = PathBuf::from("./target/ssd-sorted-1000.dat");

    sort_with_defaults(&input_path, &default_output, Path::new("./target/tmp-default"))?;
    sort_tuned_for_ssd(&input_path, &ssd_output, Path::new("./target/tmp-ssd"))?;

    Ok(())
}
