use std::fs;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub fn setup() -> PathBuf {
    let dir = temp_file_name("./target/test-results/");
    fs::create_dir_all(&dir).unwrap_or_else(|_| panic!("failed to create results directory: {dir:?}"));
    dir
}

#[allow(dead_code)]
pub fn read_lines(path: &PathBuf) -> Vec<String> {
    let reader = BufReader::new(File::open(path).unwrap());
    reader.lines().map(|x| x.unwrap()).collect()
}

#[allow(dead_code)]
pub fn write_lines(path: &PathBuf, lines: &[String]) {
    let mut writer = BufWriter::new(File::create(path).unwrap());
    for line in lines {
        writeln!(writer, "{line}").unwrap();
    }
}

#[allow(dead_code)]
pub fn temp_file_name(dir: &str) -> PathBuf {
    let mut result = PathBuf::from(dir);
    let bytes: [u8; 16] = rand::random();
    let name: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    result.push(name);
    result
}

const WORDS: &[&str] = &["Apple", "Banana is yellow", "Cherry is the best", "Something", "Fig"];

/// Deterministic `N. T` fixture generator, seeded so test failures reproduce.
#[allow(dead_code)]
pub fn generate_lines(count: usize, seed: u64) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            let number: i64 = rng.gen_range(0..(1 << 31));
            let word = WORDS[rng.gen_range(0..WORDS.len())];
            format!("{number}. {word}")
        })
        .collect()
}
