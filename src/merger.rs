use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::cancel::Cancel;
use crate::chunk_stream::ChunkStream;
use crate::error::SortError;
use crate::row::Row;

const READ_BUFFER: usize = 4 << 20;
const WRITE_BUFFER: usize = 16 << 20;

/// Wraps a [`ChunkStream`] with its current Row so the pair can sit in a
/// `BinaryHeap`; ordering is delegated to Row, stream identity breaks
/// nothing since ties may resolve in either order per the Row contract.
struct HeapEntry {
    stream: ChunkStream,
}

impl HeapEntry {
    fn row(&self) -> &Row {
        self.stream.current().expect("HeapEntry only holds streams with data")
    }
}

impl Eq for HeapEntry {}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.row() == other.row()
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.row().cmp(other.row())
    }
}

/// Merges `runs` into a single sorted file at `final_path` using a bounded
/// fan-in cascade: while more runs remain than `max_fan_in`, collapse them in
/// contiguous batches into intermediate `passP_partQ.tmp` files, deleting
/// consumed inputs as each batch completes, until one final merge produces
/// `final_path`.
pub(crate) fn merge(runs: Vec<PathBuf>, final_path: &Path, temp_dir: &Path, max_fan_in: usize, cancel: &Cancel) -> Result<(), SortError> {
    if runs.is_empty() {
        File::create(final_path).map_err(|e| SortError::io(format!("create {}", final_path.display()), e))?;
        return Ok(());
    }

    let mut current = runs;
    let mut pass = 0usize;

    while current.len() > max_fan_in {
        cancel.check()?;
        let mut next = Vec::new();
        for (part, batch) in current.chunks(max_fan_in).enumerate() {
            cancel.check()?;
            let out_path = temp_dir.join(format!("pass{pass}_part{part}.tmp"));
            merge_batch(batch, &out_path, cancel)?;
            for input in batch {
                let _ = std::fs::remove_file(input);
            }
            next.push(out_path);
        }
        current = next;
        pass += 1;
    }

    merge_batch(&current, final_path, cancel)?;
    for input in &current {
        let _ = std::fs::remove_file(input);
    }

    Ok(())
}

/// K-way merges `inputs` into a single sorted file at `out_path`.
fn merge_batch(inputs: &[PathBuf], out_path: &Path, cancel: &Cancel) -> Result<(), SortError> {
    let mut heap: BinaryHeap<Reverse<HeapEntry>> = BinaryHeap::with_capacity(inputs.len());
    for path in inputs {
        let stream = ChunkStream::open(path, READ_BUFFER)?;
        if stream.has_data() {
            heap.push(Reverse(HeapEntry { stream }));
        }
    }

    let file = File::create(out_path).map_err(|e| SortError::io(format!("create {}", out_path.display()), e))?;
    let mut writer = BufWriter::with_capacity(WRITE_BUFFER, file);

    while let Some(Reverse(mut entry)) = heap.pop() {
        cancel.check()?;
        let line = entry.stream.current().expect("heap entry without data").line_ref().to_string();
        writer
            .write_all(line.as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| SortError::io(format!("write {}", out_path.display()), e))?;
        entry.stream.move_next()?;
        if entry.stream.has_data() {
            heap.push(Reverse(entry));
        }
    }

    writer.flush().map_err(|e| SortError::io(format!("flush {}", out_path.display()), e))?;
    Ok(())
}
