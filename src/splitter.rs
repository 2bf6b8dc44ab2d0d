use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::cancel::Cancel;
use crate::chunk::Chunk;
use crate::config::SortConfig;
use crate::error::SortError;
use crate::io_permit::{IoPermit, IoPermitGuard};
use crate::row::Row;

const RECV_POLL: Duration = Duration::from_millis(200);

/// Per-row byte estimate used to decide when a chunk is full, per the
/// reference implementation's `2*len(line) + 20` formula.
fn row_weight(line: &str) -> u64 {
    2 * line.len() as u64 + 20
}

/// Runs the reader -> sorters -> writer pipeline over `input_path`, producing
/// sorted run files under `config.temp_dir()`.
///
/// Returns the run paths sorted by file name, which is also chunk-index
/// order since the reader assigns indices monotonically.
pub(crate) fn split(input_path: &PathBuf, config: &SortConfig, cancel: &Cancel) -> Result<Vec<PathBuf>, SortError> {
    let io_permit = Arc::new(IoPermit::new(config.io_permits()));

    let (sort_tx, sort_rx) = bounded::<Chunk>(config.channel_capacity());
    let (write_tx, write_rx) = bounded::<Chunk>(config.channel_capacity());

    let reader_handle = {
        let input_path = input_path.clone();
        let config = config.clone();
        let cancel = cancel.clone();
        let io_permit = Arc::clone(&io_permit);
        thread::Builder::new()
            .name("splitter-reader".to_string())
            .spawn(move || read(&input_path, &config, sort_tx, &io_permit, &cancel))
            .expect("spawn reader thread")
    };

    let mut sorter_handles = Vec::with_capacity(config.sorter_count());
    for i in 0..config.sorter_count() {
        let sort_rx = sort_rx.clone();
        let write_tx = write_tx.clone();
        let cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name(format!("splitter-sorter-{i}"))
            .spawn(move || sort(sort_rx, write_tx, &cancel))
            .expect("spawn sorter thread");
        sorter_handles.push(handle);
    }
    // Drop the splitter's own senders/receivers so the channels close once
    // every thread-owned clone is gone.
    drop(sort_rx);
    drop(write_tx);

    let writer_handle = {
        let temp_dir = config.temp_dir().to_path_buf();
        let cancel = cancel.clone();
        thread::Builder::new()
            .name("splitter-writer".to_string())
            .spawn(move || write(write_rx, &temp_dir, &io_permit, &cancel))
            .expect("spawn writer thread")
    };

    let reader_result = reader_handle.join().expect("reader thread panicked");
    let mut sorter_error = None;
    for handle in sorter_handles {
        if let Err(e) = handle.join().expect("sorter thread panicked") {
            if sorter_error.is_none() {
                sorter_error = Some(e);
            }
        }
    }
    let writer_result = writer_handle.join().expect("writer thread panicked");

    // Prefer the first non-cancellation error so the caller sees the root
    // cause; fall back to a cancellation notice if nothing else fired.
    let mut cancelled = false;
    if let Err(e) = reader_result {
        if e.is_cancelled() {
            cancelled = true;
        } else {
            return Err(e);
        }
    }
    if let Some(e) = sorter_error {
        if e.is_cancelled() {
            cancelled = true;
        } else {
            return Err(e);
        }
    }
    match writer_result {
        Err(e) if e.is_cancelled() => {
            cancelled = true;
        }
        Err(e) => return Err(e),
        Ok(mut paths) => {
            if cancelled {
                return Err(SortError::Cancelled);
            }
            paths.sort();
            return Ok(paths);
        }
    }
    Err(SortError::Cancelled)
}

fn read(
    input_path: &PathBuf,
    config: &SortConfig,
    sort_tx: Sender<Chunk>,
    io_permit: &IoPermit,
    cancel: &Cancel,
) -> Result<Vec<PathBuf>, SortError> {
    let file = File::open(input_path).map_err(|e| SortError::io(format!("open {}", input_path.display()), e))?;
    let mut reader = BufReader::with_capacity(1 << 20, file);

    let estimated_rows = (config.chunk_size_bytes() / 50).max(16) as usize;
    let mut rows: Vec<Row> = Vec::with_capacity(estimated_rows);
    let mut estimate: u64 = 0;
    let mut index: usize = 0;

    // Held for the whole read loop below via an RAII guard rather than bare
    // acquire/release: `cancel.check()?` and `read_line(...)?` can both exit
    // this function early while the permit is held, and the guard's `Drop`
    // releases it on every such path, not just the success path.
    let mut guard = io_permit.acquire_guard();
    let mut line = String::new();
    loop {
        cancel.check()?;
        line.clear();
        let bytes = reader
            .read_line(&mut line)
            .map_err(|e| SortError::io(format!("read {}", input_path.display()), e))?;
        if bytes == 0 {
            break;
        }
        let trimmed = crate::chunk_stream::trim_newline(&line);
        if trimmed.is_empty() {
            continue;
        }
        let arc: Arc<str> = Arc::from(trimmed);
        let row = match Row::try_parse(&arc) {
            Some(row) => row,
            None => continue,
        };
        estimate += row_weight(trimmed);
        rows.push(row);

        if estimate >= config.chunk_size_bytes() {
            guard = flush_chunk(&mut rows, &mut index, &sort_tx, io_permit, cancel, estimated_rows, guard)?;
            estimate = 0;
        }
    }
    if !rows.is_empty() {
        guard = flush_chunk(&mut rows, &mut index, &sort_tx, io_permit, cancel, estimated_rows, guard)?;
    }
    guard.release();
    drop(sort_tx);
    Ok(Vec::new())
}

fn flush_chunk<'a>(
    rows: &mut Vec<Row>,
    index: &mut usize,
    sort_tx: &Sender<Chunk>,
    io_permit: &'a IoPermit,
    cancel: &Cancel,
    estimated_rows: usize,
    guard: IoPermitGuard<'a>,
) -> Result<IoPermitGuard<'a>, SortError> {
    let flushed = std::mem::replace(rows, Vec::with_capacity(estimated_rows));
    let chunk = Chunk::new(*index, flushed);
    *index += 1;

    guard.release();
    send_cancellable(sort_tx, chunk, cancel)?;
    Ok(io_permit.acquire_guard())
}

fn send_cancellable(tx: &Sender<Chunk>, mut chunk: Chunk, cancel: &Cancel) -> Result<(), SortError> {
    loop {
        cancel.check()?;
        match tx.send_timeout(chunk, RECV_POLL) {
            Ok(()) => return Ok(()),
            Err(crossbeam_channel::SendTimeoutError::Timeout(returned)) => {
                chunk = returned;
                continue;
            }
            Err(crossbeam_channel::SendTimeoutError::Disconnected(_)) => return Ok(()),
        }
    }
}

fn sort(sort_rx: Receiver<Chunk>, write_tx: Sender<Chunk>, cancel: &Cancel) -> Result<Vec<PathBuf>, SortError> {
    loop {
        cancel.check()?;
        match sort_rx.recv_timeout(RECV_POLL) {
            Ok(mut chunk) => {
                chunk.sort();
                send_cancellable(&write_tx, chunk, cancel)?;
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(Vec::new())
}

fn write(write_rx: Receiver<Chunk>, temp_dir: &PathBuf, io_permit: &IoPermit, cancel: &Cancel) -> Result<Vec<PathBuf>, SortError> {
    let mut paths = Vec::new();
    loop {
        cancel.check()?;
        let chunk = match write_rx.recv_timeout(RECV_POLL) {
            Ok(chunk) => chunk,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };

        let path = temp_dir.join(format!("chunk_{:03}.tmp", chunk.index()));
        io_permit.acquire();
        let result = write_chunk(&path, &chunk);
        io_permit.release();
        match result {
            Ok(()) => paths.push(path),
            Err(e) => {
                let _ = std::fs::remove_file(&path);
                return Err(e);
            }
        }
    }
    Ok(paths)
}

fn write_chunk(path: &PathBuf, chunk: &Chunk) -> Result<(), SortError> {
    let file = File::create(path).map_err(|e| SortError::io(format!("create {}", path.display()), e))?;
    let mut writer = BufWriter::with_capacity(4 << 20, file);
    for row in chunk.rows() {
        writer
            .write_all(row.line_ref().as_bytes())
            .and_then(|_| writer.write_all(b"\n"))
            .map_err(|e| SortError::io(format!("write {}", path.display()), e))?;
    }
    writer.flush().map_err(|e| SortError::io(format!("flush {}", path.display()), e))?;
    Ok(())
}
