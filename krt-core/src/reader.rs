//! Asynchronous stream reader feeding the line queue.
//!
//! One spawned task owns the target's stdout and forwards every line into
//! an unbounded channel in arrival order. Reading and matching are fully
//! decoupled: the reader blocks only on the stream, the sequencer only on
//! the queue. When the stream ends the sender is dropped, which closes the
//! queue; `recv()` returning `None` is the sentinel that no more data will
//! ever arrive, distinct from "no data yet".

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::ChildStdout;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::debug;

/// Single-producer/single-consumer, unbounded, order-preserving queue of
/// captured log lines.
pub type LineQueue = UnboundedReceiver<String>;

/// Spawn the reader task for a captured stdout handle.
pub fn spawn_reader(stdout: ChildStdout) -> LineQueue {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).is_err() {
                        // Consumer is gone; the run already ended.
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    // An abruptly closed stream is surfaced by the
                    // sequencer's timeout, not by the reader.
                    debug!("target stream read failed: {e}");
                    break;
                }
            }
        }
    });
    rx
}
