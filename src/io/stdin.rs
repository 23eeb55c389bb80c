//! Bounded stdin drain.
//!
//! Hook invocations may or may not supply an event body on stdin, and the
//! gate must never hang waiting for one. The drain reads until EOF, a byte
//! cap, or a fixed deadline, whichever comes first.

use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::time::{timeout, Instant};
use tracing::debug;

/// Hard cap on the event body size.
pub const MAX_STDIN_BYTES: usize = 2_000_000;

/// Read whatever is available on stdin within `limit`, lossily decoded as
/// UTF-8. Any runtime or read error degrades to an empty string.
pub fn read_stdin_with_timeout(limit: Duration) -> String {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(error) => {
            debug!(%error, "failed to build stdin runtime");
            return String::new();
        }
    };

    let bytes = runtime.block_on(async {
        let mut stdin = tokio::io::stdin();
        let mut collected: Vec<u8> = Vec::new();
        let mut chunk = [0u8; 65536];
        let deadline = Instant::now() + limit;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            match timeout(remaining, stdin.read(&mut chunk)).await {
                Ok(Ok(0)) => break,
                Ok(Ok(n)) => {
                    collected.extend_from_slice(&chunk[..n]);
                    if collected.len() >= MAX_STDIN_BYTES {
                        collected.truncate(MAX_STDIN_BYTES);
                        break;
                    }
                }
                Ok(Err(error)) => {
                    debug!(%error, "stdin read failed");
                    break;
                }
                Err(_) => break,
            }
        }
        collected
    });

    // A read still parked on the blocking pool must not stall process exit.
    runtime.shutdown_background();

    String::from_utf8_lossy(&bytes).into_owned()
}
