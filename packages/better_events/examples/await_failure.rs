//! Waits for a job to either finish or signal failure, whichever happens first.

use better_events::{BetterEmitter, Emitter, OnceError};
use futures::executor::block_on;
use futures::future::{Either, select};

fn main() {
    let job = BetterEmitter::<String>::new();

    let done = job.once("done");
    let failed = job.once("error");

    job.emit("error", &["disk full".to_string()]);

    match block_on(select(done, failed)) {
        Either::Left((result, _)) => println!("job finished: {result:?}"),
        Either::Right((Err(OnceError::Signaled(reason)), _)) => {
            println!("job failed: {}", reason.unwrap_or_default());
        }
        Either::Right((other, _)) => println!("job ended unexpectedly: {other:?}"),
    }

    // "done" never occurred, so its await is still pending.
    println!("pending awaits: {}", job.pending_awaits());
}
