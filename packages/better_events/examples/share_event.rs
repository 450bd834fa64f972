//! Forwards an event from one emitter to another and awaits it on the second.

use better_events::{BetterEmitter, Emitter, await_once};
use futures::executor::block_on;

fn main() {
    let emitter1 = BetterEmitter::<&str>::new();
    let emitter2 = BetterEmitter::<&str>::new();

    // If emitter1 emits "go" it will also be emitted by emitter2.
    emitter1
        .share("go", Some(&emitter2))
        .expect("emitter2 is a capable emitter");

    let go = await_once(Some(&emitter2), "go").expect("emitter2 is a capable emitter");

    emitter1.emit("go", &["now"]);

    match block_on(go) {
        Ok(value) => println!("received event 'go' with {value:?}"),
        Err(error) => eprintln!("{error}"),
    }
}
