mod clock;
mod engine;
mod mode;
mod sequencer;

pub use clock::SessionClock;
pub use engine::{FocusEngine, Snapshot, AUTO_START_DELAY_MS};
pub use mode::Mode;
pub use sequencer::{ModeSequencer, Transition, LONG_BREAK_EVERY};
