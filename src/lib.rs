// Library surface for the binary, headless tests and reuse.
// Keep this lean: rendering and app state live with the binary in main.rs.
pub mod app_dirs;
pub mod config;
pub mod error;
pub mod highscores;
pub mod results_log;
pub mod runtime;
pub mod timing;

pub use error::{HighscoreError, Result};
pub use highscores::{HighscoreRecord, HighscoreStore, Validation};
pub use timing::{Clock, ManualClock, SystemClock, TapOutcome, TapState, TimingController};
