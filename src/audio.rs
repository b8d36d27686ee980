//! Oscillator bank sonification.
//!
//! The radial sweep drives the gains of a fixed bank of sine voices whose
//! frequencies are chosen once at startup.

mod sonify;
mod system;
mod tuning;
mod voices;

pub use sonify::ToneMapper;
pub use system::AudioSystem;
pub use tuning::{ChordKind, Tuning, OCTAVE_GROUPS};
pub use voices::{BankSynth, VoiceBank, VoiceGains};
