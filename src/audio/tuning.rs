//! Voice frequency assignment.

use rand::Rng;

/// Octave groups the chord tones cycle through before wrapping
pub const OCTAVE_GROUPS: u32 = 8;

const NOTE_NAMES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

/// Chord shapes available for chord tuning (semitones above the root)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordKind {
    Major,
    Minor,
    Major7,
    Minor7,
    Dominant7,
    Sus2,
    Sus4,
    Diminished,
    Augmented,
}

impl ChordKind {
    pub const ALL: [ChordKind; 9] = [
        ChordKind::Major,
        ChordKind::Minor,
        ChordKind::Major7,
        ChordKind::Minor7,
        ChordKind::Dominant7,
        ChordKind::Sus2,
        ChordKind::Sus4,
        ChordKind::Diminished,
        ChordKind::Augmented,
    ];

    pub fn intervals(self) -> &'static [u32] {
        match self {
            ChordKind::Major => &[0, 4, 7],
            ChordKind::Minor => &[0, 3, 7],
            ChordKind::Major7 => &[0, 4, 7, 11],
            ChordKind::Minor7 => &[0, 3, 7, 10],
            ChordKind::Dominant7 => &[0, 4, 7, 10],
            ChordKind::Sus2 => &[0, 2, 7],
            ChordKind::Sus4 => &[0, 5, 7],
            ChordKind::Diminished => &[0, 3, 6],
            ChordKind::Augmented => &[0, 4, 8],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ChordKind::Major => "major",
            ChordKind::Minor => "minor",
            ChordKind::Major7 => "major 7th",
            ChordKind::Minor7 => "minor 7th",
            ChordKind::Dominant7 => "dominant 7th",
            ChordKind::Sus2 => "sus2",
            ChordKind::Sus4 => "sus4",
            ChordKind::Diminished => "diminished",
            ChordKind::Augmented => "augmented",
        }
    }
}

/// How voice indices map to pitches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tuning {
    /// Voice i sits i semitones above the base frequency
    EqualTemperament,

    /// Voices cycle through the chord tones, climbing one octave per pass
    Chord {
        /// Semitones above the base frequency (0 = A)
        key: u32,
        chord: ChordKind,
    },
}

impl Tuning {
    /// Pick a chord and key at random
    pub fn random_chord(rng: &mut impl Rng) -> Self {
        let chord = ChordKind::ALL[rng.gen_range(0..ChordKind::ALL.len())];
        let key = rng.gen_range(0..12);
        Tuning::Chord { key, chord }
    }

    /// Semitone offset of `voice` above the base frequency
    pub fn semitone(&self, voice: usize) -> u32 {
        match *self {
            Tuning::EqualTemperament => voice as u32,
            Tuning::Chord { key, chord } => {
                let notes = chord.intervals();
                let octave = (voice / notes.len()) as u32 % OCTAVE_GROUPS;
                key + notes[voice % notes.len()] + 12 * octave
            }
        }
    }

    /// Frequencies (Hz) of `count` voices above `base_hz`
    pub fn frequencies(&self, count: usize, base_hz: f32) -> Vec<f32> {
        (0..count)
            .map(|voice| base_hz * 2f32.powf(self.semitone(voice) as f32 / 12.0))
            .collect()
    }

    pub fn describe(&self) -> String {
        match *self {
            Tuning::EqualTemperament => "equal temperament".to_string(),
            Tuning::Chord { key, chord } => {
                format!("{} {}", NOTE_NAMES[key as usize % 12], chord.name())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn test_equal_temperament_spans_piano() {
        let freqs = Tuning::EqualTemperament.frequencies(88, 27.5);
        assert_eq!(freqs.len(), 88);
        assert_eq!(freqs[0], 27.5);
        assert!((freqs[12] - 55.0).abs() < 1e-3);
        assert!((freqs[48] - 440.0).abs() < 1e-2);
        // Successive voices differ by one semitone
        let ratio = freqs[1] / freqs[0];
        assert!((ratio - 2f32.powf(1.0 / 12.0)).abs() < 1e-5);
    }

    #[test]
    fn test_chord_tuning_cycles_through_chord_tones() {
        let tuning = Tuning::Chord {
            key: 3,
            chord: ChordKind::Major,
        };
        let semitones: Vec<u32> = (0..7).map(|v| tuning.semitone(v)).collect();
        assert_eq!(semitones, vec![3, 7, 10, 15, 19, 22, 27]);
    }

    #[test]
    fn test_chord_tuning_wraps_octave_groups() {
        let tuning = Tuning::Chord {
            key: 0,
            chord: ChordKind::Minor7,
        };
        // 4 notes x 8 octave groups = 32 voices before wrapping back down
        assert_eq!(tuning.semitone(32), tuning.semitone(0));
        assert_eq!(tuning.semitone(33), tuning.semitone(1));

        let freqs = tuning.frequencies(88, 27.5);
        assert_eq!(freqs.len(), 88);
        for voice in 0..88 {
            let pitch_class = tuning.semitone(voice) % 12;
            assert!(ChordKind::Minor7.intervals().contains(&pitch_class));
        }
    }

    #[test]
    fn test_random_chord_is_reproducible_with_seed() {
        let a = Tuning::random_chord(&mut StdRng::seed_from_u64(7));
        let b = Tuning::random_chord(&mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        match a {
            Tuning::Chord { key, .. } => assert!(key < 12),
            Tuning::EqualTemperament => panic!("expected a chord tuning"),
        }
    }
}
