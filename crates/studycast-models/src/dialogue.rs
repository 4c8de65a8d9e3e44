//! Dialogue lines and the speaker → voice table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Voice used for "Tom" by default.
pub const DEFAULT_TOM_VOICE: &str = "de-DE-ConradNeural";
/// Voice used for "Lisa" by default.
pub const DEFAULT_LISA_VOICE: &str = "de-DE-AmalaNeural";

/// One recognized line of a two-speaker script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueLine {
    /// Position among the non-empty lines of the script
    pub index: usize,
    /// Speaker name as it appeared before the colon
    pub speaker: String,
    /// Utterance with the speaker label stripped
    pub text: String,
}

/// A speaker and the synthesis voice assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEntry {
    pub speaker: String,
    pub voice: String,
}

/// Ordered mapping from speaker names to voice identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceProfile {
    entries: Vec<VoiceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceProfileError {
    #[error("voice profile is empty")]
    Empty,

    #[error("malformed voice entry '{0}', expected Name=voice")]
    Malformed(String),

    #[error("speaker '{0}' listed twice")]
    Duplicate(String),
}

impl Default for VoiceProfile {
    fn default() -> Self {
        Self {
            entries: vec![
                VoiceEntry {
                    speaker: "Tom".to_string(),
                    voice: DEFAULT_TOM_VOICE.to_string(),
                },
                VoiceEntry {
                    speaker: "Lisa".to_string(),
                    voice: DEFAULT_LISA_VOICE.to_string(),
                },
            ],
        }
    }
}

impl VoiceProfile {
    /// Build a profile from `(speaker, voice)` pairs.
    pub fn from_pairs<I, S, V>(pairs: I) -> Result<Self, VoiceProfileError>
    where
        I: IntoIterator<Item = (S, V)>,
        S: Into<String>,
        V: Into<String>,
    {
        let mut entries: Vec<VoiceEntry> = Vec::new();
        for (speaker, voice) in pairs {
            let speaker = speaker.into();
            if entries.iter().any(|e| e.speaker == speaker) {
                return Err(VoiceProfileError::Duplicate(speaker));
            }
            entries.push(VoiceEntry {
                speaker,
                voice: voice.into(),
            });
        }
        if entries.is_empty() {
            return Err(VoiceProfileError::Empty);
        }
        Ok(Self { entries })
    }

    /// Parse `"Tom=de-DE-ConradNeural,Lisa=de-DE-AmalaNeural"`.
    pub fn parse(spec: &str) -> Result<Self, VoiceProfileError> {
        let mut pairs = Vec::new();
        for part in spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (speaker, voice) = part
                .split_once('=')
                .map(|(s, v)| (s.trim(), v.trim()))
                .filter(|(s, v)| !s.is_empty() && !v.is_empty() && !s.contains(':'))
                .ok_or_else(|| VoiceProfileError::Malformed(part.to_string()))?;
            pairs.push((speaker.to_string(), voice.to_string()));
        }
        Self::from_pairs(pairs)
    }

    pub fn speakers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.speaker.as_str())
    }

    pub fn entries(&self) -> &[VoiceEntry] {
        &self.entries
    }

    /// Voice assigned to `speaker` (exact, case-sensitive).
    pub fn voice_for(&self, speaker: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.speaker == speaker)
            .map(|e| e.voice.as_str())
    }

    /// Match a script line against the known `Name:` labels.
    ///
    /// Returns the speaker and the utterance with the label and following
    /// whitespace stripped, or `None` for lines from unknown speakers.
    pub fn match_line<'a>(&'a self, line: &'a str) -> Option<(&'a str, &'a str)> {
        self.entries.iter().find_map(|entry| {
            line.strip_prefix(entry.speaker.as_str())
                .and_then(|rest| rest.strip_prefix(':'))
                .map(|rest| (entry.speaker.as_str(), rest.trim()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile() {
        let profile = VoiceProfile::default();
        assert_eq!(profile.voice_for("Tom"), Some(DEFAULT_TOM_VOICE));
        assert_eq!(profile.voice_for("Lisa"), Some(DEFAULT_LISA_VOICE));
        assert_eq!(profile.voice_for("lisa"), None);
    }

    #[test]
    fn test_match_line_strips_label() {
        let profile = VoiceProfile::default();
        assert_eq!(profile.match_line("Tom: Hello."), Some(("Tom", "Hello.")));
        assert_eq!(profile.match_line("Lisa:Hi there."), Some(("Lisa", "Hi there.")));
        assert_eq!(profile.match_line("MODERATOR: welcome"), None);
        assert_eq!(profile.match_line("tom: lowercase"), None);
        assert_eq!(profile.match_line("Tommy: not tom"), None);
    }

    #[test]
    fn test_parse_profile() {
        let profile = VoiceProfile::parse("Anna=en-US-AriaNeural, Ben=en-US-GuyNeural,Cara=x").unwrap();
        let speakers: Vec<_> = profile.speakers().collect();
        assert_eq!(speakers, vec!["Anna", "Ben", "Cara"]);
        assert_eq!(profile.voice_for("Ben"), Some("en-US-GuyNeural"));

        assert_eq!(VoiceProfile::parse(""), Err(VoiceProfileError::Empty));
        assert!(matches!(
            VoiceProfile::parse("Anna"),
            Err(VoiceProfileError::Malformed(_))
        ));
        assert!(matches!(
            VoiceProfile::parse("Anna=a,Anna=b"),
            Err(VoiceProfileError::Duplicate(_))
        ));
    }
}
