use thiserror::Error;

/// One timed caption.
#[derive(Clone, Debug, PartialEq)]
pub struct Cue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum CueError {
    #[error("line {line}: expected `start end text`")]
    Malformed { line: usize },
    #[error("line {line}: bad timestamp `{value}`")]
    BadTime { line: usize, value: String },
}

/// Captions sorted by start time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CueTrack {
    cues: Vec<Cue>,
}

impl CueTrack {
    /// Cues with non-finite or inverted times are dropped.
    pub fn new(mut cues: Vec<Cue>) -> Self {
        cues.retain(|c| c.start.is_finite() && c.end.is_finite() && c.end > c.start);
        cues.sort_by(|a, b| a.start.total_cmp(&b.start));
        Self { cues }
    }

    /// Parse `start end text` lines (seconds). Blank lines and lines starting
    /// with `#` are skipped.
    pub fn parse(src: &str) -> Result<Self, CueError> {
        let mut cues = Vec::new();
        for (idx, raw) in src.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let mut parts = trimmed.splitn(3, char::is_whitespace);
            let (Some(start), Some(end), Some(text)) = (parts.next(), parts.next(), parts.next())
            else {
                return Err(CueError::Malformed { line });
            };
            let time = |v: &str| {
                v.parse::<f64>().map_err(|_| CueError::BadTime {
                    line,
                    value: v.to_string(),
                })
            };
            cues.push(Cue {
                start: time(start)?,
                end: time(end)?,
                text: text.trim().to_string(),
            });
        }
        Ok(Self::new(cues))
    }

    pub fn len(&self) -> usize {
        self.cues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    /// The cue showing at `position`; the later one wins on overlap.
    pub fn active(&self, position: f64) -> Option<&Cue> {
        let idx = self.cues.partition_point(|c| c.start <= position);
        self.cues[..idx].iter().rev().find(|c| position < c.end)
    }

    /// How far `position` is through the active cue, in `[0, 1]`.
    pub fn progress(&self, position: f64) -> Option<f32> {
        self.active(position)
            .map(|c| ((position - c.start) / (c.end - c.start)).clamp(0.0, 1.0) as f32)
    }
}
