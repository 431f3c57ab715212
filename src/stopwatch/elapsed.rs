use std::fmt;

const MS_PER_SEC: u64 = 1_000;
const MS_PER_MIN: u64 = 60 * MS_PER_SEC;
const MS_PER_HOUR: u64 = 60 * MS_PER_MIN;

/// Elapsed time split into display fields.
///
/// Hours wrap at 60 like minutes and seconds do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Elapsed {
    pub hour: u64,
    pub minute: u64,
    pub second: u64,
    pub millisecond: u64,
    pub centisecond: u64,
}

impl Elapsed {
    pub fn from_millis(diff: u64) -> Self {
        let millisecond = diff % MS_PER_SEC;
        Self {
            hour: (diff / MS_PER_HOUR) % 60,
            minute: (diff / MS_PER_MIN) % 60,
            second: (diff / MS_PER_SEC) % 60,
            millisecond,
            centisecond: millisecond / 10,
        }
    }

    /// Total milliseconds recomposed from the fields.
    pub fn total_millis(&self) -> u64 {
        self.hour * MS_PER_HOUR
            + self.minute * MS_PER_MIN
            + self.second * MS_PER_SEC
            + self.millisecond
    }

    pub fn readout(&self) -> Readout {
        Readout {
            hour: pad2(self.hour),
            minute: pad2(self.minute),
            second: pad2(self.second),
            centisecond: pad2(self.centisecond),
        }
    }
}

/// Zero-padded strings handed to the render sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readout {
    pub hour: String,
    pub minute: String,
    pub second: String,
    pub centisecond: String,
}

impl fmt::Display for Readout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}.{}",
            self.hour, self.minute, self.second, self.centisecond
        )
    }
}

/// Pad to at least two digits. Wider values are kept whole.
pub fn pad2(value: u64) -> String {
    format!("{value:02}")
}
