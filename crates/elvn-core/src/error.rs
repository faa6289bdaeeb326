use std::fmt;

/// Machine-readable error codes surfaced by the library and the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    UnknownEventKind,
    TruncatedEvent,
    FieldBoundary,
    MalformedItem,
    InvalidUtf8,
    TimestampOutOfRange,
    JournalReadFailed,
    JournalWriteFailed,
    LockContention,
}

impl ErrorCode {
    /// Every code, in table order.
    pub const ALL: [Self; 10] = [
        Self::ConfigParseError,
        Self::UnknownEventKind,
        Self::TruncatedEvent,
        Self::FieldBoundary,
        Self::MalformedItem,
        Self::InvalidUtf8,
        Self::TimestampOutOfRange,
        Self::JournalReadFailed,
        Self::JournalWriteFailed,
        Self::LockContention,
    ];

    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::UnknownEventKind => "E2001",
            Self::TruncatedEvent => "E2002",
            Self::FieldBoundary => "E2003",
            Self::MalformedItem => "E2004",
            Self::InvalidUtf8 => "E2005",
            Self::TimestampOutOfRange => "E2006",
            Self::JournalReadFailed => "E3001",
            Self::JournalWriteFailed => "E3002",
            Self::LockContention => "E3003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::UnknownEventKind => "Unknown event kind code",
            Self::TruncatedEvent => "Raw event shorter than its header",
            Self::FieldBoundary => "Raw event field boundary splits a character",
            Self::MalformedItem => "Malformed item payload",
            Self::InvalidUtf8 => "Journal line is not valid UTF-8",
            Self::TimestampOutOfRange => "Timestamp does not fit the raw event field",
            Self::JournalReadFailed => "Journal read failed",
            Self::JournalWriteFailed => "Journal write failed",
            Self::LockContention => "Lock contention",
        }
    }

    /// Optional remediation hint that can be surfaced to users.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in ~/.11/sync.toml and retry."),
            Self::UnknownEventKind
            | Self::TruncatedEvent
            | Self::FieldBoundary
            | Self::InvalidUtf8 => {
                Some("The line was skipped; run `elvn prune` to rewrite the journal without it.")
            }
            Self::MalformedItem => None,
            Self::JournalReadFailed => Some("Check that the journal file exists and is readable."),
            Self::JournalWriteFailed => Some("Check disk space and write permissions."),
            Self::TimestampOutOfRange => {
                Some("Use epoch milliseconds between 0 and 9999999999999.")
            }
            Self::LockContention => Some("Retry after the other `elvn` process releases its lock."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
