use clap::ValueEnum;

/// Instant snapshot endpoints.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InstantKind {
    Primary,
    Scan,
    Status,
}

impl InstantKind {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Primary => "/data",
            Self::Scan => "/scan?scan_time=&single=true",
            Self::Status => "/imeon-status",
        }
    }
}

/// Aggregation window of `/api/monitor`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, derive_more::Display)]
pub enum MonitorRange {
    #[display("hour")]
    Hour,

    #[display("day")]
    Day,

    #[display("week")]
    Week,

    #[display("month")]
    Month,
}

/// Progress of a single instant fetch: one re-login, then one fallback at most.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Stage {
    Initial,
    RetriedLogin,
    TriedFallback,
}
