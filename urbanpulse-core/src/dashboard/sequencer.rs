use std::{fmt, str::FromStr};

/// How overlapping simulation responses are reconciled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SequencingPolicy {
    /// Whichever response settles last is displayed, even if it was issued first.
    LastResolvedWins,
    /// A response older than the newest displayed one is discarded.
    #[default]
    LatestRequestWins,
}

impl FromStr for SequencingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-resolved" | "last_resolved" => Ok(SequencingPolicy::LastResolvedWins),
            "latest-request" | "latest_request" => Ok(SequencingPolicy::LatestRequestWins),
            other => Err(format!(
                "unknown sequencing policy '{}', expected 'last-resolved' or 'latest-request'",
                other
            )),
        }
    }
}

impl fmt::Display for SequencingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SequencingPolicy::LastResolvedWins => "last-resolved",
            SequencingPolicy::LatestRequestWins => "latest-request",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Issues monotonic request tokens and decides which responses may be shown.
#[derive(Debug, Default)]
pub struct RequestSequencer {
    policy: SequencingPolicy,
    issued: u64,
    newest_settled: Option<RequestToken>,
}

impl RequestSequencer {
    pub fn new(policy: SequencingPolicy) -> Self {
        Self {
            policy,
            issued: 0,
            newest_settled: None,
        }
    }

    pub fn policy(&self) -> SequencingPolicy {
        self.policy
    }

    pub fn issue(&mut self) -> RequestToken {
        self.issued += 1;
        RequestToken(self.issued)
    }

    /// True if an outcome for `token` must not replace what is displayed:
    /// a newer request has already settled, successfully or not.
    pub fn is_stale(&self, token: RequestToken) -> bool {
        match self.policy {
            SequencingPolicy::LastResolvedWins => false,
            SequencingPolicy::LatestRequestWins => self.newest_settled.map_or(false, |newest| token < newest),
        }
    }

    /// Records that `token` settled, whatever its outcome; returns whether
    /// that outcome should be displayed.
    pub fn settle(&mut self, token: RequestToken) -> bool {
        if self.is_stale(token) {
            return false;
        }
        self.newest_settled = Some(match self.newest_settled {
            Some(newest) if newest > token => newest,
            _ => token,
        });
        true
    }
}
