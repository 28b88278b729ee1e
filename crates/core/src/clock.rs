//! Time source for domain timestamps.
//!
//! Timestamps are assigned explicitly by the caller that owns a record's lifecycle,
//! never as a side effect of persistence. Passing the clock in keeps that
//! assignment deterministic under test.

use chrono::{DateTime, SubsecRound, Utc};

/// Source of "now" for record timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

impl<C> Clock for std::sync::Arc<C>
where
    C: Clock + ?Sized,
{
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

/// Wall clock, truncated to microseconds (the precision relational stores keep).
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now().trunc_subsecs(6)
    }
}
