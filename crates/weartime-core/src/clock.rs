//! Wall-clock and local calendar access

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Offset, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering};

/// Source of the current instant and of device-local calendar dates.
///
/// Day boundaries are always local: a session started at 23:30 local time
/// belongs to that local date even when UTC has already rolled over.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    /// Local calendar date containing `at`
    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate;

    /// First instant of the local calendar date `date`
    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc>;

    fn today(&self) -> NaiveDate {
        self.local_date(self.now())
    }
}

/// Clock backed by the system time and timezone
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        // Persisted timestamps are epoch milliseconds
        let now = Utc::now();
        DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&Local).date_naive()
    }

    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        // A DST gap can swallow local midnight; fall back to the UTC midnight
        Local
            .from_local_datetime(&date.and_time(chrono::NaiveTime::MIN))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| date.and_time(chrono::NaiveTime::MIN).and_utc())
    }
}

/// Manually driven clock with a fixed UTC offset.
///
/// Used by tests and simulations that need to cross midnight or jump a day
/// ahead without sleeping.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: AtomicI64,
    offset: FixedOffset,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::with_offset(now, Utc.fix())
    }

    pub fn with_offset(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            now_ms: AtomicI64::new(now.timestamp_millis()),
            offset,
        }
    }

    /// Clock set to `hour:minute` local time on `date` at the given offset
    pub fn at_local(date: NaiveDate, hour: u32, minute: u32, offset: FixedOffset) -> Self {
        let local = date
            .and_hms_opt(hour, minute, 0)
            .unwrap_or(date.and_time(chrono::NaiveTime::MIN));
        let now = offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| local.and_utc());
        Self::with_offset(now, offset)
    }

    pub fn set(&self, now: DateTime<Utc>) {
        self.now_ms.store(now.timestamp_millis(), Ordering::SeqCst);
    }

    pub fn advance(&self, by: chrono::Duration) {
        self.now_ms.fetch_add(by.num_milliseconds(), Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.now_ms.load(Ordering::SeqCst)).unwrap_or_default()
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        at.with_timezone(&self.offset).date_naive()
    }

    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(chrono::NaiveTime::MIN);
        self.offset
            .from_local_datetime(&midnight)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn local_date(&self, at: DateTime<Utc>) -> NaiveDate {
        (**self).local_date(at)
    }

    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        (**self).start_of_day(date)
    }
}
