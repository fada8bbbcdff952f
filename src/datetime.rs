//! UTC datetimes, stored as milliseconds since the Unix epoch.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// A BSON datetime: a signed millisecond count since the Unix epoch.
///
/// This is the on-wire representation of the 0x09 element type; no calendar
/// arithmetic or formatting is provided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime(i64);

impl DateTime {
    /// The latest representable datetime.
    pub const MAX: Self = Self(i64::MAX);

    /// The earliest representable datetime.
    pub const MIN: Self = Self(i64::MIN);

    /// Makes a new [`DateTime`] from the number of non-leap milliseconds since
    /// January 1, 1970 0:00:00 UTC.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the number of non-leap milliseconds since January 1, 1970
    /// 0:00:00 UTC.
    pub const fn timestamp_millis(self) -> i64 {
        self.0
    }

    /// The current system time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Convert the given [`SystemTime`] to a [`DateTime`], truncating
    /// sub-millisecond precision.
    ///
    /// Times outside the representable range saturate to [`DateTime::MIN`] or
    /// [`DateTime::MAX`].
    pub fn from_system_time(st: SystemTime) -> Self {
        match st.duration_since(UNIX_EPOCH) {
            Ok(d) if d.as_millis() <= i64::MAX as u128 => Self(d.as_millis() as i64),
            Ok(_) => Self::MAX,
            // before the unix epoch
            Err(e) => {
                let millis = e.duration().as_millis();
                if millis > i64::MAX as u128 {
                    Self::MIN
                } else {
                    Self(-(millis as i64))
                }
            }
        }
    }

    /// Convert this [`DateTime`] to a [`SystemTime`].
    pub fn to_system_time(self) -> SystemTime {
        if self.0 >= 0 {
            UNIX_EPOCH + Duration::from_millis(self.0 as u64)
        } else {
            UNIX_EPOCH - Duration::from_millis(self.0.unsigned_abs())
        }
    }
}

impl std::fmt::Display for DateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DateTime({} ms)", self.0)
    }
}

impl From<SystemTime> for DateTime {
    fn from(st: SystemTime) -> Self {
        Self::from_system_time(st)
    }
}

impl From<DateTime> for SystemTime {
    fn from(dt: DateTime) -> Self {
        dt.to_system_time()
    }
}
