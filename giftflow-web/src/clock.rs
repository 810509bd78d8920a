use giftflow_core::Clock;

/// Wall clock from `Date.now()`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BrowserClock;

impl Clock for BrowserClock {
    #[allow(clippy::cast_possible_truncation)] // Milliseconds since epoch fit in i64 for any real date.
    fn now_ms(&self) -> i64 {
        js_sys::Date::now() as i64
    }
}
