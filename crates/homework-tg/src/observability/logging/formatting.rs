use std::fmt;
use std::time::Duration;

#[must_use]
pub fn tracing_err<'a, E: std::error::Error + 'static>(err: &'a E) -> impl tracing::Value + 'a {
    err as &dyn std::error::Error
}

pub(crate) fn tracing_duration(duration: Duration) -> impl tracing::Value {
    tracing::field::display(TracingDuration(duration))
}

struct TracingDuration(Duration);

impl fmt::Display for TracingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2?}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use expect_test::expect;

    #[test]
    fn duration_is_rounded() {
        let formatted = TracingDuration(Duration::from_micros(1_234_567)).to_string();
        expect!["1.23s"].assert_eq(&formatted);
    }
}
