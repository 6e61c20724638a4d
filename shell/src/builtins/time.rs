use super::{first, BuiltinRegistry};
use crate::error::{ShellError, ShellResult};
use chrono::format::{Item, StrftimeItems};
use chrono::{Local, SecondsFormat, Utc};

const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format the local time with a strftime pattern, rejecting bad patterns
/// up front so formatting never fails half way.
fn format_local(pattern: &str) -> ShellResult<String> {
    let items: Vec<Item<'_>> = StrftimeItems::new(pattern).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return Err(ShellError::invalid(format!("invalid date format '{pattern}'")));
    }
    Ok(Local::now().format_with_items(items.into_iter()).to_string())
}

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register("now", "Local time, RFC 3339", "now", |_: &[String]| {
        Ok(Local::now().to_rfc3339_opts(SecondsFormat::Secs, false))
    });
    r.register("iso8601", "UTC time, ISO 8601", "iso8601", |_: &[String]| {
        Ok(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true))
    });
    r.register(
        "date",
        "Local time with a strftime format",
        "date [FORMAT]",
        |a: &[String]| {
            if a.is_empty() {
                format_local(DEFAULT_DATE_FORMAT)
            } else {
                format_local(&a.join(" "))
            }
        },
    );
    r.register(
        "timestamp",
        "Unix time in seconds, milliseconds or nanoseconds",
        "timestamp [unix|milli|nano]",
        |a: &[String]| {
            let now = Utc::now();
            match first(a) {
                "" | "unix" => Ok(now.timestamp().to_string()),
                "milli" => Ok(now.timestamp_millis().to_string()),
                "nano" => now
                    .timestamp_nanos_opt()
                    .map(|n| n.to_string())
                    .ok_or_else(|| ShellError::invalid("time is out of nanosecond range")),
                other => Err(ShellError::invalid(format!(
                    "unknown unit '{other}', expected unix, milli or nano"
                ))),
            }
        },
    );
    r.register("dayofweek", "Name of the current weekday", "dayofweek", |_: &[String]| {
        Ok(Local::now().format("%A").to_string())
    });
}

#[cfg(test)]
mod tests {
    use crate::builtins::{args, BuiltinRegistry};

    fn run(name: &str, values: &[&str]) -> String {
        BuiltinRegistry::with_defaults()
            .execute(name, &args(values))
            .unwrap()
    }

    #[test]
    fn timestamps_scale_by_unit() {
        let secs: i64 = run("timestamp", &[]).parse().unwrap();
        let millis: i64 = run("timestamp", &["milli"]).parse().unwrap();
        let nanos: i64 = run("timestamp", &["nano"]).parse().unwrap();
        assert!(secs > 1_600_000_000);
        assert!(millis / 1000 >= secs);
        assert!(nanos / 1_000_000 >= millis);
        assert!(BuiltinRegistry::with_defaults()
            .execute("timestamp", &args(&["weeks"]))
            .is_err());
    }

    #[test]
    fn dates_follow_the_format() {
        let year = run("date", &["%Y"]);
        assert_eq!(year.len(), 4);
        assert!(year.parse::<u32>().unwrap() >= 2024);

        let default = run("date", &[]);
        assert_eq!(default.len(), "2024-01-01 00:00:00".len());
        assert!(run("iso8601", &[]).ends_with('Z'));
        assert!(chrono::DateTime::parse_from_rfc3339(&run("now", &[])).is_ok());
    }

    #[test]
    fn bad_format_is_rejected() {
        let err = BuiltinRegistry::with_defaults()
            .execute("date", &args(&["%Q"]))
            .unwrap_err();
        assert!(err.to_string().contains("invalid date format"), "{err}");
    }
}
