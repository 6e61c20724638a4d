use super::{require, BuiltinRegistry};
use crate::error::ShellError;
use std::time::{SystemTime, UNIX_EPOCH};

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register("whoami", "Current user", "whoami", |_: &[String]| {
        Ok(std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string()))
    });
    r.register("hostname", "System hostname", "hostname", |_: &[String]| Ok(hostname()));
    r.register("getenv", "Read an environment variable", "getenv NAME", |a: &[String]| {
        require(a, 1, "getenv NAME")?;
        Ok(std::env::var(&a[0]).unwrap_or_default())
    });
    r.register("pwd", "Current working directory", "pwd", |_: &[String]| {
        Ok(std::env::current_dir()?.display().to_string())
    });
    r.register("uuid", "Random UUID (v4)", "uuid", |_: &[String]| {
        Ok(uuid::Uuid::new_v4().to_string())
    });
    r.register("epoch", "Seconds since the Unix epoch", "epoch", |_: &[String]| {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ShellError::invalid(e.to_string()))?;
        Ok(now.as_secs().to_string())
    });
}

fn hostname() -> String {
    std::fs::read_to_string("/proc/sys/kernel/hostname")
        .or_else(|_| std::fs::read_to_string("/etc/hostname"))
        .map(|h| h.trim().to_string())
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| std::env::var("HOSTNAME").ok())
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
}

#[cfg(test)]
mod tests {
    use crate::builtins::{args, BuiltinRegistry};

    #[test]
    fn uuid_is_well_formed() {
        let id = BuiltinRegistry::with_defaults().execute("uuid", &[]).unwrap();
        assert!(uuid::Uuid::parse_str(&id).is_ok());
    }

    #[test]
    fn epoch_is_numeric() {
        let now = BuiltinRegistry::with_defaults().execute("epoch", &[]).unwrap();
        assert!(now.parse::<u64>().unwrap() > 1_600_000_000);
    }

    #[test]
    fn getenv_reads_process_env() {
        let path = BuiltinRegistry::with_defaults()
            .execute("getenv", &args(&["PATH"]))
            .unwrap();
        assert_eq!(path, std::env::var("PATH").unwrap_or_default());
    }
}
