use super::{first, BuiltinRegistry};
use crate::error::{ShellError, ShellResult};

/// Parse an unsigned integer in `radix`, allowing the usual `0x`/`0b`/`0o`
/// prefix and `_` separators.
fn parse_radix(text: &str, radix: u32) -> ShellResult<u64> {
    let prefix = match radix {
        2 => "0b",
        8 => "0o",
        16 => "0x",
        _ => "",
    };
    let trimmed = text.trim();
    let digits = if prefix.is_empty() {
        trimmed
    } else {
        trimmed
            .strip_prefix(prefix)
            .or_else(|| trimmed.strip_prefix(&prefix.to_uppercase()))
            .unwrap_or(trimmed)
    };
    u64::from_str_radix(&digits.replace('_', ""), radix)
        .map_err(|_| ShellError::invalid(format!("not a base-{radix} number: '{text}'")))
}

fn render(n: u64, radix: u32) -> String {
    match radix {
        2 => format!("{n:b}"),
        8 => format!("{n:o}"),
        16 => format!("{n:x}"),
        _ => n.to_string(),
    }
}

fn register_conversion(r: &mut BuiltinRegistry, name: &'static str, from: u32, to: u32) {
    let description = format!("Convert base {from} to base {to}");
    r.register(name, &description, &format!("{name} NUMBER"), move |a: &[String]| {
        if a.is_empty() {
            return Err(ShellError::invalid(format!("usage: {name} NUMBER")));
        }
        Ok(render(parse_radix(first(a), from)?, to))
    });
}

pub(super) fn register(r: &mut BuiltinRegistry) {
    for (name, from, to) in [
        ("dec2hex", 10, 16),
        ("hex2dec", 16, 10),
        ("dec2bin", 10, 2),
        ("bin2dec", 2, 10),
        ("dec2oct", 10, 8),
        ("oct2dec", 8, 10),
        ("bin2hex", 2, 16),
        ("hex2bin", 16, 2),
    ] {
        register_conversion(r, name, from, to);
    }
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
    fn conversions() {
        assert_eq!(run("dec2hex", &["255"]), "ff");
        assert_eq!(run("hex2dec", &["0xFF"]), "255");
        assert_eq!(run("dec2bin", &["10"]), "1010");
        assert_eq!(run("bin2dec", &["0b1010"]), "10");
        assert_eq!(run("dec2oct", &["8"]), "10");
        assert_eq!(run("oct2dec", &["777"]), "511");
        assert_eq!(run("bin2hex", &["1111_0000"]), "f0");
        assert_eq!(run("hex2bin", &["a"]), "1010");
        assert_eq!(run("hex2dec", &["ffffffffffffffff"]), u64::MAX.to_string());
    }

    #[test]
    fn bad_digits_are_rejected() {
        let registry = BuiltinRegistry::with_defaults();
        for (name, value) in [("bin2dec", "102"), ("hex2dec", "xyz"), ("dec2hex", "-1"), ("oct2dec", "")] {
            let err = registry.execute(name, &args(&[value])).unwrap_err();
            assert!(err.to_string().starts_with(name), "{err}");
        }
        assert!(registry.execute("dec2hex", &[]).is_err());
    }
}
