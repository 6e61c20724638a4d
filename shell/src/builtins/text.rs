use super::{bool_str, joined, parse_int, require, BuiltinRegistry, MAX_OUTPUT_BYTES};
use crate::error::ShellError;

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register("echo", "Print text", "echo TEXT...", |a: &[String]| Ok(joined(a)));
    r.register("toupper", "Convert to uppercase", "toupper TEXT", |a: &[String]| {
        Ok(joined(a).to_uppercase())
    });
    r.register("tolower", "Convert to lowercase", "tolower TEXT", |a: &[String]| {
        Ok(joined(a).to_lowercase())
    });
    r.register("reverse", "Reverse a string", "reverse TEXT", |a: &[String]| {
        Ok(joined(a).chars().rev().collect())
    });
    r.register("strlen", "String length in characters", "strlen TEXT", |a: &[String]| {
        Ok(joined(a).chars().count().to_string())
    });
    r.register("trim", "Trim surrounding whitespace", "trim TEXT", |a: &[String]| {
        Ok(joined(a).trim().to_string())
    });
    r.register("substr", "Extract a substring", "substr TEXT START [END]", substr);
    r.register("replace", "Replace every occurrence", "replace TEXT OLD NEW", |a: &[String]| {
        require(a, 3, "replace TEXT OLD NEW")?;
        if a[1].is_empty() {
            return Ok(a[0].clone());
        }
        Ok(a[0].replace(&a[1], &a[2]))
    });
    r.register("split", "Split into lines on a separator", "split TEXT SEP", |a: &[String]| {
        require(a, 2, "split TEXT SEP")?;
        if a[1].is_empty() {
            return Ok(a[0].clone());
        }
        Ok(a[0].split(a[1].as_str()).collect::<Vec<_>>().join("\n"))
    });
    r.register("startswith", "Check a prefix", "startswith TEXT PREFIX", |a: &[String]| {
        require(a, 2, "startswith TEXT PREFIX")?;
        Ok(bool_str(a[0].starts_with(a[1].as_str())))
    });
    r.register("endswith", "Check a suffix", "endswith TEXT SUFFIX", |a: &[String]| {
        require(a, 2, "endswith TEXT SUFFIX")?;
        Ok(bool_str(a[0].ends_with(a[1].as_str())))
    });
    r.register("contains", "Check for a substring", "contains TEXT NEEDLE", |a: &[String]| {
        require(a, 2, "contains TEXT NEEDLE")?;
        Ok(bool_str(a[0].contains(a[1].as_str())))
    });
    r.register("repeat", "Repeat a string", "repeat TEXT COUNT", |a: &[String]| {
        require(a, 2, "repeat TEXT COUNT")?;
        let count = usize::try_from(parse_int(&a[1])?)
            .map_err(|_| ShellError::invalid("count must not be negative"))?;
        a[0].len()
            .checked_mul(count)
            .filter(|len| *len <= MAX_OUTPUT_BYTES)
            .ok_or_else(|| {
                ShellError::invalid(format!("result would exceed {MAX_OUTPUT_BYTES} bytes"))
            })?;
        Ok(a[0].repeat(count))
    });
    r.register("capitalize", "Uppercase the first letter", "capitalize TEXT", |a: &[String]| {
        let text = joined(a);
        let mut chars = text.chars();
        Ok(chars.next().map_or_else(String::new, |first| {
            first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect()
        }))
    });
    r.register("wordcount", "Count words", "wordcount TEXT", |a: &[String]| {
        Ok(joined(a).split_whitespace().count().to_string())
    });
    r.register("rot13", "ROT13 cipher", "rot13 TEXT", |a: &[String]| Ok(rot13(&joined(a))));
}

fn substr(a: &[String]) -> crate::error::ShellResult<String> {
    require(a, 2, "substr TEXT START [END]")?;
    let chars: Vec<char> = a[0].chars().collect();
    let index = |s: &str| -> crate::error::ShellResult<usize> {
        usize::try_from(parse_int(s)?).map_err(|_| ShellError::invalid("index must not be negative"))
    };

    let start = index(&a[1])?;
    let end = match a.get(2) {
        Some(end) => index(end)?.min(chars.len()),
        None => chars.len(),
    };
    if start >= end {
        return Ok(String::new());
    }
    Ok(chars[start..end].iter().collect())
}

fn rot13(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'a'..='z' => rotate(c, b'a'),
            'A'..='Z' => rotate(c, b'A'),
            _ => c,
        })
        .collect()
}

fn rotate(c: char, base: u8) -> char {
    // c is ASCII here
    let offset = (c as u8 - base + 13) % 26;
    char::from(base + offset)
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
    fn case_and_reverse() {
        assert_eq!(run("echo", &["hello", "world"]), "hello world");
        assert_eq!(run("reverse", &["abc"]), "cba");
        assert_eq!(run("capitalize", &["hELLO"]), "Hello");
        assert_eq!(run("strlen", &["héllo"]), "5");
    }

    #[test]
    fn substr_bounds() {
        assert_eq!(run("substr", &["hello", "1", "3"]), "el");
        assert_eq!(run("substr", &["hello", "2"]), "llo");
        assert_eq!(run("substr", &["hello", "9"]), "");
        assert_eq!(run("substr", &["hello", "1", "99"]), "ello");
    }

    #[test]
    fn predicates() {
        assert_eq!(run("startswith", &["modsh", "mod"]), "true");
        assert_eq!(run("endswith", &["modsh", "mod"]), "false");
        assert_eq!(run("contains", &["modsh", "ds"]), "true");
    }

    #[test]
    fn split_replace_repeat() {
        assert_eq!(run("split", &["a,b,c", ","]), "a\nb\nc");
        assert_eq!(run("replace", &["a-b-c", "-", "+"]), "a+b+c");
        assert_eq!(run("repeat", &["ab", "3"]), "ababab");
        assert_eq!(run("wordcount", &["one  two three"]), "3");
        assert_eq!(run("rot13", &["Hello"]), "Uryyb");
    }

    #[test]
    fn repeat_is_bounded() {
        let registry = BuiltinRegistry::with_defaults();
        for count in ["9223372036854775807", "16777217"] {
            let err = registry.execute("repeat", &args(&["ab", count])).unwrap_err();
            assert!(err.to_string().starts_with("repeat: result would exceed"), "{err}");
        }
        assert!(registry.execute("repeat", &args(&["ab", "-1"])).is_err());
        assert_eq!(run("repeat", &["", "9223372036854775807"]), "");
        assert_eq!(run("repeat", &["x", "0"]), "");
    }

    #[test]
    fn arity_errors() {
        let err = BuiltinRegistry::with_defaults()
            .execute("replace", &args(&["x"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "replace: usage: replace TEXT OLD NEW");
    }
}
