use super::{bool_str, first, require, BuiltinRegistry, MAX_OUTPUT_BYTES};
use crate::error::{ShellError, ShellResult};
use std::path::Path;

/// Whole file as text. Invalid UTF-8 is replaced rather than rejected.
fn read_text(path: &str) -> ShellResult<String> {
    let size = std::fs::metadata(path)?.len();
    if usize::try_from(size).map_or(true, |n| n > MAX_OUTPUT_BYTES) {
        return Err(ShellError::invalid(format!(
            "'{path}' is {size} bytes, more than {MAX_OUTPUT_BYTES}"
        )));
    }
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register("cat", "Read a file", "cat FILE", |a: &[String]| {
        require(a, 1, "cat FILE")?;
        read_text(first(a))
    });
    r.register("readfile", "Read a file", "readfile FILE", |a: &[String]| {
        require(a, 1, "readfile FILE")?;
        read_text(first(a))
    });
    r.register("exists", "Check that a path exists", "exists PATH", |a: &[String]| {
        Ok(bool_str(!first(a).is_empty() && Path::new(first(a)).exists()))
    });
    r.register("isfile", "Check for a regular file", "isfile PATH", |a: &[String]| {
        Ok(bool_str(!first(a).is_empty() && Path::new(first(a)).is_file()))
    });
    r.register("isdir", "Check for a directory", "isdir PATH", |a: &[String]| {
        Ok(bool_str(!first(a).is_empty() && Path::new(first(a)).is_dir()))
    });
    r.register("filesize", "File size in bytes", "filesize FILE", |a: &[String]| {
        require(a, 1, "filesize FILE")?;
        Ok(std::fs::metadata(first(a))?.len().to_string())
    });
}

#[cfg(test)]
mod tests {
    use crate::builtins::{args, BuiltinRegistry};

    #[test]
    fn file_queries() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("notes.txt");
        std::fs::write(&file, "line one\nline two\n").unwrap();
        let file = file.to_str().unwrap();
        let dir_path = dir.path().to_str().unwrap();

        let registry = BuiltinRegistry::with_defaults();
        let run = |name: &str, value: &str| registry.execute(name, &args(&[value]));

        assert_eq!(run("cat", file).unwrap(), "line one\nline two\n");
        assert_eq!(run("readfile", file).unwrap(), run("cat", file).unwrap());
        assert_eq!(run("filesize", file).unwrap(), "18");
        assert_eq!(run("exists", file).unwrap(), "true");
        assert_eq!(run("isfile", file).unwrap(), "true");
        assert_eq!(run("isfile", dir_path).unwrap(), "false");
        assert_eq!(run("isdir", dir_path).unwrap(), "true");
        assert_eq!(run("exists", "/no/such/path").unwrap(), "false");
        assert!(run("cat", "/no/such/path").is_err());
        assert!(registry.execute("cat", &[]).is_err());
    }
}
