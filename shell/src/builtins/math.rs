use super::{format_number, parse_number, require, BuiltinRegistry};
use crate::error::ShellResult;

pub(super) fn register(r: &mut BuiltinRegistry) {
    r.register("sum", "Sum of numbers", "sum N...", |a: &[String]| {
        Ok(format_number(numbers(a)?.iter().sum()))
    });
    r.register("min", "Smallest number", "min N...", |a: &[String]| {
        require(a, 1, "min N...")?;
        Ok(format_number(numbers(a)?.into_iter().fold(f64::INFINITY, f64::min)))
    });
    r.register("max", "Largest number", "max N...", |a: &[String]| {
        require(a, 1, "max N...")?;
        Ok(format_number(numbers(a)?.into_iter().fold(f64::NEG_INFINITY, f64::max)))
    });
    r.register("abs", "Absolute value", "abs N", |a: &[String]| {
        require(a, 1, "abs N")?;
        Ok(format_number(parse_number(&a[0])?.abs()))
    });
    r.register("avg", "Average of numbers", "avg N...", |a: &[String]| {
        require(a, 1, "avg N...")?;
        let values = numbers(a)?;
        #[allow(clippy::cast_precision_loss)]
        let avg = values.iter().sum::<f64>() / values.len() as f64;
        Ok(format!("{avg:.2}"))
    });
}

fn numbers(a: &[String]) -> ShellResult<Vec<f64>> {
    a.iter().map(|s| parse_number(s)).collect()
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
    fn aggregates() {
        assert_eq!(run("sum", &["1", "2", "3"]), "6");
        assert_eq!(run("sum", &[]), "0");
        assert_eq!(run("sum", &["0.5", "1"]), "1.5");
        assert_eq!(run("min", &["4", "-2", "9"]), "-2");
        assert_eq!(run("max", &["4", "-2", "9"]), "9");
        assert_eq!(run("avg", &["1", "2"]), "1.50");
        assert_eq!(run("abs", &["-7"]), "7");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let registry = BuiltinRegistry::with_defaults();
        assert!(registry.execute("max", &args(&["1", "two"])).is_err());
        assert!(registry.execute("min", &[]).is_err());
    }
}
