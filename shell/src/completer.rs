use modsh::help::COMMANDS;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Helper};
use std::borrow::Cow;
use std::sync::{Arc, PoisonError, RwLock};

/// Names the REPL refreshes before every prompt.
#[derive(Default)]
pub struct Names {
    pub modules: Vec<String>,
    pub vars: Vec<String>,
}

pub struct ModshHelper {
    builtins: Vec<String>,
    names: Arc<RwLock<Names>>,
}

impl ModshHelper {
    pub fn new(builtins: Vec<String>, names: Arc<RwLock<Names>>) -> Self {
        Self { builtins, names }
    }
}

impl Completer for ModshHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line_to_cursor = &line[..pos];
        let (start, word) = find_word_start(line_to_cursor);

        let names = self.names.read().unwrap_or_else(PoisonError::into_inner);
        let mut completions = Vec::new();

        if let Some(partial) = word.strip_prefix('$') {
            for var in names.vars.iter().filter(|v| v.starts_with(partial)) {
                completions.push(Pair {
                    display: format!("${var}"),
                    replacement: format!("${var}"),
                });
            }
            return Ok((start, completions));
        }

        if word.is_empty() {
            return Ok((pos, completions));
        }

        let is_first_word = !line_to_cursor[..start].contains(|c: char| !c.is_whitespace());
        if is_first_word {
            for cmd in COMMANDS.iter().filter(|c| c.name.starts_with(word)) {
                completions.push(Pair {
                    display: cmd.name.to_string(),
                    replacement: format!("{} ", cmd.name),
                });
            }
            for module in names.modules.iter().filter(|m| m.starts_with(word)) {
                completions.push(Pair {
                    display: module.clone(),
                    replacement: format!("{module} "),
                });
            }
        }

        for builtin in self.builtins.iter().filter(|b| b.starts_with(word)) {
            completions.push(Pair {
                display: format!("{builtin}()"),
                replacement: format!("{builtin}("),
            });
        }

        Ok((start, completions))
    }
}

/// Start of the word under the cursor. Call syntax characters split words.
fn find_word_start(line: &str) -> (usize, &str) {
    let mut start = line.len();
    for (i, c) in line.char_indices().rev() {
        if c.is_whitespace() || matches!(c, '(' | ')' | ',' | '|' | '>' | '"' | '\'') {
            break;
        }
        start = i;
    }
    (start, &line[start..])
}

impl Hinter for ModshHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ModshHelper {
    fn highlight_hint<'h>(&self, hint: &'h str) -> Cow<'h, str> {
        Cow::Borrowed(hint)
    }
}

impl Validator for ModshHelper {}

impl Helper for ModshHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundaries_include_call_syntax() {
        assert_eq!(find_word_start("echo(toup"), (5, "toup"));
        assert_eq!(find_word_start("a |> rev"), (5, "rev"));
        assert_eq!(find_word_start("x = $lh"), (4, "$lh"));
        assert_eq!(find_word_start(""), (0, ""));
    }
}
