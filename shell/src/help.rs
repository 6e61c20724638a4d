use crate::builtins::{Builtin, BuiltinRegistry};
use std::fmt::Write;

pub struct CommandHelp {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub summary: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandHelp] = &[
    CommandHelp {
        name: "help",
        aliases: &["h", "?"],
        summary: "Show commands, syntax and builtins",
        usage: "help [COMMAND|BUILTIN]",
    },
    CommandHelp {
        name: "list",
        aliases: &["ls"],
        summary: "List discovered modules",
        usage: "list",
    },
    CommandHelp {
        name: "search",
        aliases: &[],
        summary: "Find modules by name, description or tag",
        usage: "search KEYWORD",
    },
    CommandHelp {
        name: "info",
        aliases: &[],
        summary: "Show a module's metadata and options",
        usage: "info MODULE  (or MODULE!)",
    },
    CommandHelp {
        name: "run",
        aliases: &[],
        summary: "Run a module",
        usage: "run MODULE [key=value ...] [threads=N]",
    },
    CommandHelp {
        name: "create",
        aliases: &["new"],
        summary: "Scaffold a new module",
        usage: "create NAME [python|bash]",
    },
    CommandHelp {
        name: "edit",
        aliases: &[],
        summary: "Show a module's files for editing",
        usage: "edit MODULE",
    },
    CommandHelp {
        name: "delete",
        aliases: &["remove", "rm"],
        summary: "Remove a module after confirmation",
        usage: "delete MODULE [--yes]",
    },
    CommandHelp {
        name: "env",
        aliases: &["envs"],
        summary: "List session variables",
        usage: "env",
    },
    CommandHelp {
        name: "unset",
        aliases: &[],
        summary: "Remove a session variable",
        usage: "unset NAME",
    },
    CommandHelp {
        name: "history",
        aliases: &[],
        summary: "Show command history",
        usage: "history",
    },
    CommandHelp {
        name: "refresh",
        aliases: &["reload"],
        summary: "Re-scan the modules directory",
        usage: "refresh",
    },
    CommandHelp {
        name: "clear",
        aliases: &["cls"],
        summary: "Clear the screen",
        usage: "clear",
    },
    CommandHelp {
        name: "exit",
        aliases: &["quit", "q"],
        summary: "Leave the shell",
        usage: "exit",
    },
];

const SYNTAX: &[(&str, &str)] = &[
    ("name(args)", "call a builtin: toupper(\"hi\"), sha256($(whoami))"),
    ("$(name args)", "nested call inside arguments or values"),
    ("a |> b |> c", "pipe each stage's output into the next"),
    ("for x in R -> cmd", "loop over 1..10, a..z, 10.0.0.1..50, a|b|c, 1..3+a..c"),
    ("key=value", "set a session variable (key=? shows it)"),
    ("$ command", "run a system shell command"),
    ("module k=v", "run a module, threads=N fans out"),
];

pub fn get_help(name: &str) -> Option<&'static CommandHelp> {
    COMMANDS
        .iter()
        .find(|c| c.name == name || c.aliases.contains(&name))
}

pub fn format_help(cmd: &CommandHelp) -> String {
    let mut out = format!("{} - {}\n\nUsage: {}\n", cmd.name, cmd.summary, cmd.usage);
    if !cmd.aliases.is_empty() {
        let _ = writeln!(out, "Aliases: {}", cmd.aliases.join(", "));
    }
    out
}

pub fn format_builtin_help(builtin: &Builtin) -> String {
    format!(
        "{} - {}\n\nUsage: {}\n",
        builtin.name, builtin.description, builtin.usage
    )
}

pub fn format_help_list(builtins: &BuiltinRegistry) -> String {
    let mut out = String::from("modsh - modular tool shell\n\nCommands:\n\n");
    for cmd in COMMANDS {
        let _ = writeln!(out, "  {:12} {}", cmd.name, cmd.summary);
    }

    out.push_str("\nSyntax:\n\n");
    for (form, summary) in SYNTAX {
        let _ = writeln!(out, "  {form:20} {summary}");
    }

    let _ = write!(out, "\nBuiltins ({}):\n\n", builtins.len());
    let names: Vec<&str> = builtins.names().collect();
    for row in names.chunks(6) {
        let _ = writeln!(out, "  {}", row.iter().map(|n| format!("{n:12}")).collect::<String>().trim_end());
    }

    out.push_str("\nUse 'help NAME' for more information.\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_resolve_to_commands() {
        assert_eq!(get_help("q").map(|c| c.name), Some("exit"));
        assert_eq!(get_help("ls").map(|c| c.name), Some("list"));
        assert_eq!(get_help("rm").map(|c| c.name), Some("delete"));
        assert!(get_help("nope").is_none());
    }

    #[test]
    fn help_list_mentions_builtins() {
        let text = format_help_list(&BuiltinRegistry::with_defaults());
        assert!(text.contains("sha256"));
        assert!(text.contains("refresh"));
    }
}
