//! End-to-end tests driving `Shell::execute` against an in-memory module runner.

use async_trait::async_trait;
use modsh::{Evaluation, Shell, ShellError};
use modsh_core::{
    ExecutionResult, ModuleArgs, ModuleError, ModuleInfo, ModuleKind, ModuleResult, ModuleRunner,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Knows `scan` (echoes its arguments) and `fail` (exits 2).
#[derive(Default)]
struct FakeModules {
    calls: Mutex<Vec<(String, ModuleArgs)>>,
}

impl FakeModules {
    fn calls(&self) -> Vec<(String, ModuleArgs)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModuleRunner for FakeModules {
    fn module(&self, name: &str) -> Option<ModuleInfo> {
        matches!(name, "scan" | "fail").then(|| ModuleInfo {
            name: name.to_string(),
            path: PathBuf::from("/modules").join(name),
            kind: ModuleKind::Bash,
            metadata: None,
            load_error: None,
        })
    }

    fn modules(&self) -> Vec<ModuleInfo> {
        ["fail", "scan"].iter().filter_map(|n| self.module(n)).collect()
    }

    fn refresh(&self) -> ModuleResult<usize> {
        Ok(2)
    }

    async fn execute(&self, name: &str, args: &ModuleArgs) -> ModuleResult<ExecutionResult> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), args.clone()));
        match name {
            "scan" => {
                let rendered: Vec<String> = args.iter().map(|(k, v)| format!("{k}={v}")).collect();
                Ok(ExecutionResult::succeeded(format!("{}\n", rendered.join(" "))))
            }
            "fail" => Ok(ExecutionResult::failed(2, "boom\n")),
            _ => Err(ModuleError::NotFound(name.to_string())),
        }
    }
}

fn shell_with(modules: &Arc<FakeModules>) -> Shell {
    let runner: Arc<dyn ModuleRunner> = Arc::clone(modules) as Arc<dyn ModuleRunner>;
    Shell::builder()
        .modules(runner)
        .builtin("whoami", "Fixed user", |_: &[String]| Ok("alice".to_string()))
        .build()
}

async fn value(shell: &mut Shell, line: &str) -> String {
    match shell.execute(line).await.unwrap() {
        Evaluation::Value(v) => v,
        other => panic!("expected a value from {line:?}, got {other:?}"),
    }
}

async fn loop_results(shell: &mut Shell, line: &str) -> Vec<String> {
    match shell.execute(line).await.unwrap() {
        Evaluation::Loop(report) => report.results().map(str::to_string).collect(),
        other => panic!("expected a loop from {line:?}, got {other:?}"),
    }
}

#[tokio::test]
async fn calls_split_and_nest() {
    let mut shell = Shell::new();
    assert_eq!(value(&mut shell, "echo(a,b,c)").await, "a b c");
    assert_eq!(value(&mut shell, "echo(\"hello world\")").await, "hello world");
    assert_eq!(value(&mut shell, "reverse(toupper(abc))").await, "CBA");
}

#[tokio::test]
async fn backslashes_outside_quotes_are_literal() {
    let mut shell = Shell::new();
    assert_eq!(value(&mut shell, r"echo(C:\dir\)").await, r"C:\dir\");
    assert_eq!(value(&mut shell, r"echo(a\) |> toupper").await, r"A\");
    assert_eq!(value(&mut shell, r#"echo("q\"q")"#).await, "q\"q");
}

#[tokio::test]
async fn inline_substitution_uses_registered_builtins() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);
    assert_eq!(value(&mut shell, "toupper($(whoami))").await, "ALICE");
    assert_eq!(value(&mut shell, "$(whoami)").await, "alice");
}

#[tokio::test]
async fn unbalanced_call_is_a_parse_error() {
    let mut shell = Shell::new();
    let err = shell.execute("foo(bar").await.unwrap_err();
    assert!(matches!(err, ShellError::Parse(_)), "{err}");
    assert_eq!(shell.last_status(), 1);
}

#[tokio::test]
async fn loops_cover_every_range_kind() {
    let mut shell = Shell::new();
    assert_eq!(loop_results(&mut shell, "for x in 1..3 -> echo($x)").await, ["1", "2", "3"]);
    assert_eq!(loop_results(&mut shell, "for c in a..c -> toupper($c)").await, ["A", "B", "C"]);
    assert_eq!(
        loop_results(&mut shell, "for ip in 192.168.1.1..192.168.1.3 -> echo($ip)").await,
        ["192.168.1.1", "192.168.1.2", "192.168.1.3"]
    );
    assert_eq!(
        loop_results(&mut shell, "for v in 1..2+a..b -> echo($v)").await,
        ["1", "2", "a", "b"]
    );
    assert_eq!(loop_results(&mut shell, "for w in x|y|z -> echo($w)").await, ["x", "y", "z"]);
}

#[tokio::test]
async fn loop_keeps_going_after_a_failed_iteration() {
    let mut shell = Shell::new();
    let Evaluation::Loop(report) = shell.execute("for n in 1|x|3 -> repeat(ab, $n)").await.unwrap()
    else {
        panic!("expected a loop");
    };
    assert_eq!(report.iterations.len(), 3);
    assert_eq!(report.failures(), 1);
    assert!(report.iterations[1].outcome.is_err());
    assert_eq!(report.results().collect::<Vec<_>>(), ["ab", "ababab"]);
    assert_eq!(shell.last_status(), 1);
}

#[tokio::test]
async fn loop_values_are_never_parsed_as_syntax() {
    let modules = Arc::new(FakeModules::default());
    let runner: Arc<dyn ModuleRunner> = Arc::clone(&modules) as Arc<dyn ModuleRunner>;
    let mut shell = Shell::builder()
        .modules(runner)
        .var("secret", "leaked")
        .builtin("argc", "Count arguments", |a: &[String]| Ok(a.len().to_string()))
        .build();

    assert_eq!(
        loop_results(&mut shell, "for v in $secret|a,b -> echo($v)").await,
        ["$secret", "a,b"]
    );
    assert_eq!(loop_results(&mut shell, "for v in $secret|a,b -> argc($v)").await, ["1", "1"]);
    assert_eq!(
        loop_results(&mut shell, "for v in x)|$(whoami) -> echo(\"v=$v\", ${v})").await,
        ["v=x) x)", "v=$(whoami) $(whoami)"]
    );

    shell.execute("for v in $secret|a b -> scan host=$v").await.unwrap();
    let hosts: Vec<String> = modules
        .calls()
        .into_iter()
        .filter_map(|(_, args)| args.get("host").cloned())
        .collect();
    assert_eq!(hosts, ["$secret", "a b"]);
}

#[tokio::test]
async fn nested_loops_see_outer_variables() {
    let mut shell = Shell::new();
    let Evaluation::Loop(outer) = shell.execute("for i in 1..2 -> for j in 1..$i -> echo($i$j)").await.unwrap()
    else {
        panic!("expected a loop");
    };
    let inner: Vec<Vec<String>> = outer
        .iterations
        .iter()
        .map(|it| match &it.outcome {
            Ok(Evaluation::Loop(report)) => report.results().map(str::to_string).collect(),
            other => panic!("expected an inner loop, got {other:?}"),
        })
        .collect();
    assert_eq!(inner, [vec!["11"], vec!["21", "22"]]);
}

#[tokio::test]
async fn bad_range_fails_before_any_iteration() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);
    let err = shell.execute("for x in ab..cd -> scan host=$x").await.unwrap_err();
    assert!(matches!(err, ShellError::Range { .. }), "{err}");
    assert!(modules.calls().is_empty());
}

#[tokio::test]
async fn assignment_is_top_level_only() {
    let mut shell = Shell::new();
    let Evaluation::Loop(report) = shell.execute("for x in 1..2 -> v=$x").await.unwrap() else {
        panic!("expected a loop");
    };
    assert_eq!(report.failures(), 2);
    assert_eq!(shell.get_var("v"), None);

    shell.execute("lhost=10.0.0.1").await.unwrap();
    match shell.execute("lhost=?").await.unwrap() {
        Evaluation::Variable { name, value } => {
            assert_eq!(name, "lhost");
            assert_eq!(value.as_deref(), Some("10.0.0.1"));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(value(&mut shell, "echo($lhost)").await, "10.0.0.1");
}

#[tokio::test]
async fn pipelines_thread_output() {
    let mut shell = Shell::new();
    assert_eq!(value(&mut shell, "\"abc\" |> reverse").await, "cba");
    assert_eq!(value(&mut shell, "echo(abc) |> toupper() |> reverse").await, "CBA");
}

#[tokio::test]
async fn pipeline_input_reaches_modules() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);

    assert_eq!(value(&mut shell, "echo(10.0.0.1) |> scan ip=$target").await, "ip=10.0.0.1");
    assert_eq!(value(&mut shell, "echo(data) |> scan mode=fast").await, "input=data mode=fast");

    let calls = modules.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].1.get("ip").map(String::as_str), Some("10.0.0.1"));
    assert!(!calls[0].1.contains_key("input"));
}

#[tokio::test]
async fn failing_module_aborts_the_pipeline() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);

    let err = shell.execute("echo(x) |> fail |> scan").await.unwrap_err();
    match err {
        ShellError::PipelineStage { stage, source } => {
            assert_eq!(stage, 2);
            assert!(matches!(*source, ShellError::ModuleFailed { exit_code: 2, .. }));
        }
        other => panic!("unexpected {other}"),
    }
    assert_eq!(modules.calls().len(), 1);
}

#[tokio::test]
async fn modules_see_session_variables() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);
    shell.execute("lhost=10.0.0.9").await.unwrap();

    let Evaluation::Module(run) = shell.execute("scan host=a lhost=override").await.unwrap() else {
        panic!("expected a module run");
    };
    assert!(run.result.success);
    assert_eq!(run.args.get("host").map(String::as_str), Some("a"));
    assert_eq!(run.args.get("lhost").map(String::as_str), Some("override"));

    let Evaluation::Module(run) = shell.execute("run scan").await.unwrap() else {
        panic!("expected a module run");
    };
    assert_eq!(run.args.get("lhost").map(String::as_str), Some("10.0.0.9"));
}

#[tokio::test]
async fn loops_drive_modules() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);
    shell.execute("for h in 10.0.0.1..3 -> scan host=$h").await.unwrap();

    let hosts: Vec<String> = modules
        .calls()
        .into_iter()
        .filter_map(|(_, args)| args.get("host").cloned())
        .collect();
    assert_eq!(hosts, ["10.0.0.1", "10.0.0.2", "10.0.0.3"]);
}

#[tokio::test]
async fn threads_fan_out_across_workers() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);

    let Evaluation::Module(run) = shell.execute("scan threads=3 host=h").await.unwrap() else {
        panic!("expected a module run");
    };
    assert_eq!(run.workers, 3);
    assert!(run.result.success);
    let lines: Vec<&str> = run.result.output.lines().collect();
    assert_eq!(lines, ["[worker 1] host=h", "[worker 2] host=h", "[worker 3] host=h"]);
    assert_eq!(modules.calls().len(), 3);
}

#[tokio::test]
async fn failed_module_sets_status() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);

    let eval = shell.execute("fail").await.unwrap();
    assert_eq!(eval.status(), 2);
    assert_eq!(shell.last_status(), 2);

    let err = shell.execute("nosuch x=1").await.unwrap_err();
    assert!(matches!(err, ShellError::Module(ModuleError::NotFound(_))), "{err}");
}

#[tokio::test]
async fn evaluation_is_repeatable() {
    let mut shell = Shell::new();
    let first = value(&mut shell, "sha256(toupper(abc))").await;
    let second = value(&mut shell, "sha256(toupper(abc))").await;
    assert_eq!(first, second);
    assert!(shell.session().is_empty());
}

#[tokio::test]
async fn authoring_commands_manage_module_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let manager = modsh_core::ModuleManager::new(tmp.path(), modsh_core::Interpreters::default());
    let mut shell = Shell::builder().modules(Arc::new(manager)).build();

    let Evaluation::Text(created) = shell.execute("new sweep bash").await.unwrap() else {
        panic!("expected a confirmation message");
    };
    assert!(created.starts_with("Module 'sweep' created"), "{created}");
    assert!(tmp.path().join("sweep/main.sh").is_file());
    assert!(shell.modules().contains("sweep"));

    let err = shell.execute("create sweep").await.unwrap_err();
    assert!(matches!(err, ShellError::Module(ModuleError::AlreadyExists(_))), "{err}");
    let err = shell.execute("create other ruby").await.unwrap_err();
    assert!(matches!(err, ShellError::InvalidArgument(_)), "{err}");

    let Evaluation::Text(listing) = shell.execute("edit sweep").await.unwrap() else {
        panic!("expected a file listing");
    };
    assert!(listing.contains("├─ main.sh"), "{listing}");
    assert!(listing.contains("└─ module.yaml"), "{listing}");
    assert!(listing.contains("Open with: "), "{listing}");

    let Evaluation::Confirm { command, .. } = shell.execute("delete sweep").await.unwrap() else {
        panic!("expected a confirmation request");
    };
    assert_eq!(command, "delete sweep --yes");
    assert!(tmp.path().join("sweep").exists());

    shell.execute(&command).await.unwrap();
    assert!(!tmp.path().join("sweep").exists());
    assert!(!shell.modules().contains("sweep"));

    let err = shell.execute("rm sweep").await.unwrap_err();
    assert!(matches!(err, ShellError::Module(ModuleError::NotFound(_))), "{err}");
}

#[tokio::test]
async fn authoring_needs_a_module_directory() {
    let modules = Arc::new(FakeModules::default());
    let mut shell = shell_with(&modules);
    let err = shell.execute("create demo").await.unwrap_err();
    assert!(matches!(err, ShellError::Module(ModuleError::Unsupported(_))), "{err}");
}
