use clap::Parser;
use modsh::display::Renderer;
use modsh::{Evaluation, SessionVars, Shell};
use modsh_config::{expand_path, ConfigLoader, LogFormat, ModshConfig};
use modsh_core::{Interpreters, ModuleManager};
use std::env;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock};

mod completer;

/// modsh - Interactive expression shell for running modular tools
#[derive(Parser, Debug)]
#[command(name = "modsh", version, about)]
struct Args {
    /// Directory containing module subdirectories
    #[arg(short, long, env = "MODSH_MODULES_DIR")]
    modules: Option<PathBuf>,

    /// Configuration file (replaces the default search paths)
    #[arg(long, env = "MODSH_CONFIG")]
    config: Option<String>,

    /// Execute command and exit
    #[arg(short = 'c')]
    command: Option<String>,

    /// Script file to execute, one command per line
    script: Option<PathBuf>,

    /// Do not print the banner
    #[arg(long)]
    no_banner: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::new().with_file(path).load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {e}, using defaults");
            ModshConfig::default()
        }),
        None => modsh_config::load().unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config: {e}, using defaults");
            ModshConfig::default()
        }),
    };
    init_logging(&config);

    let modules_dir = args
        .modules
        .clone()
        .unwrap_or_else(|| expand_path(&config.modules.dir));
    let manager = ModuleManager::new(
        modules_dir,
        Interpreters {
            python: config.modules.python.clone(),
            bash: config.modules.bash.clone(),
        },
    );
    if let Err(e) = manager.discover() {
        eprintln!("Warning: Could not scan modules: {e}");
    }

    let session = if config.session.persist {
        SessionVars::persistent(expand_path(&config.session.file))
    } else {
        SessionVars::new()
    };

    let mut shell = Shell::builder()
        .modules(Arc::new(manager))
        .session(session)
        .build();

    if let Some(command) = args.command {
        let code = run_line(&mut shell, &command, Renderer::new(false)).await;
        std::process::exit(code);
    } else if let Some(script_path) = args.script {
        match std::fs::read_to_string(&script_path) {
            Ok(content) => {
                let code = run_script(&mut shell, &content).await;
                std::process::exit(code);
            }
            Err(e) => {
                eprintln!("modsh: cannot read '{}': {e}", script_path.display());
                std::process::exit(1);
            }
        }
    } else {
        let banner = config.shell.banner && !args.no_banner;
        run_repl(&mut shell, &config, banner).await?;
    }

    Ok(())
}

fn init_logging(config: &ModshConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(config.logging.level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    match config.logging.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Pretty => builder.init(),
    }
}

/// Execute one line and print its result. Returns the exit status.
async fn run_line(shell: &mut Shell, line: &str, renderer: Renderer) -> i32 {
    match shell.execute(line).await {
        Ok(eval) => {
            if let Some(text) = renderer.render(&eval) {
                println!("{text}");
            }
            eval.status()
        }
        Err(e) => {
            eprintln!("modsh: {e}");
            1
        }
    }
}

/// Run each non-empty, non-comment line. Stops at the first error or `exit`.
async fn run_script(shell: &mut Shell, content: &str) -> i32 {
    let renderer = Renderer::new(false);
    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match shell.execute(line).await {
            Ok(Evaluation::Exit) => return 0,
            Ok(eval) => {
                if let Some(text) = renderer.render(&eval) {
                    println!("{text}");
                }
            }
            Err(e) => {
                eprintln!("modsh: {e}");
                return 1;
            }
        }
    }
    shell.last_status()
}

fn prompt_user() -> String {
    env::var("USER").unwrap_or_else(|_| "anonymous".to_string())
}

fn prompt_cwd() -> String {
    env::current_dir().map_or_else(|_| ".".to_string(), |p| p.display().to_string())
}

fn print_banner(shell: &Shell) {
    println!("modsh v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "{} modules, {} builtins. Type 'help' for help, 'exit' to quit.",
        shell.modules().modules().len(),
        shell.builtins().len()
    );
    println!();
}

async fn run_repl(
    shell: &mut Shell,
    config: &ModshConfig,
    banner: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    use completer::{ModshHelper, Names};
    use rustyline::error::ReadlineError;
    use rustyline::{CompletionType, Config, Editor};

    let history = &config.shell.history;
    let rl_config = Config::builder()
        .completion_type(CompletionType::List)
        .max_history_size(history.max_entries)?
        .history_ignore_dups(true)?
        .history_ignore_space(true)
        .build();

    let names = Arc::new(RwLock::new(Names::default()));
    let helper = ModshHelper::new(
        shell.builtins().names().map(str::to_string).collect(),
        Arc::clone(&names),
    );

    let mut rl = Editor::with_config(rl_config)?;
    rl.set_helper(Some(helper));

    let history_path = history.enabled.then(|| expand_path(&history.file));
    if let Some(path) = &history_path {
        let _ = rl.load_history(path);
    }

    if banner {
        print_banner(shell);
    }
    let renderer = Renderer::new(true);

    loop {
        {
            let mut guard = names.write().unwrap_or_else(PoisonError::into_inner);
            guard.modules = shell.modules().modules().into_iter().map(|m| m.name).collect();
            guard.vars = shell.session().iter().map(|(k, _)| k.to_string()).collect();
        }

        let prompt = config
            .shell
            .prompt
            .replace("{cwd}", &prompt_cwd())
            .replace("{user}", &prompt_user())
            .replace("{status}", &shell.last_status().to_string())
            .replace("{modules}", &shell.modules().modules().len().to_string())
            .replace("{red}", "\x1b[31m")
            .replace("{green}", "\x1b[32m")
            .replace("{blue}", "\x1b[34m")
            .replace("{yellow}", "\x1b[33m")
            .replace("{cyan}", "\x1b[36m")
            .replace("{bold}", "\x1b[1m")
            .replace("{reset}", "\x1b[0m");

        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                match shell.execute(line).await {
                    Ok(Evaluation::Exit) => break,
                    Ok(Evaluation::Confirm { prompt, command }) => {
                        let answer = rl.readline(&prompt).unwrap_or_default();
                        if answer.trim().eq_ignore_ascii_case("yes") {
                            run_line(shell, &command, renderer).await;
                        } else {
                            println!("Cancelled");
                        }
                    }
                    Ok(Evaluation::Clear) => {
                        let _ = rl.clear_screen();
                    }
                    Ok(eval) => {
                        if let Some(text) = renderer.render(&eval) {
                            println!("{text}");
                        }
                    }
                    Err(e) => eprintln!("modsh: {e}"),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("exit");
                break;
            }
            Err(err) => {
                eprintln!("Error: {err:?}");
                break;
            }
        }
    }

    if let Some(path) = &history_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = rl.save_history(path);
    }

    Ok(())
}
