//! Embed modsh as an expression engine in your Rust application.
//!
//! Run:  cargo run -p modsh --example embed

use modsh::display::Renderer;
use modsh::{Evaluation, ShellBuilder, ShellResult};

fn show(label: &str, eval: &Evaluation) {
    println!("\n== {label} ==");
    println!("status: {}", eval.status());
    match Renderer::new(false).render(eval) {
        Some(text) => println!("{text}"),
        None => println!("<nothing>"),
    }
}

#[tokio::main]
async fn main() -> ShellResult<()> {
    let mut shell = ShellBuilder::new()
        .var("app_name", "embed-demo")
        .builtin("shout", "Uppercase with emphasis", |args: &[String]| {
            Ok(format!("{}!", args.join(" ").to_uppercase()))
        })
        .build();

    println!("modsh embedded demo");
    println!("app_name from builder: {:?}", shell.get_var("app_name"));

    let eval = shell.execute("shout(hello, $app_name)").await?;
    show("custom builtin", &eval);

    shell.set_var("target", "10.0.0.1")?;
    let eval = shell.execute("echo(scanning $target)").await?;
    show("set_var/get_var", &eval);

    let eval = shell.execute("toupper($(shout hi))").await?;
    show("inline substitution", &eval);

    let eval = shell.execute("for i in 1..3 -> echo(item $i)").await?;
    show("for loop", &eval);

    let eval = shell.execute("\"apple\" |> reverse |> toupper").await?;
    show("pipeline", &eval);

    match shell.execute("echo(unbalanced").await {
        Ok(eval) => show("unexpected success", &eval),
        Err(e) => println!("\n== parse error ==\n{e}"),
    }
    println!("last status: {}", shell.last_status());

    Ok(())
}
