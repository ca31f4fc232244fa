//! `orca start`: pick a directory, wait for the session, then drive it from
//! an interactive prompt.

use std::sync::Arc;

use anyhow::{bail, Context};
use console::style;
use orca_client::{Bootstrap, ClientConfig, CommandStatus, SessionClient};
use orca_protocol::{DirectoryInfo, ServerInfo};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use crate::cmd_dirs::directory_table;

type StdinLines = Lines<BufReader<Stdin>>;

pub async fn run(config: &ClientConfig, dir: Option<&str>) -> anyhow::Result<()> {
    let mut bootstrap = Bootstrap::connect(&config.server_url)?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let result = drive(&mut bootstrap, &mut lines, config, dir).await;
    bootstrap.close();
    result
}

async fn drive(
    bootstrap: &mut Bootstrap,
    lines: &mut StdinLines,
    config: &ClientConfig,
    dir: Option<&str>,
) -> anyhow::Result<()> {
    let directories = bootstrap
        .wait_for_catalog(Some(config.request_timeout))
        .await?
        .to_vec();
    if directories.is_empty() {
        bail!("{} offers no directories", config.server_url);
    }

    let path = match dir {
        Some(wanted) => match find_directory(&directories, wanted) {
            Some(found) => found.path.clone(),
            None => bail!("no directory named or located at {wanted:?}"),
        },
        None => ask_for_directory(&directories, lines).await?,
    };

    if !bootstrap.select_directory(&path) {
        bail!("connection lost before the directory could be selected");
    }
    println!("  {} {}", style("Starting session in").dim(), path);

    let session = bootstrap
        .wait_for_session(config.session_ready_timeout)
        .await?;
    print_session(&session);

    let client = Arc::new(SessionClient::new(
        &config.server_url,
        session,
        config.request_timeout,
    )?);
    repl(bootstrap, lines, client).await
}

/// Match `wanted` against paths first, then names.
fn find_directory<'a>(directories: &'a [DirectoryInfo], wanted: &str) -> Option<&'a DirectoryInfo> {
    directories
        .iter()
        .find(|d| d.path == wanted)
        .or_else(|| directories.iter().find(|d| d.name == wanted))
}

async fn ask_for_directory(
    directories: &[DirectoryInfo],
    lines: &mut StdinLines,
) -> anyhow::Result<String> {
    println!();
    println!("{}", directory_table(directories));
    loop {
        println!("  Pick a directory [1-{}]:", directories.len());
        let Some(line) = lines.next_line().await.context("reading stdin")? else {
            bail!("stdin closed before a directory was chosen");
        };
        let choice = line
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| directories.get(index));
        match choice {
            Some(dir) => return Ok(dir.path.clone()),
            None => println!("  {}", style("Not a listed number").yellow()),
        }
    }
}

fn print_session(session: &ServerInfo) {
    println!();
    println!("  {}", style("Session ready").green().bold());
    println!("  Session:   {}", session.session_id);
    println!("  Directory: {}", session.directory);
    println!("  Model:     {}", session.current_model);
    println!("  Agent:     {}", session.current_agent);
    if !session.share_url.is_empty() {
        println!("  Share:     {}", session.share_url);
    }
    println!();
    println!("  {}", style("Type a prompt, or /help for commands").dim());
}

#[derive(Debug, PartialEq, Eq)]
enum ReplCommand<'a> {
    Prompt(&'a str),
    Model(&'a str),
    Agent(&'a str),
    ListModels,
    ListAgents,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_line(line: &str) -> ReplCommand<'_> {
    let Some(command) = line.trim_start().strip_prefix('/') else {
        return ReplCommand::Prompt(line);
    };
    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command.trim_end(), ""),
    };
    match name {
        "model" => ReplCommand::Model(arg),
        "agent" => ReplCommand::Agent(arg),
        "models" => ReplCommand::ListModels,
        "agents" => ReplCommand::ListAgents,
        "help" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        other => ReplCommand::Unknown(other),
    }
}

async fn repl(
    bootstrap: &mut Bootstrap,
    lines: &mut StdinLines,
    client: Arc<SessionClient>,
) -> anyhow::Result<()> {
    loop {
        tokio::select! {
            inbound = bootstrap.next() => {
                if inbound.is_none() {
                    println!("  {}", style("Connection closed").red());
                    return Ok(());
                }
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    return Ok(());
                };
                match parse_line(&line) {
                    ReplCommand::Quit => return Ok(()),
                    ReplCommand::Help => print_help(),
                    ReplCommand::ListModels => list_models(&client),
                    ReplCommand::ListAgents => list_agents(&client),
                    ReplCommand::Model(model) => {
                        let client = Arc::clone(&client);
                        let model = model.to_string();
                        tokio::spawn(async move {
                            let outcome = client.set_model(&model).await;
                            report("model", &model, outcome);
                        });
                    }
                    ReplCommand::Agent(agent) => {
                        let client = Arc::clone(&client);
                        let agent = agent.to_string();
                        tokio::spawn(async move {
                            let outcome = client.set_agent(&agent).await;
                            report("agent", &agent, outcome);
                        });
                    }
                    ReplCommand::Prompt(text) => {
                        let client = Arc::clone(&client);
                        let mut input = text.to_string();
                        tokio::spawn(async move {
                            match client.submit_prompt(&mut input).await {
                                Ok(CommandStatus::Sent) => {
                                    println!("  {}", style("Prompt sent").dim());
                                }
                                Ok(CommandStatus::Busy) => println!(
                                    "  {}",
                                    style("Still sending the previous prompt").yellow()
                                ),
                                Ok(CommandStatus::Invalid) => {}
                                Err(e) => println!("  {} {e}", style("Prompt failed:").red()),
                            }
                        });
                    }
                    ReplCommand::Unknown(name) => println!(
                        "  {} /{name} (try /help)",
                        style("Unknown command").yellow()
                    ),
                }
            }
        }
    }
}

fn report(
    kind: &str,
    value: &str,
    outcome: Result<CommandStatus, orca_client::CommandError>,
) {
    match outcome {
        Ok(CommandStatus::Sent) => println!("  {kind} set to {value}"),
        Ok(CommandStatus::Busy) => {
            println!("  {}", style(format!("A {kind} change is already in flight")).yellow())
        }
        Ok(CommandStatus::Invalid) => {
            println!("  {}", style(format!("Unknown {kind} {value:?}")).yellow())
        }
        Err(e) => println!("  {} {e}", style(format!("Setting {kind} failed:")).red()),
    }
}

fn list_models(client: &SessionClient) {
    let current = client.current_model();
    for model in &client.session().models {
        let marker = if *model == *current { "*" } else { " " };
        println!("  {marker} {model}");
    }
}

fn list_agents(client: &SessionClient) {
    let current = client.current_agent();
    for agent in &client.session().agents {
        let marker = if agent.name == *current { "*" } else { " " };
        match &agent.description {
            Some(description) => println!("  {marker} {:<12} {}", agent.name, style(description).dim()),
            None => println!("  {marker} {}", agent.name),
        }
    }
}

fn print_help() {
    println!("  /model <name>   switch model");
    println!("  /agent <name>   make <name> the only enabled agent");
    println!("  /models         list models");
    println!("  /agents         list agents");
    println!("  /quit           leave");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directories() -> Vec<DirectoryInfo> {
        vec![
            DirectoryInfo { name: "app".into(), path: "/src/app".into() },
            DirectoryInfo { name: "/src/app".into(), path: "/other".into() },
        ]
    }

    #[test]
    fn path_match_wins_over_name() {
        let dirs = directories();
        assert_eq!(find_directory(&dirs, "/src/app").unwrap().path, "/src/app");
        assert_eq!(find_directory(&dirs, "app").unwrap().path, "/src/app");
        assert!(find_directory(&dirs, "missing").is_none());
    }

    #[test]
    fn parses_repl_lines() {
        assert_eq!(parse_line("fix the tests"), ReplCommand::Prompt("fix the tests"));
        assert_eq!(parse_line("/model openai/gpt-5"), ReplCommand::Model("openai/gpt-5"));
        assert_eq!(parse_line("  /agent   plan "), ReplCommand::Agent("plan"));
        assert_eq!(parse_line("/models"), ReplCommand::ListModels);
        assert_eq!(parse_line("/agents"), ReplCommand::ListAgents);
        assert_eq!(parse_line("/quit"), ReplCommand::Quit);
        assert_eq!(parse_line("/model"), ReplCommand::Model(""));
        assert_eq!(parse_line("/bogus x"), ReplCommand::Unknown("bogus"));
    }
}
