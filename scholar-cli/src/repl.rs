//! Interactive question loop for `scholar ask`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use scholar_assistant::{PresetQuestion, Session};

use crate::output;

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Preset(PresetQuestion),
    History,
    Export(PathBuf),
    Load(PathBuf),
    Reset,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

impl ReplCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Self::Empty;
        }
        let Some(command) = line.strip_prefix('/') else {
            return Self::Ask(line.to_string());
        };

        let (name, arg) = match command.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (command, ""),
        };

        match (name, arg) {
            ("quit" | "exit" | "q", _) => Self::Quit,
            ("help" | "?", _) => Self::Help,
            ("history", _) => Self::History,
            ("reset", _) => Self::Reset,
            ("export", "") => Self::Invalid("usage: /export <path>".into()),
            ("export", path) => Self::Export(PathBuf::from(path)),
            ("load", "") => Self::Invalid("usage: /load <path>".into()),
            ("load", path) => Self::Load(PathBuf::from(path)),
            ("preset", name) => match name.parse() {
                Ok(preset) => Self::Preset(preset),
                Err(_) => Self::Invalid(format!(
                    "usage: /preset <{}>",
                    PresetQuestion::ALL.map(|p| p.name()).join("|")
                )),
            },
            (other, _) => Self::Invalid(format!("unknown command '/{other}', try /help")),
        }
    }
}

/// Read questions until `/quit` or end of input.
///
/// Failed questions are reported and the loop continues; memory only grows on
/// success.
pub async fn run(session: &mut Session) -> Result<()> {
    let mut editor = DefaultEditor::new().context("failed to start line editor")?;
    print_help();

    loop {
        let line = match editor.readline("scholar> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e).context("failed to read input"),
        };
        if !line.trim().is_empty() {
            let _ = editor.add_history_entry(line.as_str());
        }

        match ReplCommand::parse(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => print_help(),
            ReplCommand::Invalid(message) => println!("{message}"),
            ReplCommand::History => {
                if session.history().is_empty() {
                    println!("(no turns yet)");
                } else {
                    print!("{}", session.export_history());
                }
            }
            ReplCommand::Export(path) => match std::fs::write(&path, session.export_history()) {
                Ok(()) => println!("history written to {}", path.display()),
                Err(e) => eprintln!("error: failed to write {}: {e}", path.display()),
            },
            ReplCommand::Reset => {
                session.reset();
                println!("session cleared; /load a document to continue");
            }
            ReplCommand::Load(path) => match session.load_path(&path).await {
                Ok(summary) => output::print_summary(summary),
                Err(e) => eprintln!("error: {e}"),
            },
            ReplCommand::Ask(question) => match session.ask(&question).await {
                Ok(answer) => output::print_answer(&answer),
                Err(e) => eprintln!("error: {e}"),
            },
            ReplCommand::Preset(preset) => {
                println!("{}", preset.question());
                match session.ask_preset(preset).await {
                    Ok(answer) => output::print_answer(&answer),
                    Err(e) => eprintln!("error: {e}"),
                }
            }
        }
    }

    Ok(())
}

fn print_help() {
    println!("Type a question, or one of:");
    println!("  /preset <name>   ask a canned question (summary, innovation, method, results)");
    println!("  /history         show the conversation");
    println!("  /export <path>   save the conversation as text");
    println!("  /load <path>     index another document");
    println!("  /reset           clear the conversation and the document");
    println!("  /quit            leave");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(ReplCommand::parse("  这篇文章的创新点是什么？ "), ReplCommand::Ask("这篇文章的创新点是什么？".into()));
        assert_eq!(ReplCommand::parse("   "), ReplCommand::Empty);
    }

    #[test]
    fn slash_commands() {
        assert_eq!(ReplCommand::parse("/quit"), ReplCommand::Quit);
        assert_eq!(ReplCommand::parse("/history"), ReplCommand::History);
        assert_eq!(ReplCommand::parse("/reset"), ReplCommand::Reset);
        assert_eq!(ReplCommand::parse("/export chat history.txt"), ReplCommand::Export("chat history.txt".into()));
        assert_eq!(ReplCommand::parse("/load paper.pdf"), ReplCommand::Load("paper.pdf".into()));
        assert_eq!(ReplCommand::parse("/preset results"), ReplCommand::Preset(PresetQuestion::Results));
    }

    #[test]
    fn malformed_commands_are_invalid() {
        assert!(matches!(ReplCommand::parse("/export"), ReplCommand::Invalid(_)));
        assert!(matches!(ReplCommand::parse("/preset nope"), ReplCommand::Invalid(_)));
        assert!(matches!(ReplCommand::parse("/dance"), ReplCommand::Invalid(_)));
    }
}
