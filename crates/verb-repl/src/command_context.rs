use std::fmt;

use itertools::Itertools;
use miette::miette;
use strum::IntoEnumIterator;
use verb_lang::{BUILTIN_COMMAND_DOC, Engine, Evaluation, SIGIL};

#[derive(Debug, Clone)]
pub enum CommandOutput {
    Evaluation(Evaluation),
    String(Vec<String>),
    None,
}

#[derive(Debug, Clone, strum::EnumIter)]
pub enum Command {
    Commands,
    Help,
    Quit,
    Vars,
    Eval(String),
    Version,
    NotFound(String),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Commands => write!(f, ":commands"),
            Command::Help => write!(f, ":help"),
            Command::Quit => write!(f, ":quit"),
            Command::Vars => write!(f, ":vars"),
            Command::Eval(_) => write!(f, ":eval"),
            Command::Version => write!(f, ":version"),
            Command::NotFound(_) => write!(f, ":not_found"),
        }
    }
}

impl Command {
    pub fn help(&self) -> String {
        match self {
            Command::Commands => format!("{:<12}{}", ":commands", "List registered commands"),
            Command::Help => format!("{:<12}{}", ":help", "Print command help"),
            Command::Quit => format!("{:<12}{}", ":quit", "Quit evaluation and exit"),
            Command::Vars => format!("{:<12}{}", ":vars", "List global variables"),
            Command::Eval(_) => format!("{:<12}{}", ":eval", ""),
            Command::NotFound(_) => format!("{:<12}{}", ":not_found", ""),
            Command::Version => format!("{:<12}{}", ":version", "Print verb version"),
        }
    }

    /// Commands a user can type.
    pub fn listed() -> impl Iterator<Item = Command> {
        Command::iter().filter(|c| !matches!(c, Command::Eval(_) | Command::NotFound(_)))
    }
}

impl From<String> for Command {
    fn from(s: String) -> Self {
        match s
            .as_str()
            .split_whitespace()
            .collect::<Vec<&str>>()
            .as_slice()
        {
            [":commands"] => Command::Commands,
            [":help"] => Command::Help,
            [":quit"] => Command::Quit,
            [":vars"] => Command::Vars,
            [":version"] => Command::Version,
            _ if s.trim_start().starts_with(':') => Command::NotFound(s),
            _ => Command::Eval(s),
        }
    }
}

pub struct CommandContext {
    pub(crate) engine: Engine,
}

impl CommandContext {
    pub fn new(engine: Engine) -> Self {
        Self { engine }
    }

    /// Candidates for the word ending at `pos`, with the offset the word starts at.
    pub fn completions(&self, line: &str, pos: usize) -> (usize, Vec<String>) {
        let src = &line[..pos];
        let start = src
            .rfind(|c: char| c.is_whitespace() || c == '(')
            .map(|i| i + 1)
            .unwrap_or(0);
        let word = &src[start..];

        let candidates = if start == 0 && word.starts_with(':') {
            Command::listed().map(|c| c.to_string()).collect_vec()
        } else if word.starts_with(SIGIL) {
            self.engine
                .globals()
                .iter()
                .map(|(name, _)| format!("{SIGIL}{name}"))
                .collect_vec()
        } else {
            self.engine
                .command_names()
                .into_iter()
                .map(str::to_string)
                .collect_vec()
        };

        (
            start,
            candidates
                .into_iter()
                .filter(|candidate| candidate.starts_with(word))
                .collect(),
        )
    }

    pub fn execute(&mut self, to_run: &str) -> miette::Result<CommandOutput> {
        match to_run.to_string().into() {
            Command::Commands => Ok(CommandOutput::String(
                self.engine
                    .command_names()
                    .into_iter()
                    .map(|name| match BUILTIN_COMMAND_DOC.get(name) {
                        Some(doc) => format!(
                            "{:<12}{} {}",
                            name,
                            doc.params.join(" "),
                            doc.description
                        ),
                        None => name.to_string(),
                    })
                    .collect(),
            )),
            Command::Help => Ok(CommandOutput::String(
                Command::listed().map(|c| c.help()).collect(),
            )),
            Command::Quit => {
                std::process::exit(0);
            }
            Command::NotFound(s) => Err(miette!("Command not found: {}", s.trim())),
            Command::Vars => Ok(CommandOutput::String(
                self.engine
                    .globals()
                    .iter()
                    .map(|(name, value)| format!("{SIGIL}{name} = {}", value.repr()))
                    .collect(),
            )),
            Command::Version => Ok(CommandOutput::String(vec![Engine::version().to_string()])),
            Command::Eval(code) => {
                if code.trim().is_empty() {
                    return Ok(CommandOutput::None);
                }

                tracing::debug!(code = code.as_str(), "evaluating");
                self.engine
                    .evaluate(&code)
                    .map(CommandOutput::Evaluation)
                    .map_err(miette::Report::new)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rstest::{fixture, rstest};
    use verb_lang::Value;

    use super::*;

    #[fixture]
    fn ctx() -> CommandContext {
        let mut engine = Engine::default();
        engine.load_builtin_commands();
        CommandContext::new(engine)
    }

    #[test]
    fn test_command_from_string() {
        assert!(matches!(Command::from(":commands".to_string()), Command::Commands));
        assert!(matches!(Command::from(":help".to_string()), Command::Help));
        assert!(matches!(Command::from(":quit".to_string()), Command::Quit));
        assert!(matches!(Command::from(":vars".to_string()), Command::Vars));
        assert!(matches!(Command::from(" :version ".to_string()), Command::Version));
        assert!(matches!(Command::from(":nope".to_string()), Command::NotFound(_)));

        if let Command::Eval(code) = Command::from("print a".to_string()) {
            assert_eq!(code, "print a");
        } else {
            panic!("Expected Eval command");
        }
    }

    #[test]
    fn test_command_help() {
        for cmd in Command::iter() {
            let help = cmd.help();
            assert!(help.starts_with(&cmd.to_string()));
        }
        assert_eq!(Command::listed().count(), 5);
    }

    #[rstest]
    #[case::command("pr", 2, 0, vec!["print"])]
    #[case::nested("print (ti", 9, 7, vec!["time"])]
    #[case::colon(":v", 2, 0, vec![":vars", ":version"])]
    #[case::colon_mid_line("print :v", 8, 6, vec![])]
    #[case::variable("print $~", 8, 6, vec!["$~"])]
    #[case::all_commands("", 0, 0, vec!["print", "time", "type", "version"])]
    fn test_completions(
        mut ctx: CommandContext,
        #[case] line: &str,
        #[case] pos: usize,
        #[case] expected_start: usize,
        #[case] expected: Vec<&str>,
    ) {
        ctx.execute("print a").unwrap();
        let (start, candidates) = ctx.completions(line, pos);
        assert_eq!(start, expected_start);
        assert_eq!(candidates, expected);
    }

    #[rstest]
    fn test_execute_eval(mut ctx: CommandContext) {
        let Ok(CommandOutput::Evaluation(evaluation)) = ctx.execute("print a b") else {
            panic!("Expected Evaluation output");
        };
        assert_eq!(evaluation.value, Value::from("a, b"));

        assert!(matches!(ctx.execute("   "), Ok(CommandOutput::None)));
        assert!(ctx.execute("nope").is_err());
    }

    #[rstest]
    fn test_execute_vars(mut ctx: CommandContext) {
        ctx.execute("$x = 5").unwrap();
        let Ok(CommandOutput::String(vars)) = ctx.execute(":vars") else {
            panic!("Expected String output");
        };
        assert_eq!(vars, vec!["$x = \"5\""]);
    }

    #[rstest]
    fn test_execute_commands(mut ctx: CommandContext) {
        let Ok(CommandOutput::String(commands)) = ctx.execute(":commands") else {
            panic!("Expected String output");
        };
        assert_eq!(commands.len(), 4);
        assert!(commands[0].starts_with("print"));
    }

    #[rstest]
    fn test_execute_help(mut ctx: CommandContext) {
        let Ok(CommandOutput::String(help)) = ctx.execute(":help") else {
            panic!("Expected String output");
        };
        assert!(help.iter().any(|s| s.contains(":vars")));
        assert!(help.iter().all(|s| !s.contains(":eval")));
    }

    #[rstest]
    fn test_execute_version(mut ctx: CommandContext) {
        let Ok(CommandOutput::String(version)) = ctx.execute(":version") else {
            panic!("Expected String output");
        };
        assert_eq!(version, vec![Engine::version().to_string()]);
    }

    #[rstest]
    fn test_execute_not_found(mut ctx: CommandContext) {
        let err = ctx.execute(":nope").unwrap_err();
        assert_eq!(err.to_string(), "Command not found: :nope");
    }
}
