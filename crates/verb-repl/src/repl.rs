use colored::*;
use itertools::Itertools;
use miette::IntoDiagnostic;
use rustyline::{
    At, Cmd, CompletionType, Config, Context, EditMode, Editor, Helper, KeyCode, KeyEvent,
    Modifiers, Movement, Word,
    completion::{Completer, Pair},
    error::ReadlineError,
    highlight::{CmdKind, Highlighter, MatchingBracketHighlighter},
    hint::Hinter,
    validate::{ValidationContext, ValidationResult, Validator},
};
use std::{borrow::Cow, cell::RefCell, fs, path::PathBuf, rc::Rc};
use verb_lang::Engine;

use crate::command_context::{CommandContext, CommandOutput};

const PROMPT: &str = "verb> ";
const HISTORY_FILE: &str = "history.txt";

pub struct VerbLineHelper {
    command_context: Rc<RefCell<CommandContext>>,
    matching_bracket_highlighter: MatchingBracketHighlighter,
}

impl VerbLineHelper {
    pub fn new(command_context: Rc<RefCell<CommandContext>>) -> Self {
        Self {
            command_context,
            matching_bracket_highlighter: MatchingBracketHighlighter::default(),
        }
    }
}

impl Hinter for VerbLineHelper {
    type Hint = String;
}

impl Highlighter for VerbLineHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        _default: bool,
    ) -> Cow<'b, str> {
        prompt.cyan().to_string().into()
    }

    fn highlight_char(&self, line: &str, pos: usize, kind: CmdKind) -> bool {
        self.matching_bracket_highlighter
            .highlight_char(line, pos, kind)
    }
}

impl Validator for VerbLineHelper {
    fn validate(&self, ctx: &mut ValidationContext<'_>) -> Result<ValidationResult, ReadlineError> {
        let input = ctx.input();
        if input.is_empty() || input.ends_with('\n') || input.starts_with(':') {
            return Ok(ValidationResult::Valid(None));
        }

        // An open quote or paren continues on the next line; other errors are reported on submit.
        match verb_lang::slot_plan(input) {
            Err(err) if err.is_incomplete() => Ok(ValidationResult::Incomplete),
            _ => Ok(ValidationResult::Valid(None)),
        }
    }

    fn validate_while_typing(&self) -> bool {
        false
    }
}

impl Completer for VerbLineHelper {
    type Candidate = Pair;
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let (start, candidates) = self.command_context.borrow().completions(line, pos);
        let completions = candidates
            .into_iter()
            .map(|candidate| Pair {
                display: candidate.clone(),
                replacement: candidate,
            })
            .collect_vec();

        Ok((start, completions))
    }
}

impl Helper for VerbLineHelper {}

pub struct Repl {
    command_context: Rc<RefCell<CommandContext>>,
}

impl Repl {
    pub fn new(engine: Engine) -> Self {
        Self {
            command_context: Rc::new(RefCell::new(CommandContext::new(engine))),
        }
    }

    pub fn config_dir() -> Option<PathBuf> {
        std::env::var_os("VERB_CONFIG_DIR")
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|d| d.join("verb")))
    }

    pub fn run(&self) -> miette::Result<()> {
        let config = Config::builder()
            .history_ignore_space(true)
            .completion_type(CompletionType::List)
            .edit_mode(EditMode::Emacs)
            .color_mode(rustyline::ColorMode::Enabled)
            .build();
        let mut editor = Editor::with_config(config).into_diagnostic()?;
        let helper = VerbLineHelper::new(Rc::clone(&self.command_context));

        editor.set_helper(Some(helper));
        editor.bind_sequence(
            KeyEvent(KeyCode::Left, Modifiers::CTRL),
            Cmd::Move(Movement::BackwardWord(1, Word::Big)),
        );
        editor.bind_sequence(
            KeyEvent(KeyCode::Right, Modifiers::CTRL),
            Cmd::Move(Movement::ForwardWord(1, At::AfterEnd, Word::Big)),
        );

        let history = Self::config_dir().map(|config_dir| {
            fs::create_dir_all(&config_dir).ok();
            config_dir.join(HISTORY_FILE)
        });

        if let Some(history) = &history {
            if editor.load_history(history).is_err() {
                println!("No previous history.");
            }
        }

        println!("Welcome to verb. For help, type :help");

        loop {
            let readline = editor.readline(PROMPT);

            match readline {
                Ok(line) => {
                    let output = self.command_context.borrow_mut().execute(&line);
                    match output {
                        Ok(CommandOutput::String(s)) => println!("{}", s.join("\n")),
                        Ok(CommandOutput::Evaluation(evaluation)) => {
                            match evaluation.message {
                                Some(message) => println!("{message}"),
                                None if evaluation.value.is_none() => {}
                                None => println!("{}", evaluation.value),
                            }

                            editor.add_history_entry(&line).into_diagnostic()?;
                        }
                        Ok(CommandOutput::None) => (),
                        Err(e) => {
                            eprintln!("{:?}", e)
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    break;
                }
                Err(err) => {
                    eprintln!("Error: {:?}", err);
                    break;
                }
            }

            if let Some(history) = &history {
                if let Err(err) = editor.save_history(history) {
                    tracing::warn!(path = %history.display(), error = %err, "failed to save history");
                }
            }
        }

        Ok(())
    }
}
