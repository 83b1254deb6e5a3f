use clap::Parser;
use miette::miette;
use verb_lang::Engine;
use verb_repl::{Repl, demo};

#[derive(Parser, Debug)]
#[command(name = "verb")]
#[command(version)]
#[command(after_help = "Examples:\n\n\
    To evaluate a single command:\n\
    $ verb -c 'print (time ms)'\n\n\
    To start a REPL session with the demo commands:\n\
    $ verb --demo")]
#[command(
    about = "verb evaluates a small command language with nested calls and $ variables.",
    long_about = None
)]
pub struct Cli {
    /// Evaluate the command and exit instead of starting a REPL
    #[arg(short = 'c', long = "command")]
    command: Option<String>,

    /// Treat an unregistered command name as a literal value
    #[arg(long)]
    allow_unknown: bool,

    /// Name of the variable that receives the last output
    #[arg(long, default_value = "~")]
    last_output_name: String,

    /// Record the output of nested commands as the last output too
    #[arg(long)]
    always_set_last_output: bool,

    /// Number of characters shown around a syntax error
    #[arg(long, default_value_t = 20)]
    context_radius: usize,

    /// Register the team directory demo commands
    #[arg(long)]
    demo: bool,

    /// Increase logging verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "verb=warn",
            1 => "verb=debug",
            _ => "verb=trace",
        }
    }

    pub fn run(&self) -> miette::Result<()> {
        let mut engine = self.create_engine();

        match &self.command {
            Some(code) => match engine.evaluate(code) {
                Ok(evaluation) => {
                    println!("{evaluation}");
                    Ok(())
                }
                Err(err) => {
                    eprintln!("{}", err.render(self.context_radius));
                    Err(miette!("Failed to evaluate command"))
                }
            },
            None => Repl::new(engine).run(),
        }
    }

    fn create_engine(&self) -> Engine {
        let mut engine = Engine::default();
        engine.load_builtin_commands();
        engine.set_unknown_command_is_error(!self.allow_unknown);
        engine.set_last_output_name(&self.last_output_name);
        engine.set_always_set_last_output(self.always_set_last_output);
        engine.set_context_radius(self.context_radius);

        if self.demo {
            demo::install(&mut engine);
        }

        engine
    }
}
