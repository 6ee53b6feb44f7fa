use anyhow::{Context, Result};
use clap::Parser;
use eliza_core::{Chooser, ElizaConfig, RandomChooser, SelectionMode, SessionConfig, Template};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing::{debug, info};

const PROMPT: &str = "> ";
const CONFIG_FILE: &str = "eliza.toml";
const ANONYMOUS: &str = "friend";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file (defaults to ./eliza.toml, then the user config dir)
    #[arg(short, long, env = "ELIZA_CONFIG")]
    config: Option<PathBuf>,

    /// Rule table to use instead of the built-in one
    #[arg(short, long)]
    rules: Option<PathBuf>,

    /// Seed for random template selection and the farewell
    #[arg(long)]
    seed: Option<u64>,

    /// Pick templates at random instead of rotating through them
    #[arg(long)]
    random: bool,

    /// Skip the name prompt
    #[arg(short, long)]
    name: Option<String>,
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(&args);

    let eliza = config.build_engine().context("Failed to build the responder")?;
    info!(
        "Rule table ready: {} keywords, {} fallbacks",
        eliza.table().entries().len(),
        eliza.table().fallbacks().len()
    );

    let session = &config.session;
    let mut farewells = RandomChooser::new(config.engine.seed);
    let mut rl = DefaultEditor::new().context("Failed to open the terminal")?;

    let name = match args.name.as_deref() {
        Some(name) => name.trim().to_string(),
        None => {
            say(session, &session.greeting);
            match read_line(&mut rl)? {
                Some(line) if !line.trim().is_empty() => line.trim().to_string(),
                Some(_) => ANONYMOUS.to_string(),
                None => {
                    say(session, &farewell(session, &mut farewells));
                    return Ok(());
                }
            }
        }
    };

    let mut state = eliza.initialize(&name);
    say(session, &Template::parse(&session.welcome).render(&[], &name));

    while let Some(line) = read_line(&mut rl)? {
        let input = line.trim();
        if session.is_quit(input) {
            break;
        }
        if input.is_empty() {
            say(session, &session.empty_input_reply);
            continue;
        }
        let _ = rl.add_history_entry(input);

        let response = eliza.respond_traced(input, &mut state);
        debug!(origin = ?response.origin, "Turn {}", state.turns());
        say(session, &response.text);
    }

    say(session, &farewell(session, &mut farewells));
    Ok(())
}

/// Config file lookup: `--config`, then `./eliza.toml`, then the user config
/// directory. Command-line flags override whatever was loaded.
fn load_config(args: &Args) -> ElizaConfig {
    let path = args.config.clone().unwrap_or_else(|| {
        let local = PathBuf::from(CONFIG_FILE);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|dir| dir.join("eliza").join(CONFIG_FILE))
            .unwrap_or(local)
    });
    info!("Loading config from {}", path.display());

    let mut config = ElizaConfig::load_or_default(&path);
    if let Some(rules) = &args.rules {
        config.rules.path = Some(rules.clone());
    }
    if let Some(seed) = args.seed {
        config.engine.seed = Some(seed);
    }
    if args.random {
        config.engine.selection = SelectionMode::Random;
    }
    config
}

/// `None` on end of input or Ctrl-C/Ctrl-D.
fn read_line(rl: &mut DefaultEditor) -> Result<Option<String>> {
    match rl.readline(PROMPT) {
        Ok(line) => Ok(Some(line)),
        Err(ReadlineError::Eof | ReadlineError::Interrupted) => Ok(None),
        Err(e) => Err(e).context("Failed to read input"),
    }
}

fn say(session: &SessionConfig, text: &str) {
    println!("{}: {}", session.bot_name, text);
}

/// A farewell drawn with the session seed, so seeded runs end the same way.
fn farewell(session: &SessionConfig, chooser: &mut dyn Chooser) -> String {
    let index = chooser.choose(session.farewells.len().max(1));
    session
        .farewells
        .get(index)
        .cloned()
        .unwrap_or_else(|| "Goodbye.".to_string())
}
