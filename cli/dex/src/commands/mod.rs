mod list;
mod show;
mod triggers;

use std::fmt;

use anyhow::Result;
use bpaf::{Bpaf, ParseFailure};
use dex_rust_sdk::dex::Dex;
use indoc::{formatdoc, indoc};
use tracing::debug;

use crate::config::Config;
use crate::utils::init::init_catalog_client;
use crate::utils::message;

pub const DEX_VERSION: &str = env!("CARGO_PKG_VERSION");

static DEX_DESCRIPTION: &'_ str = indoc! {"
    dex browses the public Pokémon catalog from the terminal.

    List and search Pokémon, show their details and page through evolution triggers."
};

fn vec_len<T>(x: Vec<T>) -> usize {
    Vec::len(&x)
}

#[derive(Bpaf, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verbosity {
    Verbose(
        /// Increase logging verbosity
        ///
        /// Invoke multiple times for increasing detail.
        #[bpaf(short('v'), long("verbose"), req_flag(()), many, map(vec_len))]
        usize,
    ),

    /// Silence logs except for errors
    #[bpaf(short, long)]
    Quiet,
}

impl Default for Verbosity {
    fn default() -> Self {
        Verbosity::Verbose(0)
    }
}

#[derive(Bpaf)]
#[bpaf(options, descr(DEX_DESCRIPTION), version(DEX_VERSION))]
pub struct DexCli(#[bpaf(external(dex_args))] pub DexArgs);

/// Main dex args parser
///
/// To parse the dex CLI, use [`DexCli`] instead using [`dex_cli()`].
#[derive(Debug, Bpaf)]
#[bpaf(ignore_rustdoc)]
pub struct DexArgs {
    /// Verbose mode
    ///
    /// Invoke multiple times for increasing detail.
    #[bpaf(external, fallback(Default::default()))]
    pub verbosity: Verbosity,

    #[bpaf(external(commands), optional)]
    command: Option<Commands>,
}

impl DexArgs {
    /// Run the selected command
    ///
    /// The catalog client is only set up for commands that query the catalog.
    pub async fn handle(self, config: Config) -> Result<()> {
        let Some(command) = self.command else {
            print_welcome_message();
            return Ok(());
        };

        match command {
            Commands::Help(args) => args.handle(),
            Commands::List(args) => args.handle(init_dex(&config)?).await?,
            Commands::Show(args) => args.handle(init_dex(&config)?).await?,
            Commands::Triggers(args) => args.handle(init_dex(&config)?).await?,
        }
        Ok(())
    }
}

fn init_dex(config: &Config) -> Result<Dex> {
    let catalog_client = init_catalog_client(config)?;
    let mut dex = Dex::new(catalog_client);
    dex.page_size = config.page_size;
    dex.trigger_page_size = config.trigger_page_size;
    debug!(?dex, "initialized dex");
    Ok(dex)
}

fn print_welcome_message() {
    message::plain(formatdoc! {"
        dex version {DEX_VERSION}

        Usage: dex OPTIONS (list|show|triggers) [--help]

        Use 'dex --help' for full list of commands and more information
    "});
}

#[derive(Bpaf, Clone)]
enum Commands {
    /// Prints help information
    #[bpaf(command, hide)]
    Help(#[bpaf(external(help))] Help),

    /// List Pokémon page by page or search them by name
    #[bpaf(command)]
    List(#[bpaf(external(list::list))] list::List),

    /// Show the details of a single Pokémon
    #[bpaf(command)]
    Show(#[bpaf(external(show::show))] show::Show),

    /// List evolution triggers
    #[bpaf(command)]
    Triggers(#[bpaf(external(triggers::triggers))] triggers::Triggers),
}

impl fmt::Debug for Commands {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Command")
    }
}

#[derive(Debug, Bpaf, Clone)]
struct Help {
    /// Command to show help for
    #[bpaf(positional("cmd"))]
    cmd: Option<String>,
}

/// Force `--help` output for `dex` with a given command
pub fn display_help(cmd: Option<String>) {
    let mut args = Vec::from_iter(cmd.as_deref());
    args.push("--help");

    match dex_cli().run_inner(&*args) {
        Ok(_) => message::error("expected help output"),
        Err(ParseFailure::Completion(comp)) => print!("{comp:80}"),
        Err(ParseFailure::Stdout(doc, _)) => message::plain(format!("{doc:80}")),
        Err(ParseFailure::Stderr(err)) => message::error(err),
    }
}

impl Help {
    fn handle(self) {
        display_help(self.cmd);
    }
}
