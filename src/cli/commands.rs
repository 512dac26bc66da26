//! Command dispatch

use std::io::{self, BufRead};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{FavouriteStore, Pick};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::{output, progress};
use crate::config::{global_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

/// Run the command given on the command line.
pub fn execute_command(cli: &Cli) -> CliResult<()> {
    match &cli.command {
        Some(Commands::Completion { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Config { command }) => return cmd_config(command),
        _ => {}
    }

    let settings = Settings::load()?;
    debug!("settings: {:?}", settings);
    let container = ServiceContainer::new(settings)?;
    run(cli, &container, &mut io::stdin().lock())
}

/// Run a browse command against `container`; `input` answers the
/// "continue" prompt of the interactive walk.
pub fn run(cli: &Cli, container: &ServiceContainer, input: &mut dyn BufRead) -> CliResult<()> {
    match &cli.command {
        None => cmd_walk(container, cli.no_browser, input),
        Some(Commands::Random) => cmd_random(container, cli.no_browser),
        Some(Commands::Surprise) => cmd_surprise(container, cli.no_browser),
        Some(Commands::Profile) => cmd_profile(&container.browse.favourites()),
        Some(Commands::Reset) => cmd_reset(container),
        Some(Commands::Cache) => cmd_cache(container),
        Some(Commands::Tree { levels }) => cmd_tree(container, *levels),
        Some(Commands::Config { command }) => cmd_config(command),
        Some(Commands::Completion { .. }) => Ok(()),
    }
}

#[instrument(skip_all)]
fn cmd_walk(container: &ServiceContainer, no_browser: bool, input: &mut dyn BufRead) -> CliResult<()> {
    let mut nav = container.browse.load_navigator()?;

    loop {
        let mut favourites = container.browse.favourites();
        match container
            .browse
            .walk(&mut nav, container.selector.as_ref(), &mut favourites)
        {
            Ok(Some(pick)) => {
                if let Err(e) = container.browse.save_favourites(&favourites) {
                    output::warning(&format!("choices not saved: {e}"));
                }
                show_pick(container, &pick, no_browser);
            }
            Ok(None) => return Ok(()),
            Err(e) if e.is_navigation() => return Err(e.into()),
            Err(e) => output::error(&e),
        }

        output::prompt("Continue walking? (y/n)");
        if !confirmed(input)? {
            return Ok(());
        }
    }
}

fn confirmed(input: &mut dyn BufRead) -> CliResult<bool> {
    let mut answer = String::new();
    input
        .read_line(&mut answer)
        .map_err(|e| InfraError::io("read answer", e))?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

#[instrument(skip_all)]
fn cmd_random(container: &ServiceContainer, no_browser: bool) -> CliResult<()> {
    let mut nav = container.browse.load_navigator()?;
    let pick = container.browse.random(&mut nav)?;
    show_pick(container, &pick, no_browser);
    Ok(())
}

#[instrument(skip_all)]
fn cmd_surprise(container: &ServiceContainer, no_browser: bool) -> CliResult<()> {
    let favourites = container.browse.favourites();
    let mut nav = container.browse.load_navigator()?;
    let pick = container.browse.surprise(&mut nav, &favourites)?;
    show_pick(container, &pick, no_browser);
    Ok(())
}

fn cmd_profile(favourites: &FavouriteStore) -> CliResult<()> {
    if favourites.is_empty() {
        output::info("No choices yet. Walk the lists to record some.");
        return Ok(());
    }
    output::header("Your choices:");
    for category in favourites.tree().children() {
        output::info(&category.name);
        for subcategory in category.children() {
            output::detail(&subcategory.name);
        }
    }
    Ok(())
}

fn cmd_reset(container: &ServiceContainer) -> CliResult<()> {
    container.browse.reset()?;
    output::success("The choice list has been cleared.");
    Ok(())
}

#[instrument(skip_all)]
fn cmd_cache(container: &ServiceContainer) -> CliResult<()> {
    output::info("Downloading all reachable lists to cache.");
    output::info("This may take some time!");

    let (tx, renderer) = progress::spawn();
    let result = container.browse.cache(tx);
    // The sender is gone once `cache` returns, so the renderer always ends
    let _ = renderer.join();
    let outcome = result?;

    output::info(&format!(
        "Downloaded {} / Failed {}",
        outcome.summary.crawled, outcome.summary.errors
    ));
    for error in &outcome.errors {
        output::failure(error);
    }
    Ok(())
}

fn cmd_tree(container: &ServiceContainer, levels: usize) -> CliResult<()> {
    let Some(tree) = container.browse.cached_tree() else {
        output::warning("no cached tree, run `awesome cache` first");
        return Ok(());
    };
    output::info(&tree.to_termtree_limited(levels));
    let leaves = tree.leaves().len();
    output::detail(&format!(
        "{} categories, {} repos",
        tree.children().len(),
        leaves
    ));
    Ok(())
}

fn cmd_config(command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = Settings::load()?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => match global_config_path() {
            Some(path) => output::info(&path.display()),
            None => output::warning("no config directory on this platform"),
        },
        ConfigCommands::Init { force } => {
            let path = global_config_path()
                .ok_or_else(|| CliError::Usage("no config directory on this platform".into()))?;
            if path.exists() && !force {
                return Err(CliError::Usage(format!(
                    "{} exists, use --force to overwrite",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| InfraError::io(format!("create {}", parent.display()), e))?;
            }
            std::fs::write(&path, Settings::template())
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::success(&format!("created {}", path.display()));
        }
    }
    Ok(())
}

/// Print the picked repo and open it unless disabled.
fn show_pick(container: &ServiceContainer, pick: &Pick, no_browser: bool) {
    for label in &pick.path {
        output::info(label);
    }
    output::link(&pick.url);

    if no_browser {
        return;
    }
    if let Err(e) = container.browser.open(&pick.url) {
        output::warning(&InfraError::Browser {
            message: e.to_string(),
        });
    }
}
