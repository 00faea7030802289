//! Interactive session over one [`SessionManager`].
//!
//! The shell bootstraps once and then reads one command per line. Besides
//! the regular commands it has the cart, which only lives as long as the
//! session.

use std::io::Write;

use clap::{Parser, Subcommand, ValueEnum};
use the_shop_client::state::Tab;
use the_shop_client::{AuthMode, SessionManager, Severity};
use the_shop_core::ProductId;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{self, ShopCommand};
use crate::error::CliError;
use crate::render;

#[derive(Parser)]
#[command(name = "shop", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand)]
enum ShellCommand {
    #[command(flatten)]
    Shop(ShopCommand),
    /// Add a product from the catalog to the cart
    Add {
        id: ProductId,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
    },
    /// Remove a product from the cart
    Remove { id: ProductId },
    /// Increase a cart line by one
    Inc { id: ProductId },
    /// Decrease a cart line by one; at zero the line is removed
    Dec { id: ProductId },
    /// Show the cart
    Cart,
    /// Place an order for the cart
    Checkout,
    /// Switch to a tab and show it
    Tab { tab: TabArg },
    /// Show the session summary
    Status,
    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

#[derive(Clone, Copy, ValueEnum)]
enum TabArg {
    Products,
    Cart,
    Wishlist,
    Profile,
}

impl From<TabArg> for Tab {
    fn from(tab: TabArg) -> Self {
        match tab {
            TabArg::Products => Self::Products,
            TabArg::Cart => Self::Cart,
            TabArg::Wishlist => Self::Wishlist,
            TabArg::Profile => Self::Profile,
        }
    }
}

enum Flow {
    Continue,
    Quit,
}

/// Split a line into words. Double quotes group words; `\"` is a literal quote.
fn split_line(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '\\' if quoted => match chars.next() {
                Some(next) => current.push(next),
                None => return Err("unterminated escape".to_string()),
            },
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        return Err("unterminated quote".to_string());
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn show_tab(out: &mut impl Write, manager: &SessionManager) -> std::io::Result<()> {
    let state = manager.state();
    match state.tab() {
        Tab::Products => render::catalog(out, state),
        Tab::Cart => render::cart(out, state),
        Tab::Wishlist => render::wishlist(out, state),
        Tab::Profile => render::profile(out, state),
    }
}

fn adjust(
    manager: &mut SessionManager,
    id: ProductId,
    delta: i64,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let had_line = manager.state().cart().line(id).is_some();
    match manager.adjust_quantity(id, delta) {
        Some(quantity) => writeln!(out, "#{id} × {quantity} in cart"),
        None if had_line => writeln!(out, "#{id} removed from cart"),
        None => writeln!(out, "#{id} is not in the cart"),
    }
}

async fn dispatch(
    manager: &mut SessionManager,
    command: ShellCommand,
    out: &mut impl Write,
) -> Result<Flow, CliError> {
    match command {
        ShellCommand::Shop(command) => commands::execute(manager, command, out).await?,
        ShellCommand::Add { id, quantity } => {
            let quantity = manager.add_quantity_to_cart(id, quantity)?;
            writeln!(out, "#{id} × {quantity} in cart")?;
        }
        ShellCommand::Remove { id } => {
            if !manager.remove_from_cart(id) {
                writeln!(out, "#{id} is not in the cart")?;
            }
            render::cart(out, manager.state())?;
        }
        ShellCommand::Inc { id } => adjust(manager, id, 1, out)?,
        ShellCommand::Dec { id } => adjust(manager, id, -1, out)?,
        ShellCommand::Cart => render::cart(out, manager.state())?,
        ShellCommand::Checkout => {
            let receipt = manager.place_order().await?;
            writeln!(out, "{receipt}")?;
        }
        ShellCommand::Tab { tab } => {
            manager.select_tab(tab.into()).await?;
            show_tab(out, manager)?;
        }
        ShellCommand::Status => render::header(out, manager.state())?,
        ShellCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

/// Run the shell until `quit` or end of input.
pub async fn run(manager: &mut SessionManager, out: &mut impl Write) -> Result<(), CliError> {
    let report = manager.bootstrap().await;
    render::header(out, manager.state())?;
    for failure in &report.failures {
        writeln!(out, "! {}", failure.user_message())?;
    }
    if report.session_rejected {
        writeln!(out, "Session expired, please login again.")?;
    }
    writeln!(out, "Type `help` for commands, `quit` to leave.")?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        write!(out, "shop> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let words = match split_line(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(e) => {
                writeln!(out, "! {e}")?;
                continue;
            }
        };
        let command = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed.command,
            Err(e) => {
                write!(out, "{}", e.render())?;
                continue;
            }
        };

        match dispatch(manager, command, out).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(CliError::Action(e)) => {
                let label = match e.severity() {
                    Severity::Inline => "!",
                    Severity::Blocking => "Error:",
                };
                writeln!(out, "{label} {}", e.user_message())?;
            }
            Err(e) => return Err(e),
        }

        let prompt = manager.state().auth_prompt();
        if prompt.is_open() {
            let hint = match prompt.mode() {
                AuthMode::Login => "login --email EMAIL --password PASSWORD",
                AuthMode::Register => "register --email EMAIL --password PASSWORD [--name NAME]",
            };
            writeln!(out, "Sign in with: {hint}")?;
            manager.close_auth_prompt();
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line() {
        assert_eq!(split_line("  add 3  -q 2 ").unwrap(), ["add", "3", "-q", "2"]);
        assert_eq!(
            split_line(r#"review 1 --comment "Great \"fit\"" -r 4"#).unwrap(),
            ["review", "1", "--comment", r#"Great "fit""#, "-r", "4"]
        );
        assert_eq!(split_line(r#"review 1 -c """#).unwrap(), ["review", "1", "-c", ""]);
        assert!(split_line(r#"review "open"#).is_err());
        assert!(split_line("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_shell_commands() {
        let parsed = ShellLine::try_parse_from(["add", "3", "--quantity", "2"]).unwrap();
        assert!(matches!(
            parsed.command,
            ShellCommand::Add { quantity: 2, .. }
        ));

        let parsed = ShellLine::try_parse_from(["tab", "wishlist"]).unwrap();
        assert!(matches!(
            parsed.command,
            ShellCommand::Tab {
                tab: TabArg::Wishlist
            }
        ));

        let parsed = ShellLine::try_parse_from(["products", "--category", "jewelery"]).unwrap();
        assert!(matches!(
            parsed.command,
            ShellCommand::Shop(ShopCommand::Products { .. })
        ));

        assert!(matches!(
            ShellLine::try_parse_from(["exit"]).unwrap().command,
            ShellCommand::Quit
        ));
    }
}
