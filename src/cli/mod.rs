//! CLI module for the helpdesk relay
//!
//! Provides commands:
//! - `serve`: Start the relay server
//! - `ask`: Run a question against the configured knowledge base

use clap::{Parser, Subcommand};

pub mod ask;

/// Helpdesk relay CLI
#[derive(Parser, Debug)]
#[command(name = "helpdesk")]
#[command(about = "Escalation coordination and message relay for a helpdesk")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the server
    Serve,
    /// Answer a question from the knowledge base
    Ask {
        /// The question, as a caller would phrase it
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
}

/// Run the CLI command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Serve) => crate::server::run().await,
        Some(Commands::Ask { question }) => ask::run(&question.join(" ")).await,
        None => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            cmd.print_help()?;
            println!();
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_joins_words() {
        let cli = Cli::try_parse_from(["helpdesk", "ask", "what", "are", "your", "hours"]).unwrap();
        let Some(Commands::Ask { question }) = cli.command else {
            panic!("expected ask");
        };
        assert_eq!(question.join(" "), "what are your hours");
    }

    #[test]
    fn test_ask_requires_question() {
        assert!(Cli::try_parse_from(["helpdesk", "ask"]).is_err());
    }

    #[test]
    fn test_no_subcommand() {
        let cli = Cli::try_parse_from(["helpdesk"]).unwrap();
        assert!(cli.command.is_none());
    }
}
