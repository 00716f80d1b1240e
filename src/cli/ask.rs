//! `helpdesk ask`

use anyhow::Result;
use helpdesk_core::Matcher;
use helpdesk_knowledge::KeywordMatcher;

use crate::server::{load_config, load_knowledge};

/// Print the knowledge base answer for a question, or "no match"
pub async fn run(question: &str) -> Result<()> {
    let config = load_config()?;
    let matcher = KeywordMatcher::new(load_knowledge(&config).await?);

    match matcher.find_answer(question).await? {
        Some(answer) => println!("{answer}"),
        None => println!("no match (would escalate to a supervisor)"),
    }
    Ok(())
}
