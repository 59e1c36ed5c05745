//! CLI command implementations.

use std::path::{Path, PathBuf};

use crate::chat::ChatSession;
use crate::context::ErisContext;
use crate::engine::{seeds, FeedbackEffect};
use crate::hooks::MetricsHook;
use crate::store::RuleStore;
use crate::types::config::Config;
use crate::types::Feedback;
use crate::ErisResult;

/// Initializes configuration in the specified directory.
pub async fn init(path: Option<PathBuf>) -> ErisResult<()> {
    let target_dir = path.unwrap_or_else(|| PathBuf::from("."));

    if !target_dir.exists() {
        std::fs::create_dir_all(&target_dir)?;
        tracing::info!("Directory created: {}", target_dir.display());
    }

    let config_path = target_dir.join("eris.toml");

    if config_path.exists() {
        println!("Configuration already exists at: {}", config_path.display());
        println!("Use 'eris config' to modify.");
        return Ok(());
    }

    // .eris/ holds the rule database
    let data_dir = target_dir.join(".eris");
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        tracing::info!(".eris/ directory created");
    }

    update_gitignore(&target_dir)?;

    let config = Config::default_config();
    config.save(&config_path)?;

    println!("Eris initialized successfully!");
    println!("Configuration created at: {}", config_path.display());
    println!("Data directory: .eris/");
    println!();
    println!("Next steps:");
    println!("  1. Start chatting: eris chat");
    println!("  2. Teach a reply: eris teach \"good morning\" \"Morning!\"");
    println!("  3. Configure options: eris config");

    Ok(())
}

/// Updates or creates .gitignore to include .eris/
fn update_gitignore(target_dir: &Path) -> ErisResult<()> {
    let gitignore_path = target_dir.join(".gitignore");
    let eris_entry = ".eris/";
    let eris_comment = "# Eris - local rule database";

    if gitignore_path.exists() {
        let content = std::fs::read_to_string(&gitignore_path)?;

        if content
            .lines()
            .any(|line| line.trim() == eris_entry || line.trim() == ".eris")
        {
            tracing::debug!(".gitignore already contains .eris/");
            return Ok(());
        }

        let mut new_content = content.trim_end().to_string();
        if !new_content.is_empty() {
            new_content.push_str("\n\n");
        }
        new_content.push_str(eris_comment);
        new_content.push('\n');
        new_content.push_str(eris_entry);
        new_content.push('\n');

        std::fs::write(&gitignore_path, new_content)?;
        println!(".gitignore updated with .eris/");
    } else {
        let content = format!("{}\n{}\n", eris_comment, eris_entry);
        std::fs::write(&gitignore_path, content)?;
        println!(".gitignore created with .eris/");
    }

    Ok(())
}

/// Starts an interactive chat session on stdin/stdout.
pub async fn chat(config: &Config) -> ErisResult<()> {
    let mut context = ErisContext::new(config.clone())?;
    let counters = MetricsHook::install(context.responder.hooks_mut());
    let mut session = ChatSession::stdio(&context.config);

    let summary = session.run(&mut context.responder).await?;

    println!();
    println!(
        "{} messages, {} ratings, {} replies learned",
        summary.messages, summary.ratings, summary.overrides
    );
    if summary.messages > 0 {
        let metrics = counters.metrics();
        println!(
            "{} answered by a rule, {} not understood (hit rate {:.0}%)",
            metrics.matches,
            metrics.misses,
            metrics.hit_rate * 100.0
        );
        if metrics.low_ratings > 0 {
            println!("{} low ratings; see 'eris rules' to revise", metrics.low_ratings);
        }
    }

    Ok(())
}

/// Answers a single message and applies the given feedback.
pub async fn ask(
    text: &str,
    rating: Option<i64>,
    reply: Option<String>,
    config: &Config,
) -> ErisResult<()> {
    let feedback = match (rating, reply) {
        (Some(value), _) => Some(Feedback::rating(value)?),
        (None, Some(reply)) => Some(Feedback::reply(reply)),
        (None, None) => None,
    };

    let mut context = ErisContext::new(config.clone())?;
    let response = context.responder.handle(text, feedback).await;

    println!("{}", response);

    Ok(())
}

/// Teaches (or replaces) the reply for an input pattern.
pub async fn teach(input: &str, reply: &str, config: &Config) -> ErisResult<()> {
    let mut context = ErisContext::new(config.clone())?;

    let effect = context
        .responder
        .feedback(input, Some(Feedback::reply(reply)))
        .await?;

    match effect {
        FeedbackEffect::Overridden { created: true } => {
            println!("Learned: {:?} -> {:?}", input, reply)
        }
        _ => println!("Updated: {:?} -> {:?}", input, reply),
    }

    Ok(())
}

/// Lists stored rules in matching order.
pub async fn rules(limit: Option<usize>, config: &Config) -> ErisResult<()> {
    let context = ErisContext::new(config.clone())?;
    let rules = context.responder.rules();

    println!("{} rules (first match wins):\n", rules.len());

    for (i, rule) in rules
        .iter()
        .take(limit.unwrap_or(usize::MAX))
        .enumerate()
    {
        println!(
            "  {}. {:?} -> {:?}  ({})",
            i + 1,
            rule.input_pattern,
            rule.output_pattern,
            rule.last_changed.format("%Y-%m-%d %H:%M:%S")
        );
    }

    Ok(())
}

/// Loads the built-in and configured seed rules.
pub async fn seed(config: &Config) -> ErisResult<()> {
    let mut no_autoseed = config.clone();
    no_autoseed.rules.seed_on_start = false;

    let mut context = ErisContext::new(no_autoseed)?;
    let report = context
        .responder
        .seed(seeds::startup_rules(&config.rules.seed))?;

    println!("Seed rules loaded:");
    println!("  Created: {}", report.created);
    println!("  Skipped (already present): {}", report.skipped);

    Ok(())
}

/// Exports stored rules.
pub async fn export_rules(output: &Path, config: &Config) -> ErisResult<()> {
    let db_path = &config.storage.db_path;

    if !db_path.exists() {
        println!("Rule database has not been created yet.");
        println!("No rules to export.");
        return Ok(());
    }

    let store = RuleStore::open(db_path)?;
    let export = store.export(output)?;

    println!("{} rules exported to: {}", export.rules.len(), output.display());

    Ok(())
}

/// Imports rules into the store.
pub async fn import_rules(input: &Path, overwrite: bool, config: &Config) -> ErisResult<()> {
    if !input.exists() {
        println!("File not found: {}", input.display());
        return Ok(());
    }

    let store = RuleStore::open(&config.storage.db_path)?;
    let result = store.import(input, overwrite)?;

    println!("Import complete:");
    println!("  Rules imported: {}", result.imported);
    println!("  Rules skipped (already present): {}", result.skipped);
    println!("  Rules overwritten: {}", result.overwritten);

    Ok(())
}

/// Edits the configuration interactively.
pub async fn config_cmd(config_path: &Path) -> ErisResult<()> {
    use super::interactive::{run_interactive_config, show_config_summary};

    if config_path.exists() {
        let config = Config::load(config_path)?;
        show_config_summary(&config);
    }

    run_interactive_config(config_path)
}

/// Shows version.
pub fn version() {
    println!("eris {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Pattern-response chat agent that learns from feedback");
}
