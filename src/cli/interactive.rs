//! Interactive configuration for Eris.
//!
//! Menus are built with dialoguer.

use std::path::{Path, PathBuf};

use dialoguer::{theme::ColorfulTheme, Confirm, Input, Select};

use crate::types::config::{Config, SeedRule};
use crate::ErisResult;

/// Runs the interactive configuration.
pub fn run_interactive_config(config_path: &Path) -> ErisResult<()> {
    let theme = ColorfulTheme::default();

    println!("\nEris interactive configuration\n");

    let mut config = if config_path.exists() {
        Config::load(config_path)?
    } else {
        println!("Creating a new configuration...\n");
        Config::default_config()
    };

    loop {
        let options = vec![
            "General",
            "Storage",
            "Feedback",
            "Seed rules",
            "Save and exit",
            "Exit without saving",
        ];

        let selection = Select::with_theme(&theme)
            .with_prompt("What do you want to configure?")
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => configure_general(&theme, &mut config)?,
            1 => configure_storage(&theme, &mut config)?,
            2 => configure_feedback(&theme, &mut config)?,
            3 => configure_rules(&theme, &mut config)?,
            4 => {
                config.save(config_path)?;
                println!("\nConfiguration saved to: {}\n", config_path.display());
                break;
            }
            5 => {
                if Confirm::with_theme(&theme)
                    .with_prompt("Exit without saving?")
                    .default(false)
                    .interact()?
                {
                    println!("\nExiting without saving.\n");
                    break;
                }
            }
            _ => {}
        }
    }

    Ok(())
}

fn configure_general(theme: &ColorfulTheme, config: &mut Config) -> ErisResult<()> {
    println!("\nGeneral settings\n");

    let log_levels = vec!["error", "warn", "info", "debug", "trace"];
    let current_idx = log_levels
        .iter()
        .position(|&l| l == config.general.log_level)
        .unwrap_or(2);

    let log_level_idx = Select::with_theme(theme)
        .with_prompt("Log level")
        .items(&log_levels)
        .default(current_idx)
        .interact()?;

    config.general.log_level = log_levels[log_level_idx].to_string();

    let log_formats = vec!["text", "json"];
    let current_format_idx = log_formats
        .iter()
        .position(|&f| f == config.general.log_format)
        .unwrap_or(0);

    let log_format_idx = Select::with_theme(theme)
        .with_prompt("Log format")
        .items(&log_formats)
        .default(current_format_idx)
        .interact()?;

    config.general.log_format = log_formats[log_format_idx].to_string();

    let bot_name: String = Input::with_theme(theme)
        .with_prompt("Bot name")
        .default(config.general.bot_name.clone())
        .interact_text()?;

    config.general.bot_name = bot_name;

    println!("\nGeneral settings updated.\n");
    Ok(())
}

fn configure_storage(theme: &ColorfulTheme, config: &mut Config) -> ErisResult<()> {
    println!("\nStorage\n");

    let db_path: String = Input::with_theme(theme)
        .with_prompt("Database path")
        .default(config.storage.db_path.display().to_string())
        .interact_text()?;

    config.storage.db_path = PathBuf::from(db_path);

    println!("\nStorage updated.\n");
    Ok(())
}

fn configure_feedback(theme: &ColorfulTheme, config: &mut Config) -> ErisResult<()> {
    println!("\nFeedback\n");

    config.feedback.prompt_for_rating = Confirm::with_theme(theme)
        .with_prompt("Ask for feedback after every reply?")
        .default(config.feedback.prompt_for_rating)
        .interact()?;

    let timeout: u64 = Input::with_theme(theme)
        .with_prompt("Feedback timeout (seconds)")
        .default(config.feedback.timeout_secs)
        .interact_text()?;

    config.feedback.timeout_secs = timeout.max(1);

    let threshold: u8 = Input::with_theme(theme)
        .with_prompt("Flag rules rated below (1-6)")
        .default(config.feedback.low_rating_threshold)
        .interact_text()?;

    config.feedback.low_rating_threshold = threshold.clamp(1, 6);

    println!("\nFeedback updated.\n");
    Ok(())
}

fn configure_rules(theme: &ColorfulTheme, config: &mut Config) -> ErisResult<()> {
    println!("\nSeed rules\n");

    config.rules.seed_on_start = Confirm::with_theme(theme)
        .with_prompt("Load seed rules on start?")
        .default(config.rules.seed_on_start)
        .interact()?;

    loop {
        let options = vec!["Add a seed rule", "Remove a seed rule", "Back"];

        let selection = Select::with_theme(theme)
            .with_prompt(format!("{} extra seed rules", config.rules.seed.len()))
            .items(&options)
            .default(0)
            .interact()?;

        match selection {
            0 => {
                let input: String = Input::with_theme(theme)
                    .with_prompt("Input pattern")
                    .interact_text()?;
                let output: String = Input::with_theme(theme)
                    .with_prompt("Reply")
                    .interact_text()?;

                if input.is_empty() {
                    println!("Input pattern cannot be empty.\n");
                } else {
                    config.rules.seed.push(SeedRule { input, output });
                }
            }
            1 => {
                if config.rules.seed.is_empty() {
                    println!("No extra seed rules.\n");
                    continue;
                }

                let items: Vec<String> = config
                    .rules
                    .seed
                    .iter()
                    .map(|s| format!("{:?} -> {:?}", s.input, s.output))
                    .collect();

                let idx = Select::with_theme(theme)
                    .with_prompt("Remove which rule?")
                    .items(&items)
                    .default(0)
                    .interact()?;

                config.rules.seed.remove(idx);
            }
            _ => break,
        }
    }

    println!("\nSeed rules updated.\n");
    Ok(())
}

/// Prints a summary of the configuration.
pub fn show_config_summary(config: &Config) {
    println!("\nConfiguration summary\n");
    println!("┌─────────────────────────────────────────┐");
    println!("│ General                                 │");
    println!("├─────────────────────────────────────────┤");
    println!("│ Log level: {:<28} │", config.general.log_level);
    println!("│ Log format: {:<27} │", config.general.log_format);
    println!("│ Bot name: {:<29} │", config.general.bot_name);
    println!("├─────────────────────────────────────────┤");
    println!("│ Storage                                 │");
    println!("├─────────────────────────────────────────┤");
    println!(
        "│ Database: {:<29} │",
        config.storage.db_path.display().to_string()
    );
    println!("├─────────────────────────────────────────┤");
    println!("│ Feedback                                │");
    println!("├─────────────────────────────────────────┤");
    println!(
        "│ Prompt: {:<31} │",
        if config.feedback.prompt_for_rating {
            "yes"
        } else {
            "no"
        }
    );
    println!("│ Timeout: {:<29}s │", config.feedback.timeout_secs);
    println!(
        "│ Flag below: {:<27} │",
        config.feedback.low_rating_threshold
    );
    println!("├─────────────────────────────────────────┤");
    println!("│ Seed rules                              │");
    println!("├─────────────────────────────────────────┤");
    println!(
        "│ On start: {:<29} │",
        if config.rules.seed_on_start {
            "yes"
        } else {
            "no"
        }
    );
    println!("│ Extra rules: {:<26} │", config.rules.seed.len());
    println!("└─────────────────────────────────────────┘");
    println!();
}
