use colored::Colorize;
use infradoc_config::{Preferences, Settings};
use infradoc_core::Language;
use std::str::FromStr;

pub fn handle(settings: &Settings, code: Option<&str>) -> anyhow::Result<()> {
    match code {
        None => {
            let preferences = Preferences::load()?;
            match preferences.language {
                Some(code) => println!("{} {}", "Document language:".bold(), code.cyan()),
                None => println!(
                    "{} {} {}",
                    "Document language:".bold(),
                    settings.language.cyan(),
                    "(default)".dimmed()
                ),
            }
        }
        Some(code) => {
            let language = Language::from_str(code)?;
            let preferences = Preferences {
                language: Some(language.code().to_string()),
            };
            let path = preferences.save()?;
            println!(
                "{} {} ({})",
                "✓ Document language set to".green(),
                language.code().cyan(),
                path.display()
            );
        }
    }
    Ok(())
}
