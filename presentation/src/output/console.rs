//! Console output formatting

use colored::Colorize;
use relay_application::ChatTurnError;
use relay_domain::{ResolvedConfig, StudyConfig};

/// Formats study data and chat output for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// One line per condition with its index and state.
    pub fn conditions(study: &StudyConfig) -> String {
        let mut output = Self::header("Study Conditions");
        output.push('\n');

        if study.is_empty() {
            output.push_str(&format!("{}\n", "No conditions defined.".yellow()));
            return output;
        }

        for (index, condition) in study.conditions.iter().enumerate() {
            let state = if condition.enabled {
                "enabled".green()
            } else {
                "disabled".red()
            };
            output.push_str(&format!(
                "{:>3}  {} ({}) [{}]\n",
                index,
                condition.name.bold(),
                condition.id,
                state
            ));
            if !condition.description.is_empty() {
                output.push_str(&format!("     {}\n", condition.description.dimmed()));
            }
        }

        output.push_str(&format!(
            "\n{} {} of {} enabled\n",
            "Total:".cyan().bold(),
            study.enabled_indices().len(),
            study.len()
        ));
        output
    }

    /// Summary printed when a console session starts.
    pub fn condition_banner(config: &ResolvedConfig) -> String {
        let mut output = Self::header(&format!("Condition {}", config.condition_index));
        output.push('\n');
        output.push_str(&format!(
            "{} {} ({})\n",
            "Condition:".cyan().bold(),
            config.condition_name,
            config.condition_id
        ));
        output.push_str(&format!("{} {}\n", "Bot:".cyan().bold(), config.bot_name));
        output.push_str(&format!(
            "{} {}{}\n",
            "Temperature:".cyan().bold(),
            config.temperature,
            Self::override_tag(config.has_temperature_override)
        ));
        output.push_str(&format!(
            "{} {}{}\n",
            "Max tokens:".cyan().bold(),
            config.max_completion_tokens,
            Self::override_tag(config.has_max_tokens_override)
        ));
        output.push_str(&format!(
            "{} {} ({} attempts, {:.1}s delay)\n",
            "Deployment:".cyan().bold(),
            config.deployment,
            config.max_retries,
            config.retry_delay.as_secs_f64()
        ));
        if !config.enabled {
            output.push_str(&format!(
                "{}\n",
                "Warning: this condition is disabled".yellow().bold()
            ));
        }
        output.push_str(&Self::footer());
        output
    }

    /// Resolved configuration as pretty JSON; the API key is never included.
    pub fn resolved_json(config: &ResolvedConfig) -> serde_json::Result<String> {
        serde_json::to_string_pretty(config)
    }

    /// Label printed before an assistant reply
    pub fn bot_label(bot_name: &str) -> String {
        format!("{}:", bot_name).magenta().bold().to_string()
    }

    pub fn reply(bot_name: &str, text: &str) -> String {
        format!("{} {}", Self::bot_label(bot_name), text)
    }

    pub fn turn_error(error: &ChatTurnError) -> String {
        match error {
            ChatTurnError::AssistantUnavailable(_) => format!(
                "{} {}\n{}",
                "Assistant unavailable:".red().bold(),
                error,
                "Your message was saved. You can try sending it again.".dimmed()
            ),
            ChatTurnError::Transcript(_) => format!("{} {}", "Error:".red().bold(), error),
        }
    }

    fn override_tag(overridden: bool) -> String {
        if overridden {
            format!(" {}", "(override)".yellow())
        } else {
            String::new()
        }
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}
