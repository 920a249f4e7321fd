//! Command-line interface definitions for AI Dev Daily.
//!
//! Every option can also be supplied through the environment, so the binary
//! runs unattended from a scheduler with no arguments at all.

use crate::api::ProviderKind;
use crate::enrich::AiSummaryConfig;
use clap::Parser;
use clap::builder::BoolishValueParser;

/// Command-line arguments for the AI Dev Daily collector.
///
/// # Examples
///
/// ```sh
/// # Collect into ./data without summaries
/// ai_dev_daily
///
/// # Collect with Anthropic summaries
/// AI_SUMMARY_ENABLED=true AI_PROVIDER=anthropic AI_API_KEY=... ai_dev_daily -d /srv/daily
///
/// # Probe every source and print bucket sizes without writing anything
/// ai_dev_daily --dry-run
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Directory that receives latest.json
    #[arg(short, long, env = "DATA_DIR", default_value = "data")]
    pub data_dir: String,

    /// Fetch and classify only; report bucket sizes and skip summaries and writing
    #[arg(long)]
    pub dry_run: bool,

    /// Generate AI summaries for the top items
    #[arg(
        long,
        env = "AI_SUMMARY_ENABLED",
        value_parser = BoolishValueParser::new(),
        action = clap::ArgAction::Set,
        default_value = "false",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub ai_summary_enabled: bool,

    /// Summary provider
    #[arg(long, env = "AI_PROVIDER", value_enum, default_value = "openai")]
    pub ai_provider: ProviderKind,

    /// Provider API key
    #[arg(long, env = "AI_API_KEY", hide_env_values = true)]
    pub ai_api_key: Option<String>,

    /// Model id (defaults per provider)
    #[arg(long, env = "AI_MODEL")]
    pub ai_model: Option<String>,

    /// Override the provider endpoint base URL
    #[arg(long, env = "AI_BASE_URL")]
    pub ai_base_url: Option<String>,

    /// Retries per summary on rate limits and server errors
    #[arg(long, env = "AI_MAX_RETRIES", default_value_t = 1)]
    pub ai_max_retries: usize,
}

impl Cli {
    pub fn ai_summary_config(&self) -> AiSummaryConfig {
        AiSummaryConfig {
            enabled: self.ai_summary_enabled,
            provider: self.ai_provider,
            api_key: self.ai_api_key.clone(),
            model: self.ai_model.clone(),
            base_url: self.ai_base_url.clone(),
            max_retries: self.ai_max_retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from([
            "ai_dev_daily",
            "--data-dir",
            "./out",
            "--ai-summary-enabled",
            "true",
            "--ai-provider",
            "anthropic",
            "--ai-api-key",
            "sk-ant-test",
            "--ai-max-retries",
            "3",
        ]);

        assert_eq!(cli.data_dir, "./out");
        assert!(cli.ai_summary_enabled);
        assert_eq!(cli.ai_provider, ProviderKind::Anthropic);
        assert_eq!(cli.ai_max_retries, 3);

        let config = cli.ai_summary_config();
        assert!(config.is_active());
        assert_eq!(config.api_key.as_deref(), Some("sk-ant-test"));
        assert_eq!(config.model, None);
    }

    #[test]
    fn test_cli_short_flags_and_bare_switch() {
        let cli = Cli::parse_from(["ai_dev_daily", "-d", "/tmp/daily", "--ai-summary-enabled", "--dry-run"]);

        assert_eq!(cli.data_dir, "/tmp/daily");
        assert!(cli.ai_summary_enabled);
        assert!(cli.dry_run);
    }

    #[test]
    fn test_boolish_values() {
        for (raw, expected) in [("yes", true), ("1", true), ("off", false), ("false", false)] {
            let cli = Cli::parse_from(["ai_dev_daily", "--ai-summary-enabled", raw]);
            assert_eq!(cli.ai_summary_enabled, expected, "{raw}");
        }
    }

    #[test]
    fn test_rejects_unknown_provider() {
        assert!(Cli::try_parse_from(["ai_dev_daily", "--ai-provider", "gemini"]).is_err());
    }
}
