//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};

/// Check texts for uniqueness with the text.ru API.
///
/// Submits texts, fetches finished results, parses result bodies delivered
/// to a callback URL, and shows the remaining character quota.
#[derive(Parser, Debug)]
#[command(name = "textru")]
#[command(author, version, about)]
pub struct Args {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// API key (overrides TEXTRU_API_KEY and the config file)
    #[arg(long, global = true)]
    pub api_key: Option<String>,

    /// API base URL (overrides TEXTRU_BASE_URL and the config file)
    #[arg(long, global = true, hide = true)]
    pub base_url: Option<String>,

    /// Path to the config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Connect timeout in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub connect_timeout: Option<u64>,

    /// Whole-request timeout in seconds (1-3600)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub read_timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a text for checking and print its UID
    Submit(SubmitArgs),
    /// Fetch the result of an earlier submission
    Result(ResultArgs),
    /// Parse a saved or callback-delivered result body (no network access)
    Parse(ParseArgs),
    /// Show the remaining character quota
    Balance,
}

impl Command {
    /// Subcommand name as typed on the command line.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::Result(_) => "result",
            Self::Parse(_) => "parse",
            Self::Balance => "balance",
        }
    }
}

#[derive(ClapArgs, Debug)]
pub struct SubmitArgs {
    /// Text to check (read from --file or stdin when omitted)
    pub text: Option<String>,

    /// Read the text from a file
    #[arg(short, long, conflicts_with = "text")]
    pub file: Option<PathBuf>,

    /// URL the service calls with the finished result
    #[arg(long)]
    pub callback: Option<String>,

    /// Publish the result page
    #[arg(long)]
    pub public: bool,

    /// Let the service add its visual report badge
    #[arg(long)]
    pub visual_report: bool,

    /// Domain to ignore when searching for matches (repeatable)
    #[arg(short = 'x', long = "exclude-domain", value_name = "DOMAIN")]
    pub exclude_domains: Vec<String>,
}

#[derive(ClapArgs, Debug)]
pub struct ResultArgs {
    /// Text UID returned by `submit`
    pub uid: String,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(ClapArgs, Debug)]
pub struct ParseArgs {
    /// File holding the result body (stdin when omitted)
    pub file: Option<PathBuf>,

    /// Text UID to report instead of the body's own `uid`
    #[arg(long)]
    pub uid: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_subcommand() {
        let result = Args::try_parse_from(["textru"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["textru", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_cli_version_flag_shows_version() {
        let err = Args::try_parse_from(["textru", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    #[test]
    fn test_cli_verbose_flag_counts_after_subcommand() {
        let args = Args::try_parse_from(["textru", "balance", "-vv"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(args.command, Command::Balance));
    }

    #[test]
    fn test_cli_submit_all_options() {
        let args = Args::try_parse_from([
            "textru",
            "submit",
            "Some text",
            "--callback",
            "http://test.com/process-result",
            "--public",
            "-x",
            "test.com",
            "--exclude-domain",
            "mail.ru",
        ])
        .unwrap();
        let Command::Submit(submit) = args.command else {
            panic!("expected submit command");
        };
        assert_eq!(submit.text.as_deref(), Some("Some text"));
        assert_eq!(
            submit.callback.as_deref(),
            Some("http://test.com/process-result")
        );
        assert!(submit.public);
        assert!(!submit.visual_report);
        assert_eq!(submit.exclude_domains, ["test.com", "mail.ru"]);
    }

    #[test]
    fn test_cli_submit_text_and_file_conflict() {
        let err = Args::try_parse_from(["textru", "submit", "text", "--file", "a.txt"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_cli_result_requires_uid() {
        let err = Args::try_parse_from(["textru", "result"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_parse_with_uid_and_json() {
        let args =
            Args::try_parse_from(["textru", "parse", "body.json", "--uid", "12345", "--json"])
                .unwrap();
        let Command::Parse(parse) = args.command else {
            panic!("expected parse command");
        };
        assert_eq!(parse.file, Some(PathBuf::from("body.json")));
        assert_eq!(parse.uid.as_deref(), Some("12345"));
        assert!(parse.json);
    }

    #[test]
    fn test_cli_timeout_zero_rejected() {
        let err = Args::try_parse_from(["textru", "--connect-timeout", "0", "balance"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_command_name_omits_arguments() {
        let args = Args::try_parse_from(["textru", "submit", "secret text body"]).unwrap();
        assert_eq!(args.command.name(), "submit");
        assert!(!args.command.name().contains("secret"));

        let args = Args::try_parse_from(["textru", "parse"]).unwrap();
        assert_eq!(args.command.name(), "parse");
    }

    #[test]
    fn test_cli_global_api_key() {
        let args = Args::try_parse_from(["textru", "balance", "--api-key", "k"]).unwrap();
        assert_eq!(args.api_key.as_deref(), Some("k"));
    }
}
