//! CLI argument parsing via clap.

use clap::{Parser, Subcommand};

use crate::config::BatchSize;

/// Conversational-AI demos with local function calling.
///
/// Credentials and assistant ids come from the environment
/// (OPENAI_API_KEY, OPENAI_ASSISTANT_ID, OPENAI_SPAM_FILTER_ASSISTANT_ID, ...).
#[derive(Debug, Parser)]
#[command(name = "runcall", version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Math tutor that opens with a quiz, then answers your questions.
    Quiz,

    /// Type messages; the assistant routes each to spam_message_filter or allow_message.
    SpamFilter,

    /// Sweep unread mail through the spam filter assistant (deletes spam, marks the rest read).
    CleanInbox {
        /// Messages per sweep, as `deleteCount=N` (default 2, at most 3).
        #[arg(value_name = "deleteCount=N", default_value = "deleteCount=2")]
        delete_count: BatchSize,
    },

    /// Classify unread mail with the local model.
    Classify {
        /// Messages to classify, as `deleteCount=N` (default 2, at most 3).
        #[arg(value_name = "deleteCount=N", default_value = "deleteCount=2")]
        delete_count: BatchSize,

        /// Use built-in sample emails instead of the mailbox.
        #[arg(long)]
        sample: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::{Args, Command};
    use clap::Parser;

    #[test]
    fn clean_inbox_defaults_to_two() {
        let args = Args::parse_from(["runcall", "clean-inbox"]);
        match args.command {
            Command::CleanInbox { delete_count } => assert_eq!(delete_count.get(), 2),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn clean_inbox_reads_and_clamps_delete_count() {
        let args = Args::parse_from(["runcall", "clean-inbox", "deleteCount=5"]);
        match args.command {
            Command::CleanInbox { delete_count } => assert_eq!(delete_count.get(), 3),
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn classify_accepts_sample_flag() {
        let args = Args::parse_from(["runcall", "classify", "--sample"]);
        match args.command {
            Command::Classify { sample, delete_count } => {
                assert!(sample);
                assert_eq!(delete_count.get(), 2);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn invalid_delete_count_is_a_usage_error() {
        assert!(Args::try_parse_from(["runcall", "clean-inbox", "deleteCount=many"]).is_err());
    }
}
