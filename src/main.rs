use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use crossterm::style::Stylize;
use tracing_subscriber::EnvFilter;

use runcall::classify::{classify, sample_emails, Classification};
use runcall::cli::{Args, Command};
use runcall::client::{AssistantTool, ConversationClient};
use runcall::config::{BatchSize, Config};
use runcall::console::{Console, Terminal};
use runcall::handlers::{AllowMessage, MailboxSweep, QuizHandler, SpamMessageFilter, QUIZ_TOOL};
use runcall::mail::{self, CredentialStore, GmailClient, Mailbox, OAuthClient};
use runcall::options::{ModelOptions, TransportOptions};
use runcall::providers::{Ollama, OpenAi, OpenAiClient, Provider, OPENAI_DEFAULT_MODEL};
use runcall::{Agent, ToolRegistry};

type BoxError = Box<dyn std::error::Error>;

const TUTOR_INSTRUCTIONS: &str =
    "You are a personal math tutor. Answer questions briefly, in a sentence or less.";

const QUIZ_REQUEST: &str = "Make a quiz with 2 questions: One open ended, one multiple choice. \
     Then, give me feedback for the responses.";

const SPAM_FILTER_INSTRUCTIONS: &str = "You are a useful spam filter assistant. \
     Call 'spam_message_filter' if the user message is a spam message or 'allow_message' if not. \
     After that, return a message stating which function was run.";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args = Args::parse();
    let config = Config::from_env();

    match run(args.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", "error:".red(), e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("runcall=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(command: Command, config: Config) -> Result<(), BoxError> {
    let console: Arc<dyn Console> = Arc::new(Terminal::new());

    match command {
        Command::Quiz => quiz(&config, console).await,
        Command::SpamFilter => spam_filter(&config, console).await,
        Command::CleanInbox { delete_count } => clean_inbox(&config, console, delete_count).await,
        Command::Classify {
            delete_count,
            sample,
        } => local_classify(&config, console, delete_count, sample).await,
    }
}

fn openai_client(config: &Config, instructions: &str) -> Result<OpenAiClient, BoxError> {
    let api_key = config.require_api_key()?;
    Ok(OpenAi::create_with_base_url(
        api_key.to_string(),
        config.openai_base_url.clone(),
        ModelOptions::new(OPENAI_DEFAULT_MODEL).with_instructions(instructions),
        TransportOptions::new().with_timeout(Duration::from_secs(60)),
    ))
}

fn function_tools(registry: &ToolRegistry) -> Vec<AssistantTool> {
    registry
        .definitions()
        .into_iter()
        .map(AssistantTool::Function)
        .collect()
}

async fn show_reply(console: &dyn Console, reply: Option<String>) -> Result<(), BoxError> {
    let text = reply.unwrap_or_else(|| "(no reply)".to_string());
    console.say(&format!("{}\n", text)).await?;
    Ok(())
}

async fn quiz(config: &Config, console: Arc<dyn Console>) -> Result<(), BoxError> {
    let client = openai_client(config, TUTOR_INSTRUCTIONS)?;
    let agent = Agent::new(client).with_tool(QuizHandler::new(console.clone()));

    let mut tools = vec![AssistantTool::CodeInterpreter];
    tools.extend(function_tools(agent.registry()));
    let assistant = agent.client().create_assistant("Math Tutor", tools).await?;

    console
        .say("\nHello there, I'm your personal Math assistant. We'll start with a small quiz.\n")
        .await?;

    let mut session = agent.start_session().await?;
    loop {
        // The first turn asks for the quiz; later turns come from the student.
        let question = if session.has_used(QUIZ_TOOL) {
            console.ask("Your next question to the model:\n> ").await?
        } else {
            QUIZ_REQUEST.to_string()
        };

        let reply = agent.exchange(&mut session, &assistant.id, &question).await?;
        show_reply(console.as_ref(), reply).await?;

        let answer = console
            .ask("Do you want to keep having a conversation? (yes/no) ")
            .await?;
        if !answer.to_lowercase().contains("yes") {
            console
                .say("Alrighty then, I hope you learned something!\n")
                .await?;
            return Ok(());
        }
    }
}

async fn spam_filter(config: &Config, console: Arc<dyn Console>) -> Result<(), BoxError> {
    let client = openai_client(config, SPAM_FILTER_INSTRUCTIONS)?;
    let agent = Agent::new(client)
        .with_tool(SpamMessageFilter::new(console.clone()))
        .with_tool(AllowMessage::new(console.clone()));

    let assistant = match &config.assistant_id {
        Some(id) => agent.client().retrieve_assistant(id).await?,
        None => {
            let tools = function_tools(agent.registry());
            agent.client().create_assistant("Spam Filter", tools).await?
        }
    };

    let mut session = agent.start_session().await?;
    loop {
        let message = console.ask("Message to check (empty to quit): ").await?;
        if message.trim().is_empty() {
            return Ok(());
        }
        let reply = agent.exchange(&mut session, &assistant.id, &message).await?;
        show_reply(console.as_ref(), reply).await?;
    }
}

async fn open_mailbox(config: &Config, console: &dyn Console) -> Result<GmailClient, BoxError> {
    let store = CredentialStore::new(&config.gmail_credentials_path, &config.gmail_token_path);
    let access_token = mail::authorize(&store, &OAuthClient::default(), console).await?;
    Ok(GmailClient::new(access_token))
}

async fn clean_inbox(
    config: &Config,
    console: Arc<dyn Console>,
    batch: BatchSize,
) -> Result<(), BoxError> {
    let assistant_id = config.require_spam_filter_assistant()?;
    let client = openai_client(config, SPAM_FILTER_INSTRUCTIONS)?;

    let mailbox: Arc<dyn Mailbox> = Arc::new(open_mailbox(config, console.as_ref()).await?);
    let messages = mailbox.list_unread(batch.get()).await?;
    if messages.is_empty() {
        console.say("No unread messages to sweep.").await?;
        return Ok(());
    }
    for message in &messages {
        console
            .say(&format!("- {}: {}", message.id, message.snippet))
            .await?;
    }

    let assistant = client.retrieve_assistant(assistant_id).await?;
    let agent = Agent::new(client).with_tool(MailboxSweep::new(mailbox));
    let mut session = agent.start_session().await?;

    console
        .say("\nHello there, I'm your personal spam filter. I'll help you filter your emails.\n")
        .await?;

    // The assistant only parses the batch reliably as a fenced JSON block.
    let content = format!("```json\n{}\n```", serde_json::to_string(&messages)?);
    console.say("thinking...").await?;

    let reply = agent.exchange(&mut session, &assistant.id, &content).await?;
    show_reply(console.as_ref(), reply).await
}

async fn local_classify(
    config: &Config,
    console: Arc<dyn Console>,
    batch: BatchSize,
    sample: bool,
) -> Result<(), BoxError> {
    let emails = if sample {
        sample_emails()
    } else {
        let mailbox = open_mailbox(config, console.as_ref()).await?;
        mailbox.list_unread(batch.get()).await?
    };

    let client = Ollama::create_with_options(
        config.ollama_base_url.clone(),
        ModelOptions::new(config.ollama_model.clone()),
        TransportOptions::default(),
    );

    match classify(&client, &emails).await? {
        Classification::Verdicts(verdicts) => {
            for verdict in verdicts {
                let label = if verdict.is_spam_or_marketing {
                    "spam".red().to_string()
                } else {
                    "ok".green().to_string()
                };
                console
                    .say(&format!(
                        "[{}] {}: {}\n    {}",
                        label, verdict.id, verdict.snippet, verdict.reason
                    ))
                    .await?;
            }
        }
        Classification::Malformed(description) => console.say(&description).await?,
    }
    Ok(())
}
