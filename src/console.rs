//! Human-in-the-loop console I/O used by handlers and the CLI.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Line-oriented conversation with the person at the terminal.
#[async_trait]
pub trait Console: Send + Sync {
    /// Show `question` and wait for one line of input, without the line ending.
    async fn ask(&self, question: &str) -> io::Result<String>;

    /// Show text to the user.
    async fn say(&self, text: &str) -> io::Result<()>;
}

/// [`Console`] over the process's stdin and stdout.
///
/// Prompts are serialized: a second `ask` waits until the first has its answer.
pub struct Terminal {
    input: Mutex<Lines<BufReader<Stdin>>>,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Console for Terminal {
    async fn ask(&self, question: &str) -> io::Result<String> {
        let mut input = self.input.lock().await;

        let mut stdout = tokio::io::stdout();
        stdout.write_all(question.as_bytes()).await?;
        stdout.flush().await?;

        match input.next_line().await? {
            Some(line) => Ok(line.trim_end().to_string()),
            None => Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed")),
        }
    }

    async fn say(&self, text: &str) -> io::Result<()> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(text.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await
    }
}
