//! `display_quiz`: ask the student each question and hand the answers back.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::console::Console;
use crate::tool;
use crate::tools::ToolError;

pub const QUIZ_TOOL: &str = "display_quiz";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct QuizInput {
    pub title: String,
    /// An array of questions, each with a title and potentially options (if multiple choice).
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Question {
    pub question_text: String,
    #[serde(default)]
    pub question_type: Option<QuestionType>,
    #[serde(default)]
    pub choices: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QuestionType {
    MultipleChoice,
    FreeResponse,
}

/// Renders quizzes on a [`Console`] and collects one answer per question.
pub struct QuizHandler {
    console: Arc<dyn Console>,
}

impl QuizHandler {
    pub fn new(console: Arc<dyn Console>) -> Self {
        Self { console }
    }

    async fn answer(&self, question: &Question) -> Result<String, ToolError> {
        let prompt = match question.question_type {
            Some(QuestionType::MultipleChoice) => format!(
                "Question: {}\n  Options: {}\n> ",
                question.question_text,
                question.choices.join(", ")
            ),
            Some(QuestionType::FreeResponse) => {
                format!("Question: {}\n> ", question.question_text)
            }
            // Untyped questions are not shown; their answer stays empty.
            None => return Ok(String::new()),
        };

        self.console
            .ask(&prompt)
            .await
            .map_err(|e| ToolError::Failed(format!("reading quiz answer: {}", e)))
    }
}

#[tool(
    name = "display_quiz",
    description = "Displays a quiz to the student, and returns the student's response. A single quiz can have multiple questions."
)]
impl QuizHandler {
    async fn call(&self, input: QuizInput) -> Result<Vec<String>, ToolError> {
        self.console
            .say(&format!("Quiz: {}", input.title))
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;

        let mut answers = Vec::with_capacity(input.questions.len());
        for question in &input.questions {
            answers.push(self.answer(question).await?);
        }

        info!("Collected {} quiz answers", answers.len());
        Ok(answers)
    }
}
