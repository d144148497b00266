//! Step-by-step quiz runs that produce a final `(score, max_score)` pair.

use serde::{Deserialize, Serialize};

use crate::error::QuizError;
use crate::model::{Question, Test};

/// Final tally of a quiz run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizScore {
    pub score: u32,
    pub max_score: u32,
}

/// An in-progress run through one test.
#[derive(Debug, Clone)]
pub struct QuizRun<'a> {
    test: &'a Test,
    step: usize,
    answers: Vec<Option<usize>>,
}

impl<'a> QuizRun<'a> {
    pub fn new(test: &'a Test) -> Self {
        Self {
            test,
            step: 0,
            answers: vec![None; test.questions.len()],
        }
    }

    pub fn test(&self) -> &Test {
        self.test
    }

    /// Zero-based index of the current question.
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn current(&self) -> Option<&Question> {
        self.test.questions.get(self.step)
    }

    /// Option picked for the current question.
    pub fn picked(&self) -> Option<usize> {
        self.answers.get(self.step).copied().flatten()
    }

    /// Pick an option for the current question, replacing any earlier choice.
    pub fn choose(&mut self, option: usize) {
        if let Some(slot) = self.answers.get_mut(self.step) {
            *slot = Some(option);
        }
    }

    pub fn next(&mut self) {
        self.step = self.clamp_step(self.step.saturating_add(1));
    }

    pub fn prev(&mut self) {
        self.step = self.clamp_step(self.step.saturating_sub(1));
    }

    /// Jump to a question; out-of-range targets stop at the last one.
    pub fn go_to(&mut self, step: usize) {
        self.step = self.clamp_step(step);
    }

    fn clamp_step(&self, step: usize) -> usize {
        step.min(self.test.questions.len().saturating_sub(1))
    }

    /// Share of the questions already stepped past, 0..=100.
    pub fn progress_percent(&self) -> u32 {
        let total = self.test.questions.len();
        if total == 0 {
            return 0;
        }
        (100.0 * self.step as f64 / total as f64).round() as u32
    }

    pub fn unanswered(&self) -> usize {
        self.answers.iter().filter(|a| a.is_none()).count()
    }

    pub fn can_finish(&self) -> bool {
        !self.answers.is_empty() && self.unanswered() == 0
    }

    /// Count correct answers. Every question must have an answer.
    pub fn finish(&self) -> Result<QuizScore, QuizError> {
        if self.test.questions.is_empty() {
            return Err(QuizError::Empty(self.test.id.clone()));
        }
        let unanswered = self.unanswered();
        if unanswered > 0 {
            return Err(QuizError::Unanswered { unanswered });
        }

        let score = self
            .test
            .questions
            .iter()
            .zip(&self.answers)
            .filter(|(q, a)| **a == Some(q.answer_index))
            .count() as u32;

        Ok(QuizScore {
            score,
            max_score: self.test.questions.len() as u32,
        })
    }
}
