//! Scoped question answering over a single insight.
//!
//! Questions are limited to a fixed set of intents. A prompt payload is
//! built from the insight's own fields and answered from deterministic
//! templates, so the output never introduces facts the insight lacks.

use std::{fmt, str::FromStr};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    findings::{FindingCode, Severity},
    insights::Insight,
};

const SYSTEM_RULES: [&str; 4] = [
    "Do not introduce new data.",
    "Do not invent numbers.",
    "Do not contradict the evidence.",
    "Keep the answer concise and actionable.",
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChatError {
    #[error("Unsupported question intent '{0}'")]
    UnsupportedIntent(String),
    #[error("No insight at index {index} ({available} available)")]
    UnknownInsight { index: usize, available: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[value(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    WhyRisky,
    WhatToDo,
    WhatCouldGoWrong,
    HowToMonitor,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::WhyRisky,
        Intent::WhatToDo,
        Intent::WhatCouldGoWrong,
        Intent::HowToMonitor,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Intent::WhyRisky => "WHY_RISKY",
            Intent::WhatToDo => "WHAT_TO_DO",
            Intent::WhatCouldGoWrong => "WHAT_COULD_GO_WRONG",
            Intent::HowToMonitor => "HOW_TO_MONITOR",
        }
    }

    fn instruction(self) -> &'static str {
        match self {
            Intent::WhyRisky => {
                "Explain why this insight represents a business risk using the provided evidence only."
            }
            Intent::WhatToDo => {
                "Suggest concrete next steps based strictly on the recommendation and impact."
            }
            Intent::WhatCouldGoWrong => {
                "Describe failure scenarios if this insight is ignored. Do not invent numbers."
            }
            Intent::HowToMonitor => {
                "Explain how a business could monitor this risk over time using metrics already mentioned."
            }
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Intent {
    type Err = ChatError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.as_str() == value)
            .ok_or_else(|| ChatError::UnsupportedIntent(value.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptContext {
    pub insight_code: FindingCode,
    pub severity: Severity,
    pub message: String,
    pub evidence: Vec<String>,
    pub impact: Option<String>,
    pub recommendation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScopedPrompt {
    pub intent: Intent,
    pub system_rules: Vec<String>,
    pub context: PromptContext,
    pub instruction: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedAnswer {
    pub answer: String,
    pub confidence: String,
    pub source: String,
}

/// Questions a caller may ask about one insight of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopedChatHook {
    pub insight_id: usize,
    pub insight_code: FindingCode,
    pub allowed_questions: Vec<Intent>,
}

pub fn build_scoped_prompt(insight: &Insight, intent: Intent) -> ScopedPrompt {
    let finding = &insight.finding;
    ScopedPrompt {
        intent,
        system_rules: SYSTEM_RULES.iter().map(|rule| rule.to_string()).collect(),
        context: PromptContext {
            insight_code: finding.code,
            severity: finding.severity,
            message: finding.message.clone(),
            evidence: finding.evidence.clone(),
            impact: finding.impact.clone(),
            recommendation: finding.recommendation.clone(),
        },
        instruction: intent.instruction().to_string(),
    }
}

pub fn generate_scoped_answer(prompt: &ScopedPrompt) -> ScopedAnswer {
    let context = &prompt.context;
    let answer = match prompt.intent {
        Intent::WhyRisky => format!(
            "This is risky because {} The evidence indicates {}.",
            context.message,
            context.evidence.join(", ")
        ),
        Intent::WhatToDo => format!(
            "Recommended action: {} This helps mitigate the stated impact.",
            context.recommendation.as_deref().unwrap_or("None")
        ),
        Intent::WhatCouldGoWrong => "If ignored, this could amplify existing weaknesses and \
                                     increase exposure to the stated business impact."
            .to_string(),
        Intent::HowToMonitor => "You can monitor this by tracking the same metrics highlighted \
                                 in the evidence and watching for further concentration or drift."
            .to_string(),
    };
    ScopedAnswer {
        answer,
        confidence: "high".to_string(),
        source: "deterministic".to_string(),
    }
}

pub fn insight_at(insights: &[Insight], index: usize) -> Result<&Insight, ChatError> {
    insights.get(index).ok_or(ChatError::UnknownInsight {
        index,
        available: insights.len(),
    })
}

/// Looks up `index` in `insights` and answers `intent` for it.
pub fn ask(insights: &[Insight], index: usize, intent: Intent) -> Result<ScopedAnswer, ChatError> {
    let insight = insight_at(insights, index)?;
    Ok(generate_scoped_answer(&build_scoped_prompt(insight, intent)))
}

pub fn chat_hooks(insights: &[Insight]) -> Vec<ScopedChatHook> {
    insights
        .iter()
        .enumerate()
        .map(|(insight_id, insight)| ScopedChatHook {
            insight_id,
            insight_code: insight.code(),
            allowed_questions: Intent::ALL.to_vec(),
        })
        .collect()
}
