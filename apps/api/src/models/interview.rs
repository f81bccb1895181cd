use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Flavour of interview the guide is tailored for. Only changes the prompt,
/// never the session state machine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterviewType {
    #[default]
    General,
    Technical,
    Behavioral,
    Leadership,
}

impl InterviewType {
    pub const ALL: [InterviewType; 4] = [
        InterviewType::General,
        InterviewType::Technical,
        InterviewType::Behavioral,
        InterviewType::Leadership,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InterviewType::General => "general",
            InterviewType::Technical => "technical",
            InterviewType::Behavioral => "behavioral",
            InterviewType::Leadership => "leadership",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            InterviewType::General => "Overall interview preparation",
            InterviewType::Technical => "Focus on technical skills and coding",
            InterviewType::Behavioral => "STAR method and soft skills",
            InterviewType::Leadership => "Management and leadership scenarios",
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterviewType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        InterviewType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("unknown interview type: {s}"))
    }
}

/// Interview preparation guide generated from a resume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterviewGuide {
    pub likely_questions: Vec<LikelyQuestion>,
    pub strengths_to_highlight: Vec<Strength>,
    pub potential_weaknesses: Vec<Weakness>,
    pub technical_preparation: Vec<TechnicalTopic>,
    pub behavioral_scenarios: Vec<BehavioralScenario>,
    pub questions_to_ask: Vec<String>,
    pub salary_negotiation: Option<SalaryNegotiation>,
    pub interview_tips: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LikelyQuestion {
    pub question: String,
    /// behavioral / technical / situational
    pub category: String,
    pub suggested_answer: String,
    pub key_points: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Strength {
    pub strength: String,
    pub evidence: String,
    pub how_to_present: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Weakness {
    pub weakness: String,
    pub mitigation: String,
    pub reframe: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TechnicalTopic {
    pub skill: String,
    pub depth_questions: Vec<String>,
    pub preparation_tips: String,
}

/// STAR-shaped story lifted from the candidate's experience.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BehavioralScenario {
    pub scenario: String,
    pub situation: String,
    pub task: String,
    pub action: String,
    pub result: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SalaryNegotiation {
    pub market_range: String,
    pub negotiation_points: Vec<String>,
    pub preparation_tips: String,
}
