//! Prompt-engineering catalog and a keyword heuristic that scores prompts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Technique {
    ZeroShot,
    FewShot,
    ChainOfThought,
    RolePlaying,
    Constraints,
    Formatting,
}

impl Technique {
    pub const ALL: [Technique; 6] = [
        Technique::ZeroShot,
        Technique::FewShot,
        Technique::ChainOfThought,
        Technique::RolePlaying,
        Technique::Constraints,
        Technique::Formatting,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Technique::ZeroShot => "zero_shot",
            Technique::FewShot => "few_shot",
            Technique::ChainOfThought => "chain_of_thought",
            Technique::RolePlaying => "role_playing",
            Technique::Constraints => "constraints",
            Technique::Formatting => "formatting",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Technique::ZeroShot => "Direct question without examples",
            Technique::FewShot => "Provide examples before asking",
            Technique::ChainOfThought => "Step-by-step reasoning",
            Technique::RolePlaying => "Assign specific roles or personas",
            Technique::Constraints => "Set specific limitations or requirements",
            Technique::Formatting => "Specify exact output format",
        }
    }
}

impl std::str::FromStr for Technique {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Technique::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown technique '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Advanced,
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "beginner" => Ok(Difficulty::Beginner),
            "intermediate" => Ok(Difficulty::Intermediate),
            "advanced" => Ok(Difficulty::Advanced),
            other => Err(format!("unknown difficulty '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PromptExample {
    pub name: &'static str,
    pub description: &'static str,
    pub prompt: &'static str,
    pub expected_output: &'static str,
    pub technique: Technique,
    pub difficulty: Difficulty,
}

pub static EXAMPLES: &[PromptExample] = &[
    PromptExample {
        name: "Zero-Shot Classification",
        description: "Classify text without training examples",
        prompt: "Classify the following text as positive, negative, or neutral: 'I absolutely love this new AI technology!'",
        expected_output: "positive",
        technique: Technique::ZeroShot,
        difficulty: Difficulty::Beginner,
    },
    PromptExample {
        name: "Few-Shot Learning",
        description: "Provide examples to guide the model",
        prompt: "Here are some examples of sentiment classification:\n\n\
                 Text: \"I love this product!\"\nSentiment: positive\n\n\
                 Text: \"This is terrible quality.\"\nSentiment: negative\n\n\
                 Text: \"The product works okay.\"\nSentiment: neutral\n\n\
                 Now classify: \"I'm not sure about this purchase.\"\nSentiment:",
        expected_output: "neutral",
        technique: Technique::FewShot,
        difficulty: Difficulty::Intermediate,
    },
    PromptExample {
        name: "Chain of Thought",
        description: "Encourage step-by-step reasoning",
        prompt: "Let's solve this step by step:\n\n\
                 Problem: A company wants to implement AI for customer service. They have 1000 customer inquiries per day, \
                 and currently each inquiry takes 5 minutes to resolve. If AI can reduce this to 2 minutes, how much time \
                 will be saved per day?\n\n\
                 Let me think through this:\n\
                 1. Current time per inquiry: 5 minutes\n\
                 2. New time per inquiry: 2 minutes\n\
                 3. Time saved per inquiry: 5 - 2 = 3 minutes\n\
                 4. Total inquiries per day: 1000\n\
                 5. Total time saved per day: 1000 × 3 = 3000 minutes\n\
                 6. Convert to hours: 3000 ÷ 60 = 50 hours\n\n\
                 Answer: The company will save 50 hours per day.",
        expected_output: "50 hours per day",
        technique: Technique::ChainOfThought,
        difficulty: Difficulty::Advanced,
    },
    PromptExample {
        name: "Role Playing",
        description: "Assign specific roles or expertise",
        prompt: "You are an expert data scientist with 15 years of experience in machine learning. You specialize in \
                 healthcare AI applications and have published over 50 papers in top-tier journals.\n\n\
                 As this expert, explain to a business executive why their company should invest in AI-powered predictive \
                 maintenance for their manufacturing equipment. Use business language and focus on ROI and risk reduction.",
        expected_output: "Professional business explanation with ROI focus",
        technique: Technique::RolePlaying,
        difficulty: Difficulty::Intermediate,
    },
    PromptExample {
        name: "Output Formatting",
        description: "Specify exact output structure",
        prompt: "Analyze the following customer feedback and provide insights in JSON format:\n\n\
                 Customer Feedback: \"The new AI chatbot is helpful but sometimes gives incorrect information. I like the \
                 24/7 availability but wish it could handle complex queries better.\"\n\n\
                 Please format your response as:\n\
                 {\n  \"positive_aspects\": [\"list\", \"of\", \"positive\", \"points\"],\n  \
                 \"negative_aspects\": [\"list\", \"of\", \"negative\", \"points\"],\n  \
                 \"improvement_suggestions\": [\"list\", \"of\", \"suggestions\"],\n  \
                 \"overall_sentiment\": \"positive/negative/neutral\",\n  \
                 \"priority_level\": \"high/medium/low\"\n}",
        expected_output: "Structured JSON response",
        technique: Technique::Formatting,
        difficulty: Difficulty::Intermediate,
    },
    PromptExample {
        name: "Constraint-Based",
        description: "Set specific limitations or requirements",
        prompt: "Write a product description for an AI-powered smart home device.\n\n\
                 Requirements:\n\
                 - Maximum 100 words\n\
                 - Target audience: tech-savvy homeowners aged 25-45\n\
                 - Include exactly 3 benefits\n\
                 - Use active voice only\n\
                 - Avoid technical jargon\n\
                 - End with a call-to-action\n\n\
                 Product: SmartTherm AI - Intelligent temperature control system",
        expected_output: "Concise product description meeting all constraints",
        technique: Technique::Constraints,
        difficulty: Difficulty::Advanced,
    },
];

pub fn examples_by_technique(technique: Technique) -> Vec<&'static PromptExample> {
    EXAMPLES.iter().filter(|ex| ex.technique == technique).collect()
}

pub fn examples_by_difficulty(difficulty: Difficulty) -> Vec<&'static PromptExample> {
    EXAMPLES.iter().filter(|ex| ex.difficulty == difficulty).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct TechniqueSummary {
    pub technique: Technique,
    pub description: &'static str,
    pub examples_count: usize,
    pub difficulty_levels: Vec<Difficulty>,
}

pub fn technique_summaries() -> Vec<TechniqueSummary> {
    Technique::ALL
        .into_iter()
        .map(|technique| {
            let examples = examples_by_technique(technique);
            let levels: BTreeSet<Difficulty> = examples.iter().map(|ex| ex.difficulty).collect();
            TechniqueSummary {
                technique,
                description: technique.description(),
                examples_count: examples.len(),
                difficulty_levels: levels.into_iter().collect(),
            }
        })
        .collect()
}

pub const CUSTOM_TEMPLATE: &str = "Custom prompt template for your specific needs";

/// Template for a use case (`classification` or `generation`) and technique.
pub fn prompt_template(use_case: &str, technique: Technique) -> &'static str {
    match (use_case, technique) {
        ("classification", Technique::ZeroShot) => "Classify the following {input_type} as {categories}: {input_text}",
        ("classification", Technique::FewShot) => "Here are some examples:\n{examples}\n\nNow classify: {input_text}",
        ("classification", Technique::ChainOfThought) => {
            "Let's solve this step by step:\n\nProblem: {problem}\n\nLet me think through this:\n{steps}\n\nAnswer:"
        }
        ("generation", Technique::RolePlaying) => "You are {role} with {expertise}. {task_description}",
        ("generation", Technique::Constraints) => {
            "Create {output_type} with these requirements:\n{requirements}\n\n{task_description}"
        }
        ("generation", Technique::Formatting) => {
            "Generate {output_type} in this exact format:\n{format_specification}\n\n{task_description}"
        }
        _ => CUSTOM_TEMPLATE,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PromptAnalysis {
    pub clarity_score: u32,
    pub specificity_score: u32,
    pub constraint_score: u32,
    pub examples_score: u32,
    pub format_score: u32,
    /// Mean of the five component scores.
    pub overall_score: f64,
    pub suggestions: Vec<String>,
}

const SPECIFIC_WORDS: [&str; 4] = ["specific", "exact", "precise", "detailed"];
const CONSTRAINT_WORDS: [&str; 6] = ["maximum", "minimum", "exactly", "only", "must", "should"];
const STRUCTURE_WORDS: [&str; 5] = ["format", "structure", "json", "xml", "table"];
const OUTPUT_WORDS: [&str; 4] = ["format", "output", "response", "answer"];

fn mentions_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

/// Score a prompt against prompt-writing practices. Keyword checks are case-insensitive
/// substring matches.
pub fn analyze_prompt(prompt: &str) -> PromptAnalysis {
    let mut a = PromptAnalysis::default();
    let words = prompt.split_whitespace().count();
    let lower = prompt.to_lowercase();

    if words < 50 {
        a.clarity_score += 2;
        a.suggestions.push("Consider adding more context for clarity".into());
    } else if words < 200 {
        a.clarity_score += 4;
    } else {
        a.clarity_score += 5;
    }

    if prompt.contains('?') { a.specificity_score += 2; }
    if mentions_any(&lower, &SPECIFIC_WORDS) { a.specificity_score += 2; }
    if words > 100 { a.specificity_score += 1; }

    if mentions_any(&lower, &CONSTRAINT_WORDS) { a.constraint_score += 3; }
    if mentions_any(&lower, &STRUCTURE_WORDS) { a.constraint_score += 2; }

    if lower.contains("example") || lower.contains("for instance") { a.examples_score += 3; }

    if mentions_any(&lower, &OUTPUT_WORDS) { a.format_score += 2; }

    let total = a.clarity_score + a.specificity_score + a.constraint_score + a.examples_score + a.format_score;
    a.overall_score = f64::from(total) / 5.0;

    if a.overall_score < 3.0 {
        a.suggestions.push("Consider using few-shot examples".into());
        a.suggestions.push("Add specific output format requirements".into());
    }
    if a.overall_score < 2.0 {
        a.suggestions.push("Review prompt clarity and specificity".into());
    }
    a
}
