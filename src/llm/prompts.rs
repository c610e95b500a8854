use crate::models::{Band, Direction, EditPlan, Metric, StageKind};

/// System prompt shared by every revision request
pub const SYSTEM_PROMPT: &str = r#"You are a text editor adjusting the readability of a short passage. You MUST follow these rules:

1. Edit surgically: keep the original wording and sentence structure wherever possible.
2. Do NOT change the meaning of any sentence.
3. Change only what is needed to move the named metric toward its target range.
4. If a perfect edit is impossible, return the version closest to the target.
5. Respond with the revised passage only. No headings, notes or explanations."#;

/// Template chosen once per stage from the plan's direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptTemplate {
    StructuralIncrease,
    StructuralDecrease,
    LexicalIncrease,
    LexicalDecrease,
}

impl PromptTemplate {
    pub fn resolve(stage: StageKind, direction: Direction) -> Self {
        match (stage, direction) {
            (StageKind::Structural, Direction::Increase) => PromptTemplate::StructuralIncrease,
            (StageKind::Structural, Direction::Decrease) => PromptTemplate::StructuralDecrease,
            (StageKind::Lexical, Direction::Increase) => PromptTemplate::LexicalIncrease,
            (StageKind::Lexical, Direction::Decrease) => PromptTemplate::LexicalDecrease,
        }
    }

    fn mission(&self) -> &'static str {
        match self {
            PromptTemplate::StructuralIncrease => {
                "INCREASE the metric toward the MINIMUM edge of its target range."
            }
            PromptTemplate::StructuralDecrease => {
                "DECREASE the metric toward the MAXIMUM edge of its target range."
            }
            PromptTemplate::LexicalIncrease => {
                "INCREASE the share of basic (CEFR A1/A2) content words by replacing harder nouns, verbs, adjectives and adverbs with simpler synonyms."
            }
            PromptTemplate::LexicalDecrease => {
                "DECREASE the share of basic (CEFR A1/A2) content words by replacing simple nouns, verbs, adjectives and adverbs with more precise, less common synonyms."
            }
        }
    }

    fn method(&self, metric: Metric) -> &'static str {
        match (self, metric) {
            (PromptTemplate::StructuralIncrease, Metric::ClauseRatio) => {
                "Insert a subordinate clause (relative, adverbial or nominal) into a simple sentence, or join two simple sentences with a coordinating conjunction."
            }
            (PromptTemplate::StructuralIncrease, _) => {
                "Combine two short related sentences into one, or insert descriptive words or phrases."
            }
            (PromptTemplate::StructuralDecrease, Metric::ClauseRatio) => {
                "Turn a clause into a phrase, or split a complex sentence into simple sentences."
            }
            (PromptTemplate::StructuralDecrease, _) => {
                "Split a long sentence into two, or remove non-essential modifiers."
            }
            (PromptTemplate::LexicalIncrease, _) | (PromptTemplate::LexicalDecrease, _) => {
                "Swap single words only. Never swap proper nouns. Keep grammar and sentence boundaries intact."
            }
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            PromptTemplate::StructuralIncrease | PromptTemplate::StructuralDecrease => "sentences",
            PromptTemplate::LexicalIncrease | PromptTemplate::LexicalDecrease => "words",
        }
    }
}

/// Everything a generation prompt needs for one stage
#[derive(Debug, Clone)]
pub struct EditInstructions {
    pub stage: StageKind,
    pub template: PromptTemplate,
    pub plan: EditPlan,
    pub current_value: f64,
    pub band: Band,
}

impl EditInstructions {
    pub fn new(stage: StageKind, plan: EditPlan, current_value: f64, band: Band) -> Self {
        Self {
            stage,
            template: PromptTemplate::resolve(stage, plan.direction),
            plan,
            current_value,
            band,
        }
    }
}

/// Build the user prompt for a revision
pub fn build_revision_prompt(text: &str, instructions: &EditInstructions) -> String {
    let template = instructions.template;
    let metric = instructions.plan.metric;
    let mut prompt = String::new();

    prompt.push_str("# Passage\n");
    prompt.push_str(text.trim());
    prompt.push_str("\n\n");

    prompt.push_str("# Target\n");
    prompt.push_str(&format!("- Metric: {}\n", metric.label()));
    prompt.push_str(&format!("- Current value: {:.3}\n", instructions.current_value));
    prompt.push_str(&format!(
        "- Target range: {:.3} - {:.3}\n",
        instructions.band.min, instructions.band.max
    ));
    prompt.push_str(&format!(
        "- Modify at least {} {}\n\n",
        instructions.plan.edit_count,
        template.unit()
    ));

    prompt.push_str("# Mission\n");
    prompt.push_str(template.mission());
    prompt.push_str("\n\n# Method\n");
    prompt.push_str(template.method(metric));
    prompt.push('\n');

    prompt
}

/// Build the prompt asking the tie-breaker for the best candidate
pub fn build_selection_prompt(candidates: &[String]) -> String {
    let n = candidates.len();
    let mut prompt = String::from(
        "You are a precise text evaluator selecting the single best revised text from a list.\n\n### Candidates\n",
    );

    for (i, candidate) in candidates.iter().enumerate() {
        prompt.push_str(&format!("candidate_{}: {}\n", i + 1, candidate));
    }

    prompt.push_str(
        "\n### Evaluation Criteria (strict order)\n\
         1. Grammatically correct and meaning-preserving; anything else is disqualified.\n\
         2. Among the rest, the most fluent and natural.\n\
         3. If still tied, the one whose changes are integrated most elegantly.\n\n",
    );
    prompt.push_str(&format!(
        "Respond ONLY with the number of the best candidate, between 1 and {n}. No explanation."
    ));

    prompt
}
