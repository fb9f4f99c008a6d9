//! Prompt templates for the LLM entailment judge.

/// System prompt that frames the model as an NLI classifier.
pub const ENTAILMENT_SYSTEM_PROMPT: &str = "You are a natural language inference classifier. \
You decide whether a premise supports a hypothesis and answer with JSON only.";

/// Build the user prompt for one (hypothesis, premise) pair.
///
/// The model must answer with `{"label": "...", "confidence": 0.0-1.0}` where
/// label is one of `entailment`, `contradiction` or `neutral`.
///
/// # Example
/// ```
/// use ragtrace::llm::prompts::entailment_prompt;
///
/// let prompt = entailment_prompt("Paris is in France", "Paris is the capital of France.");
/// assert!(prompt.contains("Paris is in France"));
/// ```
pub fn entailment_prompt(hypothesis: &str, premise: &str) -> String {
    format!(
        r#"Premise:
{premise}

Hypothesis:
{hypothesis}

Does the premise entail the hypothesis?
- "entailment": the premise supports the hypothesis
- "contradiction": the premise contradicts the hypothesis
- "neutral": the premise neither supports nor contradicts it

Respond with valid JSON only, for example:
{{"label": "entailment", "confidence": 0.93}}"#
    )
}
