// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Common instruction appended to every prompt that reasons over a resume.
pub const GROUNDING_INSTRUCTION: &str = "\
    Base every statement on the resume data provided. \
    Do NOT invent employers, dates, degrees, or metrics that are not present. \
    If the resume does not support a claim, say so or omit it.";
