// Shared prompt fragments.
// Each feature that calls the model keeps its own prompts.rs alongside it;
// this file only holds the cross-cutting pieces.

/// System instruction sent with every model call.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Closing line appended to every analysis prompt.
pub const JSON_ONLY_FOOTER: &str = "IMPORTANT: Return ONLY valid JSON, no additional text.";
