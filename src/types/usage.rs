use std::ops::Add;

use serde::{Deserialize, Serialize};

/// Token counts reported by the endpoint.
///
/// Usage is forwarded to the frontend for display only.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Usage {
    /// Tokens in the request, including history and system prompt.
    #[serde(default)]
    pub prompt_tokens: u32,

    /// Tokens generated in the reply.
    #[serde(default)]
    pub completion_tokens: u32,

    /// Sum of prompt and completion tokens.
    #[serde(default)]
    pub total_tokens: u32,
}

impl Usage {
    /// Create a new `Usage` with the given prompt and completion tokens.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        Usage {
            prompt_tokens: self.prompt_tokens.saturating_add(rhs.prompt_tokens),
            completion_tokens: self.completion_tokens.saturating_add(rhs.completion_tokens),
            total_tokens: self.total_tokens.saturating_add(rhs.total_tokens),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn usage_deserialization_ignores_timing_fields() {
        let usage: Usage = serde_json::from_value(json!({
            "queue_time": 0.02,
            "prompt_tokens": 24,
            "prompt_time": 0.001,
            "completion_tokens": 377,
            "completion_time": 0.3,
            "total_tokens": 401,
            "total_time": 0.301
        }))
        .unwrap();
        assert_eq!(usage, Usage::new(24, 377));
    }

    #[test]
    fn usage_add() {
        let total = Usage::new(10, 5) + Usage::new(1, 2);
        assert_eq!(total, Usage::new(11, 7));
    }
}
