// the model is asked for a single word so the answer survives a tiny max_tokens.
pub const RELEVANCE_PROMPT: &str =
    "You are screening newly published research papers for a reader. \
    Decide whether the paper described by the abstract below is relevant \
    to the reader's interest. Answer with exactly one word: \"yes\" or \"no\".";

pub fn relevance_prompt(summary: &str, interest: &str) -> String {
    format!(
        "{}\n\nInterest: {}\n\nAbstract: {}\n\nAnswer (yes or no):",
        RELEVANCE_PROMPT,
        interest.trim(),
        summary.trim()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_both_inputs() {
        let prompt = relevance_prompt(" An abstract about graphs. ", "graph neural networks\n");
        assert!(prompt.starts_with(RELEVANCE_PROMPT));
        assert!(prompt.contains("Interest: graph neural networks\n"));
        assert!(prompt.contains("Abstract: An abstract about graphs.\n"));
        assert!(prompt.ends_with("Answer (yes or no):"));
    }
}
