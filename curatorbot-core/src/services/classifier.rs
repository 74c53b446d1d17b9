// File: src/services/classifier.rs
//
// Decides whether an observed message is a help request. Pure and stateless
// apart from the configured keyword list; safe to call from anywhere.

use curatorbot_common::models::FactionContext;

pub struct KeywordClassifier {
    /// Lowercased keyword list from configuration.
    keywords: Vec<String>,
}

impl KeywordClassifier {
    pub fn new(keywords: &[String]) -> Self {
        Self {
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    /// True when the text, the resolved role mentions, or a literal role tag
    /// indicates the message wants curator attention.
    pub fn is_help_request(
        &self,
        text: &str,
        mentioned_role_ids: &[String],
        faction: &FactionContext,
    ) -> bool {
        if self.contains_keyword(text) {
            return true;
        }
        if let Some(role_id) = &faction.attention_role_id {
            if mentioned_role_ids.iter().any(|id| id == role_id) {
                return true;
            }
            // Clients that don't resolve mentions still carry the raw tag.
            let tag = format!("<@&{}>", role_id);
            if text.contains(&tag) {
                return true;
            }
        }
        false
    }

    pub fn contains_keyword(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let lower = text.to_lowercase();
        self.keywords.iter().any(|k| lower.contains(k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curatorbot_common::models::FactionContext;

    fn faction_with_role(role_id: &str) -> FactionContext {
        let mut f = FactionContext::new("100", "Government");
        f.attention_role_id = Some(role_id.to_string());
        f
    }

    fn classifier() -> KeywordClassifier {
        KeywordClassifier::new(&[
            "куратор".to_string(),
            "curator".to_string(),
            "help".to_string(),
            "помощь".to_string(),
        ])
    }

    #[test]
    fn test_keyword_match_is_case_insensitive() {
        let c = classifier();
        let f = faction_with_role("555");
        assert!(c.is_help_request("Нужен КУРАТОР срочно", &[], &f));
        assert!(c.is_help_request("can a Curator help me out", &[], &f));
        assert!(!c.is_help_request("just chatting", &[], &f));
    }

    #[test]
    fn test_attention_role_mention_matches() {
        let c = classifier();
        let f = faction_with_role("555");
        assert!(c.is_help_request("??", &["555".to_string()], &f));
        assert!(!c.is_help_request("??", &["556".to_string()], &f));
    }

    #[test]
    fn test_literal_role_tag_matches() {
        let c = classifier();
        let f = faction_with_role("555");
        assert!(c.is_help_request("hey <@&555> anyone there", &[], &f));
        assert!(!c.is_help_request("hey <@&556> anyone there", &[], &f));
    }

    #[test]
    fn test_no_attention_role_configured() {
        let c = classifier();
        let f = FactionContext::new("100", "Government");
        assert!(!c.is_help_request("<@&555>", &["555".to_string()], &f));
        assert!(c.is_help_request("help", &[], &f));
    }

    #[test]
    fn test_empty_text() {
        let c = classifier();
        let f = faction_with_role("555");
        assert!(!c.is_help_request("", &[], &f));
    }
}
