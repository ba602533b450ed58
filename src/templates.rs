//! Canned replies offered to the coach, picked by a keyword heuristic over
//! the client's latest message.

use crate::conversation::Conversation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateCategory {
    PersonalRecord,
    Pain,
    Consistency,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub category: TemplateCategory,
    pub title: &'static str,
    pub text: &'static str,
}

pub const PR_TEMPLATE: Template = Template {
    category: TemplateCategory::PersonalRecord,
    title: "Celebrate a PR",
    text: "Huge congrats on the new PR! That's what showing up week after week \
           gets you. Let's ride this momentum into the next block.",
};

pub const PAIN_TEMPLATE: Template = Template {
    category: TemplateCategory::Pain,
    title: "Check in on pain",
    text: "Sorry to hear you're dealing with some pain. Can you rate it from 1 to 10 \
           and tell me exactly where you feel it? We'll adjust your program so you \
           can keep training safely.",
};

pub const CONSISTENCY_TEMPLATE: Template = Template {
    category: TemplateCategory::Consistency,
    title: "Get back on track",
    text: "Consistency beats perfection. One missed session won't undo your progress, \
           so let's get the next workout on the calendar and keep moving.",
};

pub const TEMPLATES: [&Template; 3] = [&PR_TEMPLATE, &PAIN_TEMPLATE, &CONSISTENCY_TEMPLATE];

/// Keyword rules, checked in order. The first rule with any matching
/// keyword wins, so a message mentioning both a PR and pain gets the PR reply.
const RULES: [(&[&str], &Template); 3] = [
    (&["pr", "record", "personal best"], &PR_TEMPLATE),
    (&["pain", "hurt", "sore"], &PAIN_TEMPLATE),
    (&["missed", "skip"], &CONSISTENCY_TEMPLATE),
];

/// Suggest a reply for the text of the client's most recent message.
/// Keywords match as case-insensitive substrings anywhere in the text.
pub fn suggest(client_text: &str) -> Option<&'static Template> {
    let lower = client_text.to_lowercase();
    RULES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lower.contains(k)))
        .map(|&(_, template)| template)
}

/// Suggest a reply for a conversation. Only the latest client-authored
/// message is considered; coach replies are never scanned.
pub fn suggest_for(conversation: &Conversation) -> Option<&'static Template> {
    conversation
        .latest_client_message()
        .and_then(|m| suggest(m.text()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::index;
    use crate::message::{Channel, Message};
    use chrono::{TimeZone, Utc};
    use rstest::rstest;

    #[rstest]
    #[case("New PR on deadlift!", Some(TemplateCategory::PersonalRecord))]
    #[case("broke my squat record", Some(TemplateCategory::PersonalRecord))]
    #[case("That was a Personal Best for me", Some(TemplateCategory::PersonalRecord))]
    #[case("my knee felt sore today", Some(TemplateCategory::Pain))]
    #[case("back PAIN again", Some(TemplateCategory::Pain))]
    #[case("it hurts when I bend", Some(TemplateCategory::Pain))]
    #[case("I missed yesterday", Some(TemplateCategory::Consistency))]
    #[case("had to SKIP leg day", Some(TemplateCategory::Consistency))]
    #[case("see you thursday", None)]
    #[case("", None)]
    fn picks_template_by_keyword(#[case] text: &str, #[case] expected: Option<TemplateCategory>) {
        assert_eq!(suggest(text).map(|t| t.category), expected);
    }

    #[test]
    fn pr_rule_outranks_pain_rule() {
        let t = suggest("new pr but my wrist has some pain").unwrap();
        assert_eq!(t.category, TemplateCategory::PersonalRecord);
    }

    #[test]
    fn pain_rule_outranks_consistency_rule() {
        let t = suggest("skipped because of the pain").unwrap();
        assert_eq!(t.category, TemplateCategory::Pain);
    }

    #[test]
    fn keywords_match_inside_words() {
        // "program" contains "pr", so it lands on the PR rule.
        assert_eq!(
            suggest("can we change my program?").map(|t| t.category),
            Some(TemplateCategory::PersonalRecord)
        );
    }

    #[test]
    fn template_texts_carry_their_marker() {
        assert!(PR_TEMPLATE.text.contains("PR"));
        assert!(PAIN_TEMPLATE.text.contains("pain"));
        assert!(CONSISTENCY_TEMPLATE.text.contains("Consistency"));
        assert_eq!(TEMPLATES.len(), 3);
    }

    #[test]
    fn sore_knee_gets_pain_template() {
        let t0 = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let msgs = vec![Message::inbound("c1", "my knee felt sore today", None, t0).unwrap()];
        let convs = index(&msgs);
        let template = suggest_for(&convs[0]).unwrap();
        assert!(template.text.contains("pain"));
    }

    #[test]
    fn coach_messages_are_never_scanned() {
        let at = |s: i64| Utc.timestamp_opt(1_700_000_000 + s, 0).unwrap();
        let msgs = vec![
            Message::inbound("c1", "see you tomorrow", None, at(1)).unwrap(),
            Message::outbound("c1", "hope the pain is gone", Channel::Email, at(2)).unwrap(),
        ];
        let convs = index(&msgs);
        assert_eq!(suggest_for(&convs[0]), None);

        let coach_only = vec![Message::outbound("c2", "new PR?", Channel::Email, at(3)).unwrap()];
        assert_eq!(suggest_for(&index(&coach_only)[0]), None);
    }
}
