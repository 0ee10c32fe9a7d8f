//! Canned replies for the simulated agent chat.
//!
//! A reply is picked at random from the pool for the agent's taxonomy type,
//! unless the message hits one of the keyword overrides below. Overrides are
//! checked in order and the first match wins.

use std::time::Duration;

use {
    agenthub_config::ChatConfig,
    agenthub_store::Agent,
    rand::{Rng, seq::IndexedRandom},
};

pub const UNAVAILABLE_REPLY: &str =
    "I'm sorry, but this agent is currently unavailable. Please try again later.";

const KEYWORD_REPLIES: &[(&[&str], &str)] = &[
    (
        &["refund", "return"],
        "I can definitely help you with your refund request. Let me process that for you right away.",
    ),
    (
        &["problem", "issue", "damaged"],
        "I'm sorry to hear you're having trouble. Let me look into this issue and find a solution for you.",
    ),
    (
        &["order", "purchase"],
        "I'd be happy to help with your order. Could you share your order number so I can look it up?",
    ),
    (
        &["hello", "hi"],
        "Hello! Thanks for reaching out. How can I help you today?",
    ),
];

const CUSTOMER_SERVICE: [&str; 5] = [
    "Thank you for contacting us! I'm here to help. Could you tell me a bit more about your request?",
    "I understand how important this is. Let me check the details on your account.",
    "Great question! Here's what I can do for you right now.",
    "I've noted your request and our team will follow up within 24 hours.",
    "Is there anything else I can help you with today?",
];

const CODE_ASSISTANT: [&str; 5] = [
    "I've reviewed the snippet. Consider extracting that logic into a separate function for readability.",
    "That error usually means a value is used after it has been moved. Try borrowing it instead.",
    "Here's a cleaner approach: iterate once and collect the results into a map.",
    "Your tests cover the happy path. I'd add a case for empty input as well.",
    "This looks good overall. One suggestion: handle the error instead of ignoring it.",
];

const DATA_ANALYSIS: [&str; 5] = [
    "Based on the data, there's a clear upward trend over the last quarter.",
    "I found three outliers in the dataset that are skewing the average.",
    "The correlation between these two metrics is moderate, around 0.62.",
    "I'd recommend segmenting the data by region before drawing conclusions.",
    "Here's a summary: volume is up 12% while conversion stayed flat.",
];

const CONTENT_CREATION: [&str; 5] = [
    "Here's a draft headline: \"Work Smarter, Not Harder\". Want a few alternatives?",
    "I can adjust the tone to be more conversational if that fits your audience better.",
    "I've outlined the post in five sections. Shall I expand the introduction first?",
    "A shorter call to action would likely perform better on mobile.",
    "Here are three social captions based on your brief.",
];

const RESEARCH: [&str; 5] = [
    "I found several recent papers on this topic. The most cited one is from last year.",
    "The consensus in the literature is mixed, with two competing explanations.",
    "Here's a short summary of the key findings and their limitations.",
    "I'd suggest narrowing the question to make the search more focused.",
    "Three competitors released similar features this quarter. Want a comparison?",
];

const SALES: [&str; 5] = [
    "Thanks for your interest! Which plan are you currently considering?",
    "I can put together a quote based on your team size.",
    "Our enterprise tier includes priority support and custom integrations.",
    "Would you like to schedule a demo with one of our account managers?",
    "There's a discount available for annual billing this month.",
];

const GENERIC: [&str; 5] = [
    "Thanks for your message. How can I help you further?",
    "I'm processing your request now.",
    "Could you provide a little more detail?",
    "Got it. Let me look into that for you.",
    "Happy to help with that.",
];

fn pool_for(agent_type: &str) -> &'static [&'static str; 5] {
    match agent_type {
        "customer_service" => &CUSTOMER_SERVICE,
        "code_assistant" => &CODE_ASSISTANT,
        "data_analysis" => &DATA_ANALYSIS,
        "content_creation" => &CONTENT_CREATION,
        "research" => &RESEARCH,
        "sales" => &SALES,
        _ => &GENERIC,
    }
}

/// The keyword override for `message`, if any (case-insensitive substring match).
pub fn keyword_reply(message: &str) -> Option<&'static str> {
    let lowered = message.to_lowercase();
    KEYWORD_REPLIES
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| lowered.contains(k)))
        .map(|(_, reply)| *reply)
}

/// Compose the reply an agent gives to `message`. `None` means the agent is gone.
pub fn compose_reply(agent: Option<&Agent>, message: &str) -> String {
    let Some(agent) = agent else {
        return UNAVAILABLE_REPLY.to_string();
    };
    if let Some(reply) = keyword_reply(message) {
        return reply.to_string();
    }
    pool_for(&agent.agent_type)
        .choose(&mut rand::rng())
        .copied()
        .unwrap_or(GENERIC[0])
        .to_string()
}

/// Random artificial latency within the configured bounds.
pub fn response_delay(config: &ChatConfig) -> Duration {
    let (low, high) = if config.min_delay_ms <= config.max_delay_ms {
        (config.min_delay_ms, config.max_delay_ms)
    } else {
        (config.max_delay_ms, config.min_delay_ms)
    };
    Duration::from_millis(rand::rng().random_range(low..=high))
}

#[cfg(test)]
mod tests {
    use {agenthub_store::NewAgent, chrono::Utc};

    use super::*;

    fn agent(agent_type: &str) -> Agent {
        Agent::from_new(
            NewAgent {
                name: "Bot".into(),
                team: "Ops".into(),
                description: String::new(),
                tech_stack: String::new(),
                agent_type: agent_type.into(),
                container_url: None,
                container_image: None,
                capabilities: Vec::new(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn refund_beats_order() {
        let reply = compose_reply(Some(&agent("customer_service")), "I need a refund for order #123");
        assert_eq!(
            reply,
            "I can definitely help you with your refund request. Let me process that for you right away."
        );
    }

    #[test]
    fn keyword_priority_and_case() {
        assert_eq!(keyword_reply("My package arrived DAMAGED"), Some(KEYWORD_REPLIES[1].1));
        assert_eq!(keyword_reply("where is my Purchase"), Some(KEYWORD_REPLIES[2].1));
        assert_eq!(keyword_reply("Hello there"), Some(KEYWORD_REPLIES[3].1));
        assert_eq!(keyword_reply("good morning"), None);
    }

    #[test]
    fn default_reply_comes_from_type_pool() {
        let reply = compose_reply(Some(&agent("research")), "summarise the latest papers");
        assert!(RESEARCH.contains(&reply.as_str()));

        let reply = compose_reply(Some(&agent("astrology")), "what's my sign");
        assert!(GENERIC.contains(&reply.as_str()));
    }

    #[test]
    fn missing_agent_is_unavailable() {
        assert_eq!(compose_reply(None, "refund please"), UNAVAILABLE_REPLY);
    }

    #[test]
    fn delay_stays_in_bounds() {
        let config = ChatConfig {
            min_delay_ms: 500,
            max_delay_ms: 2500,
        };
        for _ in 0..50 {
            let delay = response_delay(&config).as_millis();
            assert!((500..=2500).contains(&delay));
        }
        let inverted = ChatConfig {
            min_delay_ms: 20,
            max_delay_ms: 10,
        };
        assert!((10..=20).contains(&response_delay(&inverted).as_millis()));
    }
}
