//! Local phrase pools used when no completion is available.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use strum::{Display, IntoStaticStr};

use crate::context::AssembledContext;
use crate::triggers::{SilenceBand, TriggerCategory, TriggerEvent};

const MORNING_LINES: &[&str] = &[
    "Good morning! ☀️ What's the one thing that would make today a win?",
    "Morning! What are you tackling first today?",
    "New day, fresh start! What's your main focus today?",
    "Good morning! Ready to make today count?",
    "Morning check-in: What's most important on your agenda today?",
];

const EVENING_LINES: &[&str] = &[
    "Evening reflection time! 🌅 How did today go?",
    "End of the day - what's on your mind about today?",
    "Time to wind down. Tell me about your day!",
    "Evening check-in: What happened today that mattered?",
    "How are you feeling about what you accomplished today?",
];

const EVENING_FOLLOW_UPS: &[&str] = &[
    "How did that thing we talked about go today?",
    "Did you make progress on what we discussed?",
    "I'm curious how today went after our conversation!",
];

const HOURLY_LINES: &[&str] = &[
    "Quick check-in: How are you doing with your main goal today?",
    "What's occupying your mind right now?",
    "Making progress on what matters most today?",
    "How's your energy level? Staying focused?",
    "Just checking in - anything you want to share about today?",
];

const SHORT_SILENCE_LINES: &[&str] = &[
    "Haven't heard from you today. How did things go? I'm curious about your progress!",
    "It's been a day since we talked. What's been keeping you busy?",
];

const MEDIUM_SILENCE_LINES: &[&str] = &[
    "Just wanted to check in - you've been quiet for a couple days. Everything okay? I'm here if you need to talk about anything.",
    "A couple of quiet days over here. How are you holding up?",
];

const LONG_SILENCE_LINES: &[&str] = &[
    "Hey, I haven't heard from you in a few days. No pressure, but I'm here when you're ready to talk. Hope you're doing well! 💙",
    "It's been a few days. Whenever you feel like catching up, I'm around. 💙",
];

const WEEKLY_REVIEW: &str = "🗓️ Week's almost over! Time for a quick review:\n\n\
1. What was your biggest win this week?\n\
2. What challenged you the most?\n\
3. What do you want to focus on next week?\n\n\
I love hearing about your progress and struggles. Both help us learn! 📈";

const GENERIC_PROMPTS: &[&str] = &[
    "I'm here and listening. What's on your mind today?",
    "How are you feeling about your goals right now?",
    "Tell me something good that happened recently!",
    "What's the most important thing you want to focus on today?",
    "I'm always here to chat. What would you like to talk about?",
];

/// Topic detected in an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display, IntoStaticStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Topic {
    Goal,
    Progress,
    Stress,
    Completion,
    Help,
}

struct TopicRule {
    topic: Topic,
    keywords: &'static [&'static str],
    reply: &'static str,
}

/// Checked in order; the first rule with a matching keyword wins.
const TOPIC_RULES: &[TopicRule] = &[
    TopicRule {
        topic: Topic::Goal,
        keywords: &["goal", "objective"],
        reply: "I hear you talking about goals! That's great. What specific goal are you working on? I'll help you break it down and keep track of your progress. 🎯",
    },
    TopicRule {
        topic: Topic::Progress,
        keywords: &["progress", "update"],
        reply: "Thanks for the update! I love hearing about your progress. Tell me more - what went well and what was challenging? 📊",
    },
    TopicRule {
        topic: Topic::Stress,
        keywords: &["tired", "stressed", "overwhelmed"],
        reply: "I hear you're having a tough time. That's completely normal. Sometimes the best thing is to take a step back. What's one small thing that might help you feel better right now? 💪",
    },
    TopicRule {
        topic: Topic::Completion,
        keywords: &["done", "finished", "completed"],
        reply: "Nice work! 🎉 It feels good to finish things, doesn't it? What did you learn from doing this, and what's next on your list?",
    },
    TopicRule {
        topic: Topic::Help,
        keywords: &["help", "stuck"],
        reply: "I'm here to help! Let's figure this out together. Can you tell me more about what's blocking you? Sometimes talking it through helps clarify things. 🤔",
    },
];

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|l| l.to_string()).collect()
}

fn matching_rule(text: &str) -> Option<&'static TopicRule> {
    let lowered = text.to_lowercase();
    TOPIC_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
}

/// Detect the first matching topic in `text`, case-insensitively.
pub fn detect_topic(text: &str) -> Option<Topic> {
    matching_rule(text).map(|rule| rule.topic)
}

/// Deterministic-when-seeded local responder.
pub struct FallbackResponder {
    rng: Mutex<StdRng>,
    rotation: AtomicUsize,
}

impl Default for FallbackResponder {
    fn default() -> Self {
        Self::new()
    }
}

impl FallbackResponder {
    /// Responder seeded from OS entropy.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Responder with a fixed seed, for reproducible output.
    pub fn with_seed(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
            rotation: AtomicUsize::new(0),
        }
    }

    /// Candidate lines for a proactive trigger.
    pub fn proactive_pool(event: &TriggerEvent, context: &AssembledContext) -> Vec<String> {
        match event.category {
            TriggerCategory::Morning => {
                let mut pool = owned(MORNING_LINES);
                pool.extend(context.active_goals.iter().map(|goal| {
                    format!("Morning! How will you move forward on \"{}\" today?", goal.title)
                }));
                pool
            }
            TriggerCategory::Evening => {
                let mut pool = owned(EVENING_LINES);
                if !context.recent_messages.is_empty() {
                    pool.extend(owned(EVENING_FOLLOW_UPS));
                }
                pool
            }
            TriggerCategory::Hourly => owned(HOURLY_LINES),
            TriggerCategory::Silence => match event.silence_band {
                Some(SilenceBand::Long) => owned(LONG_SILENCE_LINES),
                Some(SilenceBand::Medium) => owned(MEDIUM_SILENCE_LINES),
                _ => owned(SHORT_SILENCE_LINES),
            },
            TriggerCategory::Weekly => vec![WEEKLY_REVIEW.to_string()],
        }
    }

    /// Pick uniformly from the category's pool.
    pub fn proactive(&self, event: &TriggerEvent, context: &AssembledContext) -> String {
        let pool = Self::proactive_pool(event, context);
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        pool.choose(&mut *rng)
            .cloned()
            .unwrap_or_else(|| GENERIC_PROMPTS[0].to_string())
    }

    /// Reply to inbound text: topic rule first, then the next generic prompt.
    pub fn reactive(&self, text: &str) -> String {
        if let Some(rule) = matching_rule(text) {
            return rule.reply.to_string();
        }
        let index = self.rotation.fetch_add(1, Ordering::Relaxed) % GENERIC_PROMPTS.len();
        GENERIC_PROMPTS[index].to_string()
    }
}
