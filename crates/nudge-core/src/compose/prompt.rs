//! Prompt construction for the completion provider.

use chrono_tz::Tz;

use crate::context::AssembledContext;
use crate::mode::{guidance_for, Mode};
use crate::types::ChatMessage;

use super::ComposeInput;

/// Transcript lines included in a prompt.
pub const PROMPT_TRANSCRIPT_LINES: usize = 5;

const PERSONALITY_RULES: &str = "PERSONALITY RULES:\n\
- Speak like a close friend, not a formal assistant\n\
- Be honest and sometimes firm when needed for their benefit\n\
- Remember and reference past conversations naturally\n\
- Ask follow-up questions about goals and progress\n\
- Celebrate wins, learn from failures\n\
- Never judge or shame, but don't enable excuses\n\
- Keep responses conversational and under 200 words usually\n\
- Use emojis occasionally but don't overdo it";

/// Build the system prompt: persona, time, rules, mode, goals, transcript.
pub fn system_prompt(user_name: &str, mode: Mode, context: &AssembledContext, tz: Tz) -> String {
    let local = context.assembled_at.with_timezone(&tz);
    let mut prompt = format!(
        "You are a personal AI companion for {name}. You are:\n\
         - A supportive friend who remembers everything\n\
         - A motivational accountability partner\n\
         - An understanding mentor who helps with goals\n\
         - Someone who cares deeply about {name}'s growth\n\n\
         Current date: {date}\n\
         Current time: {time}\n\n\
         {rules}\n\n\
         MODE: Currently in \"{mode}\" mode",
        name = user_name,
        date = local.format("%A, %B %-d, %Y"),
        time = local.format("%H:%M %Z"),
        rules = PERSONALITY_RULES,
        mode = mode,
    );

    if !context.active_goals.is_empty() {
        prompt.push_str("\n\nACTIVE GOALS:");
        for goal in &context.active_goals {
            if goal.description.trim().is_empty() {
                prompt.push_str(&format!("\n- {} ({} priority)", goal.title, goal.priority));
            } else {
                prompt.push_str(&format!(
                    "\n- {}: {} ({} priority)",
                    goal.title, goal.description, goal.priority
                ));
            }
        }
    }

    let transcript = context.transcript(PROMPT_TRANSCRIPT_LINES);
    if !transcript.is_empty() {
        prompt.push_str("\n\nRECENT CONVERSATION:\n");
        prompt.push_str(&transcript.join("\n"));
    }

    prompt.push_str("\n\n");
    prompt.push_str(guidance_for(mode));
    prompt
}

/// Full message list sent to the provider.
pub fn build_messages(
    user_name: &str,
    mode: Mode,
    context: &AssembledContext,
    input: &ComposeInput,
    tz: Tz,
) -> Vec<ChatMessage> {
    let user_turn = match input {
        ComposeInput::Trigger(event) => format!(
            "[Proactive check-in] {} Write only the message to send.",
            event.describe()
        ),
        ComposeInput::Reply(text) => text.clone(),
    };
    vec![
        ChatMessage::system(system_prompt(user_name, mode, context, tz)),
        ChatMessage::user(user_turn),
    ]
}
