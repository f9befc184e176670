//! Prompt construction for the generation collaborator.
//!
//! The engine treats generation as a single request/response call; these
//! builders produce the full prompt text for each pipeline. Plan prompts
//! scale to the days remaining before the exam and are derived from the
//! note content when the note has any substance.

use chrono::NaiveDate;

/// Below this many trimmed characters a note is treated as empty and the
/// plan falls back to general curriculum topics.
const MIN_SUBSTANTIVE_CONTENT: usize = 10;

/// Prompt for the summary pipeline.
pub fn summary_prompt(title: &str, content: &str) -> String {
    format!(
        "Summarize the following study notes titled: {}\n\n{}\n\n\
         Produce a concise summary with bullet points and 3 key takeaways. \
         Output plain text without markdown formatting.",
        title, content
    )
}

/// Prompt for the study-plan pipeline.
///
/// `days_remaining` is clamped to zero by the caller; a zero value means
/// the exam date is today or already past, which becomes a caveat in the
/// generated plan rather than an error.
pub fn plan_prompt(
    subject: &str,
    content: &str,
    exam_date: NaiveDate,
    days_remaining: i64,
) -> String {
    let mut prompt = if days_remaining > 0 {
        format!(
            "Create a concise {}-day study plan for '{}', leading up to the exam on {}.\n",
            days_remaining, subject, exam_date
        )
    } else {
        format!(
            "The exam for '{}' was scheduled on {}, which is today or already past. \
             Start the plan with a one-line caveat noting that the exam date has passed, \
             then give a short same-day revision plan.\n",
            subject, exam_date
        )
    };

    if content.trim().len() > MIN_SUBSTANTIVE_CONTENT {
        prompt.push_str(&format!(
            "Derive the plan exclusively from the following notes for '{}'; ignore general \
             knowledge about the subject and use only the topics found in the notes:\n---\n{}\n---\n\
             Cover the topics from the notes logically across the available days. \
             One line per day: 'Day X: [topic from notes] - [suggested action]'.",
            subject, content
        ));
    } else {
        prompt.push_str(&format!(
            "No notes were provided for '{}'. Build a general plan from common curriculum \
             topics for this subject. One line per day: 'Day X: [topic] - [suggested action]'.",
            subject
        ));
    }

    prompt.push_str("\nOutput plain text without markdown formatting.");
    prompt
}
