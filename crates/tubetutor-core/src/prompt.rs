//! Tutorial prompt template

/// Placeholder replaced by the transcript text
const TRANSCRIPT_PLACEHOLDER: &str = "{transcript_text}";

/// Instructions sent to the model ahead of the transcript
pub const TUTORIAL_PROMPT: &str = "Create a comprehensive tutorial based on the provided transcript. \
Begin by analyzing the content of the transcript thoroughly to identify its core themes, key concepts, and main points.

Break down the information into logical sections or chapters that flow in a structured and coherent manner. \
Ensure each section focuses on one main idea or topic to maintain clarity and engagement.

Use simple and precise language to explain each complex idea. \
Start each section with an overview and end with a summary or key takeaways or insights.

Conclude with a recap of the entire tutorial, highlighting the main points and encouraging readers to apply their newfound knowledge. \
Include actionable steps or exercises at the end to reinforce learning and provide practical applications.

Ensure the tutorial is easy to navigate by using subheadings and providing a logical progression of topics. \
Use plaintext formatting only. Do not format the headings or subheadings. Use plain numbered lists.

Transcript: {transcript_text}";

/// Builds the generation prompt for a transcript.
///
/// # Examples
///
/// ```
/// use tubetutor_core::prompt::build_tutorial_prompt;
/// let prompt = build_tutorial_prompt("hello world");
/// assert!(prompt.ends_with("Transcript: hello world"));
/// ```
#[must_use]
pub fn build_tutorial_prompt(transcript: &str) -> String {
    TUTORIAL_PROMPT.replacen(TRANSCRIPT_PLACEHOLDER, transcript, 1)
}
