//! Prompt templates for the text-generation calls.

use studycast_models::VoiceProfile;

/// Placeholder used when the project has no extracted notes yet.
const NO_NOTES: &str = "(no notes available)";

fn notes_or_placeholder(notes: &str) -> &str {
    if notes.trim().is_empty() {
        NO_NOTES
    } else {
        notes
    }
}

/// Inputs for the podcast script prompt.
#[derive(Debug, Clone)]
pub struct ScriptPrompt<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub background_notes: &'a str,
    pub voices: &'a VoiceProfile,
    pub language: &'a str,
    pub word_target: usize,
    pub chapters: usize,
}

impl ScriptPrompt<'_> {
    pub fn render(&self) -> String {
        let speakers: Vec<&str> = self.voices.speakers().collect();
        let host = speakers.first().copied().unwrap_or("Speaker");
        let format_lines: String = speakers
            .iter()
            .map(|s| format!("{}: Text\n", s))
            .collect();
        let example = match speakers.as_slice() {
            [a, b, ..] => format!("{}: Hello {}, how are you?\n{}: Great, and you?\n", a, b, b),
            [a] => format!("{}: Hello and welcome!\n", a),
            [] => String::new(),
        };

        format!(
            "Write a {words}-word \"AI podcast\" in {language} on the topic \"{title}\" that explains: {description}\n\
             The length matters: the script must contain at least {words} words.\n\n\
             Spread the content evenly over {chapters} parts and keep the information density steady across the whole script. \
             The text will be converted to audio with text-to-speech, so optimise it for TTS: \
             spell formulas out in words (write \"f(x) = x * c^2\" as \"f of x equals x times c squared\") \
             and replace stage directions such as *laughs* with spoken words like \"haha\".\n\n\
             Present everything simply and conversationally without losing important information from the notes. \
             The speakers may joke, but they stay on topic. \
             {host} opens the podcast with a short introduction.\n\n\
             Write only continuous dialogue: no headings, no markdown, no lists or tables.\n\n\
             The speakers are {names}. Use exactly this format, one line per turn:\n\n\
             {format_lines}\n\
             For example:\n\n\
             {example}\n\
             Only cover: {description}. The rest of the notes is handled separately.\n\n\
             Notes:\n\n\
             {notes}\n",
            words = self.word_target,
            language = self.language,
            title = self.title,
            description = self.description,
            chapters = self.chapters,
            host = host,
            names = speakers.join(" and "),
            format_lines = format_lines,
            example = example,
            notes = notes_or_placeholder(self.background_notes),
        )
    }
}

/// Markdown cheat sheet for one subtopic.
pub fn notes_prompt(title: &str, description: &str, background_notes: &str) -> String {
    format!(
        "Create a concise study cheat sheet in Markdown for the subtopic:\n\
         \"{title}\" ({description})\n\n\
         Use the following analysis as background:\n\
         {notes}\n\n\
         Follow this exact Markdown structure:\n\
         # {title}\n\
         A short 1-2 sentence overview of the subtopic.\n\n\
         ---\n\n\
         ## Key Concepts\n\
         - Bullet point 1\n\
         - Bullet point 2\n\
         - Bullet point 3\n\n\
         ---\n\n\
         ## Important Terms\n\
         - **Term 1**: Short definition\n\
         - **Term 2**: Short definition\n\
         - **Term 3**: Short definition\n\n\
         ---\n\n\
         ## Quick Facts\n\
         - Fact 1\n\
         - Fact 2\n\
         - Fact 3\n\n\
         Guidelines:\n\
         - Keep language clear and beginner-friendly.\n\
         - Use proper Markdown headings (#, ##) exactly as shown.\n\
         - Answer in the language of the analysis.\n\
         - Output ONLY valid Markdown (no extra commentary).\n",
        title = title,
        description = description,
        notes = notes_or_placeholder(background_notes),
    )
}

/// Five-question multiple-choice quiz as JSON.
pub fn quiz_prompt(title: &str, description: &str, background_notes: &str) -> String {
    format!(
        "Create a 5-question multiple-choice quiz in valid JSON for the subtopic:\n\
         \"{title}\" ({description})\n\n\
         Use the following analysis as background:\n\
         {notes}\n\n\
         Rules:\n\
         - Output ONLY valid JSON of the form {{\"questions\": [...]}}.\n\
         - Each question must have:\n\
         - \"question\": string\n\
         - \"options\": array of exactly 4 strings\n\
         - \"answer\": string (must match one of the options)\n\
         - Answer in the language of the analysis.\n",
        title = title,
        description = description,
        notes = notes_or_placeholder(background_notes),
    )
}

/// Sent ahead of the inline documents in the analysis request.
pub const ANALYSIS_PROMPT: &str = "Analyze the provided documents and images in the highest detail possible. \
     Cover every concept, definition, formula and example they contain. \
     Answer in the language the material is written in.";

/// Learning plan over the whole analysis.
pub fn plan_prompt(analysis: &str) -> String {
    format!(
        "You are an AI tutor. I will give you extracted notes from a collection of documents and images. \
         Your job is to design a structured learning plan that teaches everything step by step.\n\n\
         Return ONLY valid JSON (no explanations, no markdown, no extra text) with this structure:\n\
         {{ \"chapters\": [ {{ \"title\": \"Chapter Title\", \
         \"summary\": \"Keywords describing the key ideas of the chapter\", \
         \"subtopics\": [ {{ \"title\": \"Subtopic Title\", \"description\": \"A brief explanation of the subtopic.\" }} ] }} ] }}\n\n\
         Guidelines:\n\
         - Break the material into 3-6 logical chapters, each covering a coherent theme.\n\
         - Each chapter must contain exactly 3 subtopics with titles and brief descriptions.\n\
         - Titles should be short, clear and student-friendly.\n\
         - Answer in the language the analysis is in.\n\n\
         Here is the extracted analysis to structure into chapters:\n\
         {analysis}\n",
        analysis = analysis,
    )
}
