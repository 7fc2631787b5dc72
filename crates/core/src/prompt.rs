//! Prompt text sent to the generative-text service.

use crate::types::{Color, SlideSpec};

/// Phrase every generated image prompt must start with.
pub const IMAGE_STYLE_PREFIX: &str =
    "modern glassmorphism style, gradient background with purple and blue tones";

/// Prompt asking for a complete deck as JSON.
pub fn deck_prompt(topic: &str, slide_count: usize) -> String {
    // The topic goes into the sample as a JSON string literal so quotes in it
    // cannot break the sample.
    let topic_literal = serde_json::Value::from(topic).to_string();

    format!(
        r#"Topic: {topic}

Create the content for a polished, modern presentation on the topic above with {count} slides.

Answer in this JSON format:

{{
  "topic": {topic_literal},
  "design_theme": {{
    "primary_color": "{primary}",
    "secondary_color": "{secondary}",
    "accent_color": "{accent}",
    "style": "glassmorphism"
  }},
  "slides": [
    {{
      "title": "Slide title",
      "content": [
        "**Key concept**: with an explanation",
        "A playful analogy: it works just like ...",
        "A concrete example with numbers",
        "**Takeaway**: the point to remember"
      ],
      "image_prompt": "{image_prefix}, semi-transparent frosted glass elements, subtle blur effects, [describe the specific diagram], professional tech illustration, vibrant neon accents, clean minimalist design, soft shadows, depth layers"
    }}
  ]
}}

Requirements:
1. Exactly {count} slides following a logical arc: introduction, core concepts, deep dive, applications, outlook
2. 4-6 key points per slide
3. Mark important terms in markdown bold (for example **transformer**, **attention mechanism**)
4. Stay academically accurate while adding witty analogies and examples
5. Give every slide a glassmorphism image prompt
6. Every image prompt must start with "{image_prefix}..."
7. Color theme: purple-blue-pink gradient ({primary}, {secondary}, {accent})
8. Keep the tone professional yet engaging
9. Keep each point concise but informative

Return only the JSON, with no other explanation."#,
        topic = topic,
        count = slide_count,
        topic_literal = topic_literal,
        primary = Color::DEFAULT_PRIMARY,
        secondary = Color::DEFAULT_SECONDARY,
        accent = Color::DEFAULT_ACCENT,
        image_prefix = IMAGE_STYLE_PREFIX,
    )
}

/// Prompt asking for an improved version of one slide.
pub fn enhance_prompt(slide: &SlideSpec) -> String {
    let points = slide
        .content
        .iter()
        .map(|point| format!("- {}", point))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"Improve the following slide so it is more professional and academic:

Title: {title}
Content:
{points}

Requirements:
1. Make the title clearer and more professional
2. Make every point more specific and informative
3. Keep an academic tone
4. Condense to 3-5 key points
5. Be concise but rich in information

Answer only in this JSON format:
{{
  "title": "Improved title",
  "content": [
    "Improved point 1",
    "Improved point 2",
    "Improved point 3"
  ]
}}"#,
        title = slide.title,
        points = points,
    )
}

/// Short greeting used to check that the service answers.
pub fn ping_prompt() -> &'static str {
    "Hello! Please reply with a short greeting."
}
