use crate::models::{GenerationRequest, ImageKey};

pub const SYSTEM_INSTRUCTION: &str =
    "You are a Cults3D SEO expert. You answer ONLY with valid JSON, without markdown or backticks.";

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
    pub include_system: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstructionPayload {
    pub system: Option<&'static str>,
    pub prompt: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f64>,
}

pub fn build_payload(request: &GenerationRequest, params: &GenerationParams) -> InstructionPayload {
    InstructionPayload {
        system: params.include_system.then_some(SYSTEM_INSTRUCTION),
        prompt: build_instruction(request.subject()),
        model: params.model.clone(),
        max_tokens: params.max_tokens,
        temperature: params.temperature,
    }
}

// Subject goes in verbatim, unescaped.
pub fn build_instruction(subject: &str) -> String {
    let image_names = ImageKey::ALL
        .iter()
        .map(|k| format!("    \"{}\": \"{}\"", k.as_str(), image_placeholder(*k)))
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        r#"Generate Cults3D listing content for an STL figure of: "{subject}"

Respond ONLY with valid JSON using exactly this structure (no markdown, no backticks):
{{
  "title": "SEO optimised title",
  "description": "markdown description with technical details, included versions (pre-supported solid, hollow with drain holes), and what it is ideal for",
  "tags": "tag1, tag2, tag3, tag4, tag5, tag6, tag7, tag8, tag9, tag10, tag11, tag12, tag13, tag14, tag15",
  "baseName": "base-name-for-images-separated-by-hyphens",
  "imageNames": {{
{image_names}
  }},
  "salesTip": "relevant and specific sales tip"
}}

Important:
- The title must be attractive and carry relevant keywords
- The description must include technical features and versions (pre-supported solid, hollow with drain holes)
- Tags separated by commas, at least 15 relevant tags
- baseName and every image name in lowercase with hyphens
- Sales tip specific to this kind of figure"#
    )
}

fn image_placeholder(key: ImageKey) -> &'static str {
    match key {
        ImageKey::Main => "name-main",
        ImageKey::Front => "name-front-view",
        ImageKey::Side => "name-side-view",
        ImageKey::Back => "name-back-view",
        ImageKey::Animated => "name-animated-gif",
        ImageKey::Detail => "name-detail",
        ImageKey::Render => "name-raw-render",
    }
}
