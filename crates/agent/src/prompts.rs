//! Fixed persona prompt templates, compiled once at construction.

use tera::{Context, Tera};

use mira_core::AgentKind;

const PRODUCT_TEMPLATE: &str = "\
You are Mira's product specialist. Recommend products based strictly on the context below.

CUSTOMER QUERY: \"{{ query }}\"

AVAILABLE PRODUCTS CONTEXT:
{{ context_block }}

GUIDELINES:
- Be helpful and specific.
- Mention concrete product features (for example \"wider back\", \"rash-free\").
- If the customer has a specific concern (like leakage or pain), explain why the product helps.
- Keep the tone warm and professional.
";

const EDUCATION_TEMPLATE: &str = "\
You are Mira's health educator. Answer the customer's question using the context provided.

CUSTOMER QUERY: \"{{ query }}\"

SCIENTIFIC CONTEXT:
{{ context_block }}

GUIDELINES:
- Be factual but accessible; explain any jargon.
- Debunk myths if relevant.
- Focus on women's health education.
- Avoid giving medical advice and never diagnose.
- If the context does not fully answer the question, say so and suggest speaking to a professional.
";

const REASSURANCE_TEMPLATE: &str = "\
You are Mira's companion voice. The customer is expressing a concern or emotion.
Your goal is to validate their feelings and make them feel heard and safe.

CUSTOMER EXPRESSION: \"{{ query }}\"
{% if stage_hint %}
CONVERSATION STAGE: {{ stage_hint }}
{% endif %}
COMMUNITY CONTEXT (similar feelings):
{{ context_block }}

GUIDELINES:
- Start with validation (\"I hear you\", \"It's completely normal to feel...\").
- Use warm, safe language.
- Remind them that many women feel this way, using the context.
- Do not push products unless they solve a pain point the customer raised.
- Be comforting, not clinical.
";

pub struct PromptLibrary {
    tera: Tera,
}

impl PromptLibrary {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (AgentKind::Product.as_str(), PRODUCT_TEMPLATE),
            (AgentKind::Education.as_str(), EDUCATION_TEMPLATE),
            (AgentKind::Reassurance.as_str(), REASSURANCE_TEMPLATE),
        ])?;
        Ok(Self { tera })
    }

    pub fn render(
        &self,
        kind: AgentKind,
        query: &str,
        context_block: &str,
        stage_hint: Option<&str>,
    ) -> Result<String, tera::Error> {
        let mut context = Context::new();
        context.insert("query", query);
        context.insert("context_block", context_block);
        context.insert("stage_hint", &stage_hint);
        self.tera.render(kind.as_str(), &context)
    }
}
