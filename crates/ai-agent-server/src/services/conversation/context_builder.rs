use crate::services::business_config::TenantConfig;

/// Builds the system instruction for a completion request.
pub struct ContextBuilder;

impl ContextBuilder {
    pub fn system_instruction(config: Option<&TenantConfig>) -> String {
        match config {
            Some(config) => Self::tenant_instruction(config),
            None => Self::default_instruction(),
        }
    }

    pub fn tenant_instruction(config: &TenantConfig) -> String {
        format!(
            r#"You are a helpful customer support agent for {name}.
Business Context: {specialties}
Communication Style: {tone}
Language: {language}
Business Hours: {hours}

Please provide helpful, professional, and friendly responses to customer inquiries.
Keep responses concise but informative."#,
            name = config.name,
            specialties = config.specialties,
            tone = config.tone,
            language = config.language,
            hours = config.business_hours,
        )
    }

    pub fn default_instruction() -> String {
        r#"You are a helpful customer support agent for a business.
Please provide helpful, professional, and friendly responses to customer inquiries.
Keep responses concise but informative."#
            .to_string()
    }

    /// Correlation id sent with each completion: `{tenant}_{sender}` or the bare sender.
    pub fn conversation_id(sender: &str, tenant_id: Option<&str>) -> String {
        match tenant_id {
            Some(tenant) => format!("{}_{}", tenant, sender),
            None => sender.to_string(),
        }
    }
}
