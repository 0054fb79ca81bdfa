use super::registry::PromptVariant;
use super::template::render;
use crate::errors::TemplateError;
use crate::model::Message;

/// Builds the chat turns for one question under one prompt variant.
///
/// A lone system or user template is rendered into a single turn. When both
/// are present the system turn is sent verbatim and only the user turn is
/// rendered.
pub fn build_messages(
    question: &str,
    context: &str,
    variant: &PromptVariant,
) -> Result<Vec<Message>, TemplateError> {
    let values = [("question", question), ("context", context)];

    match (&variant.system, &variant.user) {
        (Some(system), None) => Ok(vec![Message::system(render(system, &values)?)]),
        (None, Some(user)) => Ok(vec![Message::user(render(user, &values)?)]),
        (Some(system), Some(user)) => Ok(vec![
            Message::system(system.clone()),
            Message::user(render(user, &values)?),
        ]),
        (None, None) => Err(TemplateError::EmptyVariant {
            name: variant.name.clone(),
        }),
    }
}
