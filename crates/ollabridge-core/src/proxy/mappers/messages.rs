//! Message normalization: merges the three inbound multimodal shapes
//! (message-scoped image lists, a request-level image list, plain text)
//! into one canonical content-part sequence per message.

use super::models::{
    ContentPart, ImageUrl, InboundMessage, UpstreamContent, UpstreamMessage, ROLE_SYSTEM,
    ROLE_USER,
};
use crate::proxy::common::media_detect::image_data_url;
use tracing::warn;

/// Transform an inbound message sequence into the canonical upstream form.
///
/// - A `system` prompt is prepended iff no system message already exists.
/// - Message-scoped images become `image_url` parts after a leading text
///   part; the plain-text representation is dropped once parts exist.
/// - `top_level_images` attach to the last user-role message, appended
///   after any message-scoped parts. With no user message present they are
///   dropped (a long-standing quirk clients rely on, logged at warn).
/// - Empty image entries are skipped with a warning, never an abort.
pub fn normalize_messages(
    messages: &[InboundMessage],
    system: Option<&str>,
    top_level_images: &[String],
) -> Vec<UpstreamMessage> {
    let mut out: Vec<UpstreamMessage> = Vec::with_capacity(messages.len() + 1);

    if let Some(prompt) = system {
        let has_system = messages.iter().any(|m| m.role == ROLE_SYSTEM);
        if !has_system {
            out.push(UpstreamMessage::text(ROLE_SYSTEM, prompt));
        }
    }

    for msg in messages {
        let images = msg.images.as_deref().unwrap_or_default();
        if images.is_empty() {
            out.push(UpstreamMessage::text(msg.role.clone(), msg.content.clone()));
            continue;
        }

        let mut parts = vec![ContentPart::Text { text: msg.content.clone() }];
        append_image_parts(&mut parts, images);
        out.push(UpstreamMessage {
            role: msg.role.clone(),
            content: UpstreamContent::Parts(parts),
        });
    }

    if !top_level_images.is_empty() {
        attach_to_last_user_message(&mut out, top_level_images);
    }

    out
}

/// Append request-level images to the last user message, converting its
/// plain text into a leading text part when it has no parts yet.
fn attach_to_last_user_message(messages: &mut [UpstreamMessage], images: &[String]) {
    let Some(target) = messages.iter_mut().rev().find(|m| m.role == ROLE_USER) else {
        warn!(
            count = images.len(),
            "top-level images received but no user message to attach them to, dropping"
        );
        return;
    };

    let mut parts = match std::mem::replace(
        &mut target.content,
        UpstreamContent::Text(String::new()),
    ) {
        UpstreamContent::Parts(existing) => existing,
        UpstreamContent::Text(text) => vec![ContentPart::Text { text }],
    };

    append_image_parts(&mut parts, images);
    target.content = UpstreamContent::Parts(parts);
}

fn append_image_parts(parts: &mut Vec<ContentPart>, images: &[String]) {
    for (idx, image) in images.iter().enumerate() {
        match image_data_url(image) {
            Ok(url) => parts.push(ContentPart::ImageUrl { image_url: ImageUrl { url } }),
            Err(e) => warn!(image_index = idx, "skipping image: {}", e),
        }
    }
}
