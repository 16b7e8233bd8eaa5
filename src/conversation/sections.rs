//! Display sections derived from the message log
//!
//! A section is a borrowed, contiguous run of messages. Boundaries are decided
//! here, from each pair of adjacent messages, so a reordered or truncated log
//! always partitions consistently.

use super::message::{ChatMessage, MessageId};

/// A contiguous run of messages grouped for layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageSection<'a> {
    /// Position of this section in the partition
    pub index: usize,
    pub messages: &'a [ChatMessage],
    /// False only for the implicit leading section
    pub is_new_section: bool,
    /// Whether this is the most recently created section
    pub is_active: bool,
}

impl<'a> MessageSection<'a> {
    /// ID of the message that opens this section
    pub fn first_message_id(&self) -> Option<MessageId> {
        self.messages.first().map(|m| m.id)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Whether `next` opens a new section after `prev`.
pub fn starts_section(_prev: &ChatMessage, next: &ChatMessage) -> bool {
    next.is_user() || next.section_boundary
}

/// Split a message log into sections.
///
/// The first message always opens section 0, whatever its flag says, so no
/// empty leading section is ever produced.
pub fn partition(messages: &[ChatMessage]) -> Vec<MessageSection<'_>> {
    let mut sections = Vec::new();
    if messages.is_empty() {
        return sections;
    }

    let mut start = 0;
    for i in 1..messages.len() {
        if starts_section(&messages[i - 1], &messages[i]) {
            sections.push(MessageSection {
                index: sections.len(),
                messages: &messages[start..i],
                is_new_section: start > 0,
                is_active: false,
            });
            start = i;
        }
    }
    sections.push(MessageSection {
        index: sections.len(),
        messages: &messages[start..],
        is_new_section: start > 0,
        is_active: true,
    });

    sections
}
