//! Block Kit rendering of a queue.

use serde_json::{json, Value};

use crate::queue::Item;

pub const ACTION_JOIN: &str = "joinQueue";
pub const ACTION_LEAVE: &str = "leaveQueue";

const EMPTY_QUEUE_TEXT: &str = "The queue is empty.";

pub fn emoji_for_position(position: usize) -> &'static str {
    match position {
        0 => ":first_place_medal:",
        1 => ":second_place_medal:",
        2 => ":third_place_medal:",
        _ => ":hourglass:",
    }
}

/// One line per participant, or a placeholder when nobody is waiting.
pub fn queue_text(items: &[Item]) -> String {
    if items.is_empty() {
        return EMPTY_QUEUE_TEXT.to_string();
    }

    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{} @{}\n", emoji_for_position(i), item.user_name))
        .collect()
}

/// Full message: title, divider, queue listing, Join/Leave buttons and an
/// optional footer. Button values carry the channel id.
pub fn queue_blocks(
    channel_id: &str,
    channel_name: &str,
    items: &[Item],
    footer: Option<&str>,
) -> Vec<Value> {
    let mut blocks = vec![
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": format!("{} Queue", channel_name)}
        }),
        json!({"type": "divider"}),
        json!({
            "type": "section",
            "text": {"type": "mrkdwn", "text": queue_text(items)}
        }),
        json!({
            "type": "actions",
            "block_id": "actions",
            "elements": [
                button(ACTION_JOIN, channel_id, "Join"),
                button(ACTION_LEAVE, channel_id, "Leave"),
            ]
        }),
    ];

    if let Some(footer) = footer {
        blocks.push(json!({
            "type": "context",
            "block_id": "context",
            "elements": [{"type": "mrkdwn", "text": footer}]
        }));
    }

    blocks
}

fn button(action_id: &str, value: &str, label: &str) -> Value {
    json!({
        "type": "button",
        "action_id": action_id,
        "value": value,
        "text": {"type": "plain_text", "text": label, "emoji": true}
    })
}
