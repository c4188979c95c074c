//! Reply keyboards rendered as Bot API `reply_markup` objects.

use serde_json::{json, Value};

use crate::messages::buttons;
use crate::notify::ReplyKeyboard;

pub fn reply_markup(keyboard: ReplyKeyboard) -> Value {
    match keyboard {
        ReplyKeyboard::Main => json!({
            "keyboard": [
                [{"text": buttons::START}],
                [{"text": buttons::STOP}, {"text": buttons::STATS}],
                [{"text": buttons::ADD_USER}],
            ],
            "resize_keyboard": true,
            "one_time_keyboard": false,
        }),
        ReplyKeyboard::Cancel => json!({
            "keyboard": [[{"text": buttons::CANCEL}]],
            "resize_keyboard": true,
        }),
        ReplyKeyboard::Remove => json!({"remove_keyboard": true}),
    }
}
