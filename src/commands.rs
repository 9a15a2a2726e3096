use serde::Serialize;
use serde_json::{json, Value};

pub const INPUT_KEY_PATH: &str = "/1/input/key";
pub const LAUNCH_PATH: &str = "/1/activities/launch";

/// Key codes accepted by JointSpace televisions
pub const KNOWN_KEYS: &[&str] = &[
    "Standby",
    "Home",
    "Back",
    "Source",
    "Options",
    "Info",
    "Find",
    "Adjust",
    "Watch TV",
    "CursorUp",
    "CursorDown",
    "CursorLeft",
    "CursorRight",
    "Confirm",
    "VolumeUp",
    "VolumeDown",
    "Mute",
    "ChannelStepUp",
    "ChannelStepDown",
    "PlayPause",
    "Play",
    "Pause",
    "Stop",
    "FastForward",
    "Rewind",
    "Next",
    "Previous",
    "Record",
    "RedColour",
    "GreenColour",
    "YellowColour",
    "BlueColour",
    "Digit0",
    "Digit1",
    "Digit2",
    "Digit3",
    "Digit4",
    "Digit5",
    "Digit6",
    "Digit7",
    "Digit8",
    "Digit9",
    "Dot",
    "Teletext",
    "Subtitle",
    "AmbilightOnOff",
    "Viewmode",
];

/// A single fire-and-semi-forget instruction for the television
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Command {
    Key(String),
    Launch(String),
}

impl Command {
    pub fn path(&self) -> &'static str {
        match self {
            Command::Key(_) => INPUT_KEY_PATH,
            Command::Launch(_) => LAUNCH_PATH,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            Command::Key(key) => json!({ "key": key }),
            Command::Launch(action) => json!({ "intent": { "action": action } }),
        }
    }

    /// Activity log line written when the command goes out
    pub fn send_message(&self) -> String {
        match self {
            Command::Key(key) => format!("Sending key: {}", key),
            Command::Launch(action) => format!("Launching: {}", action),
        }
    }

    pub fn success_label(&self, opaque: bool) -> &'static str {
        match (self, opaque) {
            (Command::Key(_), false) => "Command sent",
            (Command::Key(_), true) => "Command sent (no-cors)",
            (Command::Launch(_), false) => "App launched",
            (Command::Launch(_), true) => "App launched (no-cors)",
        }
    }

    pub fn failure_label(&self) -> &'static str {
        match self {
            Command::Key(_) => "Failed to reach TV",
            Command::Launch(_) => "Launch failed",
        }
    }
}

pub fn is_known_key(key: &str) -> bool {
    KNOWN_KEYS.contains(&key)
}
