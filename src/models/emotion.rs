use serde::{Deserialize, Serialize};

/// Reference row from the `emotions` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Emotion {
    pub id: i32,
    pub name: String,
    pub emoji: String,
    pub color: String,
    pub description: Option<String>,
}

/// Seed row: name, emoji, color, description.
pub type EmotionSeed = (&'static str, &'static str, &'static str, &'static str);

/// The reference set inserted into an empty `emotions` table.
pub const DEFAULT_EMOTIONS: [EmotionSeed; 8] = [
    ("joy", "😄", "#FFD93D", "Feeling happy and light."),
    ("sadness", "😢", "#4D96FF", "Feeling down or blue."),
    ("anger", "😠", "#FF4D4D", "Feeling mad or frustrated."),
    ("fear", "😨", "#9B5DE5", "Feeling scared or worried."),
    ("surprise", "😲", "#F15BB5", "Feeling amazed or startled."),
    ("disgust", "🤢", "#6BCB77", "Feeling grossed out."),
    ("calm", "😌", "#00BBF9", "Feeling peaceful and relaxed."),
    ("love", "🥰", "#FF8FAB", "Feeling warm and caring."),
];
