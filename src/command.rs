// src/command.rs - Edge-triggered mapping from gesture labels to actuator commands
use serde::Serialize;
use tracing::debug;

use crate::gesture::GestureLabel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Command {
    On,
    Off,
    Open,
    Close,
}

impl Command {
    /// Fixed lookup table. Labels without an entry never produce a command.
    pub fn for_label(label: GestureLabel) -> Option<Self> {
        match label {
            GestureLabel::TwoFingers => Some(Self::On),
            GestureLabel::ThreeFingers => Some(Self::Off),
            GestureLabel::FiveFingers => Some(Self::Open),
            GestureLabel::Fist => Some(Self::Close),
            _ => None,
        }
    }

    /// Token understood by the controller firmware.
    pub fn token(&self) -> &'static str {
        match self {
            Self::On => "ON",
            Self::Off => "OFF",
            Self::Open => "O",
            Self::Close => "C",
        }
    }

    pub fn line(&self) -> String {
        format!("{}\n", self.token())
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::On => "lamp on",
            Self::Off => "lamp off",
            Self::Open => "open door",
            Self::Close => "close door",
        }
    }
}

/// Remembers the last stable label and emits a command only when it changes.
///
/// A frame with no hand clears the stored label, so the same gesture shown
/// again after the hand left the frame is emitted again. There is no dwell
/// time: the first frame carrying a new label triggers.
#[derive(Debug, Default)]
pub struct CommandMapper {
    stable: Option<GestureLabel>,
}

impl CommandMapper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&mut self, label: GestureLabel) -> Option<Command> {
        if label == GestureLabel::NoHands {
            if let Some(previous) = self.stable.take() {
                debug!("Hand lost, clearing stable gesture {}", previous.as_str());
            }
            return None;
        }

        if self.stable == Some(label) {
            return None;
        }

        self.stable = Some(label);
        Command::for_label(label)
    }

    pub fn stable_label(&self) -> Option<GestureLabel> {
        self.stable
    }

    pub fn reset(&mut self) {
        self.stable = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(labels: &[GestureLabel]) -> Vec<Option<Command>> {
        let mut mapper = CommandMapper::new();
        labels.iter().map(|label| mapper.observe(*label)).collect()
    }

    #[test]
    fn emits_on_transitions_and_rearms_after_hand_loss() {
        use GestureLabel::*;
        let commands = run(&[Fist, Fist, Fist, FiveFingers, FiveFingers, NoHands, FiveFingers]);
        assert_eq!(
            commands,
            vec![
                Some(Command::Close),
                None,
                None,
                Some(Command::Open),
                None,
                None,
                Some(Command::Open),
            ]
        );
    }

    #[test]
    fn unmapped_labels_still_move_the_state() {
        use GestureLabel::*;
        let commands = run(&[Fist, Unrecognized, Fist, OneFinger, OneFinger]);
        assert_eq!(commands, vec![Some(Command::Close), None, Some(Command::Close), None, None]);
    }

    #[test]
    fn lamp_gestures_map_to_on_and_off() {
        use GestureLabel::*;
        let commands = run(&[TwoFingers, ThreeFingers, TwoFingers]);
        assert_eq!(commands, vec![Some(Command::On), Some(Command::Off), Some(Command::On)]);
    }

    #[test]
    fn reset_and_hand_loss_clear_state() {
        let mut mapper = CommandMapper::new();
        assert_eq!(mapper.observe(GestureLabel::Fist), Some(Command::Close));
        assert_eq!(mapper.stable_label(), Some(GestureLabel::Fist));

        mapper.reset();
        assert_eq!(mapper.stable_label(), None);
        assert_eq!(mapper.observe(GestureLabel::Fist), Some(Command::Close));

        assert_eq!(mapper.observe(GestureLabel::NoHands), None);
        assert_eq!(mapper.stable_label(), None);
    }

    #[test]
    fn only_four_labels_have_commands() {
        let mapped: Vec<_> = GestureLabel::all()
            .into_iter()
            .filter_map(Command::for_label)
            .collect();
        assert_eq!(mapped, vec![Command::Close, Command::On, Command::Off, Command::Open]);
    }

    #[test]
    fn wire_tokens() {
        assert_eq!(Command::On.line(), "ON\n");
        assert_eq!(Command::Off.line(), "OFF\n");
        assert_eq!(Command::Open.line(), "O\n");
        assert_eq!(Command::Close.line(), "C\n");
    }
}
