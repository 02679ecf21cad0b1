//! Static action catalog: name -> definition lookup
//!
//! One catalog is built per process at startup and never mutated, so it is
//! shared freely between the control surface and the consumer task.

use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// Broad classification of how an action drives the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ActionKind {
    /// Continuous gait/velocity command
    Velocity,
    /// Pre-recorded motion played back by the device
    NamedMotion,
    /// Ordered sequence of sub-commands
    Composite,
}

/// The device-level command an action resolves to
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceCommand {
    /// Numbered action slot on the local control daemon (code, group)
    RunAction {
        code: &'static str,
        group: &'static str,
    },
    /// Velocity vector for the gait controller
    Velocity { x: f32, y: f32, yaw_rate: f32 },
    /// Motion file played back by the named-motion service
    MotionFile { file: &'static str },
    /// Sub-commands executed back to back within one nominal duration
    Sequence(Vec<DeviceCommand>),
}

impl DeviceCommand {
    pub fn kind(&self) -> ActionKind {
        match self {
            DeviceCommand::Velocity { .. } => ActionKind::Velocity,
            DeviceCommand::RunAction { .. } | DeviceCommand::MotionFile { .. } => {
                ActionKind::NamedMotion
            }
            DeviceCommand::Sequence(_) => ActionKind::Composite,
        }
    }
}

/// A single catalog entry
#[derive(Debug, Clone)]
pub struct ActionDefinition {
    /// Unique key the bus submits by
    pub name: &'static str,
    /// Human-readable name shown in status output
    pub display_name: &'static str,
    /// Assumed wall-clock time the motion takes; paces the executor
    pub duration: Duration,
    pub command: DeviceCommand,
}

impl ActionDefinition {
    pub fn kind(&self) -> ActionKind {
        self.command.kind()
    }
}

/// Immutable name -> definition table
pub struct ActionCatalog {
    entries: HashMap<&'static str, ActionDefinition>,
}

impl ActionCatalog {
    fn from_entries(entries: Vec<ActionDefinition>) -> Self {
        let entries = entries.into_iter().map(|def| (def.name, def)).collect();
        Self { entries }
    }

    pub fn lookup(&self, name: &str) -> Option<&ActionDefinition> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Action table for the humanoid, driven through the local RunAction daemon
    pub fn humanoid() -> Self {
        fn run(
            name: &'static str,
            display_name: &'static str,
            secs: f32,
            code: &'static str,
            group: &'static str,
        ) -> ActionDefinition {
            ActionDefinition {
                name,
                display_name,
                duration: Duration::from_secs_f32(secs),
                command: DeviceCommand::RunAction { code, group },
            }
        }

        Self::from_entries(vec![
            run("stand", "Stand", 1.0, "0", "1"),
            run("go_forward", "Walk forward", 3.5, "1", "4"),
            run("back_fast", "Walk backward", 4.5, "2", "4"),
            run("left_move_fast", "Sidestep left", 3.0, "3", "4"),
            run("right_move_fast", "Sidestep right", 3.0, "4", "4"),
            run("sit_ups", "Sit-ups", 12.0, "6", "1"),
            run("turn_left", "Turn left", 4.0, "7", "4"),
            run("turn_right", "Turn right", 4.0, "8", "4"),
            run("wave", "Wave", 3.5, "9", "1"),
            run("bow", "Bow", 4.0, "10", "1"),
            run("squat", "Squat", 1.0, "11", "1"),
            run("chest", "Chest exercise", 9.0, "12", "1"),
            run("left_shot_fast", "Left punch", 4.0, "13", "1"),
            run("right_shot_fast", "Right punch", 4.0, "14", "1"),
            run("wing_chun", "Wing chun", 2.0, "15", "1"),
            run("left_uppercut", "Left uppercut", 2.0, "16", "1"),
            run("right_uppercut", "Right uppercut", 2.0, "17", "1"),
            run("left_kick", "Left kick", 2.0, "18", "1"),
            run("right_kick", "Right kick", 2.0, "19", "1"),
            run("stand_up_front", "Stand up (front)", 5.0, "20", "1"),
            run("stand_up_back", "Stand up (back)", 5.0, "21", "1"),
            run("twist", "Twist", 4.0, "22", "1"),
            run("stand_slow", "Stand slowly", 1.0, "23", "1"),
            run("stepping", "Step in place", 3.0, "24", "2"),
        ])
    }

    /// Action table for the quadruped, driven through the motion-control bridge
    pub fn quadruped() -> Self {
        fn vel(
            name: &'static str,
            display_name: &'static str,
            secs: f32,
            x: f32,
            y: f32,
            yaw_rate: f32,
        ) -> ActionDefinition {
            ActionDefinition {
                name,
                display_name,
                duration: Duration::from_secs_f32(secs),
                command: DeviceCommand::Velocity { x, y, yaw_rate },
            }
        }
        fn motion(
            name: &'static str,
            display_name: &'static str,
            secs: f32,
            file: &'static str,
        ) -> ActionDefinition {
            ActionDefinition {
                name,
                display_name,
                duration: Duration::from_secs_f32(secs),
                command: DeviceCommand::MotionFile { file },
            }
        }

        Self::from_entries(vec![
            // Gait moves
            vel("go_forward", "Walk forward", 3.5, 5.0, 0.0, 0.0),
            vel("back_fast", "Walk backward", 4.5, -5.0, 0.0, 0.0),
            vel("left_move_fast", "Sidestep left", 3.0, 0.0, 5.0, 0.0),
            vel("right_move_fast", "Sidestep right", 3.0, 0.0, -5.0, 0.0),
            vel("turn_left", "Turn left", 4.0, 0.0, 0.0, 1.0),
            vel("turn_right", "Turn right", 4.0, 0.0, 0.0, -1.0),
            // Postures
            motion("stand", "Stand", 2.0, "stand.d6ac"),
            motion("sit", "Sit", 2.0, "sit.d6ac"),
            motion("lie_down", "Lie down", 3.0, "lie_down.d6ac"),
            motion("2_legs_stand", "Stand on hind legs", 3.0, "2_legs_stand.d6ac"),
            motion("look_down", "Look down", 2.0, "look_down.d6a"),
            // Interaction
            motion("bow", "Bow", 4.0, "bow.d6ac"),
            motion("wave", "Wave", 3.5, "wave.d6ac"),
            motion("shake_hands", "Shake hands", 4.0, "shake_hands.d6ac"),
            motion("nod", "Nod", 2.0, "nod.d6ac"),
            motion("shake_head", "Shake head", 2.0, "shake_head.d6ac"),
            // Exercise
            motion("boxing", "Boxing", 5.0, "boxing.d6ac"),
            motion("boxing2", "Boxing (variant)", 5.0, "boxing2.d6ac"),
            motion("push_ups", "Push-ups", 8.0, "push-up.d6ac"),
            motion("push_up", "Push-ups", 8.0, "push-up.d6ac"),
            motion("press_up", "Press-ups", 8.0, "press-up.d6ac"),
            motion("moonwalk", "Moonwalk", 6.0, "moonwalk.d6ac"),
            motion("spacewalk", "Spacewalk", 6.0, "spacewalk.d6ac"),
            motion("jump", "Jump", 3.0, "jump.d6ac"),
            motion("stretch", "Stretch", 5.0, "stretch.d6ac"),
            motion("pee", "Pee", 4.0, "pee.d6ac"),
            motion("demo", "Demo routine", 10.0, "demo.d6ac"),
            // Special
            motion("up_stairs_3_5cm", "Climb 3.5cm stair", 5.0, "up_stairs_3.5cm.d6ac"),
            motion("kick_ball_left", "Kick ball (left)", 3.0, "kick_ball_left.d6ac"),
            motion("kick_ball_right", "Kick ball (right)", 3.0, "kick_ball_right.d6ac"),
            motion("Clamping", "Clamp", 3.0, "Clamping.d6a"),
        ])
    }
}
