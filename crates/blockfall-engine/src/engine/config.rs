/// Tunable timing and rule parameters of a session.
///
/// All durations are in ticks. The defaults assume the session is
/// ticked 60 times per second.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Gravity interval at level 1.
    pub gravity_base: u32,
    /// Ticks shaved off the gravity interval per level above 1.
    pub gravity_step: u32,
    /// Ticks a grounded piece waits before locking.
    pub lock_delay: u32,
    /// Rotations per piece that may reset the lock delay.
    pub rotation_budget: u32,
    /// When set, rotations always reset the lock delay and the budget
    /// is ignored.
    pub infinite_resets: bool,
    /// Holds allowed per placement.
    pub hold_limit: u32,
    /// Whether ghost cells are reported for rendering.
    pub ghost: bool,
    /// Ticks a direction must stay held before it starts repeating.
    pub autoshift_delay: u32,
    /// Ticks between repeated shifts once autoshift has kicked in.
    pub autoshift_repeat: u32,
    /// Ticks between repeated rows while soft drop is held.
    pub soft_drop_repeat: u32,
    /// Points per row descended by soft drop.
    pub soft_drop_bonus: u64,
    /// Points per row descended by hard drop.
    pub hard_drop_bonus: u64,
    /// Level the session starts at. Zero is treated as one.
    pub start_level: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gravity_base: 60,
            gravity_step: 3,
            lock_delay: 30,
            rotation_budget: 15,
            infinite_resets: false,
            hold_limit: 2,
            ghost: true,
            autoshift_delay: 10,
            autoshift_repeat: 3,
            soft_drop_repeat: 2,
            soft_drop_bonus: 1,
            hard_drop_bonus: 2,
            start_level: 1,
        }
    }
}
