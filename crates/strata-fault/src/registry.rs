use std::collections::HashMap;
use std::sync::RwLock;

use tracing::debug;

use crate::trigger::{Trigger, TriggerMode};

/// The set of armed fault points.
///
/// Shared by reference between the test harness (which arms points) and the
/// adapter (which checks them). Checks against unarmed names return `false`
/// without touching trigger state.
#[derive(Default)]
pub struct FaultRegistry {
    points: RwLock<HashMap<String, Trigger>>,
}

impl FaultRegistry {
    /// Create a registry with no points armed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) a point. Re-arming replaces the mode and resets any
    /// counters accumulated under the previous mode.
    pub fn enable(&self, name: &str, mode: TriggerMode) {
        debug!(point = name, ?mode, "fault point armed");
        self.points
            .write()
            .expect("fault registry lock poisoned")
            .insert(name.to_string(), Trigger::new(mode));
    }

    /// Arm a point that fires on every check.
    pub fn enable_always(&self, name: &str) {
        self.enable(name, TriggerMode::Always);
    }

    /// Arm a point that fires on the next check only.
    pub fn enable_once(&self, name: &str) {
        self.enable(name, TriggerMode::Once);
    }

    /// Disarm a point. Disarming an unknown name is a no-op.
    pub fn disable(&self, name: &str) {
        let removed = self
            .points
            .write()
            .expect("fault registry lock poisoned")
            .remove(name);
        if removed.is_some() {
            debug!(point = name, "fault point disarmed");
        }
    }

    /// Evaluate one check of `name`, advancing the point's trigger state.
    ///
    /// Returns `false` for unarmed names.
    pub fn is_enabled(&self, name: &str) -> bool {
        // Fast path: most checks are against unarmed points.
        {
            let points = self.points.read().expect("fault registry lock poisoned");
            if !points.contains_key(name) {
                return false;
            }
        }
        let mut points = self.points.write().expect("fault registry lock poisoned");
        match points.get_mut(name) {
            Some(trigger) => {
                let fired = trigger.fire();
                if fired {
                    debug!(point = name, "fault point fired");
                }
                fired
            }
            None => false,
        }
    }

    /// Disarm all points.
    pub fn reset(&self) {
        self.points
            .write()
            .expect("fault registry lock poisoned")
            .clear();
    }

    /// Names and modes of points that can still fire, sorted by name.
    ///
    /// A `Once` point that has already fired is not reported.
    pub fn active_points(&self) -> Vec<(String, TriggerMode)> {
        let points = self.points.read().expect("fault registry lock poisoned");
        let mut active: Vec<(String, TriggerMode)> = points
            .iter()
            .filter(|(_, t)| t.is_live())
            .map(|(name, t)| (name.clone(), t.mode()))
            .collect();
        active.sort_by(|a, b| a.0.cmp(&b.0));
        active
    }
}

impl std::fmt::Debug for FaultRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .points
            .read()
            .expect("fault registry lock poisoned")
            .len();
        f.debug_struct("FaultRegistry")
            .field("armed_points", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unarmed_point_is_disabled() {
        let reg = FaultRegistry::new();
        assert!(!reg.is_enabled("entity_create_fail"));
    }

    #[test]
    fn enable_always_fires_repeatedly() {
        let reg = FaultRegistry::new();
        reg.enable_always("obj_write_fail");
        assert!(reg.is_enabled("obj_write_fail"));
        assert!(reg.is_enabled("obj_write_fail"));
        // Other points are unaffected.
        assert!(!reg.is_enabled("obj_read_fail"));
    }

    #[test]
    fn enable_once_disarms_after_firing() {
        let reg = FaultRegistry::new();
        reg.enable_once("idx_op_fail");
        assert!(reg.is_enabled("idx_op_fail"));
        assert!(!reg.is_enabled("idx_op_fail"));
        assert!(reg.active_points().is_empty());
    }

    #[test]
    fn disable_removes_point() {
        let reg = FaultRegistry::new();
        reg.enable_always("kv_put_fail");
        reg.disable("kv_put_fail");
        assert!(!reg.is_enabled("kv_put_fail"));
    }

    #[test]
    fn disable_unknown_is_noop() {
        let reg = FaultRegistry::new();
        reg.disable("never_armed");
    }

    #[test]
    fn rearming_resets_counters() {
        let reg = FaultRegistry::new();
        reg.enable_once("sync_op_init_fail");
        assert!(reg.is_enabled("sync_op_init_fail"));
        assert!(!reg.is_enabled("sync_op_init_fail"));

        // Re-arm: fires again.
        reg.enable_once("sync_op_init_fail");
        assert!(reg.is_enabled("sync_op_init_fail"));
    }

    #[test]
    fn n_and_m_through_registry() {
        let reg = FaultRegistry::new();
        reg.enable("kv_get_fail", TriggerMode::NAndM { skip: 1, fire: 1 });
        assert!(!reg.is_enabled("kv_get_fail"));
        assert!(reg.is_enabled("kv_get_fail"));
        assert!(!reg.is_enabled("kv_get_fail"));
        assert!(reg.is_enabled("kv_get_fail"));
    }

    #[test]
    fn reset_disarms_everything() {
        let reg = FaultRegistry::new();
        reg.enable_always("a");
        reg.enable_always("b");
        reg.reset();
        assert!(!reg.is_enabled("a"));
        assert!(!reg.is_enabled("b"));
        assert!(reg.active_points().is_empty());
    }

    #[test]
    fn active_points_sorted_and_filtered() {
        let reg = FaultRegistry::new();
        reg.enable_always("b_point");
        reg.enable_always("a_point");
        reg.enable_once("c_point");
        assert!(reg.is_enabled("c_point")); // spend the Once

        let active = reg.active_points();
        let names: Vec<&str> = active.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["a_point", "b_point"]);
    }

    #[test]
    fn shared_across_threads() {
        use std::sync::Arc;
        use std::thread;

        let reg = Arc::new(FaultRegistry::new());
        reg.enable_always("shared_fail");

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let reg = Arc::clone(&reg);
                thread::spawn(move || {
                    for _ in 0..100 {
                        assert!(reg.is_enabled("shared_fail"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().expect("thread should not panic");
        }
    }
}
