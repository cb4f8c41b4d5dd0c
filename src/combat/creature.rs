//! Creature stats and hit point bookkeeping

use serde::{Deserialize, Serialize};

/// One of the four contestants, owned by its battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Creature {
    pub base_hp: u16,
    pub atk: u16,
    pub def: u16,
    pub spd: u16,
    pub current_hp: u16,
    pub alive: bool,
}

impl Creature {
    /// Fresh creature at full health
    pub fn new(hp: u16, atk: u16, def: u16, spd: u16) -> Self {
        Self {
            base_hp: hp,
            atk,
            def,
            spd,
            current_hp: hp,
            alive: hp > 0,
        }
    }

    /// Apply damage, flooring at zero. Returns true if this hit was fatal.
    pub fn take_damage(&mut self, damage: u16) -> bool {
        self.current_hp = self.current_hp.saturating_sub(damage);
        if self.current_hp == 0 && self.alive {
            self.alive = false;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_creature_is_alive_at_full_hp() {
        let c = Creature::new(100, 50, 20, 30);
        assert_eq!(c.current_hp, 100);
        assert!(c.alive);
    }

    #[test]
    fn test_damage_floors_at_zero() {
        let mut c = Creature::new(10, 5, 5, 5);
        assert!(c.take_damage(25));
        assert_eq!(c.current_hp, 0);
        assert!(!c.alive);
        // Already dead: not a second kill
        assert!(!c.take_damage(1));
    }

    #[test]
    fn test_partial_damage() {
        let mut c = Creature::new(10, 5, 5, 5);
        assert!(!c.take_damage(4));
        assert_eq!(c.current_hp, 6);
        assert!(c.alive);
    }
}
