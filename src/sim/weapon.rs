//! Static weapon catalog

use serde::{Deserialize, Serialize};

/// Weapon slots, selected with the number keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    #[default]
    Pistol,
    Shotgun,
    Rifle,
}

/// Fixed weapon stats
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weapon {
    pub name: &'static str,
    /// Catalog damage per pellet (only used by `DamageModel::PerWeapon`)
    pub damage: u32,
    pub max_ammo: u32,
    /// Minimum time between trigger pulls
    pub fire_rate_ms: u64,
    pub bullet_speed: f32,
    /// Max angular jitter per pellet (radians, applied to yaw and pitch)
    pub spread: f32,
    pub pellets: u32,
}

const PISTOL: Weapon = Weapon {
    name: "Pistol",
    damage: 20,
    max_ammo: 30,
    fire_rate_ms: 300,
    bullet_speed: 50.0,
    spread: 0.0,
    pellets: 1,
};

const SHOTGUN: Weapon = Weapon {
    name: "Shotgun",
    damage: 50,
    max_ammo: 12,
    fire_rate_ms: 800,
    bullet_speed: 40.0,
    spread: 0.1,
    pellets: 5,
};

const RIFLE: Weapon = Weapon {
    name: "Assault Rifle",
    damage: 100,
    max_ammo: 90,
    fire_rate_ms: 100,
    bullet_speed: 60.0,
    spread: 0.05,
    pellets: 1,
};

impl WeaponKind {
    pub const ALL: [WeaponKind; 3] = [WeaponKind::Pistol, WeaponKind::Shotgun, WeaponKind::Rifle];

    pub fn stats(&self) -> &'static Weapon {
        match self {
            WeaponKind::Pistol => &PISTOL,
            WeaponKind::Shotgun => &SHOTGUN,
            WeaponKind::Rifle => &RIFLE,
        }
    }

    /// Weapon bound to a keyboard key ("1", "2", "3")
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "1" => Some(WeaponKind::Pistol),
            "2" => Some(WeaponKind::Shotgun),
            "3" => Some(WeaponKind::Rifle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeaponKind::Pistol => "pistol",
            WeaponKind::Shotgun => "shotgun",
            WeaponKind::Rifle => "rifle",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog() {
        assert_eq!(WeaponKind::Pistol.stats().pellets, 1);
        assert_eq!(WeaponKind::Shotgun.stats().pellets, 5);
        assert!(WeaponKind::Rifle.stats().fire_rate_ms < WeaponKind::Pistol.stats().fire_rate_ms);
        assert_eq!(WeaponKind::Shotgun.stats().max_ammo, 12);
    }

    #[test]
    fn test_key_binding() {
        assert_eq!(WeaponKind::from_key("2"), Some(WeaponKind::Shotgun));
        assert_eq!(WeaponKind::from_key("4"), None);
        for kind in WeaponKind::ALL {
            assert!(!kind.stats().name.is_empty());
        }
    }
}
