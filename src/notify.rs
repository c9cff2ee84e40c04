//! Audio/visual notification seam
//!
//! The simulation only queues `GameEvent`s; a `Notifier` turns them into
//! sounds and HUD effects on the host. Every call is fire-and-forget.

use serde::{Deserialize, Serialize};

use crate::sim::GameEvent;

/// Named sound effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sound {
    Shoot,
    Reload,
    /// Player took damage
    #[serde(rename = "hit")]
    PlayerHit,
    ZombieAttack,
    ZombieDying,
    ZombieScreams,
    ZombieLaughter,
    ZombieGrowling,
}

impl Sound {
    /// Pool for the random background groans
    pub const AMBIENT: [Sound; 3] = [
        Sound::ZombieScreams,
        Sound::ZombieLaughter,
        Sound::ZombieGrowling,
    ];

    /// Asset key the host plays
    pub fn as_str(&self) -> &'static str {
        match self {
            Sound::Shoot => "shoot",
            Sound::Reload => "reload",
            Sound::PlayerHit => "hit",
            Sound::ZombieAttack => "zombieAttack",
            Sound::ZombieDying => "zombieDying",
            Sound::ZombieScreams => "zombieScreams",
            Sound::ZombieLaughter => "zombieLaughter",
            Sound::ZombieGrowling => "zombieGrowling",
        }
    }
}

/// Host-side effects
pub trait Notifier {
    fn play_sound(&mut self, _sound: Sound) {}
    fn show_hit_marker(&mut self) {}
    fn show_wave_complete(&mut self, _wave: u32) {}
    fn flash_damage(&mut self) {}
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {}

/// Logs notifications at debug level (headless runs)
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn play_sound(&mut self, sound: Sound) {
        log::debug!("sound: {}", sound.as_str());
    }

    fn show_hit_marker(&mut self) {
        log::debug!("hit marker");
    }

    fn show_wave_complete(&mut self, wave: u32) {
        log::debug!("wave {} complete banner", wave);
    }

    fn flash_damage(&mut self) {
        log::debug!("damage flash");
    }
}

/// Records notifications for hosts that poll instead of being called
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Notice {
    Sound {
        name: String,
    },
    HitMarker,
    WaveComplete {
        wave: u32,
    },
    DamageFlash,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog {
    pub notices: Vec<Notice>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything recorded so far
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Notifier for EventLog {
    fn play_sound(&mut self, sound: Sound) {
        self.notices.push(Notice::Sound {
            name: sound.as_str().to_string(),
        });
    }

    fn show_hit_marker(&mut self) {
        self.notices.push(Notice::HitMarker);
    }

    fn show_wave_complete(&mut self, wave: u32) {
        self.notices.push(Notice::WaveComplete { wave });
    }

    fn flash_damage(&mut self) {
        self.notices.push(Notice::DamageFlash);
    }
}

/// Forward the notifier-facing events; the rest are for the session
pub fn dispatch<N: Notifier + ?Sized>(events: &[GameEvent], notifier: &mut N) {
    for event in events {
        match event {
            GameEvent::Sound(sound) => notifier.play_sound(*sound),
            GameEvent::HitMarker => notifier.show_hit_marker(),
            GameEvent::DamageFlash { .. } => notifier.flash_damage(),
            GameEvent::WaveComplete { completed, .. } => notifier.show_wave_complete(*completed),
            _ => {}
        }
    }
}
