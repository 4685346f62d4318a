use crate::file::settings::RingSettings;

pub type RingId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingKind {
    /// First beat of a bar.
    Filled,
    Outline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingTint {
    /// Slot in the theme's ring palette.
    Palette(usize),
    Neutral,
}

/// Beat marker that drifts left from the spawn point until it leaves the view.
#[derive(Debug, Clone, PartialEq)]
pub struct TransientRing {
    pub id: RingId,
    pub kind: RingKind,
    pub tint: RingTint,
    pub x: f64,
    /// Accumulated roll around the ring's own axis, radians.
    pub spin: f64,
    pub visible: bool,
}

/// The set of live rings plus the scene changes nobody has applied yet.
#[derive(Debug, Default)]
pub struct RingField {
    rings: Vec<TransientRing>,
    next_id: RingId,
    spawned: Vec<RingId>,
    removed: Vec<RingId>,
}

impl RingField {
    pub fn rings(&self) -> &[TransientRing] {
        &self.rings
    }

    pub fn get(&self, id: RingId) -> Option<&TransientRing> {
        self.rings.iter().find(|ring| ring.id == id)
    }

    pub fn len(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn spawn(&mut self, kind: RingKind, tint: RingTint, settings: &RingSettings) -> RingId {
        let id = self.next_id;
        self.next_id += 1;
        self.rings.push(TransientRing {
            id,
            kind,
            tint,
            x: settings.spawn_x,
            spin: 0.0,
            visible: true,
        });
        self.spawned.push(id);
        id
    }

    /// Moves every ring left by `delta_secs * 1000 * speed_factor` and spins it.
    /// Rings already past the cull line turn invisible and leave the set.
    pub fn advance(&mut self, delta_secs: f64, speed_factor: f64, settings: &RingSettings) {
        let step = delta_secs * 1000.0 * speed_factor;
        let spin = delta_secs * settings.spin_per_second * std::f64::consts::PI;
        for ring in &mut self.rings {
            if ring.x > settings.cull_x {
                ring.x -= step;
                ring.spin += spin;
            } else {
                ring.visible = false;
            }
        }

        let removed = &mut self.removed;
        self.rings.retain(|ring| {
            if !ring.visible {
                removed.push(ring.id);
            }
            ring.visible
        });
    }

    /// Drops every live ring at once.
    pub fn clear(&mut self) {
        self.removed.extend(self.rings.drain(..).map(|ring| ring.id));
    }

    /// Ids spawned since the last call.
    pub fn take_spawned(&mut self) -> Vec<RingId> {
        std::mem::take(&mut self.spawned)
    }

    /// Ids removed since the last call.
    pub fn take_removed(&mut self) -> Vec<RingId> {
        std::mem::take(&mut self.removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RingSettings {
        RingSettings::default()
    }

    #[test]
    fn test_spawn_places_ring_at_spawn_x() {
        let mut field = RingField::default();
        let id = field.spawn(RingKind::Filled, RingTint::Neutral, &settings());
        let ring = field.get(id).unwrap();
        assert_eq!(ring.x, 15.0);
        assert!(ring.visible);
        assert_eq!(field.take_spawned(), vec![id]);
        assert!(field.take_spawned().is_empty());
    }

    #[test]
    fn test_advance_moves_left_by_elapsed_time() {
        let mut field = RingField::default();
        let id = field.spawn(RingKind::Outline, RingTint::Palette(0), &settings());
        field.advance(0.5, 0.005, &settings());
        let ring = field.get(id).unwrap();
        assert!((ring.x - 12.5).abs() < 1e-9);
        assert!((ring.spin + 0.05 * std::f64::consts::PI).abs() < 1e-9);
    }

    #[test]
    fn test_ring_past_cull_line_is_removed_for_good() {
        let mut field = RingField::default();
        let id = field.spawn(RingKind::Outline, RingTint::Neutral, &settings());
        // One long frame carries it from 15 to roughly -185.
        field.advance(40.0, 0.005, &settings());
        assert!(field.get(id).unwrap().x < -100.0);
        assert_eq!(field.len(), 1);

        field.advance(0.016, 0.005, &settings());
        assert!(field.is_empty());
        assert_eq!(field.take_removed(), vec![id]);

        field.advance(1.0, 0.005, &settings());
        assert!(field.get(id).is_none());
        assert!(field.take_removed().is_empty());
    }

    #[test]
    fn test_set_only_shrinks_without_spawns() {
        let mut field = RingField::default();
        for _ in 0..3 {
            field.spawn(RingKind::Outline, RingTint::Neutral, &settings());
            field.advance(8.0, 0.005, &settings());
        }
        let mut last = field.len();
        for _ in 0..10 {
            field.advance(8.0, 0.005, &settings());
            assert!(field.len() <= last);
            last = field.len();
        }
        assert!(field.is_empty());
    }

    #[test]
    fn test_clear_reports_every_live_ring() {
        let mut field = RingField::default();
        let a = field.spawn(RingKind::Filled, RingTint::Neutral, &settings());
        let b = field.spawn(RingKind::Outline, RingTint::Neutral, &settings());
        field.clear();
        assert!(field.is_empty());
        assert_eq!(field.take_removed(), vec![a, b]);
    }
}
