//! Hull integrity of the player vessel
//!
//! Impacts deduct life through `Health::take_damage`, which reports how much was actually
//! removed and whether the hit was fatal. The movement controller turns a fatal hit into the
//! dead flag the world controller polls.

/// Current and maximum life
///
/// # Examples
///
/// ```
/// use abyssal::health::Health;
///
/// let mut health = Health::new(100.0);
/// health.take_damage(30.0);
/// assert_eq!(health.current(), 70.0);
/// assert_eq!(health.percentage(), 0.7);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Creates a new Health instance at full life
    pub fn new(max: f32) -> Self {
        Health { current: max, max }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Current life as a fraction of the maximum (0.0 to 1.0)
    pub fn percentage(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }

    /// Deducts `amount` life, never going below zero.
    ///
    /// ```
    /// use abyssal::health::Health;
    ///
    /// let mut health = Health::new(100.0);
    /// let result = health.take_damage(150.0);
    /// assert_eq!(result.damage_dealt, 100.0);
    /// assert!(result.is_fatal);
    /// assert_eq!(result.overkill, 50.0);
    /// ```
    pub fn take_damage(&mut self, amount: f32) -> DamageResult {
        if !self.is_alive() {
            return DamageResult::no_damage();
        }

        let old = self.current;
        self.current = (self.current - amount).max(0.0);

        DamageResult {
            damage_dealt: old - self.current,
            is_fatal: self.current <= 0.0,
            overkill: (amount - old).max(0.0),
        }
    }

    /// Back to full life (used when a level reloads after death)
    pub fn restore(&mut self) {
        self.current = self.max;
    }
}

/// Outcome of a `take_damage` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageResult {
    /// Life actually removed (capped by what was left)
    pub damage_dealt: f32,
    /// The hit brought life to zero
    pub is_fatal: bool,
    pub overkill: f32,
}

impl DamageResult {
    pub fn no_damage() -> Self {
        DamageResult {
            damage_dealt: 0.0,
            is_fatal: false,
            overkill: 0.0,
        }
    }
}
