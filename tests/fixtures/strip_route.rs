//! A driving route along Las Vegas Boulevard, north to south.
//!
//! Coordinates sourced from OpenStreetMap; full precision on purpose so the
//! codec's rounding is exercised.

/// A named stop with coordinates.
#[derive(Debug, Clone)]
pub struct Stop {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Stop {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

pub const STRIP_STOPS: &[Stop] = &[
    Stop::new("Encore at Wynn", 36.1289345, -115.1653620),
    Stop::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Stop::new("Public House", 36.1219193, -115.1689317),
    Stop::new("Yard House", 36.1177147, -115.1691992),
    Stop::new("Caesars Palace", 36.1162, -115.1745),
    Stop::new("Bellagio", 36.1126, -115.1767),
    Stop::new("Gordon Ramsay BurGR", 36.1107195, -115.1720818),
    Stop::new("Hard Rock Cafe", 36.1041592, -115.1722166),
    Stop::new("MGM Grand", 36.1023654, -115.1688720),
];

pub fn strip_route() -> Vec<(f64, f64)> {
    STRIP_STOPS.iter().map(Stop::coords).collect()
}
