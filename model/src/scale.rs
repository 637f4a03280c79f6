use crate::TimeFilter;

/// Maps a station's total traffic to a marker radius. The area of the marker, not the radius, is
/// proportional to traffic.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusScale {
    max_traffic: usize,
    min_radius: f64,
    max_radius: f64,
}

impl RadiusScale {
    pub const UNFILTERED: (f64, f64) = (0.0, 25.0);
    // A filtered window has far fewer trips, so small counts are exaggerated to stay visible
    pub const FILTERED: (f64, f64) = (3.0, 50.0);

    pub fn new(max_traffic: usize, filter: TimeFilter) -> Self {
        let (min_radius, max_radius) = if filter.is_filtered() {
            Self::FILTERED
        } else {
            Self::UNFILTERED
        };
        Self {
            max_traffic,
            min_radius,
            max_radius,
        }
    }

    pub fn radius(&self, total_traffic: usize) -> f64 {
        if self.max_traffic == 0 {
            return self.min_radius;
        }
        let pct = (total_traffic as f64 / self.max_traffic as f64).sqrt();
        self.min_radius + pct * (self.max_radius - self.min_radius)
    }

    pub fn max_traffic(&self) -> usize {
        self.max_traffic
    }
}

/// Quantizes the fraction of a station's traffic that departs (instead of arrives) into one of a
/// few evenly spaced steps over [0, 1].
#[derive(Clone, Debug, PartialEq)]
pub struct FlowScale {
    steps: Vec<f64>,
}

impl FlowScale {
    /// Mostly arrivals, balanced, mostly departures
    pub fn new() -> Self {
        Self {
            steps: vec![0.0, 0.5, 1.0],
        }
    }

    fn departure_ratio(departures: usize, total_traffic: usize) -> f64 {
        if total_traffic == 0 {
            0.0
        } else {
            departures as f64 / total_traffic as f64
        }
    }

    pub fn flow(&self, departures: usize, total_traffic: usize) -> f64 {
        self.quantize(Self::departure_ratio(departures, total_traffic))
    }

    pub fn quantize(&self, ratio: f64) -> f64 {
        let n = self.steps.len();
        // Thresholds sit at 1/n, 2/n, ... (n-1)/n. A value exactly on one goes to the upper step.
        let idx = (1..n).take_while(|i| ratio >= *i as f64 / n as f64).count();
        self.steps[idx]
    }
}

impl Default for FlowScale {
    fn default() -> Self {
        Self::new()
    }
}
