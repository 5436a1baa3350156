//! Pages of the prerendered site that always exist.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticRoute {
    pub path: &'static str,
    pub changefreq: &'static str,
    pub priority: f32,
}

const fn route(path: &'static str, changefreq: &'static str, priority: f32) -> StaticRoute {
    StaticRoute {
        path,
        changefreq,
        priority,
    }
}

pub const STATIC_ROUTES: &[StaticRoute] = &[
    route("/", "weekly", 1.0),
    // Services
    route("/services", "monthly", 0.9),
    route("/services/concrete-driveways", "monthly", 0.8),
    route("/services/stamped-concrete", "monthly", 0.8),
    route("/services/concrete-patios", "monthly", 0.8),
    route("/services/sidewalks-and-steps", "monthly", 0.8),
    route("/services/foundations-and-slabs", "monthly", 0.8),
    route("/services/concrete-repair", "monthly", 0.8),
    route("/services/retaining-walls", "monthly", 0.8),
    // Locations
    route("/locations", "monthly", 0.7),
    route("/locations/minneapolis", "monthly", 0.7),
    route("/locations/st-paul", "monthly", 0.7),
    route("/locations/bloomington", "monthly", 0.7),
    route("/locations/edina", "monthly", 0.7),
    route("/locations/plymouth", "monthly", 0.7),
    route("/locations/maple-grove", "monthly", 0.7),
    route("/locations/eden-prairie", "monthly", 0.7),
    // Pricing guides
    route("/pricing", "monthly", 0.7),
    route("/pricing/concrete-driveway-cost", "monthly", 0.6),
    route("/pricing/stamped-concrete-cost", "monthly", 0.6),
    route("/pricing/concrete-patio-cost", "monthly", 0.6),
    route("/pricing/foundation-repair-cost", "monthly", 0.6),
    // Content indexes
    route("/blog", "daily", 0.8),
    route("/gallery", "weekly", 0.8),
    route("/contact", "yearly", 0.5),
];
