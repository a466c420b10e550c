use crate::dto::HealthRes;

/// Simple health service shared by every API surface.
///
/// This service provides a standardised way to check the health status of the
/// Rota system. It can be used both as a static utility and as an
/// instantiated service.
#[derive(Clone)]
pub struct HealthService;

impl HealthService {
    /// Creates a new instance of HealthService.
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Rota is alive".into(),
        }
    }

    /// Instance method for compatibility; delegates to `check_health()`.
    pub fn check_health_instance(&self) -> HealthRes {
        Self::check_health()
    }
}

impl Default for HealthService {
    fn default() -> Self {
        Self::new()
    }
}
