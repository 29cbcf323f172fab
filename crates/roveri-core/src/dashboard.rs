use crate::models::{AdminUser, Pet};

/// Counters shown on the admin overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_users: usize,
    pub total_pets: usize,
    pub available_pets: usize,
    pub adopted_pets: usize,
    pub total_views: u64,
}

impl DashboardStats {
    pub fn compute(users: &[AdminUser], pets: &[Pet]) -> Self {
        let pet_status = |status: &str| {
            pets.iter()
                .filter(|pet| pet.status.as_deref() == Some(status))
                .count()
        };
        Self {
            total_users: users.len(),
            active_users: users.iter().filter(|user| user.is_active()).count(),
            total_pets: pets.len(),
            available_pets: pet_status("available"),
            adopted_pets: pet_status("adopted"),
            total_views: pets.iter().filter_map(|pet| pet.views).sum(),
        }
    }
}
