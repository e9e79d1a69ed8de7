use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::AvailabilityStore;
use crate::services::clock::Clock;
use crate::services::reservation::ReservationService;

pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<AvailabilityStore>,
    pub reservations: Arc<ReservationService>,
    pub clock: Arc<dyn Clock>,
}
